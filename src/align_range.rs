use crate::range::SeqRange;

/// One aligned block between the anchor (first) and a row (second).
///
/// Both sides have the same length: rows with a base width of 3 are stored
/// in nucleotide-equivalent units, so a protein residue spans three anchor
/// positions and three row positions.
///
/// `direct` is the row orientation relative to the anchor, `first_direct`
/// the anchor's own orientation. Insertions use the same type, with
/// `first_from` being the anchor position the inserted residues sit before.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlignRange {
    first_from: i64,
    second_from: i64,
    len: i64,
    direct: bool,
    first_direct: bool,
}

impl AlignRange {
    pub fn new(first_from: i64, second_from: i64, len: i64, direct: bool) -> Self {
        Self {
            first_from,
            second_from,
            len,
            direct,
            first_direct: true,
        }
    }

    pub fn first_from(&self) -> i64 {
        self.first_from
    }

    pub fn first_to_open(&self) -> i64 {
        self.first_from + self.len
    }

    pub fn first_to(&self) -> i64 {
        self.first_to_open() - 1
    }

    pub fn second_from(&self) -> i64 {
        self.second_from
    }

    pub fn second_to_open(&self) -> i64 {
        self.second_from + self.len
    }

    pub fn second_to(&self) -> i64 {
        self.second_to_open() - 1
    }

    pub fn len(&self) -> i64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len <= 0
    }

    pub fn is_direct(&self) -> bool {
        self.direct
    }

    pub fn is_reversed(&self) -> bool {
        !self.direct
    }

    pub fn is_first_direct(&self) -> bool {
        self.first_direct
    }

    pub fn set_first_from(&mut self, first_from: i64) {
        self.first_from = first_from;
    }

    pub fn set_second_from(&mut self, second_from: i64) {
        self.second_from = second_from;
    }

    pub fn set_len(&mut self, len: i64) {
        self.len = len;
    }

    pub fn set_direct(&mut self, direct: bool) {
        self.direct = direct;
    }

    pub fn set_first_direct(&mut self, first_direct: bool) {
        self.first_direct = first_direct;
    }

    pub fn first_range(&self) -> SeqRange {
        SeqRange::new(self.first_from, self.first_to_open())
    }

    pub fn second_range(&self) -> SeqRange {
        SeqRange::new(self.second_from, self.second_to_open())
    }

    pub fn first_contains(&self, pos: i64) -> bool {
        self.first_from <= pos && pos < self.first_to_open()
    }

    pub fn second_contains(&self, pos: i64) -> bool {
        self.second_from <= pos && pos < self.second_to_open()
    }

    /// Row position aligned to anchor position `pos`. The caller makes sure
    /// `pos` lies inside the range.
    pub fn second_pos_by_first_pos(&self, pos: i64) -> i64 {
        let offset = pos - self.first_from;
        if self.direct {
            self.second_from + offset
        } else {
            self.second_to() - offset
        }
    }

    /// Anchor position aligned to row position `pos`.
    pub fn first_pos_by_second_pos(&self, pos: i64) -> i64 {
        if self.direct {
            self.first_from + (pos - self.second_from)
        } else {
            self.first_from + (self.second_to() - pos)
        }
    }

    /// Row sub-range aligned to the anchor sub-range `[from, to_open)`.
    pub fn second_range_for(&self, from: i64, to_open: i64) -> SeqRange {
        let head = from - self.first_from;
        let tail = to_open - self.first_from;
        if self.direct {
            SeqRange::new(self.second_from + head, self.second_from + tail)
        } else {
            SeqRange::new(self.second_to_open() - tail, self.second_to_open() - head)
        }
    }
}
