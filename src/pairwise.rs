//! Per-row aligned range collections.
//!
//! A [`PairwiseAln`] relates one row to the shared anchor. Ranges are kept in
//! anchor order; the collection records whether they ever went out of order
//! or overlapped so that consumers can reject bad input instead of guessing.

use crate::align_range::AlignRange;
use crate::range::SeqRange;

/// Nearest-neighbour policy for position lookups that fall into a hole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchDirection {
    /// Exact match or nothing.
    #[default]
    None,
    /// Towards lower alignment coordinates.
    Left,
    /// Towards higher alignment coordinates.
    Right,
    /// Along the row's own orientation.
    Forward,
    /// Against the row's own orientation.
    Backwards,
}

impl SearchDirection {
    pub fn opposite(self) -> Self {
        match self {
            SearchDirection::None => SearchDirection::None,
            SearchDirection::Left => SearchDirection::Right,
            SearchDirection::Right => SearchDirection::Left,
            SearchDirection::Forward => SearchDirection::Backwards,
            SearchDirection::Backwards => SearchDirection::Forward,
        }
    }
}

/// Collection state flags.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CollFlags {
    /// A range with a negative length was pushed.
    pub invalid: bool,
    /// A range started before its predecessor.
    pub unsorted: bool,
    /// A range overlapped its predecessor on the anchor.
    pub overlap: bool,
    /// At least one range has the row on the anchor's strand.
    pub direct: bool,
    /// At least one range has the row on the opposite strand.
    pub reversed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PairwiseAln {
    ranges: Vec<AlignRange>,
    insertions: Vec<AlignRange>,
    first_id: String,
    second_id: String,
    first_base_width: i32,
    second_base_width: i32,
    flags: CollFlags,
}

impl PairwiseAln {
    pub fn new(first_id: impl Into<String>, second_id: impl Into<String>) -> Self {
        Self::with_base_widths(first_id, second_id, 1, 1)
    }

    pub fn with_base_widths(
        first_id: impl Into<String>,
        second_id: impl Into<String>,
        first_base_width: i32,
        second_base_width: i32,
    ) -> Self {
        Self {
            ranges: Vec::new(),
            insertions: Vec::new(),
            first_id: first_id.into(),
            second_id: second_id.into(),
            first_base_width,
            second_base_width,
            flags: CollFlags::default(),
        }
    }

    /// Append a range. Empty ranges are dropped; ordering problems are
    /// recorded in the flags rather than fixed.
    pub fn push(&mut self, rg: AlignRange) {
        if rg.len() < 0 {
            self.flags.invalid = true;
            return;
        }
        if rg.is_empty() {
            return;
        }
        if let Some(last) = self.ranges.last() {
            if rg.first_from() < last.first_from() {
                self.flags.unsorted = true;
            } else if rg.first_from() < last.first_to_open() {
                self.flags.overlap = true;
            }
        }
        if rg.is_direct() {
            self.flags.direct = true;
        } else {
            self.flags.reversed = true;
        }
        self.ranges.push(rg);
    }

    /// Record residues present on the row with no anchor counterpart.
    pub fn add_insertion(&mut self, ins: AlignRange) {
        if ins.len() < 0 {
            self.flags.invalid = true;
            return;
        }
        if !ins.is_empty() {
            self.insertions.push(ins);
        }
    }

    pub fn ranges(&self) -> &[AlignRange] {
        &self.ranges
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AlignRange> {
        self.ranges.iter()
    }

    pub fn insertions(&self) -> &[AlignRange] {
        &self.insertions
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn first_id(&self) -> &str {
        &self.first_id
    }

    pub fn second_id(&self) -> &str {
        &self.second_id
    }

    pub fn first_base_width(&self) -> i32 {
        self.first_base_width
    }

    pub fn second_base_width(&self) -> i32 {
        self.second_base_width
    }

    pub fn flags(&self) -> CollFlags {
        self.flags
    }

    /// Sorted, non-overlapping and free of negative lengths.
    pub fn is_valid(&self) -> bool {
        !self.flags.invalid && !self.flags.unsorted && !self.flags.overlap
    }

    pub fn is_direct(&self) -> bool {
        self.flags.direct
    }

    pub fn is_reversed(&self) -> bool {
        self.flags.reversed
    }

    pub fn is_mixed_dir(&self) -> bool {
        self.flags.direct && self.flags.reversed
    }

    /// Anchor extent; relies on the collection being sorted.
    pub fn first_range(&self) -> SeqRange {
        match (self.ranges.first(), self.ranges.last()) {
            (Some(first), Some(last)) => SeqRange::new(first.first_from(), last.first_to_open()),
            _ => SeqRange::empty(),
        }
    }

    pub fn first_from(&self) -> i64 {
        self.first_range().from()
    }

    pub fn first_to(&self) -> i64 {
        self.first_range().to()
    }

    /// Index of the range containing anchor `pos`, or the insertion point.
    pub fn find_by_first(&self, pos: i64) -> Result<usize, usize> {
        let idx = self.ranges.partition_point(|rg| rg.first_to_open() <= pos);
        match self.ranges.get(idx) {
            Some(rg) if rg.first_from() <= pos => Ok(idx),
            _ => Err(idx),
        }
    }

    /// Row position aligned to anchor `pos`, searching towards `dir` when the
    /// anchor position is not aligned on this row.
    pub fn second_pos_by_first_pos(&self, pos: i64, dir: SearchDirection) -> Option<i64> {
        let idx = match self.find_by_first(pos) {
            Ok(idx) => return Some(self.ranges[idx].second_pos_by_first_pos(pos)),
            Err(idx) => idx,
        };
        let towards_right = match dir {
            SearchDirection::None => return None,
            SearchDirection::Right => true,
            SearchDirection::Left => false,
            SearchDirection::Forward => !self.is_reversed(),
            SearchDirection::Backwards => self.is_reversed(),
        };
        if towards_right {
            self.ranges
                .get(idx)
                .map(|rg| rg.second_pos_by_first_pos(rg.first_from()))
        } else if idx > 0 {
            let rg = &self.ranges[idx - 1];
            Some(rg.second_pos_by_first_pos(rg.first_to()))
        } else {
            None
        }
    }
}

/// Row-coordinate index over a [`PairwiseAln`], sorted by row start.
///
/// Built once per row after the collection is final.
#[derive(Debug, Clone, Default)]
pub struct SecondIndex {
    order: Vec<usize>,
    second_range: SeqRange,
}

impl SecondIndex {
    pub fn new(coll: &PairwiseAln) -> Self {
        let mut order: Vec<usize> = (0..coll.len()).collect();
        order.sort_by_key(|&i| coll.ranges()[i].second_from());
        let mut second_range = SeqRange::empty();
        for rg in coll.iter() {
            second_range.combine_with(&rg.second_range());
        }
        Self {
            order,
            second_range,
        }
    }

    /// Union of all row spans, always ascending.
    pub fn second_range(&self) -> SeqRange {
        self.second_range
    }

    /// Anchor position aligned to row `pos`, searching towards `dir` when the
    /// row position is not aligned.
    pub fn first_pos_by_second_pos(
        &self,
        coll: &PairwiseAln,
        pos: i64,
        dir: SearchDirection,
    ) -> Option<i64> {
        let ranges = coll.ranges();
        let idx = self
            .order
            .partition_point(|&i| ranges[i].second_to_open() <= pos);
        if let Some(&i) = self.order.get(idx) {
            if ranges[i].second_contains(pos) {
                return Some(ranges[i].first_pos_by_second_pos(pos));
            }
        }

        // `below` ends before pos on the row, `above` starts after it.
        let below = idx.checked_sub(1).map(|k| &ranges[self.order[k]]);
        let above = self.order.get(idx).map(|&i| &ranges[i]);
        let row_direct = !coll.is_reversed();
        let pick_above = match dir {
            SearchDirection::None => return None,
            SearchDirection::Forward => true,
            SearchDirection::Backwards => false,
            SearchDirection::Right => row_direct,
            SearchDirection::Left => !row_direct,
        };
        if pick_above {
            above.map(|rg| rg.first_pos_by_second_pos(rg.second_from()))
        } else {
            below.map(|rg| rg.first_pos_by_second_pos(rg.second_to()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_blocks(direct: bool) -> PairwiseAln {
        let mut pw = PairwiseAln::new("anchor", "row");
        if direct {
            pw.push(AlignRange::new(0, 0, 10, true));
            pw.push(AlignRange::new(20, 10, 10, true));
        } else {
            pw.push(AlignRange::new(0, 10, 10, false));
            pw.push(AlignRange::new(20, 0, 10, false));
        }
        pw
    }

    #[test]
    fn test_flags_track_order_and_overlap() {
        let mut pw = PairwiseAln::new("a", "b");
        pw.push(AlignRange::new(10, 0, 10, true));
        assert!(pw.is_valid());
        pw.push(AlignRange::new(15, 10, 10, true));
        assert!(pw.flags().overlap);
        let mut pw = PairwiseAln::new("a", "b");
        pw.push(AlignRange::new(10, 0, 10, true));
        pw.push(AlignRange::new(0, 10, 5, false));
        assert!(pw.flags().unsorted);
        assert!(pw.is_mixed_dir());
        let mut pw = PairwiseAln::new("a", "b");
        pw.push(AlignRange::new(0, 0, -1, true));
        assert!(!pw.is_valid());
    }

    #[test]
    fn test_empty_ranges_are_dropped() {
        let mut pw = PairwiseAln::new("a", "b");
        pw.push(AlignRange::new(0, 0, 0, true));
        pw.add_insertion(AlignRange::new(0, 0, 0, true));
        assert!(pw.is_empty());
        assert!(pw.insertions().is_empty());
        assert!(pw.is_valid());
    }

    #[test]
    fn test_second_pos_by_first_pos_search() {
        let pw = two_blocks(true);
        assert_eq!(pw.second_pos_by_first_pos(5, SearchDirection::None), Some(5));
        assert_eq!(pw.second_pos_by_first_pos(15, SearchDirection::None), None);
        assert_eq!(pw.second_pos_by_first_pos(15, SearchDirection::Left), Some(9));
        assert_eq!(pw.second_pos_by_first_pos(15, SearchDirection::Right), Some(10));
        assert_eq!(pw.second_pos_by_first_pos(15, SearchDirection::Forward), Some(10));
        assert_eq!(pw.second_pos_by_first_pos(35, SearchDirection::Right), None);
    }

    #[test]
    fn test_forward_follows_row_orientation() {
        let pw = two_blocks(false);
        // Anchor 9 pairs with row 10, anchor 20 with row 9.
        assert_eq!(pw.second_pos_by_first_pos(15, SearchDirection::Left), Some(10));
        assert_eq!(pw.second_pos_by_first_pos(15, SearchDirection::Right), Some(9));
        assert_eq!(pw.second_pos_by_first_pos(15, SearchDirection::Forward), Some(10));
        assert_eq!(pw.second_pos_by_first_pos(15, SearchDirection::Backwards), Some(9));
    }

    #[test]
    fn test_first_pos_by_second_pos_search() {
        let mut pw = PairwiseAln::new("anchor", "row");
        pw.push(AlignRange::new(0, 0, 10, true));
        pw.push(AlignRange::new(10, 15, 10, true));
        let index = SecondIndex::new(&pw);
        assert_eq!(index.second_range(), SeqRange::new(0, 25));
        assert_eq!(index.first_pos_by_second_pos(&pw, 17, SearchDirection::None), Some(12));
        assert_eq!(index.first_pos_by_second_pos(&pw, 12, SearchDirection::None), None);
        assert_eq!(index.first_pos_by_second_pos(&pw, 12, SearchDirection::Right), Some(10));
        assert_eq!(index.first_pos_by_second_pos(&pw, 12, SearchDirection::Left), Some(9));
        assert_eq!(index.first_pos_by_second_pos(&pw, 30, SearchDirection::Right), None);
    }

    #[test]
    fn test_first_pos_by_second_pos_reversed() {
        let mut pw = PairwiseAln::new("anchor", "row");
        pw.push(AlignRange::new(0, 15, 10, false));
        pw.push(AlignRange::new(10, 0, 10, false));
        let index = SecondIndex::new(&pw);
        // Row 12 is unaligned; row 9 (below) sits at anchor 10,
        // row 15 (above) sits at anchor 9.
        assert_eq!(index.first_pos_by_second_pos(&pw, 12, SearchDirection::Right), Some(10));
        assert_eq!(index.first_pos_by_second_pos(&pw, 12, SearchDirection::Left), Some(9));
        assert_eq!(index.first_pos_by_second_pos(&pw, 12, SearchDirection::Forward), Some(9));
    }
}
