use std::cmp::{max, min};
use std::fmt;

/// Half-open coordinate range `[from, to_open)`.
///
/// `to()` reports the closed end (`to_open - 1`) for callers that print or
/// compare inclusive coordinates. The whole range is used as a "not set"
/// marker by the query methods: passing it means "use the natural extent".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SeqRange {
    from: i64,
    to_open: i64,
}

impl Default for SeqRange {
    fn default() -> Self {
        Self::empty()
    }
}

impl SeqRange {
    pub const fn new(from: i64, to_open: i64) -> Self {
        Self { from, to_open }
    }

    /// Build from inclusive coordinates.
    pub const fn from_closed(from: i64, to: i64) -> Self {
        Self {
            from,
            to_open: to + 1,
        }
    }

    pub const fn empty() -> Self {
        Self {
            from: 0,
            to_open: 0,
        }
    }

    pub const fn whole() -> Self {
        Self {
            from: i64::MIN,
            to_open: i64::MAX,
        }
    }

    pub fn is_whole(&self) -> bool {
        self.from == i64::MIN && self.to_open == i64::MAX
    }

    pub fn from(&self) -> i64 {
        self.from
    }

    pub fn to(&self) -> i64 {
        self.to_open - 1
    }

    pub fn to_open(&self) -> i64 {
        self.to_open
    }

    pub fn len(&self) -> i64 {
        max(0, self.to_open.saturating_sub(self.from))
    }

    pub fn is_empty(&self) -> bool {
        self.to_open <= self.from
    }

    pub fn contains(&self, pos: i64) -> bool {
        self.from <= pos && pos < self.to_open
    }

    pub fn intersection(&self, other: &SeqRange) -> SeqRange {
        let from = max(self.from, other.from);
        let to_open = min(self.to_open, other.to_open);
        if from < to_open {
            SeqRange::new(from, to_open)
        } else {
            SeqRange::empty()
        }
    }

    /// Extend to cover `other`. Empty ranges do not contribute.
    pub fn combine_with(&mut self, other: &SeqRange) {
        if other.is_empty() {
            return;
        }
        if self.is_empty() {
            *self = *other;
        } else {
            self.from = min(self.from, other.from);
            self.to_open = max(self.to_open, other.to_open);
        }
    }
}

impl fmt::Display for SeqRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            write!(f, "[empty]")
        } else {
            write!(f, "[{}, {}]", self.from, self.to())
        }
    }
}
