//! Segment iteration over one row of a sparse alignment.
//!
//! A window of alignment columns is cut into consecutive segments: aligned
//! stretches, holes where the row has no residues, and row residues that sit
//! between two adjacent alignment columns.

use crate::align_range::AlignRange;
use crate::pairwise::PairwiseAln;
use crate::range::SeqRange;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    /// Row residues aligned to alignment columns.
    Aligned,
    /// Alignment columns with no residues on the row.
    GapOnRow,
    /// Row residues with no alignment columns.
    GapOnAnchor,
}

/// Which segments an iterator yields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SegmentFilter {
    #[default]
    All,
    /// Drop segments without row residues.
    SkipGaps,
    /// Drop segments without alignment columns.
    SkipInserts,
    /// Only aligned segments.
    AlignedOnly,
}

impl SegmentFilter {
    fn accepts(self, seg: &AlnSegment) -> bool {
        let skip_gaps = matches!(self, SegmentFilter::SkipGaps | SegmentFilter::AlignedOnly);
        let skip_inserts = matches!(self, SegmentFilter::SkipInserts | SegmentFilter::AlignedOnly);
        !(skip_gaps && seg.row_range.is_empty() || skip_inserts && seg.aln_range.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlnSegment {
    pub kind: SegmentKind,
    /// Alignment columns covered; empty for [`SegmentKind::GapOnAnchor`].
    pub aln_range: SeqRange,
    /// Row coordinates covered; empty for [`SegmentKind::GapOnRow`].
    pub row_range: SeqRange,
    /// The row runs against the alignment in this segment.
    pub reversed: bool,
}

impl AlnSegment {
    pub fn is_aligned(&self) -> bool {
        self.kind == SegmentKind::Aligned
    }

    pub fn is_gap(&self) -> bool {
        self.kind != SegmentKind::Aligned
    }
}

/// Lazy cursor over the segments of one row intersected with a window.
///
/// Iteration has no side effects; `restart` or `clone` give an independent
/// pass over the same segments.
#[derive(Debug, Clone)]
pub struct SparseSegmentIter<'a> {
    coll: &'a PairwiseAln,
    window: SeqRange,
    filter: SegmentFilter,
    start_idx: usize,
    pos: i64,
    idx: usize,
    pending_insert: Option<AlnSegment>,
}

impl<'a> SparseSegmentIter<'a> {
    pub fn new(coll: &'a PairwiseAln, window: SeqRange, filter: SegmentFilter) -> Self {
        let start_idx = coll
            .ranges()
            .partition_point(|rg| rg.first_to_open() <= window.from());
        Self {
            coll,
            window,
            filter,
            start_idx,
            pos: window.from(),
            idx: start_idx,
            pending_insert: None,
        }
    }

    pub fn window(&self) -> SeqRange {
        self.window
    }

    pub fn restart(&mut self) {
        self.pos = self.window.from();
        self.idx = self.start_idx;
        self.pending_insert = None;
    }

    /// Row position next to a hole, used to anchor the empty row range.
    fn row_pos_near(prev: Option<&AlignRange>, next: Option<&AlignRange>) -> i64 {
        match (prev, next) {
            (Some(rg), _) if rg.is_direct() => rg.second_to_open(),
            (Some(rg), _) => rg.second_from(),
            (None, Some(rg)) if rg.is_direct() => rg.second_from(),
            (None, Some(rg)) => rg.second_to_open(),
            (None, None) => 0,
        }
    }

    /// Row residues skipped between two ranges that touch on the alignment.
    fn insert_between(prev: &AlignRange, next: &AlignRange) -> Option<SeqRange> {
        if next.first_from() != prev.first_to_open() || next.is_direct() != prev.is_direct() {
            return None;
        }
        let gap = if prev.is_direct() {
            SeqRange::new(prev.second_to_open(), next.second_from())
        } else {
            SeqRange::new(next.second_to_open(), prev.second_from())
        };
        (!gap.is_empty()).then_some(gap)
    }

    fn next_unfiltered(&mut self) -> Option<AlnSegment> {
        if let Some(seg) = self.pending_insert.take() {
            return Some(seg);
        }
        if self.pos >= self.window.to_open() {
            return None;
        }

        let coll = self.coll;
        let ranges = coll.ranges();
        match ranges.get(self.idx) {
            Some(rg) if rg.first_from() <= self.pos => {
                let end = rg.first_to_open().min(self.window.to_open());
                let seg = AlnSegment {
                    kind: SegmentKind::Aligned,
                    aln_range: SeqRange::new(self.pos, end),
                    row_range: rg.second_range_for(self.pos, end),
                    reversed: rg.is_reversed(),
                };
                self.pos = end;
                if end == rg.first_to_open() {
                    if end < self.window.to_open() {
                        self.pending_insert = ranges
                            .get(self.idx + 1)
                            .and_then(|next| Self::insert_between(rg, next))
                            .map(|row_range| AlnSegment {
                                kind: SegmentKind::GapOnAnchor,
                                aln_range: SeqRange::new(end, end),
                                row_range,
                                reversed: rg.is_reversed(),
                            });
                    }
                    self.idx += 1;
                }
                Some(seg)
            }
            next => {
                let end = next
                    .map_or(self.window.to_open(), |rg| rg.first_from())
                    .min(self.window.to_open());
                let prev = self.idx.checked_sub(1).and_then(|i| ranges.get(i));
                let row_pos = Self::row_pos_near(prev, next);
                let seg = AlnSegment {
                    kind: SegmentKind::GapOnRow,
                    aln_range: SeqRange::new(self.pos, end),
                    row_range: SeqRange::new(row_pos, row_pos),
                    reversed: coll.is_reversed(),
                };
                self.pos = end;
                Some(seg)
            }
        }
    }
}

impl Iterator for SparseSegmentIter<'_> {
    type Item = AlnSegment;

    fn next(&mut self) -> Option<AlnSegment> {
        while let Some(seg) = self.next_unfiltered() {
            if self.filter.accepts(&seg) {
                return Some(seg);
            }
        }
        None
    }
}
