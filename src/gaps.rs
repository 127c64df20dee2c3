use crate::pairwise::PairwiseAln;
use log::debug;

/// An insertion from one row, placed in the global gap order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GapRange {
    /// Anchor position before rebuilding.
    pub from: i64,
    /// Position on the row's sequence.
    pub second_from: i64,
    pub len: i64,
    pub direct: bool,
    /// Row owning the insertion.
    pub row: usize,
    /// Sum of the lengths of all gaps ordered before this one. Segments at or
    /// after `from` move right by `shift + len`.
    pub shift: i64,
}

/// Collect insertions from all rows in one globally ordered list.
///
/// Gaps are ordered by anchor position and then by row. The sort is stable so
/// that consecutive gaps of the same row at the same position keep their
/// input order.
pub fn consolidate_gaps(rows: &[PairwiseAln]) -> Vec<GapRange> {
    let mut gaps: Vec<GapRange> = Vec::with_capacity(rows.iter().map(|pw| pw.insertions().len()).sum());
    for (row, pw) in rows.iter().enumerate() {
        gaps.extend(pw.insertions().iter().map(|ins| GapRange {
            from: ins.first_from(),
            second_from: ins.second_from(),
            len: ins.len(),
            direct: ins.is_direct(),
            row,
            shift: 0,
        }));
    }

    gaps.sort_by_key(|gap| (gap.from, gap.row));

    let mut shift = 0;
    for gap in gaps.iter_mut() {
        gap.shift = shift;
        shift += gap.len;
    }

    debug!(
        "Consolidated {} gaps from {} rows, total inserted length {}",
        gaps.len(),
        rows.len(),
        shift
    );

    gaps
}
