//! Re-express every row in the gapped anchor coordinate system.
//!
//! Each row is walked once, together with the global gap list. Ranges are
//! split where a gap of any row falls inside them, the row's own insertions
//! are emitted as ranges aligned to the widened anchor, and everything at or
//! after a gap moves right by that gap's cumulative shift.

use crate::align_range::AlignRange;
use crate::gaps::GapRange;
use crate::pairwise::PairwiseAln;
use rayon::prelude::*;

/// Rebuild a single row. The source collection must be valid.
pub fn rebuild_row(row: usize, src: &PairwiseAln, gaps: &[GapRange]) -> PairwiseAln {
    assert!(
        src.is_valid(),
        "Row {row} ({}) has an invalid, unsorted or overlapping range collection: {:?}",
        src.second_id(),
        src.flags()
    );

    let mut dst = PairwiseAln::with_base_widths(
        src.first_id(),
        src.second_id(),
        src.first_base_width(),
        src.second_base_width(),
    );

    let mut gap_idx = 0;
    let mut shift = 0;
    // Row coordinate where the next trailing insertion would start.
    let mut last_row_end: i64 = 0;
    let mut first_direct = true;
    let mut second_direct = true;

    for seg in src.iter() {
        let mut rg = *seg;
        first_direct = rg.is_first_direct();
        second_direct = rg.is_direct();

        while let Some(gap) = gaps.get(gap_idx).filter(|g| g.from < rg.first_to_open()) {
            if gap.from > rg.first_from() {
                // Split off the part before the gap.
                let left_len = gap.from - rg.first_from();
                let mut sub = rg;
                sub.set_len(left_len);
                sub.set_first_from(rg.first_from() + shift);
                if rg.is_direct() {
                    rg.set_second_from(rg.second_from() + left_len);
                } else {
                    sub.set_second_from(rg.second_to_open() - left_len);
                }
                rg.set_first_from(rg.first_from() + left_len);
                rg.set_len(rg.len() - left_len);
                dst.push(sub);
            }
            if gap.row == row {
                let mut ins = AlignRange::new(gap.from + shift, gap.second_from, gap.len, gap.direct);
                // Orientation follows the surrounding segment, not the gap record.
                ins.set_first_direct(first_direct);
                ins.set_direct(second_direct);
                dst.push(ins);
            }
            shift = gap.shift + gap.len;
            gap_idx += 1;
        }

        rg.set_first_from(rg.first_from() + shift);
        dst.push(rg);
        last_row_end = if rg.is_direct() {
            rg.second_to_open()
        } else {
            rg.second_from()
        };
    }

    for gap in &gaps[gap_idx..] {
        if gap.row == row {
            let second_from = if second_direct {
                last_row_end
            } else {
                last_row_end - gap.len
            };
            let mut ins = AlignRange::new(gap.from + shift, second_from, gap.len, second_direct);
            ins.set_first_direct(first_direct);
            dst.push(ins);
            last_row_end = if second_direct {
                last_row_end + gap.len
            } else {
                second_from
            };
        }
        shift = gap.shift + gap.len;
    }

    dst
}

/// Rebuild all rows against the same consolidated gap list.
pub fn rebuild_rows(rows: &[PairwiseAln], gaps: &[GapRange]) -> Vec<PairwiseAln> {
    rows.par_iter()
        .enumerate()
        .map(|(row, pw)| rebuild_row(row, pw, gaps))
        .collect()
}
