//! Sparse alignment: N row-to-anchor alignments merged into one gapped
//! coordinate system.
//!
//! Construction collects every row's insertions into a single ordered gap
//! list and re-expresses each row against the widened anchor. After that the
//! alignment is read-only; the only mutable state is the per-row cache of
//! resolved sequences, which sits behind a lock.

use crate::alignment_record::Strand;
use crate::anchored::AnchoredAln;
use crate::error::AlnError;
use crate::gaps::consolidate_gaps;
use crate::pairwise::{PairwiseAln, SearchDirection, SecondIndex};
use crate::range::SeqRange;
use crate::rebuild::rebuild_rows;
use crate::segment::{SegmentFilter, SparseSegmentIter};
use crate::sequence_index::{Molecule, SequenceProvider};
use crate::translation::DEFAULT_GENETIC_CODE;
use log::{debug, info};
use rustc_hash::FxHashMap;
use std::sync::{Arc, RwLock};

pub const DEFAULT_GAP_CHAR: u8 = b'-';

/// A row's sequence as resolved through a [`SequenceProvider`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeqView {
    pub seq_id: String,
    pub length: usize,
    pub molecule: Molecule,
    /// Strand the row is read on relative to the alignment.
    pub strand: Strand,
    pub genetic_code: u8,
}

type SeqViewMap = FxHashMap<usize, Arc<SeqView>>;

pub struct SparseAln {
    aln: AnchoredAln,
    aln_range: SeqRange,
    seq_ranges: Vec<SeqRange>,
    second_indexes: Vec<SecondIndex>,
    anchor_direct: bool,
    gap_char: u8,
    seq_views: RwLock<SeqViewMap>,
}

/// Merge `pairwise` (row `anchor_row` being the anchor itself) into a sparse
/// alignment.
pub fn build_sparse_alignment(anchor_row: usize, pairwise: Vec<PairwiseAln>) -> SparseAln {
    SparseAln::new(&AnchoredAln::new(anchor_row, 0, pairwise))
}

impl SparseAln {
    /// Build from an anchored alignment. Every row must hold a valid range
    /// collection; anything else panics.
    pub fn new(aln: &AnchoredAln) -> Self {
        let rows = aln.pairwise_alns();
        let gaps = consolidate_gaps(rows);
        let rebuilt = rebuild_rows(rows, &gaps);

        let mut aln_range = SeqRange::empty();
        let mut seq_ranges = Vec::with_capacity(rebuilt.len());
        let mut second_indexes = Vec::with_capacity(rebuilt.len());
        for (row, pw) in rebuilt.iter().enumerate() {
            assert!(
                pw.is_valid(),
                "Rebuilt row {row} ({}) is not a valid range collection: {:?}",
                pw.second_id(),
                pw.flags()
            );
            aln_range.combine_with(&pw.first_range());
            let index = SecondIndex::new(pw);
            seq_ranges.push(index.second_range());
            second_indexes.push(index);
        }

        let anchor_direct = rebuilt
            .get(aln.anchor_row())
            .and_then(|pw| pw.ranges().first())
            .map_or(true, |rg| rg.is_first_direct());

        info!(
            "Built sparse alignment of {} rows with {} gaps over {}",
            rebuilt.len(),
            gaps.len(),
            aln_range
        );

        Self {
            aln: AnchoredAln::new(aln.anchor_row(), aln.score(), rebuilt),
            aln_range,
            seq_ranges,
            second_indexes,
            anchor_direct,
            gap_char: DEFAULT_GAP_CHAR,
            seq_views: RwLock::new(SeqViewMap::default()),
        }
    }

    fn row(&self, row: usize) -> &PairwiseAln {
        assert!(
            row < self.dim(),
            "Row {row} is out of range for an alignment of {} rows",
            self.dim()
        );
        &self.aln.pairwise_alns()[row]
    }

    pub fn dim(&self) -> usize {
        self.aln.dim()
    }

    pub fn anchor_row(&self) -> usize {
        self.aln.anchor_row()
    }

    pub fn score(&self) -> i64 {
        self.aln.score()
    }

    /// Union of all rows' alignment spans.
    pub fn aln_range(&self) -> SeqRange {
        self.aln_range
    }

    pub fn set_gap_char(&mut self, gap_char: u8) {
        self.gap_char = gap_char;
    }

    pub fn gap_char(&self) -> u8 {
        self.gap_char
    }

    /// The anchor's first segment runs on its plus strand.
    pub fn is_anchor_direct(&self) -> bool {
        self.anchor_direct
    }

    /// The rebuilt collection of `row` in alignment coordinates.
    pub fn align_collection(&self, row: usize) -> &PairwiseAln {
        self.row(row)
    }

    pub fn seq_id(&self, row: usize) -> &str {
        self.row(row).second_id()
    }

    /// Row coordinates covered by the alignment. Width-3 rows report
    /// nucleotide-equivalent units.
    pub fn seq_range(&self, row: usize) -> SeqRange {
        self.row(row);
        self.seq_ranges[row]
    }

    pub fn seq_start(&self, row: usize) -> i64 {
        self.seq_range(row).from()
    }

    pub fn seq_stop(&self, row: usize) -> i64 {
        self.seq_range(row).to()
    }

    /// Alignment columns spanned by `row`, holes included.
    pub fn seq_aln_range(&self, row: usize) -> SeqRange {
        self.row(row).first_range()
    }

    pub fn seq_aln_start(&self, row: usize) -> i64 {
        self.seq_aln_range(row).from()
    }

    pub fn seq_aln_stop(&self, row: usize) -> i64 {
        self.seq_aln_range(row).to()
    }

    pub fn base_width(&self, row: usize) -> i32 {
        self.row(row).second_base_width()
    }

    /// Any row with a base width other than 1, or widths that differ
    /// between rows or between a row's two sides.
    pub fn is_translated(&self) -> bool {
        let mut base_width = None;
        for pw in self.aln.pairwise_alns() {
            let width = *base_width.get_or_insert(pw.first_base_width());
            if width != pw.first_base_width() || width != pw.second_base_width() || width != 1 {
                return true;
            }
        }
        false
    }

    /// The row reads in the same direction as the anchor. Rows with ranges
    /// on both strands have no strand and panic here.
    pub fn is_positive_strand(&self, row: usize) -> bool {
        let pw = self.row(row);
        assert!(
            !pw.is_mixed_dir(),
            "Row {row} ({}) has ranges on both strands",
            pw.second_id()
        );
        !pw.is_reversed() == self.anchor_direct
    }

    pub fn is_negative_strand(&self, row: usize) -> bool {
        !self.is_positive_strand(row)
    }

    /// Alignment column of row position `seq_pos`. With `try_reverse` an
    /// unsuccessful search is retried in the opposite direction.
    pub fn aln_pos_from_seq_pos(
        &self,
        row: usize,
        seq_pos: i64,
        dir: SearchDirection,
        try_reverse: bool,
    ) -> Option<i64> {
        let pw = self.row(row);
        let index = &self.second_indexes[row];
        index
            .first_pos_by_second_pos(pw, seq_pos, dir)
            .or_else(|| {
                try_reverse
                    .then(|| index.first_pos_by_second_pos(pw, seq_pos, dir.opposite()))
                    .flatten()
            })
    }

    /// Row position at alignment column `aln_pos`.
    pub fn seq_pos_from_aln_pos(
        &self,
        row: usize,
        aln_pos: i64,
        dir: SearchDirection,
        try_reverse: bool,
    ) -> Option<i64> {
        let pw = self.row(row);
        pw.second_pos_by_first_pos(aln_pos, dir).or_else(|| {
            try_reverse
                .then(|| pw.second_pos_by_first_pos(aln_pos, dir.opposite()))
                .flatten()
        })
    }

    /// Segments of `row` within `range`; the whole range means the whole
    /// alignment.
    pub fn segments(&self, row: usize, range: SeqRange, filter: SegmentFilter) -> SparseSegmentIter<'_> {
        let window = if range.is_whole() {
            self.aln_range
        } else {
            range
        };
        SparseSegmentIter::new(self.row(row), window, filter)
    }

    /// Resolve `row`'s sequence through `provider`, caching the result.
    ///
    /// The cache assumes the same provider is passed on every call.
    pub fn seq_view<P: SequenceProvider + ?Sized>(
        &self,
        row: usize,
        provider: &P,
    ) -> Result<Arc<SeqView>, AlnError> {
        if let Some(view) = self.seq_views.read().unwrap().get(&row) {
            return Ok(Arc::clone(view));
        }

        let seq_id = self.seq_id(row);
        let info = provider
            .sequence_info(seq_id)
            .ok_or_else(|| AlnError::SequenceNotFound {
                row,
                seq_id: seq_id.to_string(),
            })?;
        let strand = if self.is_positive_strand(row) {
            Strand::Forward
        } else {
            Strand::Reverse
        };
        let view = Arc::new(SeqView {
            seq_id: seq_id.to_string(),
            length: info.length,
            molecule: info.molecule,
            strand,
            genetic_code: provider.genetic_code(seq_id).unwrap_or(DEFAULT_GENETIC_CODE),
        });
        debug!(
            "Resolved row {} as {} ({} residues, {:?}, {:?})",
            row, view.seq_id, view.length, view.molecule, view.strand
        );

        self.seq_views
            .write()
            .unwrap()
            .insert(row, Arc::clone(&view));
        Ok(view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align_range::AlignRange;
    use crate::sequence_index::MemorySequenceIndex;

    fn row(id: &str, ranges: &[(i64, i64, i64, bool)], insertions: &[(i64, i64, i64)]) -> PairwiseAln {
        let mut pw = PairwiseAln::new("anchor", id);
        for &(first, second, len, direct) in ranges {
            pw.push(AlignRange::new(first, second, len, direct));
        }
        for &(first, second, len) in insertions {
            pw.add_insertion(AlignRange::new(first, second, len, true));
        }
        pw
    }

    /// Anchor plus row A (5bp insertion at 40) and row B (no insertions).
    fn two_row_example() -> SparseAln {
        build_sparse_alignment(
            0,
            vec![
                row("anchor", &[(0, 0, 100, true)], &[]),
                row("A", &[(0, 0, 40, true), (40, 45, 60, true)], &[(40, 40, 5)]),
                row("B", &[(0, 0, 100, true)], &[]),
            ],
        )
    }

    #[test]
    fn test_aln_range_includes_insertion() {
        let aln = two_row_example();
        assert_eq!(aln.dim(), 3);
        assert_eq!(aln.aln_range().from(), 0);
        assert_eq!(aln.aln_range().to(), 104);
        assert_eq!(aln.seq_range(1), SeqRange::new(0, 105));
        assert_eq!(aln.seq_range(2), SeqRange::new(0, 100));
        assert_eq!(aln.seq_aln_start(2), 0);
        assert_eq!(aln.seq_aln_stop(2), 104);
    }

    #[test]
    fn test_position_mapping() {
        let aln = two_row_example();
        // Row A residue 45 follows its own insertion.
        assert_eq!(aln.aln_pos_from_seq_pos(1, 45, SearchDirection::Right, false), Some(45));
        assert_eq!(aln.aln_pos_from_seq_pos(1, 42, SearchDirection::None, false), Some(42));
        // Row B has a hole where row A inserted.
        assert_eq!(aln.seq_pos_from_aln_pos(2, 42, SearchDirection::None, false), None);
        assert_eq!(aln.seq_pos_from_aln_pos(2, 42, SearchDirection::Right, false), Some(40));
        assert_eq!(aln.seq_pos_from_aln_pos(2, 42, SearchDirection::Left, false), Some(39));
        assert_eq!(aln.seq_pos_from_aln_pos(2, 50, SearchDirection::None, false), Some(45));
    }

    #[test]
    fn test_try_reverse() {
        let aln = build_sparse_alignment(
            0,
            vec![row("anchor", &[(0, 0, 20, true)], &[]), row("r", &[(0, 0, 10, true)], &[])],
        );
        assert_eq!(aln.seq_pos_from_aln_pos(1, 15, SearchDirection::Right, false), None);
        assert_eq!(aln.seq_pos_from_aln_pos(1, 15, SearchDirection::Right, true), Some(9));
        assert_eq!(aln.aln_pos_from_seq_pos(1, 12, SearchDirection::Forward, true), Some(9));
    }

    #[test]
    fn test_strands() {
        let aln = build_sparse_alignment(
            0,
            vec![
                row("anchor", &[(0, 0, 20, true)], &[]),
                row("fwd", &[(0, 0, 20, true)], &[]),
                row("rev", &[(0, 0, 20, false)], &[]),
                row("empty", &[], &[]),
            ],
        );
        assert!(aln.is_positive_strand(1));
        assert!(aln.is_negative_strand(2));
        assert!(aln.is_positive_strand(3));
        assert!(!aln.is_translated());
    }

    #[test]
    #[should_panic(expected = "both strands")]
    fn test_mixed_direction_row_panics() {
        let aln = build_sparse_alignment(
            0,
            vec![row("m", &[(0, 0, 10, true), (10, 20, 10, false)], &[])],
        );
        aln.is_positive_strand(0);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_row_out_of_range_panics() {
        two_row_example().seq_id(7);
    }

    #[test]
    fn test_translated_widths() {
        let mut prot = PairwiseAln::with_base_widths("anchor", "p", 1, 3);
        prot.push(AlignRange::new(0, 0, 30, true));
        let aln = build_sparse_alignment(0, vec![row("anchor", &[(0, 0, 30, true)], &[]), prot]);
        assert!(aln.is_translated());
        assert_eq!(aln.base_width(1), 3);
    }

    #[test]
    fn test_seq_view_cache_and_missing_sequence() {
        let aln = two_row_example();
        let mut provider = MemorySequenceIndex::new();
        provider.insert("A", &[b'A'; 105], Molecule::Nucleotide);
        provider.set_genetic_code("A", 11);

        let view = aln.seq_view(1, &provider).unwrap();
        assert_eq!(view.genetic_code, 11);
        assert_eq!(view.strand, Strand::Forward);
        assert!(Arc::ptr_eq(&view, &aln.seq_view(1, &provider).unwrap()));

        match aln.seq_view(2, &provider) {
            Err(AlnError::SequenceNotFound { row, seq_id }) => {
                assert_eq!(row, 2);
                assert_eq!(seq_id, "B");
            }
            other => panic!("Expected SequenceNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_score_and_gap_char() {
        let mut aln = SparseAln::new(&AnchoredAln::new(
            0,
            42,
            vec![row("anchor", &[(0, 0, 10, true)], &[])],
        ));
        assert_eq!(aln.score(), 42);
        assert_eq!(aln.gap_char(), b'-');
        aln.set_gap_char(b'.');
        assert_eq!(aln.gap_char(), b'.');
    }

    #[test]
    fn test_sparse_aln_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SparseAln>();
    }
}
