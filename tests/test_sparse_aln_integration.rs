//! End-to-end checks of sparse alignment construction and queries through the
//! public library API.
//!
//! These tests verify:
//! 1. Insertions widen the alignment and shift later columns on every row
//! 2. Simultaneous insertions on different rows are both kept, in row order
//! 3. Rebuilt rows are sorted, non-overlapping and lose no residues
//! 4. Row/alignment position mapping round-trips on direct and reversed rows
//! 5. Rebuilding an already rebuilt alignment changes nothing
//! 6. Residue extraction follows strands, gaps and translation

use rayon::prelude::*;
use sparsealn::align_range::AlignRange;
use sparsealn::error::AlnError;
use sparsealn::gaps::consolidate_gaps;
use sparsealn::pairwise::{PairwiseAln, SearchDirection};
use sparsealn::range::SeqRange;
use sparsealn::segment::{SegmentFilter, SegmentKind};
use sparsealn::sequence_index::{Molecule, MemorySequenceIndex};
use sparsealn::sparse_aln::{build_sparse_alignment, SparseAln};
use sparsealn::translation::translate_na_to_aa;

fn row(
    id: &str,
    ranges: &[(i64, i64, i64, bool)],
    insertions: &[(i64, i64, i64, bool)],
) -> PairwiseAln {
    let mut pw = PairwiseAln::new("anchor", id);
    for &(first, second, len, direct) in ranges {
        pw.push(AlignRange::new(first, second, len, direct));
    }
    for &(first, second, len, direct) in insertions {
        pw.add_insertion(AlignRange::new(first, second, len, direct));
    }
    pw
}

/// Anchor of 30, a direct row with a 3bp insertion at 10 and a reversed row
/// with a deletion at 10..12 and a 2bp insertion at 20.
fn mixed_rows() -> Vec<PairwiseAln> {
    vec![
        row("anchor", &[(0, 0, 30, true)], &[]),
        row(
            "direct",
            &[(0, 0, 10, true), (10, 13, 20, true)],
            &[(10, 10, 3, true)],
        ),
        row(
            "reversed",
            &[(0, 22, 10, false), (12, 12, 8, false), (20, 0, 10, false)],
            &[(20, 10, 2, false)],
        ),
    ]
}

fn total_len(ranges: &[AlignRange]) -> i64 {
    ranges.iter().map(|rg| rg.len()).sum()
}

#[test]
fn test_single_insertion_widens_alignment() {
    let aln = build_sparse_alignment(
        0,
        vec![
            row("anchor", &[(0, 0, 100, true)], &[]),
            row("A", &[(0, 0, 40, true), (40, 45, 60, true)], &[(40, 40, 5, true)]),
            row("B", &[(0, 0, 100, true)], &[]),
        ],
    );

    assert_eq!(aln.aln_range().from(), 0);
    assert_eq!(aln.aln_range().to(), 104);

    let pos = aln
        .aln_pos_from_seq_pos(1, 45, SearchDirection::Right, false)
        .unwrap();
    assert!(pos >= 45);

    // Row B's residue 40 follows the 5 columns inserted by row A.
    assert_eq!(
        aln.aln_pos_from_seq_pos(2, 40, SearchDirection::None, false),
        Some(45)
    );
    let gaps: Vec<_> = aln
        .segments(2, SeqRange::whole(), SegmentFilter::All)
        .filter(|seg| seg.kind == SegmentKind::GapOnRow)
        .map(|seg| seg.aln_range)
        .collect();
    assert_eq!(gaps, vec![SeqRange::new(40, 45)]);
}

#[test]
fn test_simultaneous_gaps_keep_row_order() {
    let rows = vec![
        row("r0", &[(0, 0, 10, true), (10, 13, 10, true)], &[(10, 10, 3, true)]),
        row("r1", &[(0, 0, 10, true), (10, 12, 10, true)], &[(10, 10, 2, true)]),
    ];
    let gaps = consolidate_gaps(&rows);
    assert_eq!(gaps.len(), 2);
    assert_eq!((gaps[0].row, gaps[0].shift), (0, 0));
    assert_eq!((gaps[1].row, gaps[1].shift), (1, 3));

    let aln = build_sparse_alignment(0, rows);
    assert_eq!(aln.aln_range(), SeqRange::new(0, 25));
    // r0's insertion takes columns 10..13, r1's takes 13..15.
    assert_eq!(aln.aln_pos_from_seq_pos(0, 10, SearchDirection::None, false), Some(10));
    assert_eq!(aln.aln_pos_from_seq_pos(1, 10, SearchDirection::None, false), Some(13));
    assert_eq!(aln.aln_pos_from_seq_pos(0, 13, SearchDirection::None, false), Some(15));
    assert_eq!(aln.aln_pos_from_seq_pos(1, 12, SearchDirection::None, false), Some(15));
}

#[test]
fn test_rebuilt_rows_are_valid_and_lose_nothing() {
    let rows = mixed_rows();
    let aln = build_sparse_alignment(0, rows.clone());

    for (idx, src) in rows.iter().enumerate() {
        let rebuilt = aln.align_collection(idx);
        assert!(rebuilt.is_valid(), "row {} is not valid", idx);
        assert!(rebuilt.insertions().is_empty());
        assert_eq!(
            total_len(rebuilt.ranges()),
            total_len(src.ranges()) + total_len(src.insertions()),
            "row {} changed its residue count",
            idx
        );
        for pair in rebuilt.ranges().windows(2) {
            assert!(pair[0].first_to_open() <= pair[1].first_from());
        }
    }

    // Segments tile any window exactly.
    for idx in 0..aln.dim() {
        let window = SeqRange::new(-3, aln.aln_range().to_open() + 3);
        let mut pos = window.from();
        for seg in aln.segments(idx, window, SegmentFilter::All) {
            assert_eq!(seg.aln_range.from(), pos);
            pos = seg.aln_range.to_open();
        }
        assert_eq!(pos, window.to_open());
    }
}

#[test]
fn test_reversed_row_layout() {
    let aln = build_sparse_alignment(0, mixed_rows());
    assert_eq!(aln.aln_range(), SeqRange::new(0, 35));
    assert!(aln.is_negative_strand(2));

    let spans: Vec<_> = aln
        .align_collection(2)
        .iter()
        .map(|rg| (rg.first_from(), rg.second_from(), rg.len()))
        .collect();
    assert_eq!(spans, vec![(0, 22, 10), (15, 12, 8), (23, 10, 2), (25, 0, 10)]);

    // Row coordinates run down as alignment columns go up.
    assert_eq!(aln.seq_pos_from_aln_pos(2, 22, SearchDirection::None, false), Some(12));
    assert_eq!(aln.seq_pos_from_aln_pos(2, 23, SearchDirection::None, false), Some(11));
    assert_eq!(aln.seq_pos_from_aln_pos(2, 25, SearchDirection::None, false), Some(9));
    // Residues 20 and 21 are not aligned; Forward follows the row upwards.
    assert_eq!(aln.aln_pos_from_seq_pos(2, 20, SearchDirection::Forward, false), Some(9));
    assert_eq!(aln.aln_pos_from_seq_pos(2, 20, SearchDirection::Backwards, false), Some(15));
}

#[test]
fn test_position_round_trip() {
    // The reversed row has a hole at columns 10..15 and unaligned residues
    // 20 and 21.
    let aln = build_sparse_alignment(0, mixed_rows());
    let mut checked = 0;
    for idx in 0..aln.dim() {
        let seq_range = aln.seq_range(idx);
        for seq_pos in seq_range.from()..seq_range.to_open() {
            if aln
                .aln_pos_from_seq_pos(idx, seq_pos, SearchDirection::None, false)
                .is_none()
            {
                assert_eq!(idx, 2, "row {} position {} is unaligned", idx, seq_pos);
                continue;
            }
            let aln_pos = aln
                .aln_pos_from_seq_pos(idx, seq_pos, SearchDirection::Right, false)
                .unwrap();
            assert_eq!(
                aln.seq_pos_from_aln_pos(idx, aln_pos, SearchDirection::Right, false),
                Some(seq_pos),
                "row {} position {} did not round-trip",
                idx,
                seq_pos
            );
            checked += 1;
        }
    }
    // 30 + 33 + 30 aligned residues.
    assert_eq!(checked, 93);
}

#[test]
fn test_rebuild_is_idempotent() {
    let first = build_sparse_alignment(0, mixed_rows());
    let again = build_sparse_alignment(
        0,
        (0..first.dim())
            .map(|idx| first.align_collection(idx).clone())
            .collect(),
    );
    assert_eq!(first.aln_range(), again.aln_range());
    for idx in 0..first.dim() {
        assert_eq!(first.align_collection(idx), again.align_collection(idx));
        assert_eq!(first.seq_range(idx), again.seq_range(idx));
    }
}

#[test]
fn test_trailing_insertion_on_empty_row() {
    let aln = build_sparse_alignment(
        0,
        vec![
            row("anchor", &[(0, 0, 5, true)], &[]),
            row("empty", &[], &[(5, 0, 3, true)]),
        ],
    );
    assert_eq!(aln.aln_range(), SeqRange::new(0, 8));
    let spans: Vec<_> = aln
        .align_collection(1)
        .iter()
        .map(|rg| (rg.first_from(), rg.second_from(), rg.len()))
        .collect();
    assert_eq!(spans, vec![(5, 0, 3)]);
}

fn provider() -> MemorySequenceIndex {
    let mut provider = MemorySequenceIndex::new();
    provider.insert("anchor", b"AAAACCCCGG", Molecule::Nucleotide);
    provider.insert("rc", b"CCGGGGTTTT", Molecule::Nucleotide);
    provider.insert("orf", b"ATGTGGTAA", Molecule::Nucleotide);
    provider
}

#[test]
fn test_aln_seq_string_reversed_row() {
    let aln = build_sparse_alignment(
        0,
        vec![
            row("anchor", &[(0, 0, 10, true)], &[]),
            row("rc", &[(0, 0, 10, false)], &[]),
        ],
    );
    assert_eq!(
        aln.get_aln_seq_string(1, SeqRange::whole(), false, &provider())
            .unwrap(),
        b"AAAACCCCGG".to_vec()
    );
    assert_eq!(
        aln.get_seq_string(1, SeqRange::new(0, 2), false, &provider())
            .unwrap(),
        b"GG".to_vec()
    );
}

#[test]
fn test_translation_through_alignment() {
    let aln = build_sparse_alignment(
        0,
        vec![
            row("anchor", &[(0, 0, 9, true)], &[]),
            row("orf", &[(0, 0, 9, true)], &[]),
        ],
    );
    assert_eq!(
        aln.get_aln_seq_string(1, SeqRange::whole(), true, &provider())
            .unwrap(),
        b"MW*".to_vec()
    );
    assert_eq!(translate_na_to_aa(b"ATGTG", 1), b"M\\".to_vec());
}

#[test]
fn test_unknown_sequence() {
    let aln = build_sparse_alignment(
        0,
        vec![
            row("anchor", &[(0, 0, 10, true)], &[]),
            row("elsewhere", &[(0, 0, 10, true)], &[]),
        ],
    );
    let err = aln
        .get_aln_seq_string(1, SeqRange::whole(), false, &provider())
        .unwrap_err();
    assert!(matches!(err, AlnError::SequenceNotFound { row: 1, .. }));
    assert!(err.to_string().contains("elsewhere"));
}

#[test]
fn test_concurrent_queries_match_sequential() {
    let aln: SparseAln = build_sparse_alignment(
        0,
        vec![
            row("anchor", &[(0, 0, 10, true)], &[]),
            row("rc", &[(0, 6, 4, false), (6, 0, 4, false)], &[]),
            row("anchor", &[(2, 2, 8, true)], &[]),
        ],
    );
    let provider = provider();
    let sequential: Vec<_> = (0..aln.dim())
        .map(|idx| {
            aln.get_aln_seq_string(idx, SeqRange::new(0, 10), false, &provider)
                .unwrap()
        })
        .collect();
    let parallel: Vec<_> = (0..aln.dim())
        .into_par_iter()
        .map(|idx| {
            aln.get_aln_seq_string(idx, SeqRange::new(0, 10), false, &provider)
                .unwrap()
        })
        .collect();
    assert_eq!(sequential, parallel);
    assert_eq!(sequential[2], b"--AACCCCGG".to_vec());
}
