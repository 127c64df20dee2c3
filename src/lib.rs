// lib.rs
pub mod align_range;
pub mod alignment_record;
pub mod anchored;
pub mod cigar;
pub mod error;
pub mod faidx;
pub mod gaps;
pub mod paf;
pub mod pairwise;
pub mod range;
pub mod rebuild;
pub mod segment;
pub mod seq_string;
pub mod seqidx;
pub mod sequence_index;
pub mod sparse_aln;
pub mod translation;
