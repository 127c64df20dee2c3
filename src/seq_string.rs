//! Residue extraction in row and alignment coordinates.
//!
//! Width-3 rows are stored in nucleotide-equivalent units, so their ranges
//! are divided by 3 here and partial codons at segment edges are dropped,
//! unless the next segment carries on with the same codon.

use crate::error::AlnError;
use crate::range::SeqRange;
use crate::segment::SegmentFilter;
use crate::sequence_index::{Molecule, SequenceProvider};
use crate::sparse_aln::SparseAln;
use crate::translation::translate_na_to_aa;

/// Clip a width-3 segment's row range to whole codons and return it in
/// residue coordinates. A codon left open by the previous segment is kept.
fn trim_codons(
    row_range: SeqRange,
    direct: bool,
    split_codon_pos: &mut Option<i64>,
    off: &mut i64,
    trim_from: &mut i64,
    trim_to: &mut i64,
    is_first_seg: bool,
) -> SeqRange {
    let mut tr_from = row_range.from();
    let mut tr_to = row_range.to_open();
    if direct {
        let head = tr_from % 3;
        if head > 0 {
            if *split_codon_pos == Some(tr_from) {
                // Keep the codon started by the previous segment.
                if is_first_seg {
                    *trim_from = head;
                }
                *off -= head;
                tr_from -= head;
            } else {
                *off += 3 - head;
                tr_from += 3 - head;
            }
        }
        let tail = tr_to % 3;
        if tail > 0 {
            *split_codon_pos = Some(tr_to);
            *trim_to = tail;
            tr_to -= tail;
        }
    } else {
        let head = tr_to % 3;
        if head > 0 {
            if *split_codon_pos == Some(tr_to) {
                if is_first_seg {
                    *trim_from = 3 - head;
                }
                *off -= 3 - head;
                tr_to += 3 - head;
            } else {
                *off += head;
                tr_to -= head;
            }
        }
        let tail = tr_from % 3;
        if tail > 0 {
            *split_codon_pos = Some(tr_from);
            *trim_to = 3 - tail;
            tr_from += 3 - tail;
        }
    }
    SeqRange::new(tr_from / 3, tr_to / 3)
}

impl SparseAln {
    /// Residues of `row` over row coordinates `range` (the whole range means
    /// the row's aligned extent), read on the row's strand.
    ///
    /// Nucleotide rows are translated when `force_translation` is set.
    /// Width-3 rows come back as residues with partial codons dropped.
    pub fn get_seq_string<P: SequenceProvider + ?Sized>(
        &self,
        row: usize,
        range: SeqRange,
        force_translation: bool,
        provider: &P,
    ) -> Result<Vec<u8>, AlnError> {
        let seq_range = if range.is_whole() {
            self.seq_range(row)
        } else {
            range
        };

        let mut tr_from = seq_range.from();
        let mut tr_to = seq_range.to_open();
        let mut translate = force_translation;
        if self.base_width(row) > 1 {
            tr_from = tr_from / 3 + i64::from(tr_from % 3 > 0);
            tr_to /= 3;
            translate = false;
        }
        if tr_to <= tr_from {
            return Ok(Vec::new());
        }

        let view = self.seq_view(row, provider)?;
        let residues = provider.fetch_residues(&view.seq_id, tr_from, tr_to, view.strand)?;
        if translate && view.molecule == Molecule::Nucleotide {
            Ok(translate_na_to_aa(&residues, view.genetic_code))
        } else {
            Ok(residues)
        }
    }

    /// Residues of `row` laid out over alignment columns `aln_range` (the
    /// whole range means the row's alignment span), with the gap character
    /// where the row has no residues.
    ///
    /// Width-3 rows, and nucleotide rows with `force_translation`, produce
    /// one residue per three columns.
    pub fn get_aln_seq_string<P: SequenceProvider + ?Sized>(
        &self,
        row: usize,
        aln_range: SeqRange,
        force_translation: bool,
        provider: &P,
    ) -> Result<Vec<u8>, AlnError> {
        let aln_range = if aln_range.is_whole() {
            self.seq_aln_range(row)
        } else {
            aln_range
        };
        if aln_range.is_empty() {
            return Ok(Vec::new());
        }

        let view = self.seq_view(row, provider)?;
        let base_width = self.base_width(row);
        let translate =
            base_width == 3 || (force_translation && view.molecule == Molecule::Nucleotide);
        let aln_len = aln_range.len();
        let buf_size = (if translate { aln_len / 3 } else { aln_len }) as usize;
        let mut buffer = vec![self.gap_char(); buf_size];

        let direct = self.is_positive_strand(row);
        let anchor_direct = self.is_anchor_direct();
        let mut split_codon_pos: Option<i64> = None;
        let mut is_first_seg = true;
        let mut trim_from = 0;
        let mut trim_to = 0;

        // Row residues between adjacent columns have no place in the buffer.
        for seg in self.segments(row, aln_range, SegmentFilter::AlignedOnly) {
            trim_to = 0;
            let mut off = seg.aln_range.from() - aln_range.from();
            let residues = if base_width == 3 {
                let prot_range = trim_codons(
                    seg.row_range,
                    direct,
                    &mut split_codon_pos,
                    &mut off,
                    &mut trim_from,
                    &mut trim_to,
                    is_first_seg,
                );
                off /= 3;
                if prot_range.is_empty() {
                    Vec::new()
                } else {
                    provider.fetch_residues(
                        &view.seq_id,
                        prot_range.from(),
                        prot_range.to_open(),
                        view.strand,
                    )?
                }
            } else {
                let na = provider.fetch_residues(
                    &view.seq_id,
                    seg.row_range.from(),
                    seg.row_range.to_open(),
                    view.strand,
                )?;
                if translate {
                    off /= 3;
                    translate_na_to_aa(&na, view.genetic_code)
                } else {
                    na
                }
            };

            let off = off.max(0) as usize;
            if off < buf_size {
                let len = (buf_size - off).min(residues.len());
                if len > 0 {
                    let start = if anchor_direct {
                        off
                    } else {
                        buf_size - off - len
                    };
                    buffer[start..start + len].copy_from_slice(&residues[..len]);
                }
            }
            is_first_seg = false;
        }

        if translate && aln_len >= trim_from + trim_to {
            buffer.truncate(((aln_len - trim_from - trim_to) / 3) as usize);
        }
        Ok(buffer)
    }
}
