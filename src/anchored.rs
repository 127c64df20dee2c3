//! Anchored alignment: the input to sparse alignment construction.

use crate::align_range::AlignRange;
use crate::alignment_record::AlignmentRecord;
use crate::cigar::{cigar_to_pairwise, parse_cigar};
use crate::pairwise::PairwiseAln;
use crate::paf::{read_cigar_data, ParseErr};
use crate::range::SeqRange;
use crate::seqidx::SequenceIndex;
use log::{debug, info};
use rayon::prelude::*;

/// A set of row-to-anchor alignments sharing one anchor sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct AnchoredAln {
    anchor_row: usize,
    score: i64,
    pairwise: Vec<PairwiseAln>,
}

impl AnchoredAln {
    pub fn new(anchor_row: usize, score: i64, pairwise: Vec<PairwiseAln>) -> Self {
        assert!(
            pairwise.is_empty() || anchor_row < pairwise.len(),
            "Anchor row {anchor_row} is out of range for {} rows",
            pairwise.len()
        );
        Self {
            anchor_row,
            score,
            pairwise,
        }
    }

    pub fn dim(&self) -> usize {
        self.pairwise.len()
    }

    pub fn anchor_row(&self) -> usize {
        self.anchor_row
    }

    pub fn score(&self) -> i64 {
        self.score
    }

    pub fn pairwise_alns(&self) -> &[PairwiseAln] {
        &self.pairwise
    }

    /// Build an anchored alignment from the PAF records whose target is
    /// `anchor_name`.
    ///
    /// Row 0 is the anchor aligned to itself over the union of the target
    /// spans; every selected record becomes one further row. The score is
    /// the number of aligned columns across the non-anchor rows.
    pub fn from_paf_records(
        records: &[AlignmentRecord],
        anchor_name: &str,
        seq_index: &SequenceIndex,
        alignment_file: &str,
    ) -> Result<Self, ParseErr> {
        let anchor_id = seq_index.get_id(anchor_name).ok_or_else(|| {
            ParseErr::InvalidFormat(format!(
                "Anchor sequence '{}' not found in {}",
                anchor_name, alignment_file
            ))
        })?;

        let selected: Vec<&AlignmentRecord> = records
            .iter()
            .filter(|record| record.target_id == anchor_id)
            .collect();
        if selected.is_empty() {
            return Err(ParseErr::InvalidFormat(format!(
                "No alignments with target '{}' in {}",
                anchor_name, alignment_file
            )));
        }
        debug!(
            "Selected {} of {} alignments targeting {}",
            selected.len(),
            records.len(),
            anchor_name
        );

        let rows = selected
            .par_iter()
            .map(|record| {
                let query_name = seq_index.get_name(record.query_id).ok_or_else(|| {
                    ParseErr::InvalidFormat(format!(
                        "Query id {} has no name in the sequence index",
                        record.query_id
                    ))
                })?;
                let ops = if record.data_bytes > 0 {
                    let mut buffer = vec![0u8; record.data_bytes];
                    read_cigar_data(alignment_file, record.data_offset(), &mut buffer)
                        .map_err(ParseErr::InvalidFormat)?;
                    let cigar = std::str::from_utf8(&buffer).map_err(|_| {
                        ParseErr::InvalidFormat("CIGAR is not valid UTF-8".to_string())
                    })?;
                    parse_cigar(cigar)?
                } else {
                    Vec::new()
                };
                cigar_to_pairwise(record, &ops, anchor_name, query_name)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut anchor_span = SeqRange::empty();
        for record in &selected {
            anchor_span.combine_with(&SeqRange::new(
                record.target_start as i64,
                record.target_end as i64,
            ));
        }
        let mut anchor = PairwiseAln::new(anchor_name, anchor_name);
        anchor.push(AlignRange::new(
            anchor_span.from(),
            anchor_span.from(),
            anchor_span.len(),
            true,
        ));

        let score = rows
            .iter()
            .flat_map(|pw| pw.iter())
            .map(|rg| rg.len())
            .sum();

        let mut pairwise = Vec::with_capacity(rows.len() + 1);
        pairwise.push(anchor);
        pairwise.extend(rows);

        info!(
            "Anchored {} rows on {} over {}",
            pairwise.len(),
            anchor_name,
            anchor_span
        );

        Ok(Self::new(0, score, pairwise))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paf::parse_paf;
    use std::io::{BufReader, Write};
    use tempfile::NamedTempFile;

    #[test]
    fn test_dim_and_accessors() {
        let aln = AnchoredAln::new(
            0,
            7,
            vec![PairwiseAln::new("a", "a"), PairwiseAln::new("a", "b")],
        );
        assert_eq!(aln.dim(), 2);
        assert_eq!(aln.anchor_row(), 0);
        assert_eq!(aln.score(), 7);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_anchor_row_out_of_range() {
        AnchoredAln::new(3, 0, vec![PairwiseAln::new("a", "a")]);
    }

    #[test]
    fn test_from_paf_records() {
        let paf = "q1\t50\t0\t45\t+\tchr\t100\t10\t50\t40\t45\t60\tcg:Z:20=5I20=\n\
                   q2\t50\t0\t30\t-\tchr\t100\t40\t70\t30\t30\t60\tcg:Z:30=\n\
                   q3\t50\t0\t30\t+\tother\t100\t0\t30\t30\t30\t60\tcg:Z:30=\n";
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(paf.as_bytes()).unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let mut seq_index = SequenceIndex::new();
        let records = parse_paf(BufReader::new(paf.as_bytes()), &mut seq_index).unwrap();
        let aln = AnchoredAln::from_paf_records(&records, "chr", &seq_index, &path).unwrap();

        assert_eq!(aln.dim(), 3);
        let anchor = &aln.pairwise_alns()[0];
        assert_eq!(anchor.first_range(), SeqRange::new(10, 70));
        assert_eq!(anchor.second_id(), "chr");

        let q1 = &aln.pairwise_alns()[1];
        assert_eq!(q1.second_id(), "q1");
        assert_eq!(q1.len(), 2);
        assert_eq!(q1.insertions().len(), 1);
        assert_eq!(q1.insertions()[0].first_from(), 30);

        let q2 = &aln.pairwise_alns()[2];
        assert!(q2.is_reversed());
        assert_eq!(aln.score(), 40 + 30);
    }

    #[test]
    fn test_from_paf_records_unknown_anchor() {
        let seq_index = SequenceIndex::new();
        assert!(AnchoredAln::from_paf_records(&[], "chr", &seq_index, "none.paf").is_err());
    }
}
