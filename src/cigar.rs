//! CIGAR operations and their conversion into row-to-anchor range collections.
//!
//! The PAF target is the anchor (first) sequence and the query is the row
//! (second) sequence. Reverse-strand queries are walked from `query_end`
//! downwards so every emitted range is reversed on the row.

use crate::align_range::AlignRange;
use crate::alignment_record::{AlignmentRecord, Strand};
use crate::pairwise::PairwiseAln;
use crate::paf::ParseErr;

// Note that the query_delta is negative for reverse strand alignments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CigarOp {
    val: u32,
}

impl CigarOp {
    const LEN_MASK: u32 = (1 << 29) - 1;

    pub fn new(len: i64, op: char) -> Self {
        let val = match op {
            '=' => 0,
            'X' => 1,
            'I' => 2,
            'D' => 3,
            'M' => 4,
            _ => panic!("Invalid CIGAR operation: {op}"),
        };
        Self {
            val: (val << 29) | (len as u32 & Self::LEN_MASK),
        }
    }

    pub fn op(&self) -> char {
        // three most significant bits hold the op
        match self.val >> 29 {
            0 => '=',
            1 => 'X',
            2 => 'I',
            3 => 'D',
            4 => 'M',
            _ => panic!("Invalid CIGAR operation: {}", self.val >> 29),
        }
    }

    pub fn len(&self) -> i64 {
        (self.val & Self::LEN_MASK) as i64
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_match(&self) -> bool {
        matches!(self.op(), '=' | 'X' | 'M')
    }

    pub fn target_delta(&self) -> i64 {
        match self.op() {
            '=' | 'X' | 'D' | 'M' => self.len(),
            _ => 0,
        }
    }

    pub fn query_delta(&self, strand: Strand) -> i64 {
        match self.op() {
            '=' | 'X' | 'I' | 'M' => match strand {
                Strand::Forward => self.len(),
                Strand::Reverse => -self.len(),
            },
            _ => 0,
        }
    }
}

pub fn parse_cigar(cigar: &str) -> Result<Vec<CigarOp>, ParseErr> {
    let mut ops = Vec::new();
    let mut len: i64 = 0;
    let mut have_len = false;

    for c in cigar.chars() {
        if let Some(digit) = c.to_digit(10) {
            len = len * 10 + digit as i64;
            have_len = true;
            if len > CigarOp::LEN_MASK as i64 {
                return Err(ParseErr::InvalidCigarFormat);
            }
        } else {
            if !have_len {
                return Err(ParseErr::InvalidCigarFormat);
            }
            match c {
                '=' | 'X' | 'I' | 'D' | 'M' => ops.push(CigarOp::new(len, c)),
                _ => return Err(ParseErr::UnsupportedCigarOperation(c)),
            }
            len = 0;
            have_len = false;
        }
    }
    if have_len {
        return Err(ParseErr::InvalidCigarFormat);
    }

    Ok(ops)
}

/// Convert one alignment into a collection of the query against the target.
///
/// Matches become aligned ranges (abutting ones merged), insertions become
/// row insertions at the current anchor position, deletions leave holes.
/// A record without CIGAR data is taken as one ungapped block.
pub fn cigar_to_pairwise(
    record: &AlignmentRecord,
    ops: &[CigarOp],
    target_name: &str,
    query_name: &str,
) -> Result<PairwiseAln, ParseErr> {
    let target_len = (record.target_end - record.target_start) as i64;
    let query_len = (record.query_end - record.query_start) as i64;
    let strand = record.strand();
    let direct = strand == Strand::Forward;

    let implicit;
    let ops = if ops.is_empty() && target_len > 0 {
        if target_len != query_len {
            return Err(ParseErr::InvalidFormat(format!(
                "Alignment of '{}' on '{}' has no CIGAR and unequal spans ({} vs {})",
                query_name, target_name, query_len, target_len
            )));
        }
        implicit = [CigarOp::new(target_len, 'M')];
        &implicit[..]
    } else {
        ops
    };

    let mut pw = PairwiseAln::new(target_name, query_name);
    let mut target_pos = record.target_start as i64;
    let mut query_pos = if direct {
        record.query_start as i64
    } else {
        record.query_end as i64
    };
    let mut pending: Option<AlignRange> = None;

    for op in ops.iter().filter(|op| !op.is_empty()) {
        let len = op.len();
        let next_query_pos = query_pos + op.query_delta(strand);
        let row_from = query_pos.min(next_query_pos);

        if op.is_match() {
            let rg = AlignRange::new(target_pos, row_from, len, direct);
            pending = match pending {
                Some(mut prev)
                    if prev.first_to_open() == target_pos
                        && (if direct {
                            prev.second_to_open() == row_from
                        } else {
                            prev.second_from() == query_pos
                        }) =>
                {
                    if !direct {
                        prev.set_second_from(row_from);
                    }
                    prev.set_len(prev.len() + len);
                    Some(prev)
                }
                Some(prev) => {
                    pw.push(prev);
                    Some(rg)
                }
                None => Some(rg),
            };
        } else if op.op() == 'I' {
            pw.add_insertion(AlignRange::new(target_pos, row_from, len, direct));
        }

        target_pos += op.target_delta();
        query_pos = next_query_pos;
    }
    if let Some(prev) = pending {
        pw.push(prev);
    }

    let target_consumed = target_pos - record.target_start as i64;
    let query_consumed = if direct {
        query_pos - record.query_start as i64
    } else {
        record.query_end as i64 - query_pos
    };
    if target_consumed != target_len || query_consumed != query_len {
        return Err(ParseErr::InvalidFormat(format!(
            "CIGAR of '{}' on '{}' spans {}bp of query and {}bp of target, record says {} and {}",
            query_name, target_name, query_consumed, target_consumed, query_len, target_len
        )));
    }

    Ok(pw)
}
