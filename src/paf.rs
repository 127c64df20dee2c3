//! PAF (Pairwise Alignment Format) input.
//!
//! Records are parsed without their CIGAR strings; only the offset of the
//! `cg:Z:` payload is kept and the bytes are read back on demand. Plain and
//! BGZF-compressed files are supported.

use crate::alignment_record::{AlignmentRecord, Strand};
use crate::seqidx::SequenceIndex;
use log::debug;
use noodles::bgzf;
use std::fs::File;
use std::io::{BufRead, BufReader, Error as IoError, Read, Seek, SeekFrom};
use std::num::ParseIntError;

#[derive(Debug)]
pub enum ParseErr {
    NotEnoughFields,
    IoError(IoError),
    InvalidField(ParseIntError),
    InvalidStrand,
    InvalidCigarFormat,
    UnsupportedCigarOperation(char),
    InvalidFormat(String),
}

impl std::fmt::Display for ParseErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseErr::NotEnoughFields => write!(f, "Not enough fields in PAF record"),
            ParseErr::IoError(e) => write!(f, "IO error: {}", e),
            ParseErr::InvalidField(e) => write!(f, "Invalid field: {}", e),
            ParseErr::InvalidStrand => write!(f, "Invalid strand"),
            ParseErr::InvalidCigarFormat => write!(f, "Invalid CIGAR format"),
            ParseErr::UnsupportedCigarOperation(op) => {
                write!(f, "Unsupported CIGAR operation '{}'", op)
            }
            ParseErr::InvalidFormat(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for ParseErr {}

impl From<ParseErr> for IoError {
    fn from(e: ParseErr) -> Self {
        match e {
            ParseErr::IoError(e) => e,
            other => IoError::new(std::io::ErrorKind::InvalidData, other.to_string()),
        }
    }
}

enum PafHandle {
    Plain(File),
    Compressed(bgzf::io::Reader<File>),
}

const BGZF_HEADER_SIZE: usize = 18;

fn is_compressed_path(alignment_file: &str) -> bool {
    [".gz", ".bgz"]
        .iter()
        .any(|extension| alignment_file.ends_with(extension))
}

/// Check whether a file starts with a valid BGZF header.
/// Returns `Ok(false)` for regular gzip, too-small files, or plain text.
fn is_bgzf<R: Read + Seek>(reader: &mut R) -> std::io::Result<bool> {
    let mut header = [0u8; BGZF_HEADER_SIZE];
    let result = match reader.read_exact(&mut header) {
        Ok(()) => {
            Ok(header[0..2] == [0x1f, 0x8b]      // gzip magic
                && header[2] == 0x08              // DEFLATE
                && header[3] == 0x04              // FEXTRA
                && header[10..12] == [0x06, 0x00] // XLEN=6
                && header[12..14] == [b'B', b'C'] // BC subfield
                && header[14..16] == [0x02, 0x00]) // SLEN=2
        }
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Ok(false),
        Err(e) => Err(e),
    };
    reader.seek(SeekFrom::Start(0))?;
    result
}

/// Read `buffer.len()` CIGAR bytes starting at `offset`, which is a byte
/// offset for plain files and a BGZF virtual position for compressed ones.
pub fn read_cigar_data(alignment_file: &str, offset: u64, buffer: &mut [u8]) -> Result<(), String> {
    let handle = if is_compressed_path(alignment_file) {
        let mut file = File::open(alignment_file)
            .map_err(|e| format!("Failed to open compressed file '{}': {}", alignment_file, e))?;
        if !is_bgzf(&mut file)
            .map_err(|e| format!("Failed to read header of '{}': {}", alignment_file, e))?
        {
            return Err(format!(
                "'{}' is regular gzip, not BGZF. Convert with: zcat '{}' | bgzip > output.paf.gz",
                alignment_file, alignment_file
            ));
        }
        PafHandle::Compressed(bgzf::io::Reader::new(file))
    } else {
        let file = File::open(alignment_file)
            .map_err(|e| format!("Failed to open file '{}': {}", alignment_file, e))?;
        PafHandle::Plain(file)
    };

    match handle {
        PafHandle::Compressed(mut reader) => {
            let virtual_position = bgzf::VirtualPosition::from(offset);
            reader.seek(virtual_position).map_err(|e| {
                format!(
                    "Failed to seek in compressed file '{}': {}",
                    alignment_file, e
                )
            })?;
            reader.read_exact(buffer).map_err(|e| {
                format!(
                    "Failed to read data from compressed file '{}': {}",
                    alignment_file, e
                )
            })
        }
        PafHandle::Plain(mut file) => {
            file.seek(SeekFrom::Start(offset))
                .map_err(|e| format!("Failed to seek in file '{}': {}", alignment_file, e))?;
            file.read_exact(buffer)
                .map_err(|e| format!("Failed to read data from file '{}': {}", alignment_file, e))
        }
    }
}

/// Parse a single PAF line; `file_pos` is the offset of the line start.
fn parse_paf_line(
    line: &str,
    file_pos: u64,
    seq_index: &mut SequenceIndex,
) -> Result<AlignmentRecord, ParseErr> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < 12 {
        return Err(ParseErr::NotEnoughFields);
    }

    let query_length = fields[1].parse::<usize>().map_err(ParseErr::InvalidField)?;
    let query_start = fields[2].parse::<usize>().map_err(ParseErr::InvalidField)?;
    let query_end = fields[3].parse::<usize>().map_err(ParseErr::InvalidField)?;
    let target_length = fields[6].parse::<usize>().map_err(ParseErr::InvalidField)?;
    let target_start = fields[7].parse::<usize>().map_err(ParseErr::InvalidField)?;
    let target_end = fields[8].parse::<usize>().map_err(ParseErr::InvalidField)?;
    let strand = match fields[4] {
        "+" => Strand::Forward,
        "-" => Strand::Reverse,
        _ => return Err(ParseErr::InvalidStrand),
    };
    if query_start > query_end || target_start > target_end {
        return Err(ParseErr::InvalidFormat(format!(
            "Start after end in PAF record for '{}' vs '{}'",
            fields[0], fields[5]
        )));
    }

    let query_id = seq_index.get_or_insert_id(fields[0], Some(query_length));
    let target_id = seq_index.get_or_insert_id(fields[5], Some(target_length));

    let mut cigar_offset: u64 = file_pos;
    let mut cigar_bytes: usize = 0;

    for tag_str in fields.iter() {
        if let Some(cigar) = tag_str.strip_prefix("cg:Z:") {
            cigar_offset += 5;
            cigar_bytes = cigar.len();
            break;
        } else {
            cigar_offset += (tag_str.len() + 1) as u64;
        }
    }

    let mut record = AlignmentRecord {
        query_id,
        query_start,
        query_end,
        target_id,
        target_start,
        target_end,
        strand_and_data_offset: cigar_offset,
        data_bytes: cigar_bytes,
    };
    record.set_strand(strand);

    Ok(record)
}

fn is_skippable(line: &str) -> bool {
    line.is_empty() || line.starts_with('#')
}

pub fn parse_paf<R: BufRead>(
    reader: R,
    seq_index: &mut SequenceIndex,
) -> Result<Vec<AlignmentRecord>, ParseErr> {
    let mut bytes_read: u64 = 0;
    let mut records = Vec::new();
    for line_result in reader.lines() {
        let line = line_result.map_err(ParseErr::IoError)?;
        if !is_skippable(&line) {
            records.push(parse_paf_line(&line, bytes_read, seq_index)?);
        }

        // Size of line plus newline
        bytes_read += (line.len() + 1) as u64;
    }
    Ok(records)
}

/// Parse PAF from a BGZF-compressed file, storing virtual positions for seeking.
pub fn parse_paf_bgzf<R: Read + Seek>(
    mut reader: bgzf::io::Reader<R>,
    seq_index: &mut SequenceIndex,
) -> Result<Vec<AlignmentRecord>, ParseErr> {
    let mut records = Vec::new();
    let mut line_bytes = Vec::new();

    loop {
        let line_start_vpos = reader.virtual_position();
        line_bytes.clear();

        let bytes_read = reader
            .read_until(b'\n', &mut line_bytes)
            .map_err(ParseErr::IoError)?;
        if bytes_read == 0 {
            break;
        }

        let line_len = if line_bytes.ends_with(b"\n") {
            line_bytes.len() - 1
        } else {
            line_bytes.len()
        };
        let line = std::str::from_utf8(&line_bytes[..line_len])
            .map_err(|_| ParseErr::InvalidFormat("Invalid UTF-8".to_string()))?;

        if is_skippable(line) {
            continue;
        }

        let mut record = parse_paf_line(line, 0, seq_index)?;
        let cigar_byte_offset = record.data_offset();

        // Walk from the line start to the CIGAR so block boundaries are
        // accounted for in the virtual position.
        reader.seek(line_start_vpos).map_err(ParseErr::IoError)?;
        if cigar_byte_offset > 0 {
            std::io::copy(
                &mut reader.by_ref().take(cigar_byte_offset),
                &mut std::io::sink(),
            )
            .map_err(ParseErr::IoError)?;
        }
        let cigar_vpos = reader.virtual_position();

        let strand = record.strand();
        record.strand_and_data_offset = u64::from(cigar_vpos);
        record.set_strand(strand);
        records.push(record);

        let remaining_bytes = line_bytes.len() as u64 - cigar_byte_offset;
        if remaining_bytes > 0 {
            std::io::copy(
                &mut reader.by_ref().take(remaining_bytes),
                &mut std::io::sink(),
            )
            .map_err(ParseErr::IoError)?;
        }
    }

    Ok(records)
}

/// Parse a PAF file, plain or BGZF-compressed.
pub fn parse_paf_file(
    paf_file: &str,
    seq_index: &mut SequenceIndex,
) -> std::io::Result<Vec<AlignmentRecord>> {
    let mut file = File::open(paf_file)?;
    let records = if is_compressed_path(paf_file) {
        if !is_bgzf(&mut file)? {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!(
                    "'{}' is regular gzip, not BGZF. Convert with: zcat '{}' | bgzip > output.paf.gz",
                    paf_file, paf_file
                ),
            ));
        }
        debug!("Reading BGZF-compressed PAF {}", paf_file);
        parse_paf_bgzf(bgzf::io::Reader::new(file), seq_index)
    } else {
        parse_paf(BufReader::new(file), seq_index)
    };

    records.map_err(|e| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("Failed to parse PAF from {}: {}", paf_file, e),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_paf_line_without_cigar() {
        let line = "seq1\t100\t0\t100\t+\tseq2\t100\t0\t100\t60\t100\t255";
        let mut seq_index = SequenceIndex::new();
        let record = parse_paf_line(line, 0, &mut seq_index).unwrap();

        let query_id = seq_index.get_id("seq1").unwrap();
        let target_id = seq_index.get_id("seq2").unwrap();

        assert_eq!(
            record,
            AlignmentRecord {
                query_id,
                query_start: 0,
                query_end: 100,
                target_id,
                target_start: 0,
                target_end: 100,
                // If no cigar, offset is line length; data_bytes=0
                strand_and_data_offset: (line.len() + 1) as u64,
                data_bytes: 0,
            }
        );
    }

    #[test]
    fn test_parse_paf_cigar_offset() {
        let paf_data = b"seq1\t100\t10\t20\t-\tt1\t200\t30\t40\t10\t20\t255\tcg:Z:10M\n";
        let mut seq_index = SequenceIndex::new();
        let records = parse_paf(BufReader::new(&paf_data[..]), &mut seq_index).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].strand(), Strand::Reverse);
        assert_eq!(records[0].data_offset(), 45);
        assert_eq!(records[0].data_bytes, 3);
        assert_eq!(seq_index.get_len_from_id(records[0].target_id), Some(200));
    }

    #[test]
    fn test_parse_paf_skips_blank_and_comment_lines() {
        let paf_data = b"# header\n\nseq1\t100\t0\t10\t+\tt1\t200\t0\t10\t10\t10\t255\n";
        let mut seq_index = SequenceIndex::new();
        let records = parse_paf(BufReader::new(&paf_data[..]), &mut seq_index).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_parse_paf_invalid() {
        // it's got a character 'z' in the target start field
        let line = "seq1\t100\t0\t100\t+\tseq2\t100\tz\t100\t60\t100\t255\tcg:Z:10M";
        let mut seq_index = SequenceIndex::new();
        assert!(parse_paf_line(line, 0, &mut seq_index).is_err());
    }

    #[test]
    fn test_parse_paf_bad_strand() {
        let line = "seq1\t100\t0\t100\t*\tseq2\t100\t0\t100\t60\t100\t255";
        let mut seq_index = SequenceIndex::new();
        assert!(matches!(
            parse_paf_line(line, 0, &mut seq_index),
            Err(ParseErr::InvalidStrand)
        ));
    }
}
