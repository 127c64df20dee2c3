//! Residue access for sequences stored in faidx-indexed FASTA files.

use crate::sequence_index::{Molecule, SequenceInfo, SequenceProvider};
use std::collections::hash_map::Entry;
use log::{debug, warn};
use rust_htslib::faidx;
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::io;
use std::path::Path;

/// Open readers kept per thread.
const READERS_PER_THREAD: usize = 8;

thread_local! {
    // faidx::Reader is not Sync, so each rayon worker opens its own.
    static READERS: RefCell<FxHashMap<String, faidx::Reader>> = RefCell::new(FxHashMap::default());
}

/// One line of a `.fai` file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FaiEntry {
    file: usize,
    length: usize,
}

fn parse_fai_line(line: &str, file: usize) -> Option<(&str, FaiEntry)> {
    let mut fields = line.split('\t');
    let name = fields.next().filter(|name| !name.is_empty())?;
    let length = fields.next()?.parse::<usize>().ok()?;
    Some((name, FaiEntry { file, length }))
}

/// Read `<fasta>.fai`, letting htslib write it first when it is missing.
fn read_fai(fasta_path: &str) -> io::Result<String> {
    let fai_path = format!("{fasta_path}.fai");
    if !Path::new(&fai_path).exists() {
        debug!("Indexing {fasta_path}");
        faidx::Reader::from_path(fasta_path).map_err(|e| {
            io::Error::other(format!("Failed to create FASTA index for '{fasta_path}': {e}"))
        })?;
    }
    std::fs::read_to_string(&fai_path)
}

/// Sequences from one or more FASTA files, addressed by name.
///
/// Files named `*.faa` hold protein, everything else nucleotides.
#[derive(Debug)]
pub struct FastaIndex {
    files: Vec<(String, Molecule)>,
    entries: FxHashMap<String, FaiEntry>,
}

impl FastaIndex {
    pub fn build_from_files(fasta_files: &[String]) -> io::Result<Self> {
        let mut files = Vec::with_capacity(fasta_files.len());
        let mut entries: FxHashMap<String, FaiEntry> = FxHashMap::default();

        for (file, fasta_path) in fasta_files.iter().enumerate() {
            let molecule = if fasta_path.ends_with(".faa") {
                Molecule::Protein
            } else {
                Molecule::Nucleotide
            };
            files.push((fasta_path.clone(), molecule));

            for (line_num, line) in read_fai(fasta_path)?.lines().enumerate() {
                if line.is_empty() {
                    continue;
                }
                let (name, entry) = parse_fai_line(line, file).ok_or_else(|| {
                    io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("Malformed line {} in {fasta_path}.fai", line_num + 1),
                    )
                })?;
                if let Some(prev) = entries.get(name) {
                    warn!(
                        "Sequence '{name}' in {fasta_path} already read from {}; keeping the first",
                        fasta_files[prev.file]
                    );
                    continue;
                }
                entries.insert(name.to_string(), entry);
            }
        }

        debug!(
            "Indexed {} sequences from {} FASTA files",
            entries.len(),
            files.len()
        );
        Ok(FastaIndex { files, entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entry(&self, seq_name: &str) -> io::Result<FaiEntry> {
        self.entries.get(seq_name).copied().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("Sequence '{seq_name}' not found in any FASTA file"),
            )
        })
    }

    /// Uppercase residues `[start, end)` of `seq_name` on the stored strand.
    pub fn fetch_sequence(&self, seq_name: &str, start: i64, end: i64) -> io::Result<Vec<u8>> {
        let entry = self.entry(seq_name)?;
        if start < 0 || end as usize > entry.length {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "Range {start}-{end} is outside sequence '{seq_name}' of length {}",
                    entry.length
                ),
            ));
        }
        if end <= start {
            return Ok(Vec::new());
        }

        READERS.with(|cell| -> io::Result<Vec<u8>> {
            let path = &self.files[entry.file].0;
            let mut readers = cell.borrow_mut();
            if !readers.contains_key(path) && readers.len() >= READERS_PER_THREAD {
                readers.clear();
            }
            let reader = match readers.entry(path.clone()) {
                Entry::Occupied(slot) => slot.into_mut(),
                Entry::Vacant(slot) => {
                    let reader = faidx::Reader::from_path(path).map_err(|e| {
                        io::Error::other(format!("Failed to open FASTA file '{path}': {e}"))
                    })?;
                    slot.insert(reader)
                }
            };

            // htslib takes an inclusive end.
            let seq = reader
                .fetch_seq(seq_name, start as usize, (end - 1) as usize)
                .map_err(|e| {
                    io::Error::other(format!("Failed to fetch sequence for {seq_name}: {e}"))
                })?;
            let mut residues = seq.to_vec();
            // rust-htslib leaks the buffer (https://github.com/rust-bio/rust-htslib/issues/401)
            unsafe { libc::free(seq.as_ptr() as *mut std::ffi::c_void) };
            residues.make_ascii_uppercase();
            Ok(residues)
        })
    }
}

impl SequenceProvider for FastaIndex {
    fn sequence_info(&self, seq_name: &str) -> Option<SequenceInfo> {
        self.entries.get(seq_name).map(|entry| SequenceInfo {
            length: entry.length,
            molecule: self.files[entry.file].1,
        })
    }

    fn fetch_sequence(&self, seq_name: &str, start: i64, end: i64) -> io::Result<Vec<u8>> {
        FastaIndex::fetch_sequence(self, seq_name, start, end)
    }
}
