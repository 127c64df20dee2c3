use std::io;
use std::path::Path;

use crate::alignment_record::Strand;
use crate::faidx::FastaIndex;
use rustc_hash::FxHashMap;

/// Molecule type of a sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Molecule {
    #[default]
    Nucleotide,
    Protein,
}

/// What a provider knows about a sequence without fetching residues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceInfo {
    pub length: usize,
    pub molecule: Molecule,
}

// Trait for sequence fetching from different sources
pub trait SequenceProvider {
    /// Metadata for `seq_name`, or `None` if the sequence is unknown.
    fn sequence_info(&self, seq_name: &str) -> Option<SequenceInfo>;

    /// Plus-strand residues in `[start, end)`.
    fn fetch_sequence(&self, seq_name: &str, start: i64, end: i64) -> io::Result<Vec<u8>>;

    /// NCBI genetic code for the sequence's source organism, if annotated.
    fn genetic_code(&self, _seq_name: &str) -> Option<u8> {
        None
    }

    /// Residues in native `[start, end)` read on `strand`. Nucleotides on the
    /// reverse strand come back reverse-complemented.
    fn fetch_residues(
        &self,
        seq_name: &str,
        start: i64,
        end: i64,
        strand: Strand,
    ) -> io::Result<Vec<u8>> {
        let seq = self.fetch_sequence(seq_name, start, end)?;
        match strand {
            Strand::Forward => Ok(seq),
            Strand::Reverse => {
                let molecule = self
                    .sequence_info(seq_name)
                    .map(|info| info.molecule)
                    .unwrap_or_default();
                Ok(match molecule {
                    Molecule::Nucleotide => reverse_complement(&seq),
                    Molecule::Protein => seq.into_iter().rev().collect(),
                })
            }
        }
    }
}

pub fn reverse_complement(seq: &[u8]) -> Vec<u8> {
    seq.iter()
        .rev()
        .map(|&base| match base {
            b'A' | b'a' => b'T',
            b'T' | b't' => b'A',
            b'C' | b'c' => b'G',
            b'G' | b'g' => b'C',
            b'N' | b'n' => b'N',
            _ => base,
        })
        .collect()
}

/// Sequences held in memory, for small inputs and embedding callers.
#[derive(Debug, Default)]
pub struct MemorySequenceIndex {
    sequences: FxHashMap<String, (Vec<u8>, Molecule, Option<u8>)>,
}

impl MemorySequenceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, residues: &[u8], molecule: Molecule) {
        self.sequences
            .insert(name.to_string(), (residues.to_ascii_uppercase(), molecule, None));
    }

    pub fn set_genetic_code(&mut self, name: &str, gencode: u8) {
        if let Some(entry) = self.sequences.get_mut(name) {
            entry.2 = Some(gencode);
        }
    }
}

impl SequenceProvider for MemorySequenceIndex {
    fn sequence_info(&self, seq_name: &str) -> Option<SequenceInfo> {
        self.sequences
            .get(seq_name)
            .map(|(residues, molecule, _)| SequenceInfo {
                length: residues.len(),
                molecule: *molecule,
            })
    }

    fn fetch_sequence(&self, seq_name: &str, start: i64, end: i64) -> io::Result<Vec<u8>> {
        let (residues, _, _) = self.sequences.get(seq_name).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("Sequence '{seq_name}' not found in memory"),
            )
        })?;
        if start < 0 || end < start || end as usize > residues.len() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "Range {start}-{end} is outside sequence '{seq_name}' of length {}",
                    residues.len()
                ),
            ));
        }
        Ok(residues[start as usize..end as usize].to_vec())
    }

    fn genetic_code(&self, seq_name: &str) -> Option<u8> {
        self.sequences.get(seq_name).and_then(|entry| entry.2)
    }
}

// Enum to hold any of the supported sequence sources
#[derive(Debug)]
pub enum UnifiedSequenceIndex {
    Fasta(FastaIndex),
    Memory(MemorySequenceIndex),
}

impl UnifiedSequenceIndex {
    pub fn from_files(files: &[String]) -> io::Result<Self> {
        if files.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "No input files provided",
            ));
        }

        // Handle compound extensions like .fa.gz, .fasta.gz, .fna.gz
        let get_full_extension = |path: &str| -> String {
            let p = Path::new(path);
            let file_name = p.file_name().and_then(|s| s.to_str()).unwrap_or("");

            if file_name.ends_with(".fa.gz") {
                "fa.gz".to_string()
            } else if file_name.ends_with(".fasta.gz") {
                "fasta.gz".to_string()
            } else if file_name.ends_with(".fna.gz") {
                "fna.gz".to_string()
            } else {
                p.extension()
                    .and_then(|s| s.to_str())
                    .unwrap_or("")
                    .to_string()
            }
        };

        for file in files {
            let ext = get_full_extension(file);
            match ext.as_str() {
                "fa" | "fasta" | "fna" | "faa" | "fa.gz" | "fasta.gz" | "fna.gz" => {}
                _ => {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidInput,
                        format!("Unsupported file extension for '{}': {}", file, ext),
                    ))
                }
            }
        }

        let index = FastaIndex::build_from_files(files)?;
        Ok(UnifiedSequenceIndex::Fasta(index))
    }
}

impl SequenceProvider for UnifiedSequenceIndex {
    fn sequence_info(&self, seq_name: &str) -> Option<SequenceInfo> {
        match self {
            UnifiedSequenceIndex::Fasta(index) => index.sequence_info(seq_name),
            UnifiedSequenceIndex::Memory(index) => index.sequence_info(seq_name),
        }
    }

    fn fetch_sequence(&self, seq_name: &str, start: i64, end: i64) -> io::Result<Vec<u8>> {
        match self {
            UnifiedSequenceIndex::Fasta(index) => index.fetch_sequence(seq_name, start, end),
            UnifiedSequenceIndex::Memory(index) => index.fetch_sequence(seq_name, start, end),
        }
    }

    fn genetic_code(&self, seq_name: &str) -> Option<u8> {
        match self {
            UnifiedSequenceIndex::Fasta(_) => None,
            UnifiedSequenceIndex::Memory(index) => index.genetic_code(seq_name),
        }
    }
}
