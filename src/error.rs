use std::io::Error as IoError;

/// Failures surfaced by sequence extraction on a [`crate::sparse_aln::SparseAln`].
///
/// Malformed alignments are not reported here: they are contract violations
/// and panic at construction time.
#[derive(Debug)]
pub enum AlnError {
    /// The sequence provider does not know the row's sequence.
    SequenceNotFound { row: usize, seq_id: String },
    /// The provider knows the sequence but failed to deliver residues.
    IoError(IoError),
}

impl std::fmt::Display for AlnError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlnError::SequenceNotFound { row, seq_id } => write!(
                f,
                "Invalid sequence for row {}: seq id '{}' not found by the sequence provider",
                row, seq_id
            ),
            AlnError::IoError(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for AlnError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AlnError::IoError(e) => Some(e),
            AlnError::SequenceNotFound { .. } => None,
        }
    }
}

impl From<IoError> for AlnError {
    fn from(e: IoError) -> Self {
        AlnError::IoError(e)
    }
}
