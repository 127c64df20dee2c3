/// A PAF alignment record with its CIGAR left on disk.
///
/// `strand_and_data_offset`: MSB=strand; remaining bits=file offset (or BGZF
/// virtual position) of the CIGAR string. `data_bytes` is the CIGAR length.
#[derive(Debug, PartialEq)]
pub struct AlignmentRecord {
    pub query_id: u32,
    pub query_start: usize,
    pub query_end: usize,
    pub target_id: u32,
    pub target_start: usize,
    pub target_end: usize,
    pub strand_and_data_offset: u64,
    pub data_bytes: usize,
}

/// Strand orientation for alignments
#[derive(Default, PartialEq, Eq, Clone, Copy, Debug)]
#[repr(u8)]
pub enum Strand {
    #[default]
    Forward,
    Reverse,
}

impl AlignmentRecord {
    /// Bit flag for encoding strand in the MSB of strand_and_data_offset
    pub const STRAND_BIT: u64 = 0x8000000000000000;

    pub fn strand(&self) -> Strand {
        if (self.strand_and_data_offset & Self::STRAND_BIT) != 0 {
            Strand::Reverse
        } else {
            Strand::Forward
        }
    }

    pub fn set_strand(&mut self, strand: Strand) {
        match strand {
            Strand::Forward => self.strand_and_data_offset &= !Self::STRAND_BIT,
            Strand::Reverse => self.strand_and_data_offset |= Self::STRAND_BIT,
        }
    }

    /// Get the data offset without the strand bit
    pub fn data_offset(&self) -> u64 {
        self.strand_and_data_offset & !Self::STRAND_BIT
    }
}
