//! Nucleotide to amino-acid translation with NCBI genetic code tables.

use log::warn;

/// Genetic code used when a sequence carries no usable annotation.
pub const DEFAULT_GENETIC_CODE: u8 = 1;

/// Emitted for a trailing codon that is missing bases.
pub const PARTIAL_CODON_RESIDUE: u8 = b'\\';

/// Genetic code translation table, indexed by codon with T=0, C=1, A=2, G=3.
pub struct GeneticCode {
    pub id: u8,
    pub table: [u8; 64],
}

impl GeneticCode {
    /// Translate one codon. Ambiguous bases give `X`.
    pub fn translate_codon(&self, codon: &[u8]) -> u8 {
        if codon.len() != 3 {
            return b'X';
        }
        let mut idx = 0;
        for &b in codon {
            idx <<= 2;
            match b.to_ascii_uppercase() {
                b'T' | b'U' => idx |= 0,
                b'C' => idx |= 1,
                b'A' => idx |= 2,
                b'G' => idx |= 3,
                _ => return b'X',
            }
        }
        self.table[idx]
    }

    /// Look up an NCBI genetic code. Unknown ids fall back to the standard
    /// code with a warning.
    ///
    /// Reference: https://www.ncbi.nlm.nih.gov/Taxonomy/Utils/wprintgc.cgi
    pub fn from_id(id: u8) -> Self {
        let (id, table_str) = match id {
            1 => (1, b"FFLLSSSSYY**CC*WLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG"),
            2 => (2, b"FFLLSSSSYY**CCWWLLLLPPPPHHQQRRRRIIIMTTTTNNKKSS**VVVVAAAADDEEGGGG"),
            3 => (3, b"FFLLSSSSYY**CCWWTTTTPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG"),
            4 => (4, b"FFLLSSSSYY**CCWWLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG"),
            5 => (5, b"FFLLSSSSYY**CCWWLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSSSVVVVAAAADDEEGGGG"),
            6 => (6, b"FFLLSSSSYYQQCC*WLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG"),
            9 => (9, b"FFLLSSSSYY**CCWWLLLLPPPPHHQQRRRRIIIMTTTTNNNKSSSSVVVVAAAADDEEGGGG"),
            10 => (10, b"FFLLSSSSYY**CCCWLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG"),
            11 => (11, b"FFLLSSSSYY**CC*WLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG"),
            12 => (12, b"FFLLSSSSYY**CC*WLLLSPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG"),
            13 => (13, b"FFLLSSSSYY**CCWWLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSGGVVVVAAAADDEEGGGG"),
            14 => (14, b"FFLLSSSSYYY*CCWWLLLLPPPPHHQQRRRRIIIMTTTTNNNKSSSSVVVVAAAADDEEGGGG"),
            15 => (15, b"FFLLSSSSYY*QCC*WLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG"),
            16 => (16, b"FFLLSSSSYY*LCC*WLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG"),
            21 => (21, b"FFLLSSSSYY**CCWWLLLLPPPPHHQQRRRRIIIMTTTTNNNKSSSSVVVVAAAADDEEGGGG"),
            22 => (22, b"FFLLSS*SYY*LCC*WLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG"),
            23 => (23, b"FF*LSSSSYY**CC*WLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG"),
            24 => (24, b"FFLLSSSSYY**CCWWLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSSKVVVVAAAADDEEGGGG"),
            25 => (25, b"FFLLSSSSYY**CCGWLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG"),
            26 => (26, b"FFLLSSSSYY**CC*WLLLAPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG"),
            27 => (27, b"FFLLSSSSYYQQCCWWLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG"),
            28 => (28, b"FFLLSSSSYYQQCCWWLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG"),
            29 => (29, b"FFLLSSSSYYYYCC*WLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG"),
            30 => (30, b"FFLLSSSSYYEECC*WLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG"),
            31 => (31, b"FFLLSSSSYYEECC*WLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG"),
            33 => (33, b"FFLLSSSSYYY*CCWWLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSSKVVVVAAAADDEEGGGG"),
            _ => {
                warn!(
                    "Genetic code {} not implemented or invalid, using Standard ({})",
                    id, DEFAULT_GENETIC_CODE
                );
                (
                    DEFAULT_GENETIC_CODE,
                    b"FFLLSSSSYY**CC*WLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG",
                )
            }
        };

        let mut table = [0u8; 64];
        table.copy_from_slice(table_str);
        GeneticCode { id, table }
    }
}

/// Translate nucleotides codon by codon. A trailing partial codon is kept as
/// a single [`PARTIAL_CODON_RESIDUE`].
pub fn translate_na_to_aa(na: &[u8], gencode: u8) -> Vec<u8> {
    if na.is_empty() {
        return Vec::new();
    }
    let code = GeneticCode::from_id(gencode);
    let chunks = na.chunks_exact(3);
    let has_remainder = !chunks.remainder().is_empty();
    let mut aa: Vec<u8> = chunks.map(|codon| code.translate_codon(codon)).collect();
    if has_remainder {
        aa.push(PARTIAL_CODON_RESIDUE);
    }
    aa
}
