use clap::{Parser, ValueEnum};
use log::info;
use rayon::ThreadPoolBuilder;
use sparsealn::anchored::AnchoredAln;
use sparsealn::paf;
use sparsealn::pairwise::SearchDirection;
use sparsealn::range::SeqRange;
use sparsealn::segment::{SegmentFilter, SegmentKind};
use sparsealn::seqidx::SequenceIndex;
use sparsealn::sequence_index::UnifiedSequenceIndex;
use sparsealn::sparse_aln::SparseAln;
use std::io;
use std::num::NonZeroUsize;

/// Common options shared between all commands
#[derive(Parser, Debug)]
struct CommonOpts {
    /// Path to the PAF file (plain or BGZF-compressed), with CIGAR strings in cg:Z: tags.
    #[clap(short = 'p', long, value_parser)]
    paf_file: String,

    /// Anchor sequence: the PAF target all rows are aligned to.
    #[clap(short = 'a', long, value_parser)]
    anchor: String,

    /// Number of threads for parallel processing.
    #[clap(short = 't', long, value_parser, default_value_t = NonZeroUsize::new(4).unwrap())]
    num_threads: NonZeroUsize,

    /// Verbosity level (0 = error, 1 = info, 2 = debug)
    #[clap(short, long, default_value = "0")]
    verbose: u8,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Direction {
    None,
    Left,
    Right,
    Forward,
    Backwards,
}

impl From<Direction> for SearchDirection {
    fn from(dir: Direction) -> Self {
        match dir {
            Direction::None => SearchDirection::None,
            Direction::Left => SearchDirection::Left,
            Direction::Right => SearchDirection::Right,
            Direction::Forward => SearchDirection::Forward,
            Direction::Backwards => SearchDirection::Backwards,
        }
    }
}

/// Merge pairwise alignments against a shared anchor into one gapped coordinate system.
#[derive(Parser, Debug)]
#[command(author, version, about, disable_help_subcommand = true)]
enum Args {
    /// Print the alignment extent and a summary of every row
    Stats {
        #[clap(flatten)]
        common: CommonOpts,
    },
    /// Map positions between a row and the alignment
    Map {
        #[clap(flatten)]
        common: CommonOpts,

        /// Row index or sequence name
        #[clap(short = 'r', long, value_parser)]
        row: String,

        /// Position on the row sequence to map to an alignment column
        #[clap(long, value_parser, conflicts_with = "aln_pos", required_unless_present = "aln_pos")]
        seq_pos: Option<i64>,

        /// Alignment column to map to a row position
        #[clap(long, value_parser)]
        aln_pos: Option<i64>,

        /// Where to search when the position falls into a gap
        #[clap(short = 'd', long, value_enum, default_value = "none")]
        direction: Direction,

        /// Retry in the opposite direction when nothing is found
        #[clap(long, action)]
        try_reverse: bool,
    },
    /// List the segments of a row
    Segments {
        #[clap(flatten)]
        common: CommonOpts,

        /// Row index or sequence name
        #[clap(short = 'r', long, value_parser)]
        row: String,

        /// Alignment window as `start-end` (default: whole alignment)
        #[clap(long, value_parser)]
        range: Option<String>,

        /// Omit segments without residues on the row
        #[clap(long, action)]
        skip_gaps: bool,

        /// Omit row residues that have no alignment columns
        #[clap(long, action)]
        skip_inserts: bool,
    },
    /// Print every row laid out over the alignment columns
    View {
        #[clap(flatten)]
        common: CommonOpts,

        /// FASTA files holding the row sequences (.faa files are read as protein)
        #[clap(short = 's', long, value_parser, num_args = 1.., required = true)]
        sequence_files: Vec<String>,

        /// Alignment window as `start-end` (default: whole alignment)
        #[clap(long, value_parser)]
        range: Option<String>,

        /// Translate nucleotide rows
        #[clap(long, action)]
        translate: bool,

        /// Character used for gaps
        #[clap(long, value_parser, default_value = "-")]
        gap_char: char,
    },
}

fn main() -> io::Result<()> {
    let args = Args::parse();

    match args {
        Args::Stats { common } => {
            let aln = initialize_sparse_aln(&common)?;
            print_stats(&aln);
        }
        Args::Map {
            common,
            row,
            seq_pos,
            aln_pos,
            direction,
            try_reverse,
        } => {
            let aln = initialize_sparse_aln(&common)?;
            let row = resolve_row(&aln, &row)?;
            let dir = SearchDirection::from(direction);
            let (input, mapped) = match (seq_pos, aln_pos) {
                (Some(pos), _) => (pos, aln.aln_pos_from_seq_pos(row, pos, dir, try_reverse)),
                (None, Some(pos)) => (pos, aln.seq_pos_from_aln_pos(row, pos, dir, try_reverse)),
                (None, None) => {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidInput,
                        "Either --seq-pos or --aln-pos must be provided for map subcommand",
                    ))
                }
            };
            println!(
                "{}\t{}\t{}",
                aln.seq_id(row),
                input,
                mapped.map_or_else(|| ".".to_string(), |pos| pos.to_string())
            );
        }
        Args::Segments {
            common,
            row,
            range,
            skip_gaps,
            skip_inserts,
        } => {
            let aln = initialize_sparse_aln(&common)?;
            let row = resolve_row(&aln, &row)?;
            let window = parse_window(range.as_deref())?;
            let filter = match (skip_gaps, skip_inserts) {
                (false, false) => SegmentFilter::All,
                (true, false) => SegmentFilter::SkipGaps,
                (false, true) => SegmentFilter::SkipInserts,
                (true, true) => SegmentFilter::AlignedOnly,
            };
            for seg in aln.segments(row, window, filter) {
                let kind = match seg.kind {
                    SegmentKind::Aligned => "aligned",
                    SegmentKind::GapOnRow => "gap",
                    SegmentKind::GapOnAnchor => "insert",
                };
                println!(
                    "{}\t{}\t{}\t{}\t{}\t{}\t{}",
                    aln.seq_id(row),
                    kind,
                    seg.aln_range.from(),
                    seg.aln_range.to_open(),
                    seg.row_range.from(),
                    seg.row_range.to_open(),
                    if seg.reversed { '-' } else { '+' }
                );
            }
        }
        Args::View {
            common,
            sequence_files,
            range,
            translate,
            gap_char,
        } => {
            let mut aln = initialize_sparse_aln(&common)?;
            if !gap_char.is_ascii() {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("Gap character '{}' is not ASCII", gap_char),
                ));
            }
            aln.set_gap_char(gap_char as u8);
            let provider = UnifiedSequenceIndex::from_files(&sequence_files)?;
            let window = match parse_window(range.as_deref())? {
                window if window.is_whole() => aln.aln_range(),
                window => window,
            };
            for row in 0..aln.dim() {
                let residues = aln
                    .get_aln_seq_string(row, window, translate, &provider)
                    .map_err(|e| io::Error::other(e.to_string()))?;
                println!("{}\t{}", aln.seq_id(row), String::from_utf8_lossy(&residues));
            }
        }
    }

    Ok(())
}

/// Initialize logging and the thread pool, then build the alignment
fn initialize_sparse_aln(common: &CommonOpts) -> io::Result<SparseAln> {
    // Initialize logger based on verbosity
    env_logger::Builder::new()
        .filter_level(match common.verbose {
            0 => log::LevelFilter::Error,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .init();

    // Configure thread pool
    ThreadPoolBuilder::new()
        .num_threads(common.num_threads.into())
        .build_global()
        .map_err(|e| io::Error::other(format!("Failed to build thread pool: {}", e)))?;

    let mut seq_index = SequenceIndex::new();
    let records = paf::parse_paf_file(&common.paf_file, &mut seq_index)?;
    info!(
        "Parsed {} alignments over {} sequences from {}",
        records.len(),
        seq_index.len(),
        common.paf_file
    );

    let anchored =
        AnchoredAln::from_paf_records(&records, &common.anchor, &seq_index, &common.paf_file)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;
    Ok(SparseAln::new(&anchored))
}

fn resolve_row(aln: &SparseAln, row: &str) -> io::Result<usize> {
    if let Ok(idx) = row.parse::<usize>() {
        if idx < aln.dim() {
            return Ok(idx);
        }
    }
    (0..aln.dim())
        .find(|&idx| aln.seq_id(idx) == row)
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Row '{}' not found in the alignment", row),
            )
        })
}

fn parse_window(range: Option<&str>) -> io::Result<SeqRange> {
    let Some(range) = range else {
        return Ok(SeqRange::whole());
    };
    let parts: Vec<&str> = range.split('-').collect();
    if parts.len() != 2 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "Range format should be `start-end`",
        ));
    }

    let parse = |s: &str| {
        s.parse::<i64>().map_err(|_| {
            io::Error::new(io::ErrorKind::InvalidInput, format!("Invalid range value: {}", s))
        })
    };
    let (start, end) = (parse(parts[0])?, parse(parts[1])?);
    if start >= end {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "Start value must be less than end value",
        ));
    }
    Ok(SeqRange::new(start, end))
}

fn print_stats(aln: &SparseAln) {
    let aln_range = aln.aln_range();
    println!("Number of rows: {}", aln.dim());
    println!("Anchor row: {}", aln.anchor_row());
    println!("Score: {}", aln.score());
    println!("Alignment range: {}-{}", aln_range.from(), aln_range.to_open());
    println!("Translated: {}", aln.is_translated());
    for row in 0..aln.dim() {
        let seq_range = aln.seq_range(row);
        let seq_aln_range = aln.seq_aln_range(row);
        let strand = if aln.align_collection(row).is_mixed_dir() {
            '.'
        } else if aln.is_positive_strand(row) {
            '+'
        } else {
            '-'
        };
        println!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            row,
            aln.seq_id(row),
            seq_range.from(),
            seq_range.to_open(),
            seq_aln_range.from(),
            seq_aln_range.to_open(),
            strand,
            aln.align_collection(row).len()
        );
    }
}
