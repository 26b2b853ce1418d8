// fbigsort -- sort a large text file line by line in bounded memory
//
// Usage: fbigsort [--file FILE] [--line-count N] [--max-length N] [--validate]
//
// When FILE does not exist a file of random lines is generated first.

use std::path::PathBuf;
use std::process;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::LevelFilter;

use bigsort_rs::check::{CheckOutcome, check_sorted_file};
use bigsort_rs::common::{init_logging, reset_sigpipe};
use bigsort_rs::encoding::{EncodingProfile, Newline};
use bigsort_rs::generate::{GenerateConfig, generate_file};
use bigsort_rs::sort::{FileSorter, SHRINK_FACTOR, SortConfig};

const TOOL_NAME: &str = "fbigsort";

#[derive(Clone, Copy, Debug, ValueEnum)]
enum NewlineArg {
    Lf,
    Crlf,
    Native,
}

impl From<NewlineArg> for Newline {
    fn from(arg: NewlineArg) -> Self {
        match arg {
            NewlineArg::Lf => Newline::Lf,
            NewlineArg::Crlf => Newline::CrLf,
            NewlineArg::Native => Newline::native(),
        }
    }
}

#[derive(Parser)]
#[command(
    name = "fbigsort",
    version,
    about = "Sort the lines of a large text file in bounded memory"
)]
struct Cli {
    /// File to sort. If it does not exist, a file with this name is generated
    #[arg(long = "file", value_name = "FILE", default_value = "")]
    file: String,

    /// Number of lines to generate
    #[arg(long = "line-count", value_name = "N", default_value_t = 1000)]
    line_count: usize,

    /// Max line length of generated lines
    #[arg(long = "max-length", value_name = "N", default_value_t = 50)]
    max_length: usize,

    /// Seed for the line generator
    #[arg(long = "seed", value_name = "SEED")]
    seed: Option<u64>,

    /// Validate the sorted file
    #[arg(long = "validate")]
    validate: bool,

    /// Keep the index file next to the source after the run
    #[arg(long = "keep-index")]
    keep_index: bool,

    /// Comb sort gap shrink factor
    #[arg(long = "shrink-factor", value_name = "F", default_value_t = SHRINK_FACTOR)]
    shrink_factor: f64,

    /// Line terminator of the source and sorted files
    #[arg(long = "newline", value_enum, default_value_t = NewlineArg::Native)]
    newline: NewlineArg,

    /// Report index and sort statistics
    #[arg(short = 'v', long = "verbose", conflicts_with = "quiet")]
    verbose: bool,

    /// Report errors and warnings only
    #[arg(short = 'q', long = "quiet")]
    quiet: bool,
}

fn main() {
    reset_sigpipe();
    let cli = Cli::parse();

    let level = if cli.quiet {
        LevelFilter::Warn
    } else if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    init_logging(TOOL_NAME, level);

    match run(&cli) {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("{}: {:#}", TOOL_NAME, e);
            process::exit(2);
        }
    }
}

/// Returns false when validation was requested and failed.
fn run(cli: &Cli) -> Result<bool> {
    let newline = Newline::from(cli.newline);
    let requested = PathBuf::from(&cli.file);
    let has_name = !cli.file.trim().is_empty();

    let (path, profile) = if has_name && requested.is_file() {
        let path = std::path::absolute(&requested)
            .with_context(|| format!("cannot resolve {}", requested.display()))?;
        println!("Using file {}", path.display());
        let profile = EncodingProfile::sniff(&path, newline)
            .with_context(|| format!("cannot read {}", path.display()))?;
        (path, profile)
    } else {
        println!("Generating new random text file...");
        println!(
            "Number of lines: {}, Max line length: {}",
            cli.line_count, cli.max_length
        );
        let profile = EncodingProfile::utf8(newline);
        let config = GenerateConfig {
            line_count: cli.line_count,
            max_length: cli.max_length,
            seed: cli.seed,
        };
        let target = has_name.then_some(requested.as_path());
        let path = generate_file(target, &config, &profile)
            .context("cannot generate input file")?;
        println!("Generated {}", path.display());
        println!();
        (path, profile)
    };

    println!("Sorting file {}...", path.display());
    let config = SortConfig {
        shrink_factor: cli.shrink_factor,
        keep_index: cli.keep_index,
        ..SortConfig::default()
    };
    let sorter = FileSorter::new(profile, config);
    let start = Instant::now();
    let report = sorter.sort_with_report(&path)?;
    let elapsed = start.elapsed();
    println!("Done.");
    println!("Sorted file at: {}", report.output.display());
    println!("Sorting took {}ms", elapsed.as_millis());
    println!();

    if !cli.validate {
        return Ok(true);
    }

    println!("Validating {}...", report.output.display());
    let outcome = check_sorted_file(&report.output, sorter.profile())
        .with_context(|| format!("cannot read {}", report.output.display()))?;
    println!("Done.");
    match outcome {
        CheckOutcome::Sorted { .. } => println!("File is valid!"),
        CheckOutcome::Disorder { line } => {
            println!("File is not valid! Line {} is out of order.", line)
        }
    }
    println!();
    Ok(outcome.is_sorted())
}
