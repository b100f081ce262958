use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;

use blast_taxonomy_rs::{run_chunk, ConsensusConfig, RunConfig, UnknownTaxonPolicy};

/// Assign consensus taxonomy to BLAST hits, one chunk of queries per
/// worker invocation.
#[derive(Debug, Parser)]
#[command(name = "blast-taxonomy-rs", version)]
struct Args {
    /// BLAST hit table (csv, optionally gzipped) with columns
    /// query,gi,pident,evalue,tax_id
    #[arg(long)]
    infile: PathBuf,

    /// Array index: which chunk to process, 1-based
    #[arg(short = 'i', long)]
    index: usize,

    /// Array size: total chunk count
    #[arg(short = 's', long)]
    size: usize,

    /// Number of rows of the table to read; useful for partial runs
    #[arg(long)]
    nrows: Option<usize>,

    /// Reference taxonomy file (taxid, parent, name, rank; tab-separated)
    #[arg(long, default_value = "taxDB")]
    taxdb: PathBuf,

    /// Directory for consensus_taxonomy_<index>.csv
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Percent-identity margin below the best hit for a hit to be retained
    #[arg(long, default_value_t = 1.0)]
    sway: f64,

    /// Skip queries whose taxon id is missing from the reference taxonomy
    /// instead of aborting the run
    #[arg(long)]
    skip_unknown: bool,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let config = RunConfig {
        index: args.index,
        size: args.size,
        nrows: args.nrows,
        policy: if args.skip_unknown {
            UnknownTaxonPolicy::Skip
        } else {
            UnknownTaxonPolicy::Abort
        },
        consensus: ConsensusConfig::with_sway(args.sway),
    };

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .tick_strings(&[
                "⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏",
            ])
            .template("{spinner:.green} {msg}")
            .expect("Invalid spinner template"),
    );
    spinner.set_message(format!(
        "Computing consensus taxonomy for chunk {}/{}...",
        args.index, args.size
    ));

    match run_chunk(&args.infile, &args.taxdb, &args.out_dir, &config) {
        Ok(summary) => {
            spinner.finish_with_message(format!(
                "Wrote {} record(s) for {} of {} queries to {}{}",
                summary.records,
                summary.chunk_queries,
                summary.total_queries,
                summary.out_path.display(),
                if summary.skipped > 0 {
                    format!(" ({} skipped)", summary.skipped)
                } else {
                    String::new()
                },
            ));
        }
        Err(e) => {
            spinner.abandon_with_message("Consensus taxonomy failed.");
            log::error!("{e}");
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    }
}
