// src/lib.rs
pub mod chunk;
pub mod consensus;
pub mod error;
pub mod hits;
pub mod lineage;
pub mod ranks;
pub mod report;
pub mod taxdb;
pub mod types;

use std::path::{Path, PathBuf};
use std::sync::Arc;

pub use crate::consensus::{ConsensusConfig, ConsensusResolver, UnknownTaxonPolicy};
pub use crate::error::ConsensusError;
pub use crate::ranks::RankScale;
pub use crate::taxdb::TaxonomyLookup;
pub use crate::types::{ConsensusRecord, Hit, HitGroup};

/// Everything one worker invocation needs to know: which chunk is ours, how
/// the consensus is configured, and what to do about unknown taxa.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// 1-based chunk index in `[1, size]`.
    pub index: usize,
    /// Total chunk count.
    pub size: usize,
    /// Cap on hit-table rows read, for partial runs.
    pub nrows: Option<usize>,
    pub policy: UnknownTaxonPolicy,
    pub consensus: ConsensusConfig,
}

impl RunConfig {
    pub fn new(index: usize, size: usize) -> Self {
        Self {
            index,
            size,
            nrows: None,
            policy: UnknownTaxonPolicy::Abort,
            consensus: ConsensusConfig::default(),
        }
    }
}

/// What a completed worker did, for logging and the CLI summary.
#[derive(Debug)]
pub struct RunSummary {
    /// Distinct queries in the whole input table.
    pub total_queries: usize,
    /// Queries in this worker's chunk.
    pub chunk_queries: usize,
    /// Records written.
    pub records: usize,
    /// Queries dropped under `UnknownTaxonPolicy::Skip`.
    pub skipped: usize,
    pub out_path: PathBuf,
}

/// One worker invocation end to end: load the reference taxonomy, read and
/// group the hit table, slice out this worker's chunk, resolve each query
/// group in parallel, and write `consensus_taxonomy_<index>.csv` into
/// `out_dir`.
///
/// Workers share nothing mutable; any two invocations with the same table
/// and `size` but different `index` process disjoint query sets.
pub fn run_chunk<P, Q, R>(
    infile: P,
    taxdb_path: Q,
    out_dir: R,
    config: &RunConfig,
) -> Result<RunSummary, ConsensusError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
    R: AsRef<Path>,
{
    // Chunk parameters are a usage error; check before any I/O.
    let _ = chunk::chunk_bounds(0, config.size, config.index)?;

    // 1. Load the reference taxonomy (fatal if missing or unreadable)
    let taxonomy = Arc::new(TaxonomyLookup::from_file(taxdb_path)?);

    // 2. Read and group the hit table
    let groups = hits::read_hit_table(infile, config.nrows)?;
    let total_queries = groups.len();

    // 3. Take this worker's chunk of the query list
    let our_groups = chunk::chunk(&groups, config.size, config.index)?;
    log::info!(
        "Chunk {}/{} covers {} of {} queries",
        config.index,
        config.size,
        our_groups.len(),
        total_queries
    );

    // 4. Resolve consensus per query group
    let resolver = ConsensusResolver::new(taxonomy.clone(), config.consensus.clone());
    let (records, skipped) = resolver.resolve_chunk(our_groups, config.policy)?;
    for record in &records {
        log::debug!(
            "{}: consensus taxon {} ({})",
            record.query,
            record.consensus_taxon_id,
            taxonomy
                .name(record.consensus_taxon_id)
                .unwrap_or("unnamed taxon")
        );
    }

    // 5. Write the chunk's output table
    let out_path = out_dir
        .as_ref()
        .join(report::output_file_name(config.index));
    report::write_consensus_table(&out_path, &records, &config.consensus.ranks_of_interest)?;

    Ok(RunSummary {
        total_queries,
        chunk_queries: our_groups.len(),
        records: records.len(),
        skipped,
        out_path,
    })
}
