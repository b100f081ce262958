//src/error.rs

use thiserror::Error;

/// Errors produced while loading reference data or resolving consensus
/// taxonomy. Startup problems (bad rank configuration, unreadable files,
/// bad chunk parameters) abort the run; `UnknownTaxon` is per-group and
/// handled according to the caller's policy.
#[derive(Debug, Error)]
pub enum ConsensusError {
    #[error("taxon id {0} is not present in the reference taxonomy")]
    UnknownTaxon(u32),

    #[error("rank name {0:?} is not part of the rank scale")]
    UnknownRank(String),

    #[error("duplicate rank name {0:?} in rank scale")]
    DuplicateRank(String),

    #[error("rank scale must not be empty")]
    EmptyRankScale,

    #[error("ranks of interest must not be empty")]
    EmptyRanksOfInterest,

    #[error("cycle in reference taxonomy parent chain at taxon id {0}")]
    TaxonomyCycle(u32),

    #[error("chunk index {index} is not in [1, {size}]")]
    InvalidChunk { index: usize, size: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("malformed hit table: {0}")]
    Csv(#[from] csv::Error),
}
