//src/types.rs

use ahash::AHashMap;
use serde::Deserialize;

/// NCBI taxid for "unidentified". Only materialized as a number when a
/// record is written out; inside the engine it is the tagged
/// `RankValue::Unidentified` so it can never collide with a real taxon id.
pub const UNIDENTIFIED_TAXID: u32 = 32644;

/// One row of the BLAST hit table. Several hits may share a `query`.
#[derive(Debug, Clone, Deserialize)]
pub struct Hit {
    pub query: String,
    pub gi: String,
    pub pident: f64,
    pub evalue: f64,
    pub tax_id: u32,
}

/// All hits for one query, in input order.
#[derive(Debug, Clone)]
pub struct HitGroup {
    pub query: String,
    pub hits: Vec<Hit>,
}

/// Value of one rank slot in a normalized lineage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankValue {
    Taxon(u32),
    Unidentified,
}

impl RankValue {
    /// The real taxon id, if there is one.
    pub fn taxid(self) -> Option<u32> {
        match self {
            RankValue::Taxon(t) => Some(t),
            RankValue::Unidentified => None,
        }
    }

    /// The id written to the output table.
    pub fn column_value(self) -> u32 {
        match self {
            RankValue::Taxon(t) => t,
            RankValue::Unidentified => UNIDENTIFIED_TAXID,
        }
    }
}

/// Rank name -> taxon id for the ranks of interest. A rank missing from the
/// map was more specific than the query taxon itself and is omitted from the
/// output entirely (distinct from being present but unidentified).
pub type NormalizedLineage = AHashMap<String, RankValue>;

/// Final per-query consensus row. `pident` and `hits` describe the original
/// unfiltered group, not the sway-filtered subset.
#[derive(Debug, Clone)]
pub struct ConsensusRecord {
    pub query: String,
    pub consensus_taxon_id: u32,
    pub pident: f64,
    pub hits: usize,
    pub lineage: NormalizedLineage,
}
