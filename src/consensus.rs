//src/consensus.rs

use std::collections::BTreeSet;
use std::sync::Arc;

use rayon::prelude::*;

use crate::error::ConsensusError;
use crate::lineage::normalized_lineage;
use crate::ranks::{RankScale, DEFAULT_RANKS_OF_INTEREST};
use crate::taxdb::TaxonomyLookup;
use crate::types::{ConsensusRecord, Hit, HitGroup, RankValue};

/// What to do with a query group whose `tax_id` is missing from the
/// reference taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnknownTaxonPolicy {
    /// Fail the whole run (default).
    Abort,
    /// Drop the query with a warning; its record is not emitted.
    Skip,
}

/// Per-run consensus configuration.
#[derive(Debug, Clone)]
pub struct ConsensusConfig {
    /// Percent-identity margin below the best hit for a hit to be retained.
    pub sway: f64,
    pub rank_scale: RankScale,
    pub ranks_of_interest: Vec<String>,
}

impl ConsensusConfig {
    /// Validates that the ranks of interest are non-empty, free of
    /// duplicates (a duplicate would emit a duplicated output column), and
    /// all sit on the scale, so rank lookups cannot fail later mid-run.
    pub fn new(
        sway: f64,
        rank_scale: RankScale,
        ranks_of_interest: Vec<String>,
    ) -> Result<Self, ConsensusError> {
        if ranks_of_interest.is_empty() {
            return Err(ConsensusError::EmptyRanksOfInterest);
        }
        let mut seen = BTreeSet::new();
        for rank in &ranks_of_interest {
            rank_scale.position(rank)?;
            if !seen.insert(rank.as_str()) {
                return Err(ConsensusError::DuplicateRank(rank.clone()));
            }
        }
        Ok(Self {
            sway,
            rank_scale,
            ranks_of_interest,
        })
    }

    pub fn with_sway(sway: f64) -> Self {
        Self {
            sway,
            ..Self::default()
        }
    }
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            sway: 1.0,
            rank_scale: RankScale::default(),
            ranks_of_interest: DEFAULT_RANKS_OF_INTEREST
                .iter()
                .map(|r| r.to_string())
                .collect(),
        }
    }
}

/// Resolves one consensus taxonomic assignment per query group.
///
/// Holds the process-wide `TaxonomyLookup` by `Arc` rather than owning it;
/// the lookup outlives any particular run configuration.
pub struct ConsensusResolver {
    taxonomy: Arc<TaxonomyLookup>,
    config: ConsensusConfig,
}

impl ConsensusResolver {
    pub fn new(taxonomy: Arc<TaxonomyLookup>, config: ConsensusConfig) -> Self {
        Self { taxonomy, config }
    }

    pub fn config(&self) -> &ConsensusConfig {
        &self.config
    }

    /// Consensus for one query group. `hits` must be non-empty.
    pub fn resolve(&self, query: &str, hits: &[Hit]) -> Result<ConsensusRecord, ConsensusError> {
        debug_assert!(!hits.is_empty(), "query group without hits");

        let max_pident = hits.iter().map(|h| h.pident).fold(f64::NEG_INFINITY, f64::max);

        let consensus_taxon_id = if hits.len() == 1 {
            hits[0].tax_id
        } else {
            let threshold = max_pident - self.config.sway;
            let retained: Vec<u32> = hits
                .iter()
                .filter(|h| h.pident >= threshold)
                .map(|h| h.tax_id)
                .collect();
            // The best-scoring hit always satisfies the threshold.
            debug_assert!(!retained.is_empty(), "sway filter emptied a group");

            let distinct: BTreeSet<u32> = retained.iter().copied().collect();
            if distinct.len() <= 1 {
                retained[0]
            } else {
                self.intersect_consensus(&distinct)?
            }
        };

        let lineage = normalized_lineage(
            &self.taxonomy,
            consensus_taxon_id,
            &self.config.ranks_of_interest,
            &self.config.rank_scale,
        )?;

        Ok(ConsensusRecord {
            query: query.to_string(),
            consensus_taxon_id,
            pident: max_pident,
            hits: hits.len(),
            lineage,
        })
    }

    /// Ancestor-intersection step for groups that retain more than one
    /// distinct taxon: intersect the taxon ids appearing in each normalized
    /// lineage, then take the deepest members of that common set. The
    /// smallest leaf taxid is the consensus (deterministic tie-break).
    fn intersect_consensus(&self, taxids: &BTreeSet<u32>) -> Result<u32, ConsensusError> {
        let mut common: Option<BTreeSet<u32>> = None;
        for &taxid in taxids {
            let nl = normalized_lineage(
                &self.taxonomy,
                taxid,
                &self.config.ranks_of_interest,
                &self.config.rank_scale,
            )?;
            // Sentinel slots carry no topological information, so only the
            // real taxon ids take part in the intersection.
            let ids: BTreeSet<u32> = nl.values().filter_map(|v| RankValue::taxid(*v)).collect();
            common = Some(match common {
                None => ids,
                Some(prev) => prev.intersection(&ids).copied().collect(),
            });
        }
        let common = common.unwrap_or_default();

        if common.is_empty() {
            // No rank of interest is shared; fall back to the parent-map LCA.
            let lca = self.taxonomy.lca_of_set(taxids.iter().copied());
            log::debug!("empty lineage intersection, falling back to LCA {lca}");
            return Ok(lca);
        }

        match self.taxonomy.topology_leaves(&common).first() {
            Some(&leaf) => Ok(leaf),
            // Unreachable for a non-empty set, but don't panic on it.
            None => Ok(self.taxonomy.lca_of_set(common)),
        }
    }

    /// Resolves a whole chunk of query groups in parallel, in chunk order.
    /// Unknown taxa are handled per `policy`; skipped queries are counted.
    pub fn resolve_chunk(
        &self,
        groups: &[HitGroup],
        policy: UnknownTaxonPolicy,
    ) -> Result<(Vec<ConsensusRecord>, usize), ConsensusError> {
        let results: Vec<Result<ConsensusRecord, ConsensusError>> = groups
            .par_iter()
            .map(|group| self.resolve(&group.query, &group.hits))
            .collect();

        let mut records = Vec::with_capacity(groups.len());
        let mut skipped = 0usize;
        for (group, result) in groups.iter().zip(results) {
            match result {
                Ok(record) => records.push(record),
                Err(ConsensusError::UnknownTaxon(taxid))
                    if policy == UnknownTaxonPolicy::Skip =>
                {
                    log::warn!(
                        "skipping query {}: taxon id {} not in reference taxonomy",
                        group.query,
                        taxid
                    );
                    skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }
        Ok((records, skipped))
    }
}
