//src/lineage.rs

use ahash::AHashMap;

use crate::error::ConsensusError;
use crate::ranks::RankScale;
use crate::taxdb::TaxonomyLookup;
use crate::types::{NormalizedLineage, RankValue};

/// Normalizes the lineage of `taxid` onto the ranks of interest.
///
/// Ranks more specific than the query taxon's own rank are omitted; ranks at
/// or above it that the actual lineage lacks come out as
/// `RankValue::Unidentified`. Pure given fixed reference data, so repeated
/// calls with the same inputs return identical mappings.
pub fn normalized_lineage(
    taxonomy: &TaxonomyLookup,
    taxid: u32,
    ranks_of_interest: &[String],
    rank_scale: &RankScale,
) -> Result<NormalizedLineage, ConsensusError> {
    let lineage = taxonomy.lineage(taxid)?;

    // Most specific lineage member is the query taxon itself.
    let tip = lineage[lineage.len() - 1];
    let tip_rank = taxonomy
        .rank(tip)
        .ok_or(ConsensusError::UnknownTaxon(tip))?;
    let query_pos = rank_scale.position(tip_rank)?;

    // Invert to rank-name -> taxid. A proper lineage has each rank at most
    // once; if the reference disagrees, the more specific member wins.
    let ranks = taxonomy.ranks(&lineage);
    let mut by_rank: AHashMap<&str, u32> = AHashMap::with_capacity(lineage.len());
    for member in &lineage {
        if let Some(&rank) = ranks.get(member) {
            by_rank.insert(rank, *member);
        }
    }

    let mut normalized = NormalizedLineage::with_capacity(ranks_of_interest.len());
    for rank in ranks_of_interest {
        let pos = rank_scale.position(rank)?;
        if pos < query_pos {
            // would be more specific than the query itself
            continue;
        }
        let value = match by_rank.get(rank.as_str()) {
            Some(&member) => RankValue::Taxon(member),
            None => RankValue::Unidentified,
        };
        normalized.insert(rank.clone(), value);
    }
    Ok(normalized)
}
