//src/ranks.rs

use ahash::AHashMap;

use crate::error::ConsensusError;

/// Default scale, least specific slot first. Position 0 is "no rank" so the
/// reference taxonomy's unplaced nodes always have a home on the scale.
pub const DEFAULT_RANK_SCALE: [&str; 9] = [
    "no rank",
    "species",
    "genus",
    "family",
    "order",
    "class",
    "phylum",
    "kingdom",
    "superkingdom",
];

/// Ranks reported in the output table, in output column order.
pub const DEFAULT_RANKS_OF_INTEREST: [&str; 5] =
    ["superkingdom", "order", "family", "genus", "species"];

/// The fixed total order of rank names for one run. Built once at startup;
/// duplicate names are a configuration error.
#[derive(Debug, Clone)]
pub struct RankScale {
    names: Vec<String>,
    positions: AHashMap<String, usize>,
}

impl RankScale {
    pub fn new<I, S>(names: I) -> Result<Self, ConsensusError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.is_empty() {
            return Err(ConsensusError::EmptyRankScale);
        }
        let mut positions = AHashMap::with_capacity(names.len());
        for (pos, name) in names.iter().enumerate() {
            if positions.insert(name.clone(), pos).is_some() {
                return Err(ConsensusError::DuplicateRank(name.clone()));
            }
        }
        Ok(Self { names, positions })
    }

    /// Scale position of a rank name. Unknown names are a configuration
    /// error, not a per-record condition.
    pub fn position(&self, rank: &str) -> Result<usize, ConsensusError> {
        self.positions
            .get(rank)
            .copied()
            .ok_or_else(|| ConsensusError::UnknownRank(rank.to_string()))
    }

    pub fn contains(&self, rank: &str) -> bool {
        self.positions.contains_key(rank)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

impl Default for RankScale {
    fn default() -> Self {
        // DEFAULT_RANK_SCALE has no duplicates, so this cannot fail
        match Self::new(DEFAULT_RANK_SCALE) {
            Ok(scale) => scale,
            Err(_) => unreachable!("default rank scale is duplicate-free"),
        }
    }
}
