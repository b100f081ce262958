//src/taxdb.rs

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use ahash::AHashMap;

use crate::error::ConsensusError;

pub type ParentMap = AHashMap<u32, u32>;
pub type NameMap = AHashMap<u32, String>;
pub type RankMap = AHashMap<u32, String>;

/// Read-only facade over the reference taxonomy, loaded once per process
/// from a taxDB file in the format:
/// ```text
/// <taxid>\t<parentid>\t<taxname>\t<rank>
/// ```
/// A root node is its own parent.
#[derive(Debug, Clone)]
pub struct TaxonomyLookup {
    parent_map: ParentMap,
    name_map: NameMap,
    rank_map: RankMap,
}

impl TaxonomyLookup {
    /// Parses a taxDB file. Malformed lines are skipped; an unreadable file
    /// aborts the run.
    pub fn from_file<P: AsRef<Path>>(filepath: P) -> Result<Self, ConsensusError> {
        let file = File::open(filepath)?;
        let reader = BufReader::new(file);

        let mut parent_map: ParentMap = AHashMap::new();
        let mut name_map: NameMap = AHashMap::new();
        let mut rank_map: RankMap = AHashMap::new();

        for line_result in reader.lines() {
            let line = line_result?;
            // Expecting 4 tab-separated fields: taxid, parentid, taxname, rank
            // e.g. "2   131567   Bacteria   superkingdom"
            let parts: Vec<&str> = line.split('\t').collect();

            // Skip malformed lines
            if parts.len() < 4 {
                continue;
            }

            let taxid: u32 = parts[0].trim().parse().unwrap_or(0);
            let parentid: u32 = parts[1].trim().parse().unwrap_or(0);

            if taxid != 0 {
                parent_map.insert(taxid, parentid);
                name_map.insert(taxid, parts[2].trim().to_string());
                rank_map.insert(taxid, parts[3].trim().to_string());
            }
        }

        log::info!("Loaded reference taxonomy with {} taxa", parent_map.len());
        Ok(Self {
            parent_map,
            name_map,
            rank_map,
        })
    }

    /// Builds a lookup from pre-assembled maps. Used by embedded reference
    /// stores and by tests.
    pub fn from_maps(parent_map: ParentMap, name_map: NameMap, rank_map: RankMap) -> Self {
        Self {
            parent_map,
            name_map,
            rank_map,
        }
    }

    pub fn len(&self) -> usize {
        self.parent_map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parent_map.is_empty()
    }

    pub fn contains(&self, taxid: u32) -> bool {
        self.parent_map.contains_key(&taxid)
    }

    pub fn name(&self, taxid: u32) -> Option<&str> {
        self.name_map.get(&taxid).map(String::as_str)
    }

    /// Rank name of a single taxon, `None` if the store does not know it.
    pub fn rank(&self, taxid: u32) -> Option<&str> {
        self.rank_map.get(&taxid).map(String::as_str)
    }

    /// Rank names for a set of taxa. Unrecognized ids are omitted, not
    /// raised; the reference store is tolerant of partial knowledge.
    pub fn ranks(&self, taxids: &[u32]) -> AHashMap<u32, &str> {
        let mut out = AHashMap::with_capacity(taxids.len());
        for &taxid in taxids {
            if let Some(rank) = self.rank_map.get(&taxid) {
                out.insert(taxid, rank.as_str());
            }
        }
        out
    }

    /// Ancestor chain of `taxid`, root first, `taxid` last.
    /// Fails with `UnknownTaxon` when the id is absent from the store.
    pub fn lineage(&self, taxid: u32) -> Result<Vec<u32>, ConsensusError> {
        if !self.contains(taxid) {
            return Err(ConsensusError::UnknownTaxon(taxid));
        }

        let mut chain = vec![taxid];
        let mut seen = BTreeSet::from([taxid]);
        let mut node = taxid;
        while let Some(&parent) = self.parent_map.get(&node) {
            // root is its own parent; a missing or zero parent also stops
            if parent == node || parent == 0 {
                break;
            }
            // a corrupt reference file must fail, not hang
            if !seen.insert(parent) {
                return Err(ConsensusError::TaxonomyCycle(parent));
            }
            chain.push(parent);
            node = parent;
        }
        chain.reverse();
        Ok(chain)
    }

    /// Lowest common ancestor of `a` and `b` via the parent map.
    /// LCA(0, x) = x, LCA(x, 0) = x; falls back to the root (1) when the
    /// chains never meet.
    pub fn lca(&self, mut a: u32, mut b: u32) -> u32 {
        if a == 0 || b == 0 {
            return if a == 0 { b } else { a };
        }

        let mut a_anc = BTreeSet::new();
        while a > 1 {
            // revisiting a node means a cycle; stop climbing
            if !a_anc.insert(a) {
                break;
            }
            if let Some(&p) = self.parent_map.get(&a) {
                if p == a {
                    break;
                }
                a = p;
            } else {
                break;
            }
        }

        let mut b_seen = BTreeSet::new();
        while b > 1 {
            if a_anc.contains(&b) {
                return b;
            }
            if !b_seen.insert(b) {
                break;
            }
            if let Some(&p) = self.parent_map.get(&b) {
                if p == b {
                    break;
                }
                b = p;
            } else {
                break;
            }
        }
        1
    }

    /// LCA over a whole set, folding pairwise.
    pub fn lca_of_set<I: IntoIterator<Item = u32>>(&self, taxids: I) -> u32 {
        let mut iter = taxids.into_iter();
        let Some(first) = iter.next() else {
            return 0;
        };
        iter.fold(first, |acc, t| self.lca(acc, t))
    }

    /// Leaves of the minimal common-ancestor topology over `taxids`: the
    /// members of the set that have no other member strictly below them.
    /// Returned in ascending taxid order.
    pub fn topology_leaves(&self, taxids: &BTreeSet<u32>) -> Vec<u32> {
        // Mark every set member that is a strict ancestor of another member.
        let mut interior = BTreeSet::new();
        for &taxid in taxids {
            let mut node = taxid;
            let mut seen = BTreeSet::from([taxid]);
            while let Some(&parent) = self.parent_map.get(&node) {
                if parent == node || parent == 0 || !seen.insert(parent) {
                    break;
                }
                if taxids.contains(&parent) {
                    interior.insert(parent);
                }
                node = parent;
            }
        }
        taxids.iter().copied().filter(|t| !interior.contains(t)).collect()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;

    /// Small Enterobacteriaceae-shaped taxonomy with real NCBI ids:
    ///
    /// 1 root
    /// └ 2 Bacteria (superkingdom)
    ///   └ 1224 Proteobacteria (phylum)
    ///     └ 91347 Enterobacterales (order)
    ///       └ 543 Enterobacteriaceae (family)
    ///         ├ 561 Escherichia (genus) ── 562 E. coli (species)
    ///         ├ 570 Klebsiella (genus) ── 573 K. pneumoniae (species)
    ///         └ 590 Salmonella (genus) ── 28901 S. enterica (species)
    /// └ 2759 Eukaryota (superkingdom)
    ///   └ 4932 S. cerevisiae (species)
    pub(crate) fn test_taxonomy() -> TaxonomyLookup {
        let rows: &[(u32, u32, &str, &str)] = &[
            (1, 1, "root", "no rank"),
            (2, 1, "Bacteria", "superkingdom"),
            (1224, 2, "Proteobacteria", "phylum"),
            (91347, 1224, "Enterobacterales", "order"),
            (543, 91347, "Enterobacteriaceae", "family"),
            (561, 543, "Escherichia", "genus"),
            (562, 561, "Escherichia coli", "species"),
            (570, 543, "Klebsiella", "genus"),
            (573, 570, "Klebsiella pneumoniae", "species"),
            (590, 543, "Salmonella", "genus"),
            (28901, 590, "Salmonella enterica", "species"),
            (2759, 1, "Eukaryota", "superkingdom"),
            (4932, 2759, "Saccharomyces cerevisiae", "species"),
        ];

        let mut parent_map = ParentMap::new();
        let mut name_map = NameMap::new();
        let mut rank_map = RankMap::new();
        for &(taxid, parent, name, rank) in rows {
            parent_map.insert(taxid, parent);
            name_map.insert(taxid, name.to_string());
            rank_map.insert(taxid, rank.to_string());
        }
        TaxonomyLookup::from_maps(parent_map, name_map, rank_map)
    }

    #[test]
    fn parses_taxdb_file_and_skips_malformed_lines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "1\t1\troot\tno rank").unwrap();
        writeln!(file, "2\t1\tBacteria\tsuperkingdom").unwrap();
        writeln!(file, "garbage line without tabs").unwrap();
        writeln!(file, "561\t2\tEscherichia\tgenus").unwrap();

        let taxonomy = TaxonomyLookup::from_file(file.path()).unwrap();
        assert_eq!(taxonomy.len(), 3);
        assert_eq!(taxonomy.name(2), Some("Bacteria"));
        assert_eq!(taxonomy.rank(561), Some("genus"));
        assert_eq!(taxonomy.lineage(561).unwrap(), vec![1, 2, 561]);
    }

    #[test]
    fn lineage_is_root_first() {
        let taxonomy = test_taxonomy();
        assert_eq!(
            taxonomy.lineage(562).unwrap(),
            vec![1, 2, 1224, 91347, 543, 561, 562]
        );
        assert_eq!(taxonomy.lineage(1).unwrap(), vec![1]);
    }

    #[test]
    fn lineage_of_unknown_taxon_fails() {
        let taxonomy = test_taxonomy();
        assert!(matches!(
            taxonomy.lineage(999_999),
            Err(ConsensusError::UnknownTaxon(999_999))
        ));
    }

    #[test]
    fn ranks_omits_unrecognized_ids() {
        let taxonomy = test_taxonomy();
        let ranks = taxonomy.ranks(&[562, 999_999, 543]);
        assert_eq!(ranks.len(), 2);
        assert_eq!(ranks.get(&562), Some(&"species"));
        assert_eq!(ranks.get(&543), Some(&"family"));
        assert!(!ranks.contains_key(&999_999));
    }

    #[test]
    fn lca_meets_at_shared_family() {
        let taxonomy = test_taxonomy();
        assert_eq!(taxonomy.lca(562, 573), 543);
        assert_eq!(taxonomy.lca(562, 562), 562);
        // zero behaves as "no information"
        assert_eq!(taxonomy.lca(0, 562), 562);
        // different superkingdoms only share the root
        assert_eq!(taxonomy.lca(562, 4932), 1);
    }

    #[test]
    fn lca_of_set_folds_pairwise() {
        let taxonomy = test_taxonomy();
        assert_eq!(taxonomy.lca_of_set([562, 573, 28901]), 543);
        assert_eq!(taxonomy.lca_of_set(std::iter::empty()), 0);
    }

    /// Corrupt reference with 5 -> 6 -> 5.
    fn cyclic_taxonomy() -> TaxonomyLookup {
        let mut parent_map = ParentMap::new();
        let mut name_map = NameMap::new();
        let mut rank_map = RankMap::new();
        for &(taxid, parent) in &[(1u32, 1u32), (5, 6), (6, 5)] {
            parent_map.insert(taxid, parent);
            name_map.insert(taxid, format!("taxon {taxid}"));
            rank_map.insert(taxid, "no rank".to_string());
        }
        TaxonomyLookup::from_maps(parent_map, name_map, rank_map)
    }

    #[test]
    fn cyclic_parent_chain_fails_instead_of_hanging() {
        let taxonomy = cyclic_taxonomy();
        assert!(matches!(
            taxonomy.lineage(5),
            Err(ConsensusError::TaxonomyCycle(5))
        ));
        // the LCA and topology walks terminate on the same data
        assert_eq!(taxonomy.lca(5, 6), 6);
        let ids: BTreeSet<u32> = [5, 6].into_iter().collect();
        assert_eq!(taxonomy.topology_leaves(&ids).len(), 0);
    }

    #[test]
    fn topology_leaves_drop_ancestors_of_members() {
        let taxonomy = test_taxonomy();
        // 2 -> 91347 -> 543 is a chain; only the deepest survives
        let ids: BTreeSet<u32> = [2, 91347, 543].into_iter().collect();
        assert_eq!(taxonomy.topology_leaves(&ids), vec![543]);

        // two genus-level leaves under the shared family
        let ids: BTreeSet<u32> = [543, 561, 570].into_iter().collect();
        assert_eq!(taxonomy.topology_leaves(&ids), vec![561, 570]);
    }
}
