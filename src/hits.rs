//src/hits.rs

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use ahash::AHashMap;
use flate2::read::MultiGzDecoder;

use crate::error::ConsensusError;
use crate::types::{Hit, HitGroup};

/// Reads the BLAST hit table (header required, columns
/// `query,gi,pident,evalue,tax_id`) and groups rows by query in first-seen
/// order, so repeated runs chunk identically. Tables ending in `.gz` are
/// read through a gzip decoder.
///
/// A malformed row (missing column, non-numeric `pident`/`tax_id`) fails the
/// whole read; silently dropping rows would corrupt the consensus counts
/// downstream. `nrows` caps how many rows are read, for partial runs.
pub fn read_hit_table<P: AsRef<Path>>(
    path: P,
    nrows: Option<usize>,
) -> Result<Vec<HitGroup>, ConsensusError> {
    let f = File::open(&path)?;

    let is_gz = path
        .as_ref()
        .extension()
        .map(|ext| ext == "gz")
        .unwrap_or(false);

    let reader: Box<dyn Read> = if is_gz {
        Box::new(BufReader::new(MultiGzDecoder::new(f)))
    } else {
        Box::new(BufReader::new(f))
    };

    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(reader);

    let mut groups: Vec<HitGroup> = Vec::new();
    let mut group_of: AHashMap<String, usize> = AHashMap::new();
    let mut rows = 0usize;

    for row in csv_reader.deserialize::<Hit>() {
        if let Some(cap) = nrows {
            if rows >= cap {
                break;
            }
        }
        let hit = row?;
        rows += 1;

        match group_of.get(&hit.query) {
            Some(&idx) => groups[idx].hits.push(hit),
            None => {
                group_of.insert(hit.query.clone(), groups.len());
                groups.push(HitGroup {
                    query: hit.query.clone(),
                    hits: vec![hit],
                });
            }
        }
    }

    log::info!("Read {} hits across {} queries", rows, groups.len());
    Ok(groups)
}
