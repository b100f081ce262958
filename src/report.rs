//src/report.rs

use std::path::Path;

use crate::error::ConsensusError;
use crate::types::ConsensusRecord;

/// Deterministic per-worker output file name.
pub fn output_file_name(index: usize) -> String {
    format!("consensus_taxonomy_{index}.csv")
}

/// Writes the consensus table: `query,consensus_taxon_id,pident,hits`
/// followed by one nullable-integer column per rank of interest. A rank
/// omitted from a record's lineage (more specific than the consensus taxon)
/// renders as an empty field; an unidentified rank as the sentinel id.
pub fn write_consensus_table<P: AsRef<Path>>(
    path: P,
    records: &[ConsensusRecord],
    ranks_of_interest: &[String],
) -> Result<(), ConsensusError> {
    let mut writer = csv::Writer::from_path(path)?;

    let mut header = vec!["query", "consensus_taxon_id", "pident", "hits"];
    header.extend(ranks_of_interest.iter().map(String::as_str));
    writer.write_record(&header)?;

    for record in records {
        let mut row = vec![
            record.query.clone(),
            record.consensus_taxon_id.to_string(),
            record.pident.to_string(),
            record.hits.to_string(),
        ];
        for rank in ranks_of_interest {
            match record.lineage.get(rank) {
                Some(value) => row.push(value.column_value().to_string()),
                None => row.push(String::new()),
            }
        }
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}
