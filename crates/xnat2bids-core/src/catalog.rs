use crate::archive::{ArchiveSession, ScanRecord};
use crate::error::Error;
use tracing::{debug, info};

/// One acquisition within an imaging session. `label` is the series
/// description with the whole-list scan-type fallback already applied.
/// Immutable once read.
#[derive(Debug, Clone)]
pub struct Scan {
    pub id: String,
    pub label: String,
}

/// Fetch the ordered scan list for a session. Archive order is preserved;
/// the name resolver reverses it to restore ascending run numbering.
pub fn fetch_scan_catalog(session: &ArchiveSession, session_id: &str) -> Result<Vec<Scan>, Error> {
    let records = session.scan_list(session_id)?;
    info!("Found {} scans for session {}", records.len(), session_id);
    Ok(build_catalog(records))
}

/// Pair scan ids with their effective labels. When *every* series
/// description in the session is blank, each scan's acquisition-type field
/// substitutes for its label; a partially-blank list is left untouched.
pub fn build_catalog(records: Vec<ScanRecord>) -> Vec<Scan> {
    let all_blank =
        !records.is_empty() && records.iter().all(|record| record.series_description.is_empty());
    if all_blank {
        debug!("All series descriptions are blank, falling back to scan types");
    }

    records
        .into_iter()
        .map(|record| {
            let label = if all_blank {
                record.scan_type
            } else {
                record.series_description
            };
            Scan { id: record.id, label }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, series_description: &str, scan_type: &str) -> ScanRecord {
        ScanRecord {
            id: id.to_string(),
            series_description: series_description.to_string(),
            scan_type: scan_type.to_string(),
        }
    }

    #[test]
    fn test_all_blank_labels_fall_back_to_scan_type() {
        let records = vec![record("1", "", "T1w"), record("2", "", "T1w"), record("3", "", "T1w")];
        let catalog = build_catalog(records);
        let labels: Vec<&str> = catalog.iter().map(|scan| scan.label.as_str()).collect();
        assert_eq!(labels, vec!["T1w", "T1w", "T1w"]);
    }

    #[test]
    fn test_partially_blank_labels_are_left_untouched() {
        let records = vec![record("1", "MPRAGE", "T1w"), record("2", "", "T1w")];
        let catalog = build_catalog(records);
        assert_eq!(catalog[0].label, "MPRAGE");
        assert_eq!(catalog[1].label, "");
    }

    #[test]
    fn test_archive_order_is_preserved() {
        let records = vec![record("3", "a", ""), record("1", "b", ""), record("2", "c", "")];
        let catalog = build_catalog(records);
        let ids: Vec<&str> = catalog.iter().map(|scan| scan.id.as_str()).collect();
        assert_eq!(ids, vec!["3", "1", "2"]);
    }
}
