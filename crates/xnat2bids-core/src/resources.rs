use crate::archive::ResourceRecord;
use std::fmt;
use tracing::warn;

/// Resource label of the primary stored representation.
pub const PRIMARY_LABEL: &str = "DICOM";
/// Resource label of the legacy scanner-format representation.
pub const LEGACY_LABEL: &str = "IMA";
/// Resource label left behind by a finished conversion.
pub const FINISHED_LABEL: &str = "NIFTI";

/// File count as reported by the archive. A blank field is a typed
/// unknown, not zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileCount {
    Known(u64),
    Unknown,
}

impl FileCount {
    pub fn parse(raw: &str) -> FileCount {
        match raw.trim().parse::<u64>() {
            Ok(count) => FileCount::Known(count),
            Err(_) => FileCount::Unknown,
        }
    }
}

/// One stored representation of a scan's image data.
#[derive(Debug, Clone)]
pub struct Representation {
    pub label: String,
    pub file_count: FileCount,
    pub resource_id: Option<String>,
}

impl Representation {
    fn from_record(record: &ResourceRecord) -> Representation {
        let resource_id = match record.xnat_abstractresource_id.trim() {
            "" => None,
            id => Some(id.to_string()),
        };
        Representation {
            label: record.label.clone(),
            file_count: FileCount::parse(&record.file_count),
            resource_id,
        }
    }
}

/// Why a scan was excluded from transfer. A skip never aborts the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    AlreadyConverted,
    NoSourceData,
    AmbiguousSource,
    MissingResourceId,
    EmptyRepresentation,
    DestinationNotEmpty,
    SecondaryCapture,
    UnreadableModality,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::AlreadyConverted => "already-converted",
            SkipReason::NoSourceData => "no-source-data",
            SkipReason::AmbiguousSource => "ambiguous-source",
            SkipReason::MissingResourceId => "missing-resource-id",
            SkipReason::EmptyRepresentation => "empty-representation",
            SkipReason::DestinationNotEmpty => "destination-not-empty",
            SkipReason::SecondaryCapture => "secondary-capture",
            SkipReason::UnreadableModality => "unreadable-modality",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The representation chosen for transfer. Legacy representations are
/// addressed by their opaque resource id and carry no structured headers
/// for the modality gate.
#[derive(Debug, Clone)]
pub enum SourceChoice {
    Primary(Representation),
    Legacy(Representation),
}

impl SourceChoice {
    pub fn representation(&self) -> &Representation {
        match self {
            SourceChoice::Primary(rep) | SourceChoice::Legacy(rep) => rep,
        }
    }

    pub fn is_primary(&self) -> bool {
        matches!(self, SourceChoice::Primary(_))
    }
}

/// Outcome of disambiguating one scan's stored representations.
#[derive(Debug, Clone)]
pub enum Disambiguation {
    Use(SourceChoice),
    Skip(SkipReason),
}

/// Decide which single stored representation of a scan to use, or skip
/// with a reason:
///
/// - finished output present and overwrite not requested → already-converted
/// - no primary, no legacy → no-source-data
/// - exactly one primary → use it, whatever the legacy count
/// - no primary, exactly one legacy → use it (requires its resource id)
/// - anything else → ambiguous-source
///
/// A chosen representation reporting zero files is skipped; a blank file
/// count is logged and transferred unverified.
pub fn choose_source(scan_id: &str, records: &[ResourceRecord], overwrite: bool) -> Disambiguation {
    if !overwrite && records.iter().any(|record| record.label == FINISHED_LABEL) {
        return Disambiguation::Skip(SkipReason::AlreadyConverted);
    }

    let primaries: Vec<&ResourceRecord> = records
        .iter()
        .filter(|record| record.label == PRIMARY_LABEL)
        .collect();
    let legacies: Vec<&ResourceRecord> = records
        .iter()
        .filter(|record| record.label == LEGACY_LABEL)
        .collect();

    let choice = match (primaries.len(), legacies.len()) {
        (0, 0) => return Disambiguation::Skip(SkipReason::NoSourceData),
        (1, _) => SourceChoice::Primary(Representation::from_record(primaries[0])),
        (0, 1) => {
            let rep = Representation::from_record(legacies[0]);
            if rep.resource_id.is_none() {
                return Disambiguation::Skip(SkipReason::MissingResourceId);
            }
            SourceChoice::Legacy(rep)
        }
        _ => return Disambiguation::Skip(SkipReason::AmbiguousSource),
    };

    match choice.representation().file_count {
        FileCount::Known(0) => Disambiguation::Skip(SkipReason::EmptyRepresentation),
        FileCount::Known(_) => Disambiguation::Use(choice),
        FileCount::Unknown => {
            warn!(
                "Scan {} has a blank file count; cannot verify it is non-empty",
                scan_id
            );
            Disambiguation::Use(choice)
        }
    }
}
