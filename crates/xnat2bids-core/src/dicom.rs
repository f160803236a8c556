use std::path::Path;
use tracing::debug;

/// Modality codes marking a non-diagnostic series: secondary captures and
/// structured reports.
pub const SECONDARY_MODALITIES: [&str; 2] = ["SC", "SR"];

/// Reads the acquisition-modality field out of a transferred file's
/// structured headers. `None` means the header is absent or the file is
/// unreadable; callers treat both the same way.
pub trait ModalityProbe: Send + Sync {
    fn modality(&self, path: &Path) -> Option<String>;
}

/// Probe backed by a real DICOM parse of the file on disk.
pub struct DicomHeaderProbe;

impl ModalityProbe for DicomHeaderProbe {
    fn modality(&self, path: &Path) -> Option<String> {
        let object = match dicom_object::open_file(path) {
            Ok(object) => object,
            Err(err) => {
                debug!("Could not parse {} as DICOM: {}", path.display(), err);
                return None;
            }
        };

        let element = object.element_by_name("Modality").ok()?;
        let value = element.to_str().ok()?;
        let modality = value.trim().trim_matches(|c| c == '\'' || c == '"').to_string();
        if modality.is_empty() {
            None
        } else {
            Some(modality)
        }
    }
}

pub fn is_secondary(modality: &str) -> bool {
    SECONDARY_MODALITIES.contains(&modality)
}
