use crate::config::OutputLayout;
use std::path::{Path, PathBuf};

/// Investigator handle for the top-level directory: the lowercased project
/// label up to the first dash.
pub fn investigator_from_project(project: &str) -> String {
    let lowered = project.to_lowercase();
    match lowered.split('-').next() {
        Some(first) => first.to_string(),
        None => lowered,
    }
}

/// Session-level directory:
/// `<root>/<investigator>/<project>/xnat-export/sub-<subject>/ses-<session>`.
pub fn session_directory(root: &Path, project: &str, subject: &str, session_id: &str) -> PathBuf {
    root.join(investigator_from_project(project))
        .join(project)
        .join("xnat-export")
        .join(format!("sub-{}", subject))
        .join(format!("ses-{}", session_id))
}

/// Final output name for a scan under the selected layout.
pub fn output_name(layout: OutputLayout, subject: &str, resolved: &str) -> String {
    match layout {
        OutputLayout::Sourcedata => resolved.to_string(),
        OutputLayout::Bids => format!("sub-{}_{}", subject, resolved),
    }
}
