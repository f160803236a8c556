use crate::archive::{ArchiveSession, FileRecord};
use crate::dicom::{self, ModalityProbe};
use crate::error::Error;
use crate::progress::ExportReporter;
use crate::resources::SkipReason;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const STREAM_CHUNK_SIZE: usize = 1024;

/// Where one scan's files land on disk. Created per scan per run and
/// discarded after transfer or skip.
#[derive(Debug, Clone)]
pub struct OutputAssignment {
    pub scan_id: String,
    pub output_name: String,
    pub output_directory: PathBuf,
}

/// One file belonging to a representation. `local_path` is present only
/// when the archive shares a filesystem with this process.
#[derive(Debug, Clone)]
pub struct FileEntry {
    pub name: String,
    pub remote_uri: String,
    pub local_path: Option<PathBuf>,
}

impl FileEntry {
    pub fn from_record(record: FileRecord) -> FileEntry {
        FileEntry {
            name: record.name,
            remote_uri: record.uri,
            local_path: record.absolute_path.map(PathBuf::from),
        }
    }
}

/// How a file made it to disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferMethod {
    Linked,
    Copied,
    Streamed,
    /// The remote stream ended before the first byte; the output file was
    /// discarded.
    EmptyDiscarded,
}

/// Outcome of one scan's transfer, consumed by the outer per-scan loop.
#[derive(Debug, Clone)]
pub enum ScanOutcome {
    Transferred { files: usize },
    Skipped(SkipReason),
}

/// Create the destination leaf directory (idempotent, recursive). An
/// existing non-empty directory is a skip, never a merge or overwrite.
pub fn prepare_destination(directory: &Path) -> Result<Option<SkipReason>, Error> {
    fs::create_dir_all(directory)?;
    if fs::read_dir(directory)?.next().is_some() {
        warn!("Destination {} is not empty", directory.display());
        return Ok(Some(SkipReason::DestinationNotEmpty));
    }
    Ok(None)
}

/// Transfer every file of a representation into the assignment's
/// directory, sequentially and in listing order.
///
/// The first file is transferred alone and, when `gate_on_headers` is set,
/// fed to the modality probe; a secondary-capture or structured-report
/// modality aborts the scan before the remaining files are touched, as
/// does an unreadable header.
pub fn transfer_representation(
    session: &ArchiveSession,
    assignment: &OutputAssignment,
    files: &[FileEntry],
    gate_on_headers: bool,
    probe: &dyn ModalityProbe,
    reporter: &dyn ExportReporter,
) -> Result<ScanOutcome, Error> {
    let Some((first, rest)) = files.split_first() else {
        return Ok(ScanOutcome::Skipped(SkipReason::EmptyRepresentation));
    };

    let mut transferred = 0usize;
    let first_path = assignment.output_directory.join(&first.name);
    let method = fetch_file(session, first, &first_path)?;
    reporter.on_file_transferred(&assignment.scan_id, &first.name, method);
    if method != TransferMethod::EmptyDiscarded {
        transferred += 1;
    }

    if gate_on_headers {
        match probe.modality(&first_path) {
            Some(modality) if dicom::is_secondary(&modality) => {
                warn!(
                    "Scan {} is a {} series; excluding from conversion",
                    assignment.scan_id, modality
                );
                return Ok(ScanOutcome::Skipped(SkipReason::SecondaryCapture));
            }
            Some(modality) => {
                debug!("Scan {} modality: {}", assignment.scan_id, modality);
            }
            None => {
                warn!("Could not read a modality for scan {}", assignment.scan_id);
                return Ok(ScanOutcome::Skipped(SkipReason::UnreadableModality));
            }
        }
    }

    for entry in rest {
        let target = assignment.output_directory.join(&entry.name);
        let method = fetch_file(session, entry, &target)?;
        reporter.on_file_transferred(&assignment.scan_id, &entry.name, method);
        if method != TransferMethod::EmptyDiscarded {
            transferred += 1;
        }
    }

    Ok(ScanOutcome::Transferred { files: transferred })
}

/// Materialize one file: hard link when the archive path is readable
/// locally (byte copy when the filesystem refuses the link), otherwise
/// stream the remote URI.
fn fetch_file(
    session: &ArchiveSession,
    entry: &FileEntry,
    target: &Path,
) -> Result<TransferMethod, Error> {
    if let Some(local) = entry.local_path.as_deref() {
        if is_readable(local) {
            return link_or_copy(local, target);
        }
    }
    stream_to_disk(session, &entry.remote_uri, target)
}

fn is_readable(path: &Path) -> bool {
    File::open(path).is_ok()
}

fn link_or_copy(source: &Path, target: &Path) -> Result<TransferMethod, Error> {
    match fs::hard_link(source, target) {
        Ok(()) => {
            debug!("Linked {} -> {}", source.display(), target.display());
            Ok(TransferMethod::Linked)
        }
        Err(err) => {
            debug!("Link refused for {} ({}); copying", source.display(), err);
            fs::copy(source, target)?;
            Ok(TransferMethod::Copied)
        }
    }
}

fn stream_to_disk(
    session: &ArchiveSession,
    uri: &str,
    target: &Path,
) -> Result<TransferMethod, Error> {
    let mut response = session.stream_file(uri)?;
    let mut output = File::create(target)?;
    let mut buffer = [0u8; STREAM_CHUNK_SIZE];
    let mut total = 0usize;

    loop {
        let read = response.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        output.write_all(&buffer[..read])?;
        total += read;
    }

    if total == 0 {
        drop(output);
        fs::remove_file(target)?;
        warn!("Remote stream for {} was empty; output discarded", uri);
        return Ok(TransferMethod::EmptyDiscarded);
    }

    debug!("Streamed {} bytes to {}", total, target.display());
    Ok(TransferMethod::Streamed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_prepare_destination_creates_missing_directory() {
        let tmp = tempdir().unwrap();
        let target = tmp.path().join("a").join("b");
        assert_eq!(prepare_destination(&target).unwrap(), None);
        assert!(target.is_dir());
    }

    #[test]
    fn test_prepare_destination_accepts_existing_empty_directory() {
        let tmp = tempdir().unwrap();
        assert_eq!(prepare_destination(tmp.path()).unwrap(), None);
    }

    #[test]
    fn test_prepare_destination_skips_non_empty_directory() {
        let tmp = tempdir().unwrap();
        fs::write(tmp.path().join("leftover.dcm"), "x").unwrap();
        assert_eq!(
            prepare_destination(tmp.path()).unwrap(),
            Some(SkipReason::DestinationNotEmpty)
        );
    }

    #[test]
    fn test_link_or_copy_links_local_source() {
        let tmp = tempdir().unwrap();
        let source = tmp.path().join("source.dcm");
        fs::write(&source, "image bytes").unwrap();
        let target = tmp.path().join("target.dcm");

        let method = link_or_copy(&source, &target).unwrap();
        assert!(matches!(method, TransferMethod::Linked | TransferMethod::Copied));
        assert_eq!(fs::read_to_string(&target).unwrap(), "image bytes");
    }
}
