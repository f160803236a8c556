use crate::archive::ArchiveSession;
use crate::catalog::{self, Scan};
use crate::config::AppConfig;
use crate::dicom::{DicomHeaderProbe, ModalityProbe};
use crate::error::Error;
use crate::layout;
use crate::naming::{self, NamingRule};
use crate::progress::ExportReporter;
use crate::resources::{self, Disambiguation, SkipReason, SourceChoice};
use crate::transfer::{self, FileEntry, OutputAssignment, ScanOutcome};
use std::collections::HashMap;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Drives one session export end to end: catalog, naming, disambiguation,
/// transfer. One scan is fully processed before the next begins; the only
/// mutable cross-scan state is the collision counter inside name
/// assignment.
pub struct ExportEngine {
    config: AppConfig,
}

#[derive(Debug)]
pub struct ExportResult {
    pub project: String,
    pub subject: String,
    pub scans_found: usize,
    pub scans_transferred: usize,
    pub files_transferred: usize,
    pub skipped: Vec<(String, SkipReason)>,
    pub catalog_duration: Duration,
    pub transfer_duration: Duration,
}

impl ExportEngine {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    /// Connect to the archive and export with the real DICOM header probe.
    pub fn export(&self, reporter: &dyn ExportReporter) -> Result<ExportResult, Error> {
        let session = ArchiveSession::connect(&self.config)?;
        self.export_with(&session, &DicomHeaderProbe, reporter)
    }

    /// Export against an existing archive session and modality probe.
    ///
    /// Fatal archive errors propagate out of this call; every per-scan
    /// condition is recorded as a skip and processing continues.
    pub fn export_with(
        &self,
        session: &ArchiveSession,
        probe: &dyn ModalityProbe,
        reporter: &dyn ExportReporter,
    ) -> Result<ExportResult, Error> {
        let session_id = &self.config.session;

        // Phase 1: catalog and name assignment
        let catalog_start = Instant::now();
        let (project, subject) = self.project_and_subject(session)?;
        info!("Project {}, subject {}", project, subject);

        let name_map = self.load_name_map(session, &project)?;
        let mut scans = catalog::fetch_scan_catalog(session, session_id)?;
        let scans_found = scans.len();
        reporter.on_catalog_loaded(session_id, scans_found);

        // Reversed so collision run numbering lands in ascending
        // acquisition order.
        scans.reverse();
        let assignments = naming::assign_names(&scans, &name_map);
        let catalog_duration = catalog_start.elapsed();

        let session_dir = layout::session_directory(
            Path::new(&self.config.bids_root_dir),
            &project,
            &subject,
            session_id,
        );

        // Phase 2: per-scan disambiguation and transfer
        let transfer_start = Instant::now();
        let mut scans_transferred = 0usize;
        let mut files_transferred = 0usize;
        let mut skipped: Vec<(String, SkipReason)> = Vec::new();

        for (scan, assignment) in scans.iter().zip(&assignments) {
            let output_name =
                layout::output_name(self.config.layout, &subject, &assignment.output_name);
            debug!("Beginning process for scan {}", scan.id);
            reporter.on_scan_start(&scan.id, &output_name);

            let outcome =
                self.process_scan(session, session_id, scan, &output_name, &session_dir, probe, reporter)?;
            match outcome {
                ScanOutcome::Transferred { files } => {
                    scans_transferred += 1;
                    files_transferred += files;
                    reporter.on_scan_transferred(&scan.id, files);
                }
                ScanOutcome::Skipped(reason) => {
                    info!("Skipping scan {}: {}", scan.id, reason);
                    reporter.on_scan_skipped(&scan.id, reason);
                    skipped.push((scan.id.clone(), reason));
                }
            }
        }
        let transfer_duration = transfer_start.elapsed();

        reporter.on_export_complete(scans_transferred, skipped.len());

        Ok(ExportResult {
            project,
            subject,
            scans_found,
            scans_transferred,
            files_transferred,
            skipped,
            catalog_duration,
            transfer_duration,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn process_scan(
        &self,
        session: &ArchiveSession,
        session_id: &str,
        scan: &Scan,
        output_name: &str,
        session_dir: &Path,
        probe: &dyn ModalityProbe,
        reporter: &dyn ExportReporter,
    ) -> Result<ScanOutcome, Error> {
        let records = session.scan_resources(session_id, &scan.id)?;
        let choice = match resources::choose_source(&scan.id, &records, self.config.overwrite) {
            Disambiguation::Use(choice) => choice,
            Disambiguation::Skip(reason) => return Ok(ScanOutcome::Skipped(reason)),
        };

        let assignment = OutputAssignment {
            scan_id: scan.id.clone(),
            output_name: output_name.to_string(),
            output_directory: session_dir.join(output_name),
        };

        // Destination guard comes before the file listing: a populated
        // directory means a prior run already got here.
        if let Some(reason) = transfer::prepare_destination(&assignment.output_directory)? {
            return Ok(ScanOutcome::Skipped(reason));
        }

        let files = self.fetch_files(session, session_id, &scan.id, &choice)?;
        transfer::transfer_representation(
            session,
            &assignment,
            &files,
            choice.is_primary(),
            probe,
            reporter,
        )
    }

    fn fetch_files(
        &self,
        session: &ArchiveSession,
        session_id: &str,
        scan_id: &str,
        choice: &SourceChoice,
    ) -> Result<Vec<FileEntry>, Error> {
        let records = match choice {
            SourceChoice::Primary(_) => session.primary_files(session_id, scan_id)?,
            SourceChoice::Legacy(rep) => {
                // choose_source guarantees the id is present for legacy picks
                let resource_id = rep.resource_id.as_deref().unwrap_or_default();
                session.legacy_files(session_id, resource_id)?
            }
        };
        Ok(records.into_iter().map(FileEntry::from_record).collect())
    }

    /// Project and subject from configuration overrides, falling back to
    /// session experiment metadata and, for the subject label, the
    /// secondary subject-metadata lookup.
    fn project_and_subject(&self, session: &ArchiveSession) -> Result<(String, String), Error> {
        match (self.config.project.clone(), self.config.subject.clone()) {
            (Some(project), Some(subject)) => Ok((project, subject)),
            (project, subject) => {
                let record = session.session_record(&self.config.session)?;
                let project = project.unwrap_or(record.project);
                let subject = match subject {
                    Some(subject) => subject,
                    None => session.subject_label(&record.subject_id)?,
                };
                Ok((project, subject))
            }
        }
    }

    fn load_name_map(
        &self,
        session: &ArchiveSession,
        project: &str,
    ) -> Result<HashMap<String, String>, Error> {
        let project_rules: Vec<NamingRule> = session
            .project_naming_rules(project)?
            .into_iter()
            .filter_map(NamingRule::from_record)
            .collect();
        let site_rules: Vec<NamingRule> = session
            .site_naming_rules()?
            .into_iter()
            .filter_map(NamingRule::from_record)
            .collect();
        debug!(
            "Naming rules: {} project, {} site",
            project_rules.len(),
            site_rules.len()
        );
        Ok(naming::build_name_map(project_rules, site_rules))
    }
}
