use super::models::{
    FileRecord, NamingRuleRecord, ResourceRecord, ResultSet, ScanRecord, SessionRecord,
    SubjectRecord,
};
use crate::config::AppConfig;
use crate::error::Error;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info};

/// Shared archive session handle: one blocking HTTP client plus
/// credentials, read-only after setup and reused for every request of the
/// run. Any connection error or non-2xx on a required endpoint is fatal;
/// only the two naming-rule lookups tolerate a missing document.
pub struct ArchiveSession {
    client: reqwest::blocking::Client,
    base_url: String,
    user: String,
    password: String,
}

impl ArchiveSession {
    pub fn connect(config: &AppConfig) -> Result<Self, Error> {
        let client = reqwest::blocking::Client::builder()
            .danger_accept_invalid_certs(config.insecure)
            .timeout(Duration::from_secs(300))
            .user_agent("xnat2bids/0.1")
            .build()?;

        Ok(ArchiveSession {
            client,
            base_url: AppConfig::clean_server(&config.host),
            user: config.user.clone(),
            password: config.password.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ── Required endpoints ───────────────────────────────────────

    /// Project and subject id for a session experiment.
    pub fn session_record(&self, session: &str) -> Result<SessionRecord, Error> {
        let path = format!("/data/experiments/{}", session);
        let rows: Vec<SessionRecord> = self.get_rows(
            &path,
            &[
                ("format", "json"),
                ("handler", "values"),
                ("columns", "project,subject_ID"),
            ],
        )?;
        rows.into_iter().next().ok_or_else(|| Error::MalformedResponse {
            url: path,
            detail: "empty result set".to_string(),
        })
    }

    /// Human-readable label for a subject id.
    pub fn subject_label(&self, subject_id: &str) -> Result<String, Error> {
        let path = format!("/data/subjects/{}", subject_id);
        let rows: Vec<SubjectRecord> = self.get_rows(
            &path,
            &[("format", "json"), ("handler", "values"), ("columns", "label")],
        )?;
        rows.into_iter()
            .next()
            .map(|record| record.label)
            .ok_or_else(|| Error::MalformedResponse {
                url: path,
                detail: "empty result set".to_string(),
            })
    }

    /// Ordered scan list for a session.
    pub fn scan_list(&self, session: &str) -> Result<Vec<ScanRecord>, Error> {
        self.get_rows(
            &format!("/data/experiments/{}/scans", session),
            &[("format", "json")],
        )
    }

    /// Stored representations available for one scan.
    pub fn scan_resources(&self, session: &str, scan_id: &str) -> Result<Vec<ResourceRecord>, Error> {
        self.get_rows(
            &format!("/data/experiments/{}/scans/{}/resources", session, scan_id),
            &[("format", "json")],
        )
    }

    /// File listing for a primary representation: URI-locator rows with a
    /// second absolutePath-locator pass merged in by file name.
    pub fn primary_files(&self, session: &str, scan_id: &str) -> Result<Vec<FileRecord>, Error> {
        self.files_with_paths(&format!(
            "/data/experiments/{}/scans/{}/resources/DICOM/files",
            session, scan_id
        ))
    }

    /// File listing for a legacy representation, addressed by its opaque
    /// resource id.
    pub fn legacy_files(&self, session: &str, resource_id: &str) -> Result<Vec<FileRecord>, Error> {
        self.files_with_paths(&format!(
            "/data/experiments/{}/resources/{}/files",
            session, resource_id
        ))
    }

    fn files_with_paths(&self, path: &str) -> Result<Vec<FileRecord>, Error> {
        let mut files: Vec<FileRecord> = self.get_rows(path, &[("format", "json")])?;

        // The archive only reports filesystem paths under the dedicated
        // locator, so a second request is needed to fill them in.
        let with_paths: Vec<FileRecord> =
            self.get_rows(path, &[("format", "json"), ("locator", "absolutePath")])?;
        for record in &mut files {
            if let Some(found) = with_paths.iter().find(|p| p.name == record.name) {
                record.absolute_path = found.absolute_path.clone();
            }
        }

        Ok(files)
    }

    /// Open a streaming GET for a file URI. Relative URIs are resolved
    /// against the archive host.
    pub fn stream_file(&self, uri: &str) -> Result<reqwest::blocking::Response, Error> {
        let url = if uri.starts_with("http") {
            uri.to_string()
        } else {
            format!("{}{}", self.base_url, uri)
        };
        let response = self
            .client
            .get(&url)
            .basic_auth(&self.user, Some(&self.password))
            .send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::ArchiveStatus {
                status: status.as_u16(),
                url,
            });
        }
        Ok(response)
    }

    // ── Optional endpoints ───────────────────────────────────────

    /// Naming rules from the project-scope bidsmap document. A non-success
    /// status here means "no map", not an error.
    pub fn project_naming_rules(&self, project: &str) -> Result<Vec<NamingRuleRecord>, Error> {
        self.optional_rules(&format!(
            "/data/projects/{}/resources/config/files/bidsmap.json",
            project
        ))
    }

    /// Naming rules from the site-wide config service.
    pub fn site_naming_rules(&self) -> Result<Vec<NamingRuleRecord>, Error> {
        self.optional_rules("/data/config/bids/bidsmap")
    }

    fn optional_rules(&self, path: &str) -> Result<Vec<NamingRuleRecord>, Error> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .basic_auth(&self.user, Some(&self.password))
            .query(&[("contents", "true")])
            .send()?;
        if !response.status().is_success() {
            info!("No naming rules at {} ({})", url, response.status());
            return Ok(Vec::new());
        }
        Ok(response.json()?)
    }

    // ── Plumbing ─────────────────────────────────────────────────

    fn get_rows<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>, Error> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {}", url);
        let response = self
            .client
            .get(&url)
            .basic_auth(&self.user, Some(&self.password))
            .query(query)
            .send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::ArchiveStatus {
                status: status.as_u16(),
                url,
            });
        }
        let parsed: ResultSet<T> = response.json()?;
        Ok(parsed.result_set.result)
    }
}
