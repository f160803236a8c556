use config::{Config, ConfigError, Environment, File as ConfigFile};
use serde::Deserialize;

/// How exported scans are named and placed under the session directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputLayout {
    /// Each scan becomes a leaf directory named by its resolved name.
    Sourcedata,
    /// Resolved names carry a `sub-<subject>_` prefix.
    Bids,
}

/// Fully merged settings for one export run.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub user: String,
    pub password: String,
    pub session: String,
    pub subject: Option<String>,
    pub project: Option<String>,
    pub bids_root_dir: String,
    pub overwrite: bool,
    pub insecure: bool,
    pub layout: OutputLayout,
}

impl AppConfig {
    /// Normalize a host string: trim whitespace, drop one trailing slash,
    /// default to https when no scheme is given.
    pub fn clean_server(host: &str) -> String {
        let mut host = host.trim().to_string();
        if host.ends_with('/') {
            host.pop();
        }
        if !host.contains("http") {
            host = format!("https://{}", host);
        }
        host
    }
}

/// Values sourced from Config.toml and `XNAT2BIDS_*` environment variables.
/// Everything is optional here; the CLI overlays its flags on top and the
/// merged result must produce a complete [`AppConfig`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    pub host: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub bids_root_dir: Option<String>,
    pub layout: Option<OutputLayout>,
}

pub fn load_configuration() -> Result<FileConfig, ConfigError> {
    let builder = Config::builder()
        .add_source(ConfigFile::with_name("Config").required(false))
        .add_source(Environment::with_prefix("XNAT2BIDS"))
        .build()?;
    builder.try_deserialize::<FileConfig>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_server_adds_scheme() {
        assert_eq!(AppConfig::clean_server("xnat.example.org"), "https://xnat.example.org");
    }

    #[test]
    fn test_clean_server_strips_trailing_slash() {
        assert_eq!(AppConfig::clean_server("xnat.example.org/"), "https://xnat.example.org");
    }

    #[test]
    fn test_clean_server_keeps_existing_scheme() {
        assert_eq!(AppConfig::clean_server("http://localhost:8080"), "http://localhost:8080");
        assert_eq!(AppConfig::clean_server("  https://xnat.example.org  "), "https://xnat.example.org");
    }
}
