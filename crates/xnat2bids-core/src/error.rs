use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Archive request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Archive returned {status} for {url}")]
    ArchiveStatus { status: u16, url: String },

    #[error("Malformed archive response from {url}: {detail}")]
    MalformedResponse { url: String, detail: String },

    #[error("{0}")]
    Other(String),
}
