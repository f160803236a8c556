pub mod archive;
pub mod catalog;
pub mod config;
pub mod dicom;
pub mod engine;
pub mod error;
pub mod layout;
pub mod naming;
pub mod progress;
pub mod resources;
pub mod transfer;

pub use config::{AppConfig, OutputLayout};
pub use engine::{ExportEngine, ExportResult};
pub use error::Error;
pub use progress::{ExportReporter, SilentReporter};
pub use resources::SkipReason;
