mod client;
mod models;

pub use client::ArchiveSession;
pub use models::{FileRecord, NamingRuleRecord, ResourceRecord, ScanRecord, SessionRecord};
