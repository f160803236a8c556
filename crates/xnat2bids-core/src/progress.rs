use crate::resources::SkipReason;
use crate::transfer::TransferMethod;

/// Trait for reporting export progress.
///
/// The CLI implements this with indicatif spinners; tests count calls.
/// All methods have default no-op implementations.
pub trait ExportReporter: Send + Sync {
    fn on_catalog_loaded(&self, _session_id: &str, _scan_count: usize) {}
    fn on_scan_start(&self, _scan_id: &str, _output_name: &str) {}
    fn on_file_transferred(&self, _scan_id: &str, _file_name: &str, _method: TransferMethod) {}
    fn on_scan_transferred(&self, _scan_id: &str, _file_count: usize) {}
    fn on_scan_skipped(&self, _scan_id: &str, _reason: SkipReason) {}
    fn on_export_complete(&self, _transferred: usize, _skipped: usize) {}
}

/// No-op reporter for silent operation.
pub struct SilentReporter;

impl ExportReporter for SilentReporter {}
