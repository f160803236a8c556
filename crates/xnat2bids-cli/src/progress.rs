use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;
use xnat2bids_core::transfer::TransferMethod;
use xnat2bids_core::{ExportReporter, SkipReason};

/// CLI progress reporter: a spinner per scan, check marks as scans land.
pub struct CliReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl CliReporter {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn set_bar(&self, pb: ProgressBar) {
        let mut guard = self.bar.lock().unwrap();
        if let Some(old) = guard.take() {
            old.finish_and_clear();
        }
        *guard = Some(pb);
    }

    fn finish_bar(&self) {
        let mut guard = self.bar.lock().unwrap();
        if let Some(pb) = guard.take() {
            pb.finish_and_clear();
        }
    }
}

impl ExportReporter for CliReporter {
    fn on_catalog_loaded(&self, session_id: &str, scan_count: usize) {
        eprintln!(
            "  \x1b[32m✓\x1b[0m Catalog loaded: {} scans in session {}",
            scan_count, session_id
        );
    }

    fn on_scan_start(&self, scan_id: &str, output_name: &str) {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );
        pb.set_message(format!("Scan {} → {}", scan_id, output_name));
        pb.enable_steady_tick(std::time::Duration::from_millis(80));
        self.set_bar(pb);
    }

    fn on_file_transferred(&self, _scan_id: &str, file_name: &str, _method: TransferMethod) {
        let guard = self.bar.lock().unwrap();
        if let Some(pb) = guard.as_ref() {
            pb.set_message(format!("Transferring {}", file_name));
        }
    }

    fn on_scan_transferred(&self, scan_id: &str, file_count: usize) {
        self.finish_bar();
        eprintln!(
            "  \x1b[32m✓\x1b[0m Scan {}: {} files transferred",
            scan_id, file_count
        );
    }

    fn on_scan_skipped(&self, scan_id: &str, reason: SkipReason) {
        self.finish_bar();
        eprintln!("  \x1b[33m–\x1b[0m Scan {}: skipped ({})", scan_id, reason);
    }

    fn on_export_complete(&self, transferred: usize, skipped: usize) {
        self.finish_bar();
        eprintln!(
            "  \x1b[32m✓\x1b[0m Export complete: {} transferred, {} skipped",
            transferred, skipped
        );
    }
}
