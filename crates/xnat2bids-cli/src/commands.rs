use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "xnat2bids")]
#[command(about = "Export XNAT sessions into a BIDS-friendly directory tree", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Export one session's scans into the output tree
    Export(ExportArgs),
    /// Print the effective configuration
    PrintConfig,
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Archive host, e.g. xnat.example.org
    #[arg(long)]
    pub host: Option<String>,
    /// Archive username
    #[arg(long)]
    pub user: Option<String>,
    /// Archive password
    #[arg(long)]
    pub password: Option<String>,
    /// Session (experiment) ID to export
    #[arg(long)]
    pub session: String,
    /// Subject label override (read from the archive when omitted)
    #[arg(long)]
    pub subject: Option<String>,
    /// Project override (read from the archive when omitted)
    #[arg(long)]
    pub project: Option<String>,
    /// Root output directory for BIDS files
    #[arg(long)]
    pub bids_root_dir: Option<String>,
    /// Re-export scans that already have converted output
    #[arg(long)]
    pub overwrite: bool,
    /// Skip TLS certificate verification
    #[arg(long)]
    pub insecure: bool,
    /// Output layout: sourcedata or bids
    #[arg(long)]
    pub layout: Option<String>,
}
