use std::path::PathBuf;

use clap::Parser;

/// Scan the repository's tracked files for references to issues in other
/// repositories and maintain tracking issues for the ones that have been
/// closed.
#[derive(Debug, Parser)]
#[command(name = "upnotify", about = "Upstream issue notifier", version)]
pub struct Cli {
    /// API token for the issue-tracking service
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Local repository (owner/repo) where tracking issues are managed
    #[arg(long, env = "GITHUB_REPOSITORY")]
    pub repository: String,

    /// Comma-separated labels applied to created tracking issues
    #[arg(long, env = "LABELS", value_delimiter = ',')]
    pub labels: Vec<String>,

    /// Comma-separated path prefixes excluded from scanning
    #[arg(long, env = "IGNORE_DIRS", value_delimiter = ',')]
    pub ignore_dirs: Vec<String>,

    /// Log level or filter directive (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Compute all actions but perform no mutating tracker calls
    #[arg(long, env = "DRY_RUN")]
    pub dry_run: bool,

    /// Git ref name used in source-location links
    #[arg(long, env = "GITHUB_REF_NAME", default_value = "main")]
    pub ref_name: String,

    /// Server base URL used in source-location links
    #[arg(long, env = "GITHUB_SERVER_URL", default_value = "https://github.com")]
    pub server_url: String,

    /// Issue tracker API base URL
    #[arg(long, env = "GITHUB_API_URL", default_value = libupnotify_github::DEFAULT_API_URL)]
    pub api_url: String,

    /// Path to the repository to scan
    #[arg(long, default_value = ".")]
    pub repo_path: PathBuf,
}
