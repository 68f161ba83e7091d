//! upnotify - upstream issue notifier.
//!
//! Scans the repository's tracked files for references to issues in other
//! repositories (`owner/repo/issues/number`), resolves each reference against
//! the upstream tracker, and creates or refreshes a tracking issue in the
//! local repository for every upstream issue that has been closed.

mod cli;
mod walker;

use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use libupnotify_core::index::ReferenceIndex;
use libupnotify_core::reconcile::{LinkContext, ReconciliationEngine};
use libupnotify_core::resolver::UpstreamResolver;
use libupnotify_core::scanner::Scanner;
use libupnotify_core::tracker::IssueTracker;
use libupnotify_core::UpnotifyError;
use libupnotify_github::GithubClient;

use cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run(&cli).await {
        error!("{e}");
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: &Cli) -> Result<(), UpnotifyError> {
    if cli.token.is_none() {
        warn!("no API token configured; lookups are unauthenticated and may hit rate limits");
    }

    let files = walker::tracked_files(&cli.repo_path, &cli.ignore_dirs)?;

    let scanner = Scanner::new();
    let mut index = ReferenceIndex::new();
    let mut occurrences = 0usize;
    for file in &files {
        let references = scanner.scan_file(&file.path, &file.name)?;
        occurrences += references.len();
        index.extend(references);
    }
    info!(
        files = files.len(),
        references = occurrences,
        distinct = index.len(),
        "scan complete"
    );

    let tracker: Arc<dyn IssueTracker> =
        Arc::new(GithubClient::new(&cli.api_url, cli.token.clone())?);

    // The reconciliation target must exist before anything else is attempted
    let local_repo = tracker.get_repo(&cli.repository).await.map_err(|e| {
        if e.is_not_found() {
            UpnotifyError::NotFound(format!("local repository {}", cli.repository))
        } else {
            e
        }
    })?;

    let resolver = UpstreamResolver::new(Arc::clone(&tracker));
    let (resolved, stats) = resolver.resolve(index.into_groups()).await;
    info!(
        resolved = stats.resolved,
        closed = stats.closed,
        failed = stats.failed,
        "upstream resolution complete"
    );

    let closed: Vec<_> = resolved.into_iter().filter(|r| r.is_closed()).collect();

    let mut labels = cli.labels.clone();
    labels.retain(|label| !label.is_empty());

    let engine = ReconciliationEngine::new(
        tracker,
        local_repo,
        LinkContext {
            server_url: cli.server_url.trim_end_matches('/').to_string(),
            repository: cli.repository.clone(),
            ref_name: cli.ref_name.clone(),
        },
        labels,
        cli.dry_run,
    );
    let actions = engine.run(&closed).await?;
    info!(
        actions = actions.len(),
        dry_run = cli.dry_run,
        "reconciliation complete"
    );
    Ok(())
}
