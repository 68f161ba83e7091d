use async_trait::async_trait;

use crate::error::UpnotifyError;
use crate::types::{TrackerIssue, TrackerRepo};

/// The capability set the engine needs from an issue-tracking service.
///
/// Production code implements this against GitHub (`libupnotify-github`);
/// tests substitute in-memory fakes. The engine never talks to a service any
/// other way, so alternate trackers only need to implement this trait.
#[async_trait]
pub trait IssueTracker: Send + Sync {
    /// Fetch a repository by its `owner/repo` name.
    async fn get_repo(&self, full_name: &str) -> Result<TrackerRepo, UpnotifyError>;

    /// Fetch a single issue by number.
    async fn get_issue(
        &self,
        repo: &TrackerRepo,
        number: u64,
    ) -> Result<TrackerIssue, UpnotifyError>;

    /// List the repository's open issues.
    async fn list_issues(&self, repo: &TrackerRepo) -> Result<Vec<TrackerIssue>, UpnotifyError>;

    /// Create an issue, returning it as the tracker now sees it.
    async fn create_issue(
        &self,
        repo: &TrackerRepo,
        title: &str,
        body: &str,
        labels: &[String],
    ) -> Result<TrackerIssue, UpnotifyError>;

    /// Replace an issue's body.
    async fn edit_issue(
        &self,
        repo: &TrackerRepo,
        number: u64,
        body: &str,
    ) -> Result<(), UpnotifyError>;
}
