use std::collections::HashMap;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{debug, error};

use crate::tracker::IssueTracker;
use crate::types::{ReferenceGroup, ResolvedIssue};

/// How many repositories are resolved in flight at once
const REPO_CONCURRENCY: usize = 4;

/// Counts produced alongside resolution, for the end-of-run summary
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ResolveStats {
    /// Groups whose upstream issue was fetched successfully
    pub resolved: usize,
    /// Subset of `resolved` whose upstream issue is closed
    pub closed: usize,
    /// Groups dropped because the repository or issue lookup failed
    pub failed: usize,
}

/// Resolves each canonical reference's upstream state.
///
/// Each distinct repository is fetched once and each distinct issue number
/// within it once, no matter how many locations mention them.
pub struct UpstreamResolver {
    tracker: Arc<dyn IssueTracker>,
}

impl UpstreamResolver {
    pub fn new(tracker: Arc<dyn IssueTracker>) -> Self {
        Self { tracker }
    }

    /// Resolve every group against the upstream tracker.
    ///
    /// Lookup failures (unknown repository, unknown issue, transport errors)
    /// are logged at error level and drop only the affected groups; they
    /// never abort resolution of other repositories. Repositories are
    /// fetched with bounded concurrency, and the returned list is re-sorted
    /// to the input group order so the output is independent of completion
    /// order.
    pub async fn resolve(&self, groups: Vec<ReferenceGroup>) -> (Vec<ResolvedIssue>, ResolveStats) {
        let order: HashMap<_, _> = groups
            .iter()
            .enumerate()
            .map(|(position, group)| (group.canonical.clone(), position))
            .collect();

        // Bucket groups per repository so each repo is fetched exactly once
        let mut by_repo: Vec<(String, Vec<ReferenceGroup>)> = Vec::new();
        let mut repo_slot: HashMap<String, usize> = HashMap::new();
        for group in groups {
            let full_name = group.canonical.repo_full_name();
            match repo_slot.get(&full_name) {
                Some(&slot) => by_repo[slot].1.push(group),
                None => {
                    repo_slot.insert(full_name.clone(), by_repo.len());
                    by_repo.push((full_name, vec![group]));
                }
            }
        }

        let per_repo: Vec<(Vec<ResolvedIssue>, usize)> = stream::iter(by_repo)
            .map(|(full_name, repo_groups)| self.resolve_repo(full_name, repo_groups))
            .buffer_unordered(REPO_CONCURRENCY)
            .collect()
            .await;

        let mut stats = ResolveStats::default();
        let mut resolved = Vec::new();
        for (repo_resolved, repo_failed) in per_repo {
            stats.failed += repo_failed;
            resolved.extend(repo_resolved);
        }
        resolved.sort_by_key(|r| order[&r.group.canonical]);

        stats.resolved = resolved.len();
        stats.closed = resolved.iter().filter(|r| r.is_closed()).count();
        (resolved, stats)
    }

    /// Resolve all groups that point into one repository. Returns the
    /// resolved groups plus the number dropped by lookup failures.
    async fn resolve_repo(
        &self,
        full_name: String,
        groups: Vec<ReferenceGroup>,
    ) -> (Vec<ResolvedIssue>, usize) {
        let repo = match self.tracker.get_repo(&full_name).await {
            Ok(repo) => repo,
            Err(e) => {
                error!(repo = %full_name, error = %e, "failed to look up upstream repository");
                return (Vec::new(), groups.len());
            }
        };

        let mut resolved = Vec::new();
        let mut failed = 0;
        for group in groups {
            match self.tracker.get_issue(&repo, group.canonical.number).await {
                Ok(issue) => {
                    debug!(reference = %group.canonical, state = ?issue.state, "resolved upstream issue");
                    resolved.push(ResolvedIssue {
                        group,
                        state: issue.state,
                    });
                }
                Err(e) => {
                    error!(reference = %group.canonical, error = %e, "failed to look up upstream issue");
                    failed += 1;
                }
            }
        }
        (resolved, failed)
    }
}
