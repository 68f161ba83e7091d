use std::sync::Arc;

use tracing::info;

use crate::error::UpnotifyError;
use crate::tracker::IssueTracker;
use crate::types::{CanonicalRef, ReferenceGroup, ResolvedIssue, TrackerIssue, TrackerRepo};

/// Context for rendering source-location links in tracking-issue bodies
#[derive(Debug, Clone)]
pub struct LinkContext {
    /// Server base URL without a trailing slash, e.g. `https://github.com`
    pub server_url: String,
    /// Local repository in `owner/repo` form
    pub repository: String,
    /// Git ref used in blob links, e.g. `main`
    pub ref_name: String,
}

/// Action taken, or in dry-run mode recorded instead of taken, for one
/// canonical reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileAction {
    Created { reference: String, number: u64 },
    Updated { reference: String, number: u64 },
    WouldCreate { reference: String },
    WouldUpdate { reference: String, number: u64 },
}

/// Title for a newly created tracking issue
pub fn render_title(reference: &CanonicalRef) -> String {
    format!("Upstream issue {reference} closed")
}

/// Render the tracking-issue body for a closed upstream reference.
///
/// The format is fixed and consumers may parse it, so it must not drift:
/// header naming the reference, one bullet per location linking into the
/// local repository at the configured ref, then the closing sentences.
pub fn render_body(group: &ReferenceGroup, links: &LinkContext) -> String {
    let plural = if group.locations.len() > 1 { "s" } else { "" };
    let mut body = format!(
        "Upstream issue {} referenced in the file{}:\n\n",
        group.canonical, plural
    );
    for location in &group.locations {
        body.push_str(&format!(
            "  - [{file}:{line}]({server}/{repo}/blob/{ref_name}/{file}#L{line})\n",
            file = location.filename,
            line = location.line,
            server = links.server_url,
            repo = links.repository,
            ref_name = links.ref_name,
        ));
    }
    body.push_str("\nhas been closed.\n\nThe code referencing this issue could potentially be updated.");
    body
}

/// Creates or refreshes one tracking issue per closed upstream reference.
///
/// The local issue list is fetched once up front; per reference the entire
/// list is scanned for an issue already mentioning the canonical ref before
/// deciding between edit and create, so a run can never produce two tracking
/// issues for the same reference.
pub struct ReconciliationEngine {
    tracker: Arc<dyn IssueTracker>,
    local_repo: TrackerRepo,
    links: LinkContext,
    labels: Vec<String>,
    dry_run: bool,
}

impl ReconciliationEngine {
    pub fn new(
        tracker: Arc<dyn IssueTracker>,
        local_repo: TrackerRepo,
        links: LinkContext,
        labels: Vec<String>,
        dry_run: bool,
    ) -> Self {
        Self {
            tracker,
            local_repo,
            links,
            labels,
            dry_run,
        }
    }

    /// Reconcile every closed reference against the local tracker.
    ///
    /// References resolved as open or not resolved at all must be filtered
    /// out by the caller; everything passed here gets an action.
    pub async fn run(&self, closed: &[ResolvedIssue]) -> Result<Vec<ReconcileAction>, UpnotifyError> {
        if closed.is_empty() {
            return Ok(Vec::new());
        }

        let mut existing = self.tracker.list_issues(&self.local_repo).await?;
        let mut actions = Vec::with_capacity(closed.len());
        for resolved in closed {
            actions.push(self.reconcile_one(&resolved.group, &mut existing).await?);
        }
        Ok(actions)
    }

    async fn reconcile_one(
        &self,
        group: &ReferenceGroup,
        existing: &mut Vec<TrackerIssue>,
    ) -> Result<ReconcileAction, UpnotifyError> {
        let reference = group.canonical.to_string();
        let body = render_body(group, &self.links);

        // Full scan before deciding: the first issue mentioning the ref in
        // its title or body wins, and create only fires when none does.
        let matched = existing
            .iter()
            .find(|issue| {
                issue.title.contains(&reference)
                    || issue.body.as_deref().is_some_and(|b| b.contains(&reference))
            })
            .map(|issue| issue.number);

        match matched {
            Some(number) if self.dry_run => {
                info!(
                    reference = %reference,
                    issue = number,
                    body = %body,
                    "dry-run: would update tracking issue"
                );
                Ok(ReconcileAction::WouldUpdate { reference, number })
            }
            Some(number) => {
                // Refresh the body so removed references drop out and new
                // locations appear.
                self.tracker
                    .edit_issue(&self.local_repo, number, &body)
                    .await?;
                info!(reference = %reference, issue = number, "updated tracking issue");
                Ok(ReconcileAction::Updated { reference, number })
            }
            None if self.dry_run => {
                let title = render_title(&group.canonical);
                info!(
                    reference = %reference,
                    title = %title,
                    body = %body,
                    "dry-run: would create tracking issue"
                );
                Ok(ReconcileAction::WouldCreate { reference })
            }
            None => {
                let title = render_title(&group.canonical);
                let issue = self
                    .tracker
                    .create_issue(&self.local_repo, &title, &body, &self.labels)
                    .await?;
                let number = issue.number;
                info!(reference = %reference, issue = number, "created tracking issue");
                // Later references in this run must see the new issue
                existing.push(issue);
                Ok(ReconcileAction::Created { reference, number })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::types::{IssueState, Location};

    fn links() -> LinkContext {
        LinkContext {
            server_url: "https://github.com".to_string(),
            repository: "me/tracker".to_string(),
            ref_name: "main".to_string(),
        }
    }

    fn closed_group(owner: &str, repo: &str, number: u64, locations: &[(&str, u64)]) -> ResolvedIssue {
        ResolvedIssue {
            group: ReferenceGroup {
                canonical: CanonicalRef {
                    owner: owner.to_string(),
                    repo: repo.to_string(),
                    number,
                },
                locations: locations
                    .iter()
                    .map(|(filename, line)| Location {
                        filename: filename.to_string(),
                        line: *line,
                    })
                    .collect(),
            },
            state: IssueState::Closed,
        }
    }

    /// Local-tracker fake backed by an in-memory issue list
    #[derive(Default)]
    struct FakeLocal {
        issues: Mutex<Vec<TrackerIssue>>,
        created: Mutex<usize>,
        edited: Mutex<usize>,
        listed: Mutex<usize>,
    }

    impl FakeLocal {
        fn seeded(issues: Vec<TrackerIssue>) -> Self {
            Self {
                issues: Mutex::new(issues),
                ..Self::default()
            }
        }

        fn repo() -> TrackerRepo {
            TrackerRepo {
                full_name: "me/tracker".to_string(),
            }
        }
    }

    #[async_trait]
    impl IssueTracker for FakeLocal {
        async fn get_repo(&self, full_name: &str) -> Result<TrackerRepo, UpnotifyError> {
            Ok(TrackerRepo {
                full_name: full_name.to_string(),
            })
        }

        async fn get_issue(
            &self,
            _repo: &TrackerRepo,
            number: u64,
        ) -> Result<TrackerIssue, UpnotifyError> {
            Err(UpnotifyError::NotFound(format!("issue #{number}")))
        }

        async fn list_issues(&self, _repo: &TrackerRepo) -> Result<Vec<TrackerIssue>, UpnotifyError> {
            *self.listed.lock().unwrap() += 1;
            Ok(self.issues.lock().unwrap().clone())
        }

        async fn create_issue(
            &self,
            _repo: &TrackerRepo,
            title: &str,
            body: &str,
            _labels: &[String],
        ) -> Result<TrackerIssue, UpnotifyError> {
            *self.created.lock().unwrap() += 1;
            let mut issues = self.issues.lock().unwrap();
            let issue = TrackerIssue {
                number: issues.len() as u64 + 1,
                title: title.to_string(),
                body: Some(body.to_string()),
                state: IssueState::Open,
            };
            issues.push(issue.clone());
            Ok(issue)
        }

        async fn edit_issue(
            &self,
            _repo: &TrackerRepo,
            number: u64,
            body: &str,
        ) -> Result<(), UpnotifyError> {
            *self.edited.lock().unwrap() += 1;
            let mut issues = self.issues.lock().unwrap();
            match issues.iter_mut().find(|i| i.number == number) {
                Some(issue) => {
                    issue.body = Some(body.to_string());
                    Ok(())
                }
                None => Err(UpnotifyError::NotFound(format!("issue #{number}"))),
            }
        }
    }

    fn engine(tracker: Arc<FakeLocal>, dry_run: bool) -> ReconciliationEngine {
        ReconciliationEngine::new(
            tracker,
            FakeLocal::repo(),
            links(),
            vec!["upstream".to_string()],
            dry_run,
        )
    }

    #[test]
    fn test_body_single_location_exact_bytes() {
        let resolved = closed_group("foo-bar", "baz", 42, &[("x.txt", 7)]);
        let body = render_body(&resolved.group, &links());
        assert_eq!(
            body,
            "Upstream issue foo-bar/baz#42 referenced in the file:\n\
             \n\
             \x20 - [x.txt:7](https://github.com/me/tracker/blob/main/x.txt#L7)\n\
             \n\
             has been closed.\n\
             \n\
             The code referencing this issue could potentially be updated."
        );
    }

    #[test]
    fn test_body_pluralizes_and_keeps_location_order() {
        let resolved = closed_group("o", "r", 1, &[("b.rs", 9), ("a.rs", 2), ("a.rs", 5)]);
        let body = render_body(&resolved.group, &links());
        assert!(body.starts_with("Upstream issue o/r#1 referenced in the files:\n"));
        let bullets: Vec<_> = body.lines().filter(|l| l.starts_with("  - ")).collect();
        assert_eq!(
            bullets,
            vec![
                "  - [b.rs:9](https://github.com/me/tracker/blob/main/b.rs#L9)",
                "  - [a.rs:2](https://github.com/me/tracker/blob/main/a.rs#L2)",
                "  - [a.rs:5](https://github.com/me/tracker/blob/main/a.rs#L5)",
            ]
        );
    }

    #[test]
    fn test_title_format() {
        let resolved = closed_group("o", "r", 12, &[("f", 1)]);
        assert_eq!(
            render_title(&resolved.group.canonical),
            "Upstream issue o/r#12 closed"
        );
    }

    #[tokio::test]
    async fn test_creates_when_nothing_matches() {
        let tracker = Arc::new(FakeLocal::default());
        let actions = engine(tracker.clone(), false)
            .run(&[closed_group("o", "r", 1, &[("f.rs", 3)])])
            .await
            .unwrap();

        assert_eq!(
            actions,
            vec![ReconcileAction::Created {
                reference: "o/r#1".to_string(),
                number: 1,
            }]
        );
        assert_eq!(*tracker.created.lock().unwrap(), 1);
        assert_eq!(*tracker.edited.lock().unwrap(), 0);
        let issues = tracker.issues.lock().unwrap();
        assert_eq!(issues[0].title, "Upstream issue o/r#1 closed");
    }

    #[tokio::test]
    async fn test_updates_issue_matched_by_title() {
        let tracker = Arc::new(FakeLocal::seeded(vec![TrackerIssue {
            number: 8,
            title: "Upstream issue o/r#1 closed".to_string(),
            body: Some("old body".to_string()),
            state: IssueState::Open,
        }]));
        let actions = engine(tracker.clone(), false)
            .run(&[closed_group("o", "r", 1, &[("f.rs", 3)])])
            .await
            .unwrap();

        assert_eq!(
            actions,
            vec![ReconcileAction::Updated {
                reference: "o/r#1".to_string(),
                number: 8,
            }]
        );
        assert_eq!(*tracker.created.lock().unwrap(), 0);
        let issues = tracker.issues.lock().unwrap();
        assert!(issues[0].body.as_deref().unwrap().contains("f.rs:3"));
    }

    #[tokio::test]
    async fn test_updates_issue_matched_by_body_only() {
        let tracker = Arc::new(FakeLocal::seeded(vec![TrackerIssue {
            number: 2,
            title: "blocked upstream".to_string(),
            body: Some("tracking o/r#1 here".to_string()),
            state: IssueState::Open,
        }]));
        let actions = engine(tracker.clone(), false)
            .run(&[closed_group("o", "r", 1, &[("f.rs", 3)])])
            .await
            .unwrap();

        assert_eq!(*tracker.edited.lock().unwrap(), 1);
        assert!(matches!(actions[0], ReconcileAction::Updated { number: 2, .. }));
    }

    #[tokio::test]
    async fn test_full_scan_before_create() {
        // Non-matching issues first; the match is last in the list. The
        // naive inner-loop fallback would create here.
        let tracker = Arc::new(FakeLocal::seeded(vec![
            TrackerIssue {
                number: 1,
                title: "unrelated".to_string(),
                body: None,
                state: IssueState::Open,
            },
            TrackerIssue {
                number: 2,
                title: "also unrelated".to_string(),
                body: Some("nothing".to_string()),
                state: IssueState::Open,
            },
            TrackerIssue {
                number: 3,
                title: "Upstream issue o/r#1 closed".to_string(),
                body: None,
                state: IssueState::Open,
            },
        ]));
        let actions = engine(tracker.clone(), false)
            .run(&[closed_group("o", "r", 1, &[("f.rs", 3)])])
            .await
            .unwrap();

        assert_eq!(*tracker.created.lock().unwrap(), 0);
        assert!(matches!(actions[0], ReconcileAction::Updated { number: 3, .. }));
    }

    #[tokio::test]
    async fn test_second_run_edits_instead_of_creating() {
        let tracker = Arc::new(FakeLocal::default());
        let closed = [closed_group("o", "r", 1, &[("f.rs", 3)])];

        let first = engine(tracker.clone(), false).run(&closed).await.unwrap();
        let second = engine(tracker.clone(), false).run(&closed).await.unwrap();

        assert!(matches!(first[0], ReconcileAction::Created { .. }));
        assert!(matches!(second[0], ReconcileAction::Updated { .. }));
        assert_eq!(*tracker.created.lock().unwrap(), 1);
        assert_eq!(tracker.issues.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_dry_run_never_mutates() {
        let tracker = Arc::new(FakeLocal::seeded(vec![TrackerIssue {
            number: 1,
            title: "Upstream issue o/r#1 closed".to_string(),
            body: None,
            state: IssueState::Open,
        }]));
        let actions = engine(tracker.clone(), true)
            .run(&[
                closed_group("o", "r", 1, &[("f.rs", 3)]),
                closed_group("o", "r", 2, &[("g.rs", 4)]),
            ])
            .await
            .unwrap();

        assert_eq!(
            actions,
            vec![
                ReconcileAction::WouldUpdate {
                    reference: "o/r#1".to_string(),
                    number: 1,
                },
                ReconcileAction::WouldCreate {
                    reference: "o/r#2".to_string(),
                },
            ]
        );
        assert_eq!(*tracker.created.lock().unwrap(), 0);
        assert_eq!(*tracker.edited.lock().unwrap(), 0);
        assert_eq!(tracker.issues.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_input_touches_nothing() {
        let tracker = Arc::new(FakeLocal::default());
        let actions = engine(tracker.clone(), false).run(&[]).await.unwrap();

        assert!(actions.is_empty());
        assert_eq!(*tracker.listed.lock().unwrap(), 0);
    }
}
