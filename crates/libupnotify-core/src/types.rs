use std::fmt;

use serde::{Deserialize, Serialize};

/// A single reference to an upstream issue found in a scanned file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReference {
    pub owner: String,
    pub repo: String,
    pub number: u64,
    /// Path of the file containing the reference, relative to the repo root
    pub filename: String,
    /// 1-indexed line number of the match
    pub line: u64,
}

impl FileReference {
    /// The deduplication key for this reference
    pub fn canonical(&self) -> CanonicalRef {
        CanonicalRef {
            owner: self.owner.clone(),
            repo: self.repo.clone(),
            number: self.number,
        }
    }
}

impl fmt::Display for FileReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}#{} ({}:{})",
            self.owner, self.repo, self.number, self.filename, self.line
        )
    }
}

/// Identifies one upstream issue regardless of how many times or where it is
/// mentioned. Two references are "the same issue" iff their CanonicalRef is
/// equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalRef {
    pub owner: String,
    pub repo: String,
    pub number: u64,
}

impl CanonicalRef {
    /// `owner/repo` form used for repository lookups
    pub fn repo_full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

impl fmt::Display for CanonicalRef {
    /// The `owner/repo#number` form used for display and tracking-issue
    /// matching
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}#{}", self.owner, self.repo, self.number)
    }
}

/// A (filename, line) occurrence of a reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub filename: String,
    pub line: u64,
}

/// A canonical reference plus every location that mentions it, in
/// first-appearance order across the whole scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceGroup {
    pub canonical: CanonicalRef,
    pub locations: Vec<Location>,
}

/// State of a tracker issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
    Open,
    Closed,
    /// Any state string other than "open" or "closed"; never treated as
    /// closed
    #[serde(other)]
    Other,
}

/// A repository handle returned by the tracker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerRepo {
    pub full_name: String,
}

/// An issue as the tracker sees it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerIssue {
    pub number: u64,
    pub title: String,
    /// The tracker reports issues without a description as `null`
    #[serde(default)]
    pub body: Option<String>,
    pub state: IssueState,
}

/// A reference group whose upstream issue has been fetched. Lookup failures
/// never become a ResolvedIssue; they are logged and dropped by the resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedIssue {
    pub group: ReferenceGroup,
    pub state: IssueState,
}

impl ResolvedIssue {
    pub fn is_closed(&self) -> bool {
        self.state == IssueState::Closed
    }
}
