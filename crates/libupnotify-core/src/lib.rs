//! Core engine for upnotify.
//!
//! Scans file content for textual references to issues in other repositories
//! (`owner/repo/issues/number`), deduplicates them into canonical references,
//! resolves each reference's live state against the upstream tracker, and
//! reconciles tracking issues in the local tracker for every upstream issue
//! that has been closed.
//!
//! The tracker itself is abstracted behind [`tracker::IssueTracker`]; this
//! crate performs no I/O beyond reading scanned files.

pub mod error;
pub mod index;
pub mod reconcile;
pub mod resolver;
pub mod scanner;
pub mod tracker;
pub mod types;

pub use error::UpnotifyError;
