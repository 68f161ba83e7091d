use std::path::Path;

use regex::Regex;
use tracing::debug;

use crate::error::UpnotifyError;
use crate::types::FileReference;

/// Extracts upstream issue references from file content.
///
/// A reference is an occurrence of `owner/repo/issues/number` where owner and
/// repo are alphanumeric-or-hyphen tokens and number is a decimal integer.
/// A line yields at most one reference (first match only).
pub struct Scanner {
    pattern: Regex,
}

impl Scanner {
    pub fn new() -> Self {
        let pattern = Regex::new(
            r"(?P<owner>[A-Za-z0-9-]+)/(?P<repo>[A-Za-z0-9-]+)/issues/(?P<number>[0-9]+)",
        )
        .unwrap();
        Self { pattern }
    }

    /// Scan pre-split lines of `filename`. Lines are 1-indexed in the
    /// produced references.
    pub fn scan_lines<'a, I>(&self, filename: &str, lines: I) -> Vec<FileReference>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut refs = Vec::new();
        for (idx, line) in lines.into_iter().enumerate() {
            if let Some(caps) = self.pattern.captures(line) {
                let number = match caps["number"].parse::<u64>() {
                    Ok(n) => n,
                    // Too many digits to be a real issue number
                    Err(_) => continue,
                };
                refs.push(FileReference {
                    owner: caps["owner"].to_string(),
                    repo: caps["repo"].to_string(),
                    number,
                    filename: filename.to_string(),
                    line: (idx + 1) as u64,
                });
            }
        }
        refs
    }

    /// Scan a file on disk, recording `filename` in each match.
    ///
    /// Content that is not valid UTF-8 is skipped transparently: zero
    /// references, no error, so one binary file never aborts the scan.
    pub fn scan_file(&self, path: &Path, filename: &str) -> Result<Vec<FileReference>, UpnotifyError> {
        let bytes = std::fs::read(path)?;
        let content = match String::from_utf8(bytes) {
            Ok(content) => content,
            Err(_) => {
                debug!(file = %filename, "skipping non-UTF-8 file");
                return Ok(Vec::new());
            }
        };
        Ok(self.scan_lines(filename, content.lines()))
    }
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new()
    }
}
