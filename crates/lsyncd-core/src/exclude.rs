//! Directory-exclude patterns.
//!
//! Ground truth is lsyncd.c's `parse_exclude_file`: one pattern per
//! line, trailing `\n` stripped, blank lines skipped, a line ending in
//! `/` names a directory basename to never watch. Anything else is a
//! file-pattern line, forwarded to the external sync tool verbatim and
//! not interpreted here.

use std::io::BufRead;
use std::path::Path;

use crate::error::{CoreError, Result};

/// Matches lsyncd.c's `MAX_EXCLUDES`.
pub const MAX_EXCLUDES: usize = 256;

/// Immutable, ordered set of directory-basename patterns, loaded once
/// at startup.
#[derive(Debug, Default, Clone)]
pub struct ExcludePatterns {
    dirs: Vec<String>,
}

impl ExcludePatterns {
    pub fn empty() -> Self {
        Self { dirs: Vec::new() }
    }

    /// Builds the set from already-split lines, applying the same
    /// grammar `parse_exclude_file` does. Exposed separately from
    /// `load` so tests don't need real files.
    pub fn from_lines<I, S>(lines: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut dirs = Vec::new();

        for raw in lines {
            let line = raw.as_ref().trim_end_matches('\n');
            if line.is_empty() {
                continue;
            }

            if let Some(name) = line.strip_suffix('/') {
                if name.is_empty() {
                    continue;
                }
                if dirs.len() + 1 >= MAX_EXCLUDES {
                    return Err(CoreError::TooManyExcludes { max: MAX_EXCLUDES });
                }
                tracing::info!("excluding directories named '{}'", name);
                dirs.push(name.to_string());
            }
            // Lines not ending in '/' are file-pattern lines forwarded
            // to the sync tool's --exclude-from file unchanged; the
            // core does not interpret them.
        }

        Ok(Self { dirs })
    }

    /// Loads and parses an exclude file from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path).map_err(|source| CoreError::DirectoryOpenFailure {
            path: path.to_path_buf(),
            source,
        })?;
        let reader = std::io::BufReader::new(file);
        let lines: std::result::Result<Vec<String>, _> = reader.lines().collect();
        let lines = lines.map_err(|source| CoreError::DirectoryOpenFailure {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_lines(lines)
    }

    /// Exact byte-for-byte basename match.
    pub fn matches(&self, basename: &str) -> bool {
        self.dirs.iter().any(|d| d == basename)
    }

    pub fn len(&self) -> usize {
        self.dirs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_patterns_require_trailing_slash() {
        let patterns = ExcludePatterns::from_lines(["node_modules/", "*.php", "", "Data/"]).unwrap();
        assert!(patterns.matches("node_modules"));
        assert!(patterns.matches("Data"));
        assert!(!patterns.matches("*.php"));
        assert_eq!(patterns.len(), 2);
    }

    #[test]
    fn blank_and_bare_slash_lines_are_skipped() {
        let patterns = ExcludePatterns::from_lines(["", "/", "a/"]).unwrap();
        assert_eq!(patterns.len(), 1);
        assert!(patterns.matches("a"));
    }

    #[test]
    fn exceeding_cap_is_fatal() {
        let lines: Vec<String> = (0..MAX_EXCLUDES).map(|i| format!("dir{i}/")).collect();
        let err = ExcludePatterns::from_lines(lines).unwrap_err();
        assert!(matches!(err, CoreError::TooManyExcludes { .. }));
    }

    #[test]
    fn matching_is_exact_not_substring() {
        let patterns = ExcludePatterns::from_lines(["git/"]).unwrap();
        assert!(!patterns.matches(".git"));
        assert!(!patterns.matches("git2"));
        assert!(patterns.matches("git"));
    }
}
