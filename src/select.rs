//! Input file selection.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use glob::Pattern;
use regex::Regex;

use crate::error::{Error, Result};

const REGEX_PREFIX: &str = "re:";

/// Selects input files from a directory by file name.
#[derive(Debug, Clone, Default)]
pub enum FileSelector {
    /// Every regular file in the directory
    #[default]
    All,
    /// A single file name
    Exact(String),
    /// A wildcard pattern such as `*.pdf`
    Glob(Pattern),
    /// A regular expression anchored at the start of the file name
    Regex(Regex),
}

impl FileSelector {
    /// Parse a selection string.
    ///
    /// `re:<expr>` is a regular expression, anything containing `*`, `?` or
    /// `[` is a wildcard, everything else is an exact file name.
    pub fn parse(input: &str) -> Result<Self> {
        if let Some(expr) = input.strip_prefix(REGEX_PREFIX) {
            let anchored = format!("^(?:{})", expr);
            let regex = Regex::new(&anchored)
                .map_err(|e| Error::InvalidPattern(format!("{}: {}", input, e)))?;
            return Ok(FileSelector::Regex(regex));
        }
        if input.contains(['*', '?', '[']) {
            let pattern = Pattern::new(input)
                .map_err(|e| Error::InvalidPattern(format!("{}: {}", input, e)))?;
            return Ok(FileSelector::Glob(pattern));
        }
        if input.is_empty() {
            return Err(Error::InvalidPattern("empty file selection".into()));
        }
        Ok(FileSelector::Exact(input.to_string()))
    }

    /// Whether a file name is selected.
    pub fn matches(&self, file_name: &str) -> bool {
        match self {
            FileSelector::All => true,
            FileSelector::Exact(name) => name == file_name,
            FileSelector::Glob(pattern) => pattern.matches(file_name),
            FileSelector::Regex(regex) => regex.is_match(file_name),
        }
    }

    /// Selected regular files in `dir`, sorted by name.
    ///
    /// Fails with [`Error::NoMatchingInput`] when nothing matches.
    pub fn resolve(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                log::warn!("Skipping non-UTF-8 file name in {}", dir.display());
                continue;
            };
            if self.matches(name) {
                files.push(entry.path());
            }
        }

        if files.is_empty() {
            return Err(Error::NoMatchingInput(format!(
                "{} in {}",
                self,
                dir.display()
            )));
        }
        files.sort();
        log::debug!("Selected {} file(s) with {}", files.len(), self);
        Ok(files)
    }
}

impl fmt::Display for FileSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileSelector::All => write!(f, "all files"),
            FileSelector::Exact(name) => write!(f, "'{}'", name),
            FileSelector::Glob(pattern) => write!(f, "pattern '{}'", pattern.as_str()),
            FileSelector::Regex(regex) => write!(f, "regex '{}'", regex.as_str()),
        }
    }
}
