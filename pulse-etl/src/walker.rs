//! Category tree walker
//!
//! Lists `root/<state>/<year>/<quarter-file>` and parses every quarter file
//! as JSON. The result is four index-aligned sequences (state, year, quarter
//! labels and payloads).
//!
//! Structural problems (missing root, unreadable entry, invalid JSON) fail
//! fast; nothing is skipped silently at this level.

use serde_json::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

/// Depth of quarter files below the category root
const QUARTER_DEPTH: usize = 3;

/// Walker errors
#[derive(Debug, Error)]
pub enum WalkError {
    /// Category root does not exist
    #[error("Category root not found: {0}")]
    RootNotFound(PathBuf),

    /// Category root exists but is not a directory
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// Directory listing failed
    #[error("Traversal error: {0}")]
    Traverse(#[from] walkdir::Error),

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Directory or file name is not valid UTF-8
    #[error("Non UTF-8 name: {0}")]
    NonUtf8Name(PathBuf),
}

/// Parallel state/year/quarter/payload sequences for one category
#[derive(Debug, Clone, Default)]
pub struct WalkResult {
    pub states: Vec<String>,
    pub years: Vec<String>,
    /// Quarter file names, extension included (`1.json`)
    pub quarters: Vec<String>,
    pub payloads: Vec<Value>,
}

/// Borrowed view of one snapshot
#[derive(Debug, Clone, Copy)]
pub struct RawSnapshot<'a> {
    pub state: &'a str,
    pub year: &'a str,
    pub quarter: &'a str,
    pub payload: &'a Value,
}

impl WalkResult {
    pub fn push(&mut self, state: String, year: String, quarter: String, payload: Value) {
        self.states.push(state);
        self.years.push(year);
        self.quarters.push(quarter);
        self.payloads.push(payload);
    }

    pub fn len(&self) -> usize {
        self.payloads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payloads.is_empty()
    }

    /// Snapshots in walk order
    pub fn snapshots(&self) -> impl Iterator<Item = RawSnapshot<'_>> + '_ {
        (0..self.len()).map(move |i| RawSnapshot {
            state: &self.states[i],
            year: &self.years[i],
            quarter: &self.quarters[i],
            payload: &self.payloads[i],
        })
    }
}

/// Category tree walker
pub struct PathWalker {
    ignore_patterns: Vec<String>,
}

impl PathWalker {
    /// Create a walker with the default ignore list
    ///
    /// Ignores system entries like .DS_Store, Thumbs.db, .git, etc.
    pub fn new() -> Self {
        Self {
            ignore_patterns: vec![
                ".DS_Store".to_string(),
                "Thumbs.db".to_string(),
                ".git".to_string(),
                ".svn".to_string(),
                "node_modules".to_string(),
            ],
        }
    }

    /// Walk one category root
    ///
    /// Entries are visited in byte-wise file name order, so the output is
    /// deterministic across platforms. Symlinks are not followed.
    pub fn walk(&self, root: &Path) -> Result<WalkResult, WalkError> {
        if !root.exists() {
            return Err(WalkError::RootNotFound(root.to_path_buf()));
        }

        if !root.is_dir() {
            return Err(WalkError::NotADirectory(root.to_path_buf()));
        }

        let mut result = WalkResult::default();

        let walker = WalkDir::new(root)
            .min_depth(1)
            .max_depth(QUARTER_DEPTH)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| self.should_process_entry(e));

        for entry in walker {
            let entry = entry?;
            let is_dir = entry.file_type().is_dir();

            match (entry.depth(), is_dir) {
                (QUARTER_DEPTH, false) => {
                    let (state, year, quarter) = labels(&entry)?;
                    let payload = read_payload(entry.path())?;
                    result.push(state, year, quarter, payload);
                }
                (1, true) | (2, true) => {}
                _ => {
                    tracing::debug!("Not a snapshot, skipping: {}", entry.path().display());
                }
            }
        }

        tracing::debug!(
            root = %root.display(),
            snapshots = result.len(),
            "Walk complete"
        );

        Ok(result)
    }

    /// Check if entry should be visited
    fn should_process_entry(&self, entry: &DirEntry) -> bool {
        let file_name = entry.file_name().to_string_lossy();
        !self.ignore_patterns.iter().any(|p| file_name == p.as_str())
    }
}

impl Default for PathWalker {
    fn default() -> Self {
        Self::new()
    }
}

/// State, year and quarter labels of a depth-3 entry
fn labels(entry: &DirEntry) -> Result<(String, String, String), WalkError> {
    let path = entry.path();
    let name = |p: Option<&Path>| -> Result<String, WalkError> {
        p.and_then(Path::file_name)
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .ok_or_else(|| WalkError::NonUtf8Name(path.to_path_buf()))
    };

    let year_dir = path.parent();
    let state_dir = year_dir.and_then(Path::parent);

    Ok((name(state_dir)?, name(year_dir)?, name(Some(path))?))
}

fn read_payload(path: &Path) -> Result<Value, WalkError> {
    let content = std::fs::read_to_string(path).map_err(|source| WalkError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&content).map_err(|source| WalkError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
