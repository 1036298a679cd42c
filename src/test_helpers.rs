//! Shared test utilities for the mdsite test suite.
//!
//! Builds throwaway source trees, lists directories, and pulls typed facts out
//! of recorded [`BuildEvent`] streams.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = source_tree(&[("a.md", "![x](img/x.jpg)"), ("img/x.jpg", "B")]);
//! let mut events: Vec<BuildEvent> = Vec::new();
//! // ... run a stage with &mut events ...
//! assert_eq!(copied_names(&events), vec![expected_name("B")]);
//! ```

use std::fs;
use std::path::Path;
use tempfile::TempDir;

use crate::events::BuildEvent;
use crate::identity::ContentDigest;

// =========================================================================
// Fixture setup
// =========================================================================

/// Create a temp directory holding `files` (relative path, contents).
///
/// Parent directories are created as needed.
pub fn source_tree(files: &[(&str, &str)]) -> TempDir {
    let tmp = TempDir::new().unwrap();
    write_tree(tmp.path(), files);
    tmp
}

/// Write `files` below `root`, creating parent directories.
pub fn write_tree(root: &Path, files: &[(&str, &str)]) {
    for (rel, contents) in files {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, contents).unwrap();
    }
}

// =========================================================================
// Inspection
// =========================================================================

/// Sorted entry names directly inside `dir`.
pub fn dir_listing(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap_or_else(|e| panic!("cannot list {}: {e}", dir.display()))
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// Destination name the default policy gives to an image holding `bytes`.
pub fn expected_name(bytes: impl AsRef<[u8]>) -> String {
    format!("{}.jpg", ContentDigest::of_bytes(bytes.as_ref()).encoded())
}

// =========================================================================
// Event extractors
// =========================================================================

/// File names of every `Copied` destination, in event order.
pub fn copied_names(events: &[BuildEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            BuildEvent::Copied { to, .. } => {
                Some(to.file_name().unwrap().to_string_lossy().into_owned())
            }
            _ => None,
        })
        .collect()
}

/// File names of every `Rendered` document, in event order.
pub fn rendered_names(events: &[BuildEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            BuildEvent::Rendered { path, .. } => {
                Some(path.file_name().unwrap().to_string_lossy().into_owned())
            }
            _ => None,
        })
        .collect()
}

/// Destination recorded for `source` in a `Mapped` event. Panics if absent.
pub fn mapped_destination<'a>(events: &'a [BuildEvent], source: &str) -> &'a str {
    events
        .iter()
        .find_map(|e| match e {
            BuildEvent::Mapped {
                source: s,
                destination,
            } if s == source => Some(destination.as_str()),
            _ => None,
        })
        .unwrap_or_else(|| {
            let sources: Vec<&str> = events
                .iter()
                .filter_map(|e| match e {
                    BuildEvent::Mapped { source, .. } => Some(source.as_str()),
                    _ => None,
                })
                .collect();
            panic!("no Mapped event for '{source}'. Available: {sources:?}")
        })
}
