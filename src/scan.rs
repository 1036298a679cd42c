//! Source tree walking.
//!
//! First stage of the static build. Walks the source directory recursively,
//! sorting siblings by file name so the same tree always yields the same
//! order, and splits files into markdown documents and images. Anything else
//! is reported as [`BuildEvent::Skipped`] and ignored.
//!
//! ```text
//! notes/                      markdowns        images
//! ├── a.md                 →  notes/a.md
//! ├── img/
//! │   ├── cat.jpg          →                   notes/img/cat.jpg
//! │   └── dog.JPEG         →                   notes/img/dog.JPEG
//! ├── mdsite.toml          →  (skipped)
//! └── z/b.md               →  notes/z/b.md
//! ```
//!
//! A traversal error (unreadable directory, entry removed mid-walk, missing
//! root) aborts the walk. There is no partial result.

use crate::classify::{Classifier, FileKind};
use crate::events::{BuildEvent, Recorder};
use crate::types::SourceTree;
use std::path::Path;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("failed to walk source tree: {0}")]
    Walk(#[from] walkdir::Error),
}

pub fn scan(
    root: &Path,
    classifier: &Classifier,
    recorder: &mut impl Recorder,
) -> Result<SourceTree, ScanError> {
    let mut tree = SourceTree::default();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_dir() {
            continue;
        }
        let path = entry.into_path();
        match classifier.classify(&path) {
            FileKind::Markdown => tree.markdowns.push(path),
            FileKind::Image => tree.images.push(path),
            FileKind::Other => recorder.record(BuildEvent::Skipped { path }),
        }
    }

    Ok(tree)
}
