//! The static build, start to finish.
//!
//! ```text
//! source/ ──scan──▶ SourceTree ──relocate──▶ ImageMapping + destination/<digest>.jpg
//!                       │                          │
//!                       └── markdowns ──rewrite────┘──render──▶ destination/index.html
//! ```
//!
//! Preconditions are checked before anything is written: the source must be a
//! directory and the destination must not exist at all. Every stage error is
//! fatal and is returned to the caller as a [`BuildError`]; a failed build may
//! leave a partial destination behind, which the next attempt will refuse to
//! touch until it is removed.
//!
//! [`identify`] runs the same walk and digest pass without writing anything,
//! for `mdsite scan`.

use crate::classify::Classifier;
use crate::config::{BuildConfig, ConfigError, ImagePolicy, validate_directory};
use crate::events::{BuildEvent, Recorder};
use crate::identity::{self, RelocateError, relative_key};
use crate::render::render_markdown;
use crate::rewrite::{LinkRewriter, RewriteError};
use crate::scan::{ScanError, scan};
use crate::types::{ImageMapping, ImageRecord};
use crate::writer::{HtmlWriter, WriterError};
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the HTML artifact inside the destination directory.
pub const INDEX_FILENAME: &str = "index.html";

#[derive(Error, Debug)]
pub enum BuildError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("destination already exists: {}", .0.display())]
    DestinationExists(PathBuf),
    #[error("failed to create destination {path:?}: {source}")]
    CreateDestination { path: PathBuf, source: io::Error },
    #[error("error while processing source files: {0}")]
    Scan(#[from] ScanError),
    #[error(transparent)]
    Relocate(#[from] RelocateError),
    #[error(transparent)]
    Rewrite(#[from] RewriteError),
    #[error("failed to read markdown {path:?}: {source}")]
    ReadMarkdown { path: PathBuf, source: io::Error },
    #[error(transparent)]
    Writer(#[from] WriterError),
}

/// What a finished build produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSummary {
    pub markdowns: usize,
    pub images: usize,
    pub unique_images: usize,
    pub index: PathBuf,
    pub index_bytes: usize,
}

pub fn build(
    config: &BuildConfig,
    recorder: &mut impl Recorder,
) -> Result<BuildSummary, BuildError> {
    validate_directory(&config.source)?;
    if fs::symlink_metadata(&config.destination).is_ok() {
        return Err(BuildError::DestinationExists(config.destination.clone()));
    }
    fs::create_dir_all(&config.destination).map_err(|source| {
        BuildError::CreateDestination {
            path: config.destination.clone(),
            source,
        }
    })?;

    let tree = scan(&config.source, &config.classifier, recorder)?;
    let mapping = identity::relocate_images(&tree.images, config, recorder)?;
    let rewriter = LinkRewriter::new(&mapping)?;

    let mut writer = HtmlWriter::create(config.destination.join(INDEX_FILENAME))?;
    for path in &tree.markdowns {
        let html = render_document(path, &rewriter)?;
        writer.append(&html)?;
        recorder.record(BuildEvent::Rendered {
            path: path.clone(),
            bytes: html.len(),
        });
    }
    let index_bytes = writer.bytes_written();
    let index = writer.finish()?;

    Ok(BuildSummary {
        markdowns: tree.markdowns.len(),
        images: mapping.len(),
        unique_images: mapping.unique_destinations(),
        index,
        index_bytes,
    })
}

/// Read one markdown file, rewrite its image references, and render it.
///
/// Bytes that are not valid UTF-8 become U+FFFD; only I/O failures are errors.
pub fn render_document(path: &Path, rewriter: &LinkRewriter) -> Result<String, BuildError> {
    let bytes = fs::read(path).map_err(|source| BuildError::ReadMarkdown {
        path: path.to_path_buf(),
        source,
    })?;
    let source = String::from_utf8_lossy(&bytes);
    Ok(render_markdown(&rewriter.rewrite(&source)))
}

// =============================================================================
// Dry run
// =============================================================================

/// What a build of `source` would produce, without producing it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    /// Markdown documents relative to the source root, in render order.
    pub markdowns: Vec<String>,
    pub images: Vec<ImageRecord>,
}

impl ScanReport {
    pub fn mapping(&self) -> ImageMapping {
        ImageMapping::from(self.images.as_slice())
    }
}

pub fn identify(
    source: &Path,
    classifier: &Classifier,
    policy: &ImagePolicy,
    recorder: &mut impl Recorder,
) -> Result<ScanReport, BuildError> {
    validate_directory(source)?;
    let tree = scan(source, classifier, recorder)?;
    let images = identity::identify_images(&tree.images, source, policy)?;
    let markdowns = tree
        .markdowns
        .iter()
        .filter_map(|path| relative_key(source, path))
        .collect();
    Ok(ScanReport { markdowns, images })
}
