//! Content-addressed image identity and relocation.
//!
//! Every image is named by what it contains, not where it lives:
//!
//! ```text
//! source/img/cat.jpg  ──SHA3-224──▶  28-byte digest  ──base64url──▶  a04DQjZn…xw.jpg
//! ```
//!
//! # Naming
//!
//! - **Digest**: SHA3-224 over the full byte stream. Collision resistance is
//!   what keeps two unrelated images from landing on the same name.
//! - **Encoding**: URL-safe base64 without padding (38 characters), so the
//!   name drops into a markdown link or URL untouched.
//! - **Suffix**: fixed by [`ImagePolicy::output_extension`] (`jpg` by
//!   default) unless `keep_source_extension` is set.
//!
//! Identical bytes under two source paths map to one destination name. The
//! mapping keeps both keys; only the destination collides.
//!
//! # Copying
//!
//! Each source file is opened once. The handle is hashed, rewound, and copied
//! into `<destination>/<name>`. Under [`CopyPolicy::Overwrite`] every source
//! image is copied, so a shared name is rewritten with the same bytes. Under
//! [`CopyPolicy::SkipExisting`] the second and later copies are skipped.
//!
//! Any open, read, copy, or write failure aborts the whole pass: the rewriter needs
//! a complete mapping.

use crate::config::{BuildConfig, CopyPolicy, ImagePolicy};
use crate::events::{BuildEvent, Recorder};
use crate::types::{ImageMapping, ImageRecord};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use sha3::{Digest, Sha3_224};
use std::collections::HashSet;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RelocateError {
    #[error("failed to open image {path:?}: {source}")]
    Open { path: PathBuf, source: io::Error },
    #[error("failed to read image {path:?}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("image {path:?} is not under source root {root:?}")]
    OutsideRoot { path: PathBuf, root: PathBuf },
    #[error("failed to write image {path:?}: {source}")]
    Write { path: PathBuf, source: io::Error },
    #[error("failed to copy image {from:?} to {to:?}: {source}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },
}

/// SHA3-224 digest of an image's bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentDigest([u8; ContentDigest::LEN]);

impl ContentDigest {
    pub const LEN: usize = 28;

    pub fn of_bytes(bytes: &[u8]) -> Self {
        let mut hasher = Sha3_224::new();
        hasher.update(bytes);
        Self::from_hasher(hasher)
    }

    fn from_hasher(hasher: Sha3_224) -> Self {
        let mut out = [0u8; Self::LEN];
        out.copy_from_slice(&hasher.finalize());
        Self(out)
    }

    pub fn as_bytes(&self) -> &[u8; Self::LEN] {
        &self.0
    }

    /// URL-safe, unpadded base64.
    pub fn encoded(&self) -> String {
        URL_SAFE_NO_PAD.encode(self.0)
    }
}

/// Stream a reader to the end and digest everything it produced.
pub fn content_digest(reader: &mut impl Read) -> io::Result<ContentDigest> {
    let mut hasher = Sha3_224::new();
    io::copy(reader, &mut hasher)?;
    Ok(ContentDigest::from_hasher(hasher))
}

/// Destination file name for an image: `<encoded digest>.<suffix>`.
pub fn destination_name(digest: &ContentDigest, policy: &ImagePolicy, source: &Path) -> String {
    let suffix = policy
        .keep_source_extension
        .then(|| source.extension())
        .flatten()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .filter(|ext| !ext.is_empty())
        .unwrap_or_else(|| policy.output_extension.clone());
    format!("{}.{}", digest.encoded(), suffix)
}

/// Path of `path` relative to `root`, joined with `/` on every platform.
///
/// `None` when `path` is not strictly below `root`.
pub fn relative_key(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.is_empty() {
        return None;
    }
    Some(parts.join("/"))
}

fn build_record(
    image: &Path,
    digest: &ContentDigest,
    root: &Path,
    policy: &ImagePolicy,
) -> Result<ImageRecord, RelocateError> {
    let source = relative_key(root, image).ok_or_else(|| RelocateError::OutsideRoot {
        path: image.to_path_buf(),
        root: root.to_path_buf(),
    })?;
    Ok(ImageRecord {
        source,
        digest: digest.encoded(),
        destination: destination_name(digest, policy, image),
    })
}

fn open_image(image: &Path) -> Result<File, RelocateError> {
    File::open(image).map_err(|source| RelocateError::Open {
        path: image.to_path_buf(),
        source,
    })
}

fn digest_file(image: &Path, file: &mut File) -> Result<ContentDigest, RelocateError> {
    content_digest(file).map_err(|source| RelocateError::Read {
        path: image.to_path_buf(),
        source,
    })
}

/// Compute records for `images` without copying anything.
pub fn identify_images(
    images: &[PathBuf],
    root: &Path,
    policy: &ImagePolicy,
) -> Result<Vec<ImageRecord>, RelocateError> {
    images
        .iter()
        .map(|image| {
            let mut file = open_image(image)?;
            let digest = digest_file(image, &mut file)?;
            build_record(image, &digest, root, policy)
        })
        .collect()
}

/// Digest, map, and copy every image into `config.destination`.
///
/// The destination directory must already exist.
pub fn relocate_images(
    images: &[PathBuf],
    config: &BuildConfig,
    recorder: &mut impl Recorder,
) -> Result<ImageMapping, RelocateError> {
    let mut mapping = ImageMapping::new();
    let mut written = HashSet::new();

    for image in images {
        let record = relocate_image(image, config, &mut written, recorder)?;
        mapping.insert(record.source, record.destination);
    }

    Ok(mapping)
}

fn relocate_image(
    image: &Path,
    config: &BuildConfig,
    written: &mut HashSet<String>,
    recorder: &mut impl Recorder,
) -> Result<ImageRecord, RelocateError> {
    let mut file = open_image(image)?;
    let digest = digest_file(image, &mut file)?;
    let record = build_record(image, &digest, &config.source, &config.images)?;
    recorder.record(BuildEvent::Mapped {
        source: record.source.clone(),
        destination: record.destination.clone(),
    });

    let dest_path = config.destination.join(&record.destination);
    let first_write = written.insert(record.destination.clone());
    if !first_write && config.images.copy_policy == CopyPolicy::SkipExisting {
        recorder.record(BuildEvent::DuplicateSkipped {
            from: image.to_path_buf(),
            to: dest_path,
        });
        return Ok(record);
    }

    file.seek(SeekFrom::Start(0))
        .map_err(|source| RelocateError::Read {
            path: image.to_path_buf(),
            source,
        })?;
    copy_to(image, &mut file, &dest_path)?;
    recorder.record(BuildEvent::Copied {
        from: image.to_path_buf(),
        to: dest_path,
    });

    Ok(record)
}

fn copy_to(image: &Path, file: &mut File, dest_path: &Path) -> Result<(), RelocateError> {
    let mut out = File::create(dest_path).map_err(|source| RelocateError::Write {
        path: dest_path.to_path_buf(),
        source,
    })?;
    io::copy(file, &mut out).map_err(|source| RelocateError::Copy {
        from: image.to_path_buf(),
        to: dest_path.to_path_buf(),
        source,
    })?;
    out.sync_all().map_err(|source| RelocateError::Write {
        path: dest_path.to_path_buf(),
        source,
    })
}
