//! Shared types passed between the build stages.
//!
//! The walker produces a [`SourceTree`], the identity engine turns its images
//! into [`ImageRecord`]s and an [`ImageMapping`], and the rewriter consumes the
//! mapping. None of these are persisted between runs.

use serde::Serialize;
use std::collections::BTreeMap;
use std::collections::HashSet;
use std::path::PathBuf;

/// Files found by the source walk, in traversal order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SourceTree {
    pub markdowns: Vec<PathBuf>,
    pub images: Vec<PathBuf>,
}

/// Identity of one source image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageRecord {
    /// Path relative to the source root, always `/`-separated.
    pub source: String,
    /// URL-safe base64 of the SHA3-224 content digest.
    pub digest: String,
    /// Path relative to the destination root.
    pub destination: String,
}

/// Source-relative image path → destination-relative path.
///
/// Keys are unique. Values may repeat: two images with identical bytes share
/// one destination, which is the point of content addressing.
///
/// Backed by a `BTreeMap` so iteration order is stable across runs.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ImageMapping(BTreeMap<String, String>);

impl ImageMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry, returning the previous destination for `source` if any.
    pub fn insert(&mut self, source: String, destination: String) -> Option<String> {
        self.0.insert(source, destination)
    }

    pub fn get(&self, source: &str) -> Option<&str> {
        self.0.get(source).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of distinct destination files the mapping points at.
    pub fn unique_destinations(&self) -> usize {
        self.0.values().collect::<HashSet<_>>().len()
    }
}

impl FromIterator<(String, String)> for ImageMapping {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<&[ImageRecord]> for ImageMapping {
    fn from(records: &[ImageRecord]) -> Self {
        records
            .iter()
            .map(|r| (r.source.clone(), r.destination.clone()))
            .collect()
    }
}
