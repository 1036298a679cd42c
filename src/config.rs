//! Configuration for builds and the live server.
//!
//! Two layers:
//!
//! - **`mdsite.toml`** ([`SiteConfig`]): optional file in the source (or
//!   served) directory. Sparse: it only needs the keys it overrides, which are
//!   merged on top of the stock defaults. Unknown keys are rejected.
//! - **Run configs** ([`BuildConfig`], [`ServeConfig`]): immutable structs
//!   built once from CLI flags plus the resolved [`SiteConfig`], then handed
//!   to each component by reference. Nothing reads ambient state, so several
//!   builds can run in one process without stepping on each other.
//!
//! ## Configuration Options
//!
//! ```toml
//! [markdown]
//! extensions = ["md"]             # Files rendered as markdown
//!
//! [images]
//! extensions = ["jpg", "jpeg"]    # Files relocated by content digest
//! output_extension = "jpg"        # Suffix of every relocated image
//! keep_source_extension = false   # Use the source suffix instead
//! copy_policy = "overwrite"       # or "skip-existing"
//!
//! [serve]
//! port = 8080
//! ```

use crate::classify::{Classifier, normalize_extension};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the optional config file looked up in the source directory.
pub const CONFIG_FILENAME: &str = "mdsite.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("failed to open path {path:?}: {source}")]
    NotFound {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("the provided path {0:?} is not a directory")]
    NotADirectory(PathBuf),
}

/// Contents of `mdsite.toml`. Every field has a default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    pub markdown: MarkdownConfig,
    pub images: ImagesConfig,
    pub serve: ServeSettings,
}

impl SiteConfig {
    /// Validate values that deserialize fine but make no sense.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.markdown.extensions.is_empty() {
            return Err(ConfigError::Validation(
                "markdown.extensions must not be empty".into(),
            ));
        }
        if self.images.extensions.is_empty() {
            return Err(ConfigError::Validation(
                "images.extensions must not be empty".into(),
            ));
        }
        let markdown: Vec<String> = self
            .markdown
            .extensions
            .iter()
            .map(normalize_extension)
            .collect();
        if let Some(shared) = self
            .images
            .extensions
            .iter()
            .map(normalize_extension)
            .find(|ext| markdown.contains(ext))
        {
            return Err(ConfigError::Validation(format!(
                "extension {shared:?} is listed as both markdown and image"
            )));
        }
        let out = normalize_extension(&self.images.output_extension);
        if out.is_empty() || !out.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ConfigError::Validation(
                "images.output_extension must be a non-empty alphanumeric suffix".into(),
            ));
        }
        if self.serve.port == 0 {
            return Err(ConfigError::Validation("serve.port must be non-zero".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MarkdownConfig {
    pub extensions: Vec<String>,
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["md".into()],
        }
    }
}

/// Which files count as images and how they are renamed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImagesConfig {
    pub extensions: Vec<String>,
    /// Suffix given to every relocated image.
    pub output_extension: String,
    /// When true, relocated images keep their own (lowercased) suffix.
    pub keep_source_extension: bool,
    pub copy_policy: CopyPolicy,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["jpg".into(), "jpeg".into()],
            output_extension: "jpg".into(),
            keep_source_extension: false,
            copy_policy: CopyPolicy::Overwrite,
        }
    }
}

/// What to do when a second source image has the same digest as one
/// already copied in this build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CopyPolicy {
    /// Copy every source image, rewriting identical bytes to the same name.
    #[default]
    Overwrite,
    /// Copy each digest once; later duplicates are only mapped.
    SkipExisting,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServeSettings {
    pub port: u16,
}

impl Default for ServeSettings {
    fn default() -> Self {
        Self { port: 8080 }
    }
}

// =============================================================================
// Run configs
// =============================================================================

/// Naming and copy rules for relocated images.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePolicy {
    pub output_extension: String,
    pub keep_source_extension: bool,
    pub copy_policy: CopyPolicy,
}

impl ImagePolicy {
    pub fn from_config(images: &ImagesConfig) -> Self {
        Self {
            output_extension: normalize_extension(&images.output_extension),
            keep_source_extension: images.keep_source_extension,
            copy_policy: images.copy_policy,
        }
    }
}

impl Default for ImagePolicy {
    fn default() -> Self {
        Self::from_config(&ImagesConfig::default())
    }
}

/// Everything one static build needs.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub classifier: Classifier,
    pub images: ImagePolicy,
}

impl BuildConfig {
    pub fn new(
        source: impl Into<PathBuf>,
        destination: impl Into<PathBuf>,
        site: &SiteConfig,
    ) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            classifier: Classifier::from_config(site),
            images: ImagePolicy::from_config(&site.images),
        }
    }
}

/// Everything the live server needs. Shared read-only across requests.
#[derive(Debug, Clone)]
pub struct ServeConfig {
    pub dir: PathBuf,
    pub port: u16,
    pub classifier: Classifier,
}

impl ServeConfig {
    pub fn new(dir: impl Into<PathBuf>, site: &SiteConfig) -> Self {
        Self {
            dir: dir.into(),
            port: site.serve.port,
            classifier: Classifier::from_config(site),
        }
    }
}

/// Check that `path` exists and is a directory.
pub fn validate_directory(path: &Path) -> Result<(), ConfigError> {
    let metadata = fs::metadata(path).map_err(|source| ConfigError::NotFound {
        path: path.to_path_buf(),
        source,
    })?;
    if !metadata.is_dir() {
        return Err(ConfigError::NotADirectory(path.to_path_buf()));
    }
    Ok(())
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SiteConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// Tables merge key by key; any other overlay value replaces the base value.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `mdsite.toml` from a directory as a raw TOML value.
///
/// `Ok(None)` when the file does not exist.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join(CONFIG_FILENAME);
    if !config_path.is_file() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load `mdsite.toml` from `dir` over the stock defaults.
pub fn load_config(dir: &Path) -> Result<SiteConfig, ConfigError> {
    resolve_config(stock_defaults_value(), load_raw_config(dir)?)
}

/// A fully commented stock `mdsite.toml`. Printed by `mdsite gen-config`.
pub fn stock_config_toml() -> &'static str {
    r##"# mdsite configuration
# ====================
# Place this file as mdsite.toml in the source directory (build, scan) or the
# working directory (serve). Every key is optional; values below are the
# defaults. Unknown keys are an error.

# ---------------------------------------------------------------------------
# Markdown
# ---------------------------------------------------------------------------
[markdown]
# File extensions rendered as markdown (case-insensitive).
extensions = ["md"]

# ---------------------------------------------------------------------------
# Images
# ---------------------------------------------------------------------------
[images]
# File extensions relocated under their content digest (case-insensitive).
extensions = ["jpg", "jpeg"]

# Suffix of every relocated image: <base64url(sha3-224)>.<output_extension>
output_extension = "jpg"

# Keep each image's own suffix instead of output_extension.
keep_source_extension = false

# "overwrite": copy every source image, even when its bytes were already
#              written under the same name in this build.
# "skip-existing": copy each distinct digest once.
copy_policy = "overwrite"

# ---------------------------------------------------------------------------
# Live server
# ---------------------------------------------------------------------------
[serve]
port = 8080
"##
}
