//! Extension-based classification of source files.
//!
//! Every file in a source tree is exactly one of markdown, image, or other.
//! Matching ignores case, so `Cover.JPG` is an image and `NOTES.MD` is
//! markdown. Files without an extension are always [`FileKind::Other`].

use crate::config::SiteConfig;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Markdown,
    Image,
    Other,
}

/// Recognized extensions, stored lowercase without the leading dot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classifier {
    markdown: Vec<String>,
    image: Vec<String>,
}

impl Classifier {
    pub fn new<M, I, S>(markdown: M, image: I) -> Self
    where
        M: IntoIterator<Item = S>,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            markdown: markdown.into_iter().map(normalize_extension).collect(),
            image: image.into_iter().map(normalize_extension).collect(),
        }
    }

    pub fn from_config(config: &SiteConfig) -> Self {
        Self::new(&config.markdown.extensions, &config.images.extensions)
    }

    pub fn classify(&self, path: &Path) -> FileKind {
        let Some(ext) = path.extension() else {
            return FileKind::Other;
        };
        let ext = ext.to_string_lossy().to_lowercase();
        if self.markdown.contains(&ext) {
            FileKind::Markdown
        } else if self.image.contains(&ext) {
            FileKind::Image
        } else {
            FileKind::Other
        }
    }

    pub fn is_markdown(&self, path: &Path) -> bool {
        self.classify(path) == FileKind::Markdown
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::from_config(&SiteConfig::default())
    }
}

/// Lowercase and strip a leading dot: `".JPG"` → `"jpg"`.
pub fn normalize_extension(ext: impl AsRef<str>) -> String {
    ext.as_ref().trim().trim_start_matches('.').to_lowercase()
}
