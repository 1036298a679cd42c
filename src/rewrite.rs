//! Image link rewriting.
//!
//! Before a document is rendered, every occurrence of a known source-relative
//! image path is replaced with its content-addressed destination name. The
//! substitution is textual: case-sensitive, global, non-overlapping, and
//! blind to markdown structure. A path that appears in prose is rewritten
//! too. Paths that are not in the mapping are left exactly as written.
//!
//! All keys are matched in one scan of the original text, leftmost-longest:
//! `a/img/x.jpg` wins over its suffix `img/x.jpg`, and a replacement is never
//! searched again, so a key such as `g.jpg` cannot match inside a destination
//! name that happens to end in `g.jpg`.

use crate::types::ImageMapping;
use aho_corasick::{AhoCorasick, MatchKind};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RewriteError {
    #[error("failed to build image path matcher: {0}")]
    Matcher(#[from] aho_corasick::BuildError),
}

/// Rewrites documents against one mapping. Build once per run, reuse for
/// every document.
#[derive(Debug, Clone)]
pub struct LinkRewriter {
    matcher: Option<AhoCorasick>,
    replacements: Vec<String>,
}

impl LinkRewriter {
    pub fn new(mapping: &ImageMapping) -> Result<Self, RewriteError> {
        if mapping.is_empty() {
            return Ok(Self {
                matcher: None,
                replacements: Vec::new(),
            });
        }
        let (sources, replacements): (Vec<&str>, Vec<String>) = mapping
            .iter()
            .map(|(source, destination)| (source, destination.to_string()))
            .unzip();
        let matcher = AhoCorasick::builder()
            .match_kind(MatchKind::LeftmostLongest)
            .build(sources)?;
        Ok(Self {
            matcher: Some(matcher),
            replacements,
        })
    }

    pub fn rewrite(&self, document: &str) -> String {
        match &self.matcher {
            Some(matcher) => matcher.replace_all(document, &self.replacements),
            None => document.to_owned(),
        }
    }
}

pub fn rewrite_links(document: &str, mapping: &ImageMapping) -> Result<String, RewriteError> {
    Ok(LinkRewriter::new(mapping)?.rewrite(document))
}
