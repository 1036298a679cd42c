//! # mdsite
//!
//! Turns a directory of markdown notes and photos into a one-page static
//! site, or serves the same directory live while you write.
//!
//! # Two Modes
//!
//! ```text
//! build   source/  →  destination/index.html + destination/<digest>.jpg
//! serve   dir/     →  http://localhost:8080/<note>.md   (rendered per request)
//! ```
//!
//! The static build runs in four stages, each a plain function over the
//! previous stage's output:
//!
//! ```text
//! 1. Scan       source/       →  SourceTree     (markdown + images, sorted)
//! 2. Relocate   SourceTree    →  ImageMapping   (images copied under digest names)
//! 3. Rewrite    markdown      →  markdown       (image paths → digest names)
//! 4. Render     markdown      →  index.html     (concatenated HTML fragments)
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`pipeline`] | Runs the static build end to end; dry-run `identify` for scan mode |
//! | [`scan`] | Stage 1: deterministic recursive walk, split by [`classify`] |
//! | [`identity`] | Stage 2: SHA3-224 digests, destination names, image copying |
//! | [`rewrite`] | Stage 3: literal substitution of mapped image paths |
//! | [`render`] | Stage 4: markdown → HTML via `pulldown-cmark` |
//! | [`writer`] | The `index.html` artifact |
//! | [`serve`] | Live-serve mode over `axum` |
//! | [`config`] | `mdsite.toml` loading, merging, validation; run configs |
//! | [`events`] | Build progress events and the `Recorder` sink trait |
//! | [`output`] | CLI output formatting |
//! | [`types`] | Types passed between stages (`SourceTree`, `ImageMapping`) |
//!
//! # Design Decisions
//!
//! ## Content-Addressed Images
//!
//! An image's published name is the URL-safe base64 of the SHA3-224 digest of
//! its bytes. Renaming or moving a photo in the source tree never changes its
//! published name, and two copies of the same photo are published once.
//! Because names depend only on bytes, two builds of the same tree produce
//! byte-identical output.
//!
//! ## Textual Link Rewriting
//!
//! Image references are rewritten as plain text before markdown is parsed.
//! It is simple and predictable: whatever path you typed, if it names a file
//! in the source tree relative to the root, it is replaced. The cost is that
//! a path mentioned in prose is rewritten too.
//!
//! All paths are matched in a single leftmost-longest scan, so text that was
//! just substituted in is never matched again.
//!
//! ## Refuse, Don't Clobber
//!
//! A build never writes into an existing destination. Delete it and build
//! again. Half-written output from a failed build is never mistaken for a
//! finished one.
//!
//! ## Explicit Configuration
//!
//! Every component receives its settings as a struct argument
//! ([`config::BuildConfig`], [`config::ServeConfig`]) and reports progress to
//! an injected [`events::Recorder`]. There are no globals. Only the
//! [`output`] `print_*` helpers write to stdout, and only the binary calls them.

pub mod classify;
pub mod config;
pub mod events;
pub mod identity;
pub mod output;
pub mod pipeline;
pub mod render;
pub mod rewrite;
pub mod scan;
pub mod serve;
pub mod types;
pub mod writer;

#[cfg(test)]
pub(crate) mod test_helpers;
