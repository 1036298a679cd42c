//! CLI output formatting for builds and scans.
//!
//! Every source path is shown relative to the source root, and every image
//! is shown next to the content-addressed name it was given.
//!
//! # Output Format
//!
//! ## Build (streamed, one event at a time)
//!
//! ```text
//! Skipped notes.txt
//! Image img/cat.jpg → a04DQjZn27c7bhVFTw6xq9RZf5obB44_W1prxw.jpg
//!     Copied
//! Image other/cat.jpg → a04DQjZn27c7bhVFTw6xq9RZf5obB44_W1prxw.jpg
//!     Duplicate of a04DQjZn27c7bhVFTw6xq9RZf5obB44_W1prxw.jpg, not copied
//! Page a.md (1.2 KB)
//!
//! Built 1 page, 2 images (1 unique) → site/index.html
//! ```
//!
//! ## Scan
//!
//! ```text
//! Pages
//! 001 a.md
//! 002 z/b.md
//!
//! Images
//! 001 img/cat.jpg
//!     → a04DQjZn27c7bhVFTw6xq9RZf5obB44_W1prxw.jpg
//!
//! 2 pages, 1 image (1 unique)
//! ```
//!
//! Each `format_*` function returns lines for testability; the `print_*`
//! wrappers write them to stdout.

use crate::events::BuildEvent;
use crate::identity::relative_key;
use crate::pipeline::{BuildSummary, ScanReport};
use std::path::Path;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

fn format_size(bytes: usize) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

/// Path relative to `root` when possible, otherwise as given.
fn display_path(root: &Path, path: &Path) -> String {
    relative_key(root, path).unwrap_or_else(|| path.display().to_string())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// ============================================================================
// Build
// ============================================================================

/// Format a single build event as display lines.
pub fn format_build_event(event: &BuildEvent, source_root: &Path) -> Vec<String> {
    match event {
        BuildEvent::Skipped { path } => {
            vec![format!("Skipped {}", display_path(source_root, path))]
        }
        BuildEvent::Mapped {
            source,
            destination,
        } => vec![format!("Image {source} → {destination}")],
        BuildEvent::Copied { .. } => vec![format!("{}Copied", indent(1))],
        BuildEvent::DuplicateSkipped { to, .. } => vec![format!(
            "{}Duplicate of {}, not copied",
            indent(1),
            file_name(to)
        )],
        BuildEvent::Rendered { path, bytes } => vec![format!(
            "Page {} ({})",
            display_path(source_root, path),
            format_size(*bytes)
        )],
    }
}

pub fn format_build_summary(summary: &BuildSummary) -> Vec<String> {
    vec![
        String::new(),
        format!(
            "Built {}, {} ({} unique) → {}",
            plural(summary.markdowns, "page"),
            plural(summary.images, "image"),
            summary.unique_images,
            summary.index.display()
        ),
    ]
}

pub fn print_build_summary(summary: &BuildSummary) {
    for line in format_build_summary(summary) {
        println!("{}", line);
    }
}

// ============================================================================
// Scan
// ============================================================================

pub fn format_scan_output(report: &ScanReport) -> Vec<String> {
    let mut lines = Vec::new();

    if !report.markdowns.is_empty() {
        lines.push("Pages".to_string());
        for (i, page) in report.markdowns.iter().enumerate() {
            lines.push(format!("{} {}", format_index(i + 1), page));
        }
    }

    if !report.images.is_empty() {
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.push("Images".to_string());
        for (i, image) in report.images.iter().enumerate() {
            lines.push(format!("{} {}", format_index(i + 1), image.source));
            lines.push(format!("{}→ {}", indent(1), image.destination));
        }
    }

    if !lines.is_empty() {
        lines.push(String::new());
    }
    lines.push(format!(
        "{}, {} ({} unique)",
        plural(report.markdowns.len(), "page"),
        plural(report.images.len(), "image"),
        report.mapping().unique_destinations()
    ));
    lines
}

pub fn print_scan_output(report: &ScanReport) {
    for line in format_scan_output(report) {
        println!("{}", line);
    }
}
