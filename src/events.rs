//! Build progress events and the sinks that receive them.
//!
//! Components never print. They report what they did to a [`Recorder`] passed
//! in by the caller: the CLI forwards events over an `mpsc` channel to a
//! printer thread, tests collect them into a `Vec` and assert on them.
//! Events are informational only; nothing downstream depends on them.

use std::path::PathBuf;
use std::sync::mpsc::Sender;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildEvent {
    /// A file that is neither markdown nor an image was left alone.
    Skipped { path: PathBuf },
    /// An image got its content-addressed name.
    Mapped { source: String, destination: String },
    /// An image's bytes were written to the destination.
    Copied { from: PathBuf, to: PathBuf },
    /// An image shared a digest with one already written and was not copied.
    DuplicateSkipped { from: PathBuf, to: PathBuf },
    /// A markdown document was rewritten, rendered, and appended.
    Rendered { path: PathBuf, bytes: usize },
}

pub trait Recorder {
    fn record(&mut self, event: BuildEvent);
}

impl Recorder for Vec<BuildEvent> {
    fn record(&mut self, event: BuildEvent) {
        self.push(event);
    }
}

impl Recorder for Sender<BuildEvent> {
    fn record(&mut self, event: BuildEvent) {
        // A dropped receiver only loses progress output.
        let _ = self.send(event);
    }
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRecorder;

impl Recorder for NullRecorder {
    fn record(&mut self, _event: BuildEvent) {}
}
