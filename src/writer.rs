//! The single HTML artifact of a static build.
//!
//! [`HtmlWriter`] refuses to reuse an existing file, buffers appends, and
//! reports how much it has written. Rendered fragments are concatenated with
//! no separator and no surrounding document. Dropping the writer without
//! calling [`HtmlWriter::finish`] still closes the file, but buffered bytes
//! may be lost and no error is reported.

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WriterError {
    #[error("failed to create {path:?}: {source}")]
    Create { path: PathBuf, source: io::Error },
    #[error("failed to write {path:?}: {source}")]
    Write { path: PathBuf, source: io::Error },
}

#[derive(Debug)]
pub struct HtmlWriter {
    path: PathBuf,
    out: BufWriter<File>,
    written: usize,
}

impl HtmlWriter {
    /// Create `path`. Fails if anything already exists there.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self, WriterError> {
        let path = path.into();
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|source| WriterError::Create {
                path: path.clone(),
                source,
            })?;
        Ok(Self {
            path,
            out: BufWriter::new(file),
            written: 0,
        })
    }

    pub fn append(&mut self, html: &str) -> Result<(), WriterError> {
        self.out
            .write_all(html.as_bytes())
            .map_err(|source| WriterError::Write {
                path: self.path.clone(),
                source,
            })?;
        self.written += html.len();
        Ok(())
    }

    pub fn bytes_written(&self) -> usize {
        self.written
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush buffered output and close the file.
    pub fn finish(mut self) -> Result<PathBuf, WriterError> {
        self.out.flush().map_err(|source| WriterError::Write {
            path: self.path.clone(),
            source,
        })?;
        Ok(self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn appends_are_concatenated_verbatim() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("index.html");

        let mut writer = HtmlWriter::create(&path).unwrap();
        writer.append("<h1>A</h1>\n").unwrap();
        writer.append("<p>b</p>").unwrap();
        assert_eq!(writer.bytes_written(), 19);
        let finished = writer.finish().unwrap();

        assert_eq!(finished, path);
        assert_eq!(fs::read_to_string(&path).unwrap(), "<h1>A</h1>\n<p>b</p>");
    }

    #[test]
    fn finish_without_appends_leaves_empty_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("index.html");
        HtmlWriter::create(&path).unwrap().finish().unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"");
    }

    #[test]
    fn existing_file_is_not_overwritten() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("index.html");
        fs::write(&path, "keep me").unwrap();

        let result = HtmlWriter::create(&path);

        assert!(matches!(result, Err(WriterError::Create { .. })));
        assert_eq!(fs::read_to_string(&path).unwrap(), "keep me");
    }

    #[test]
    fn missing_parent_is_create_error() {
        let tmp = TempDir::new().unwrap();
        let result = HtmlWriter::create(tmp.path().join("no/such/index.html"));
        assert!(matches!(result, Err(WriterError::Create { .. })));
    }
}
