//! Output sinks.
//!
//! The rendered document goes either to stdout or to a file. Files are
//! written to a temporary sibling first and moved into place once complete,
//! so a failed run never leaves a truncated agenda behind.

use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{ClientError, ClientResult};

/// Where the document is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputSink {
    /// Standard output.
    Stdout,
    /// A file, replaced atomically.
    File(PathBuf),
}

impl OutputSink {
    /// Creates a sink for an optional output path.
    pub fn new(path: Option<PathBuf>) -> Self {
        match path {
            Some(path) => Self::File(path),
            None => Self::Stdout,
        }
    }

    /// Runs `render` against the sink.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Sink`] naming the stage that failed.
    pub fn write_with<F>(&self, render: F) -> ClientResult<()>
    where
        F: FnOnce(&mut dyn Write) -> io::Result<()>,
    {
        match self {
            Self::Stdout => {
                let stdout = io::stdout();
                let mut writer = BufWriter::new(stdout.lock());
                render(&mut writer).map_err(|e| ClientError::sink("write output", e))?;
                writer.flush().map_err(|e| ClientError::sink("write output", e))
            }
            Self::File(path) => write_file(path, render),
        }
    }
}

fn write_file<F>(path: &Path, render: F) -> ClientResult<()>
where
    F: FnOnce(&mut dyn Write) -> io::Result<()>,
{
    let parent = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&parent).map_err(|e| ClientError::sink("create output directory", e))?;

    let temp = tempfile::NamedTempFile::new_in(&parent)
        .map_err(|e| ClientError::sink("create temporary file", e))?;
    debug!(temp = %temp.path().display(), "Writing to temporary file");

    let mut writer = BufWriter::new(temp);
    render(&mut writer).map_err(|e| ClientError::sink("write output", e))?;
    let temp = writer
        .into_inner()
        .map_err(|e| ClientError::sink("write output", e.into_error()))?;

    temp.persist(path)
        .map_err(|e| ClientError::sink("persist output", e.error))?;
    info!(path = %path.display(), "Wrote output file");
    Ok(())
}
