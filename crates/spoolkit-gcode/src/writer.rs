//! Atomic output writing.
//!
//! The merged job is written to a temporary file in the destination
//! directory and renamed over the final path only once every line is on
//! disk. A failed merge or a failed write leaves no partial output behind.

use spoolkit_core::{Error, Result};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::info;

use crate::merger::MergedDocument;

/// Write the merged document to `path`, atomically.
pub fn write_document(path: &Path, document: &MergedDocument) -> Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut temp = NamedTempFile::new_in(dir)?;
    for line in document.lines() {
        writeln!(temp, "{}", line)?;
    }
    temp.flush()?;
    temp.persist(path).map_err(|e| Error::Io(e.error))?;

    info!(path = %path.display(), "wrote merged job");
    Ok(())
}
