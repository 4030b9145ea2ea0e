//! On-disk persistence for datasets and versioned model artifacts.
//!
//! Every write goes to a temporary file in the destination directory and is
//! renamed into place, so readers see either the old file or the new one.

mod artifacts;
mod dataset;

pub use artifacts::{ArtifactStore, ARTIFACT_FORMAT};
pub use dataset::{read_dataset, write_dataset, CSV_HEADER};

use crate::error::Result;
use std::io::Write;
use std::path::Path;

pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
