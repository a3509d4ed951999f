use std::io::Write;
use std::path::PathBuf;

use tracing::{debug, info};

use crate::error::WriterError;
use crate::geometry::TrackingGeometry;

use super::create_file;

/// Writes the mapping from source element identifiers to geometry
/// identifiers as a JSON object keyed by the decimal source identifier.
pub struct IdentifierMapWriter {
    path: PathBuf,
}

impl IdentifierMapWriter {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Writes the mapping, or nothing if no surface carries a source
    /// identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if two surfaces share a source identifier or the
    /// file cannot be written.
    pub fn write(&self, geometry: &TrackingGeometry) -> Result<Option<PathBuf>, WriterError> {
        let map = geometry.source_identifier_map()?;
        if map.is_empty() {
            info!("geometry carries no source identifiers, skipping identifier map");
            return Ok(None);
        }
        let mut out = create_file(&self.path)?;
        serde_json::to_writer_pretty(&mut out, &map)?;
        out.write_all(b"\n")
            .and_then(|()| out.flush())
            .map_err(|e| WriterError::io(&self.path, e))?;
        debug!(path = %self.path.display(), entries = map.len(), "wrote identifier map");
        Ok(Some(self.path.clone()))
    }
}
