//! Format writers fed by the export pipeline.
//!
//! Writers that take their geometry at construction implement
//! [`EventWriter`]; writers that receive the geometry with every call
//! implement [`SnapshotWriter`]. Both write into a directory the pipeline
//! has already created and report the files they produced.

mod csv_geometry;
mod identifier_map;
mod json_material;
mod json_surfaces;
mod obj;

pub use csv_geometry::{CsvTrackingGeometryWriter, CsvWriterConfig};
pub use identifier_map::IdentifierMapWriter;
pub use json_material::{DocumentFormat, JsonMaterialWriter, MaterialWriterConfig};
pub use json_surfaces::{JsonSurfacesConfig, JsonSurfacesWriter};
pub use obj::{ObjTrackingGeometryWriter, ObjWriterConfig};

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::context::AlgorithmContext;
use crate::error::WriterError;
use crate::geometry::{GeometryIdentifier, TrackingGeometry};

/// Writer that reads everything it needs from the event context and the
/// geometry it was built with.
pub trait EventWriter {
    /// Name used in logs and error reports.
    fn name(&self) -> &str;

    /// Writes the outputs of one event.
    ///
    /// # Errors
    ///
    /// Returns an error if an output cannot be produced.
    fn write(&self, context: &AlgorithmContext<'_>) -> Result<Vec<PathBuf>, WriterError>;

    /// Writes run-level outputs after the last event.
    ///
    /// # Errors
    ///
    /// Returns an error if an output cannot be produced.
    fn finalize(&self) -> Result<Vec<PathBuf>, WriterError> {
        Ok(Vec::new())
    }
}

/// Writer that receives the geometry snapshot with every call.
pub trait SnapshotWriter {
    /// Name used in logs and error reports.
    fn name(&self) -> &str;

    /// Writes the outputs of one event.
    ///
    /// # Errors
    ///
    /// Returns an error if an output cannot be produced.
    fn write(
        &self,
        context: &AlgorithmContext<'_>,
        geometry: &TrackingGeometry,
    ) -> Result<Vec<PathBuf>, WriterError>;

    /// Writes run-level outputs after the last event.
    ///
    /// # Errors
    ///
    /// Returns an error if an output cannot be produced.
    fn finalize(&self, _geometry: &TrackingGeometry) -> Result<Vec<PathBuf>, WriterError> {
        Ok(Vec::new())
    }
}

/// Path of a per-event file: `<dir>/event<9 digits>-<name>`.
#[must_use]
pub fn per_event_path(dir: &Path, event: usize, name: &str) -> PathBuf {
    dir.join(format!("event{event:09}-{name}"))
}

pub(crate) fn create_file(path: &Path) -> Result<BufWriter<File>, WriterError> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|e| WriterError::io(path, e))
}

/// Identifier broken into its fields, for document output.
#[derive(Debug, Clone, Copy, Serialize)]
pub(crate) struct IdentifierFields {
    pub geometry_id: u64,
    pub volume: u64,
    pub boundary: u64,
    pub layer: u64,
    pub approach: u64,
    pub sensitive: u64,
    pub extra: u64,
}

impl From<GeometryIdentifier> for IdentifierFields {
    fn from(id: GeometryIdentifier) -> Self {
        Self {
            geometry_id: id.value(),
            volume: id.volume(),
            boundary: id.boundary(),
            layer: id.layer(),
            approach: id.approach(),
            sensitive: id.sensitive(),
            extra: id.extra(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_event_path_is_zero_padded() {
        let path = per_event_path(Path::new("out/csv"), 42, "detectors.csv");
        assert_eq!(path, Path::new("out/csv/event000000042-detectors.csv"));
    }

    #[test]
    fn identifier_fields_split_value() {
        let id = GeometryIdentifier::default().with_volume(3).with_layer(2).with_sensitive(9);
        let fields = IdentifierFields::from(id);
        assert_eq!(fields.geometry_id, id.value());
        assert_eq!((fields.volume, fields.layer, fields.sensitive), (3, 2, 9));
        assert_eq!(fields.boundary, 0);
    }
}
