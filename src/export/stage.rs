use std::path::{Path, PathBuf};

use crate::context::AlgorithmContext;
use crate::error::WriterError;
use crate::geometry::TrackingGeometry;
use crate::io::{EventWriter, SnapshotWriter};

/// Output families, each written below its own subdirectory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputKind {
    Csv,
    Obj,
    Json,
}

impl OutputKind {
    /// All kinds in the order their stages run.
    pub const ALL: [Self; 3] = [Self::Csv, Self::Obj, Self::Json];

    /// Subdirectory of the output root.
    #[must_use]
    pub fn subdir(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Obj => "obj",
            Self::Json => "json",
        }
    }
}

/// A writer of either calling convention.
pub enum WriterHandle {
    Context(Box<dyn EventWriter>),
    Snapshot(Box<dyn SnapshotWriter>),
}

impl WriterHandle {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Context(w) => w.name(),
            Self::Snapshot(w) => w.name(),
        }
    }

    pub(crate) fn write(
        &self,
        context: &AlgorithmContext<'_>,
        geometry: &TrackingGeometry,
    ) -> Result<Vec<PathBuf>, WriterError> {
        match self {
            Self::Context(w) => w.write(context),
            Self::Snapshot(w) => w.write(context, geometry),
        }
    }

    pub(crate) fn finalize(&self, geometry: &TrackingGeometry) -> Result<Vec<PathBuf>, WriterError> {
        match self {
            Self::Context(w) => w.finalize(),
            Self::Snapshot(w) => w.finalize(geometry),
        }
    }
}

impl std::fmt::Debug for WriterHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("WriterHandle").field(&self.name()).finish()
    }
}

/// The writers of one output kind and the directory they write into.
#[derive(Debug)]
pub(crate) struct Stage {
    pub kind: OutputKind,
    pub enabled: bool,
    pub dir: PathBuf,
    pub writers: Vec<WriterHandle>,
}

impl Stage {
    pub fn new(kind: OutputKind, enabled: bool, root: &Path) -> Self {
        Self {
            kind,
            enabled,
            dir: root.join(kind.subdir()),
            writers: Vec::new(),
        }
    }
}
