use std::path::PathBuf;

use thiserror::Error;

use crate::decorator::ProcessCode;
use crate::geometry::GeometryIdentifier;

/// Top-level error type for the geometry export pipeline.
#[derive(Debug, Error)]
pub enum GeoportError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Material(#[from] MaterialError),

    #[error(transparent)]
    Writer(#[from] WriterError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Export(#[from] ExportError),
}

/// Errors raised while reading the geometry snapshot.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("entity not found: {0}")]
    EntityNotFound(String),

    #[error("source identifier {source_id} is carried by both {first} and {second}")]
    DuplicateSourceIdentifier {
        source_id: u64,
        first: GeometryIdentifier,
        second: GeometryIdentifier,
    },

    #[error("invalid bounds: {0}")]
    InvalidBounds(String),

    #[error("geometry has no world volume")]
    MissingWorld,

    #[error("invalid hierarchy: {0}")]
    InvalidHierarchy(String),
}

/// Errors raised by the per-event context store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("key '{key}' already present in {store}")]
    DuplicateKey { store: String, key: String },

    #[error("key '{key}' not present in {store}")]
    MissingKey { store: String, key: String },

    #[error("key '{key}' in {store} holds {actual}, requested {requested}")]
    TypeMismatch {
        store: String,
        key: String,
        actual: &'static str,
        requested: &'static str,
    },

    #[error("context store {0} lock poisoned")]
    Poisoned(String),
}

/// Errors raised while converting material associations.
#[derive(Debug, Error)]
pub enum MaterialError {
    #[error("geometry identifier {0} appears twice in the material map")]
    DuplicateIdentifier(GeometryIdentifier),

    #[error("binned material on {id} has {actual} slabs, expected {bins0} x {bins1}")]
    MalformedBinning {
        id: GeometryIdentifier,
        bins0: usize,
        bins1: usize,
        actual: usize,
    },

    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

/// Errors raised by format writers.
#[derive(Debug, Error)]
pub enum WriterError {
    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("cbor error: {0}")]
    Cbor(#[from] ciborium::ser::Error<std::io::Error>),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Tessellation(#[from] TessellationError),
}

impl WriterError {
    /// Wraps an I/O error with the path it occurred on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors related to tessellation.
#[derive(Debug, Error)]
pub enum TessellationError {
    #[error("invalid tessellation parameters: {0}")]
    InvalidParameters(String),
}

/// Errors related to loading and validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config value {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("cannot install log subscriber: {0}")]
    Logging(String),
}

/// Fatal conditions of an export run, attributed to a stage and event.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("decoration failed at event {event}: decorator '{decorator}' returned {code:?}")]
    Decoration {
        event: usize,
        decorator: String,
        code: ProcessCode,
    },

    #[error("directory creation failed at event {event} for {path}: {source}")]
    CreateDirectory {
        event: usize,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("writing failed at event {event} in writer '{writer}': {source}")]
    Write {
        event: usize,
        writer: String,
        #[source]
        source: WriterError,
    },

    #[error("finalizing writer '{writer}' failed: {source}")]
    Finalize {
        writer: String,
        #[source]
        source: WriterError,
    },

    #[error("material conversion failed at event {event}: {source}")]
    MaterialConversion {
        event: usize,
        #[source]
        source: MaterialError,
    },

    #[error("store error at event {event}: {source}")]
    Store {
        event: usize,
        #[source]
        source: StoreError,
    },
}

impl ExportError {
    /// The event index the failure is attributed to, if any.
    #[must_use]
    pub fn event(&self) -> Option<usize> {
        match self {
            Self::Decoration { event, .. }
            | Self::CreateDirectory { event, .. }
            | Self::Write { event, .. }
            | Self::MaterialConversion { event, .. }
            | Self::Store { event, .. } => Some(*event),
            Self::Finalize { .. } => None,
        }
    }
}

/// Convenience type alias for results using [`GeoportError`].
pub type Result<T> = std::result::Result<T, GeoportError>;
