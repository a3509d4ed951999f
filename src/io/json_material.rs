use std::io::Write;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::WriterError;
use crate::material::{MaterialEntry, MaterialMap};

use super::{create_file, IdentifierFields};

/// Encoding of a material document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentFormat {
    #[default]
    Json,
    Cbor,
}

impl DocumentFormat {
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Cbor => "cbor",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialWriterConfig {
    /// File name without extension.
    pub file_name: String,
    pub format: DocumentFormat,
}

impl Default for MaterialWriterConfig {
    fn default() -> Self {
        Self {
            file_name: "geometry-map".to_owned(),
            format: DocumentFormat::Json,
        }
    }
}

#[derive(Serialize)]
struct EntryRecord<'a> {
    #[serde(flatten)]
    id: IdentifierFields,
    #[serde(flatten)]
    entry: &'a MaterialEntry,
}

#[derive(Serialize)]
struct MaterialDocument<'a> {
    entries: Vec<EntryRecord<'a>>,
}

/// Writes a material map as one document.
pub struct JsonMaterialWriter {
    config: MaterialWriterConfig,
    output_dir: PathBuf,
}

impl JsonMaterialWriter {
    #[must_use]
    pub fn new(config: MaterialWriterConfig, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            config,
            output_dir: output_dir.into(),
        }
    }

    /// Path the document is written to.
    #[must_use]
    pub fn path(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}.{}", self.config.file_name, self.config.format.extension()))
    }

    /// Writes the map and returns the document path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or encoded.
    pub fn write(&self, map: &MaterialMap) -> Result<PathBuf, WriterError> {
        let path = self.path();
        let document = MaterialDocument {
            entries: map
                .iter()
                .map(|(id, entry)| EntryRecord { id: id.into(), entry })
                .collect(),
        };
        let mut out = create_file(&path)?;
        match self.config.format {
            DocumentFormat::Json => {
                serde_json::to_writer_pretty(&mut out, &document)?;
                out.write_all(b"\n").map_err(|e| WriterError::io(&path, e))?;
            }
            DocumentFormat::Cbor => ciborium::ser::into_writer(&document, &mut out)?,
        }
        out.flush().map_err(|e| WriterError::io(&path, e))?;
        debug!(path = %path.display(), entries = map.len(), "wrote material map");
        Ok(path)
    }
}
