//! Run configuration, loadable from TOML.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::export::WriterFailurePolicy;
use crate::io::{CsvWriterConfig, JsonSurfacesConfig, MaterialWriterConfig, ObjWriterConfig};
use crate::logging::LoggingConfig;
use crate::material::MaterialMapConfig;

/// Largest event index representable in per-event file names.
pub const MAX_EVENTS: usize = 1_000_000_000;

/// Accepted range of OBJ vertex decimals.
pub const OBJ_PRECISION: std::ops::RangeInclusive<usize> = 1..=17;

/// Configuration of one export run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Root of all outputs; format subdirectories are created below it.
    pub output_dir: PathBuf,
    /// Number of events to process.
    pub events: usize,
    pub output_csv: bool,
    pub output_obj: bool,
    pub output_json: bool,
    pub csv: CsvWriterConfig,
    pub obj: ObjWriterConfig,
    pub json: JsonSurfacesConfig,
    pub material: MaterialMapConfig,
    pub material_writer: MaterialWriterConfig,
    pub writer_failure: WriterFailurePolicy,
    /// File name of the identifier mapping, relative to `output_dir`.
    pub identifier_map: Option<PathBuf>,
    pub logging: LoggingConfig,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            events: 1,
            output_csv: true,
            output_obj: true,
            output_json: true,
            csv: CsvWriterConfig::default(),
            obj: ObjWriterConfig::default(),
            json: JsonSurfacesConfig::default(),
            material: MaterialMapConfig::default(),
            material_writer: MaterialWriterConfig::default(),
            writer_failure: WriterFailurePolicy::default(),
            identifier_map: None,
            logging: LoggingConfig::default(),
        }
    }
}

impl ExportConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document does not parse or fails validation.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, does not parse or fails
    /// validation.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Checks value ranges that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns the first invalid field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.events > MAX_EVENTS {
            return Err(invalid(
                "events",
                format!("{} exceeds the maximum of {MAX_EVENTS}", self.events),
            ));
        }
        if !OBJ_PRECISION.contains(&self.obj.precision) {
            return Err(invalid(
                "obj.precision",
                format!("{} is outside {OBJ_PRECISION:?}", self.obj.precision),
            ));
        }
        if !(self.obj.scalor.is_finite() && self.obj.scalor > 0.0) {
            return Err(invalid("obj.scalor", format!("{} is not positive", self.obj.scalor)));
        }
        self.obj
            .tessellation
            .validate()
            .map_err(|e| invalid("obj.tessellation", e.to_string()))?;
        let name = &self.material_writer.file_name;
        if name.is_empty() {
            return Err(invalid("material_writer.file_name", "must not be empty".to_owned()));
        }
        if name.contains(['/', '\\']) {
            return Err(invalid(
                "material_writer.file_name",
                format!("`{name}` must not contain a path separator"),
            ));
        }
        if let Some(path) = &self.identifier_map {
            if path.as_os_str().is_empty() {
                return Err(invalid("identifier_map", "must not be empty".to_owned()));
            }
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: String) -> ConfigError {
    ConfigError::Invalid { field, reason }
}
