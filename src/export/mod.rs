//! The event loop: decorate, then hand every event to the format writers.

mod stage;

pub use stage::{OutputKind, WriterHandle};

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, info_span, warn};

use crate::config::ExportConfig;
use crate::context::{AlgorithmContext, ContextStore};
use crate::decorator::ContextDecorator;
use crate::error::{ExportError, WriterError};
use crate::geometry::TrackingGeometry;
use crate::io::{
    CsvTrackingGeometryWriter, IdentifierMapWriter, JsonMaterialWriter, JsonSurfacesWriter,
    ObjTrackingGeometryWriter,
};
use crate::material::MaterialMapConverter;

use stage::Stage;

/// What happens to the other writers of an event once one has failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriterFailurePolicy {
    /// Abort at the first failing writer.
    #[default]
    FailFast,
    /// Run the remaining writers of the event, then abort with the first
    /// failure.
    FinishEvent,
}

/// Outcome of a completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportSummary {
    pub events_processed: usize,
    /// Names of the per-event stores, in creation order.
    pub store_names: Vec<String>,
    pub decorator_calls: usize,
    pub files_written: Vec<PathBuf>,
}

/// Holds back writer failures according to a [`WriterFailurePolicy`].
struct Failures {
    policy: WriterFailurePolicy,
    first: Option<ExportError>,
}

impl Failures {
    fn new(policy: WriterFailurePolicy) -> Self {
        Self {
            policy,
            first: None,
        }
    }

    /// Returns the error if the run has to stop now.
    fn record(&mut self, error: ExportError) -> Result<(), ExportError> {
        match self.policy {
            WriterFailurePolicy::FailFast => Err(error),
            WriterFailurePolicy::FinishEvent => {
                warn!(%error, "writer failed, finishing event");
                self.first.get_or_insert(error);
                Ok(())
            }
        }
    }

    fn finish(self) -> Result<(), ExportError> {
        self.first.map_or(Ok(()), Err)
    }
}

/// Exports a tracking geometry for a number of events.
///
/// Each event gets a fresh [`ContextStore`]; the decorators run in order
/// and publish into it, then every enabled output stage creates its
/// directory and runs its writers. Any failure ends the run.
pub struct ExportGeometry {
    geometry: Arc<TrackingGeometry>,
    decorators: Vec<Box<dyn ContextDecorator>>,
    config: ExportConfig,
    stages: Vec<Stage>,
}

impl ExportGeometry {
    /// Creates the export with the writers the configuration enables.
    #[must_use]
    pub fn new(
        geometry: Arc<TrackingGeometry>,
        decorators: Vec<Box<dyn ContextDecorator>>,
        config: ExportConfig,
    ) -> Self {
        let root = config.output_dir.clone();
        let mut stages: Vec<Stage> = OutputKind::ALL
            .iter()
            .map(|&kind| {
                let enabled = match kind {
                    OutputKind::Csv => config.output_csv,
                    OutputKind::Obj => config.output_obj,
                    OutputKind::Json => config.output_json,
                };
                Stage::new(kind, enabled, &root)
            })
            .collect();
        for stage in &mut stages {
            let writer = match stage.kind {
                OutputKind::Csv => WriterHandle::Context(Box::new(CsvTrackingGeometryWriter::new(
                    config.csv.clone(),
                    &stage.dir,
                    Arc::clone(&geometry),
                ))),
                OutputKind::Obj => WriterHandle::Snapshot(Box::new(ObjTrackingGeometryWriter::new(
                    config.obj,
                    &stage.dir,
                ))),
                OutputKind::Json => WriterHandle::Context(Box::new(JsonSurfacesWriter::new(
                    config.json.clone(),
                    &stage.dir,
                    Arc::clone(&geometry),
                ))),
            };
            stage.writers.push(writer);
        }
        Self {
            geometry,
            decorators,
            config,
            stages,
        }
    }

    /// Appends a writer to the stage of `kind`. It runs after the built-in
    /// writers and only if the stage is enabled.
    #[must_use]
    pub fn with_writer(mut self, kind: OutputKind, writer: WriterHandle) -> Self {
        if let Some(stage) = self.stages.iter_mut().find(|s| s.kind == kind) {
            stage.writers.push(writer);
        }
        self
    }

    #[must_use]
    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Runs all events.
    ///
    /// # Errors
    ///
    /// Returns the first decoration, directory, writer or material failure,
    /// attributed to its event.
    pub fn execute(&self) -> Result<ExportSummary, ExportError> {
        info!(
            events = self.config.events,
            decorators = self.decorators.len(),
            volumes = self.geometry.volume_count(),
            surfaces = self.geometry.surface_count(),
            output = %self.config.output_dir.display(),
            "starting geometry export"
        );
        let mut summary = ExportSummary::default();
        for event in 0..self.config.events {
            let _span = info_span!("event", event).entered();
            let store = ContextStore::for_event(event);
            summary.store_names.push(store.name().to_owned());
            let context = AlgorithmContext::new(0, event, &store);

            self.decorate(&context, &mut summary)?;
            let files = self.write_event(&context)?;
            debug!(files = files.len(), "event written");
            summary.files_written.extend(files);
            summary.events_processed += 1;
        }

        if summary.events_processed > 0 {
            summary.files_written.extend(self.finalize()?);
        }
        info!(
            events = summary.events_processed,
            files = summary.files_written.len(),
            "geometry export finished"
        );
        Ok(summary)
    }

    fn decorate(&self, context: &AlgorithmContext<'_>, summary: &mut ExportSummary) -> Result<(), ExportError> {
        for decorator in &self.decorators {
            debug!(decorator = decorator.name(), store = context.store().name(), "decorating");
            let code = decorator.decorate(context);
            summary.decorator_calls += 1;
            if !code.is_success() {
                return Err(ExportError::Decoration {
                    event: context.event_number(),
                    decorator: decorator.name().to_owned(),
                    code,
                });
            }
        }
        Ok(())
    }

    fn write_event(&self, context: &AlgorithmContext<'_>) -> Result<Vec<PathBuf>, ExportError> {
        let event = context.event_number();
        let mut failures = Failures::new(self.config.writer_failure);
        let mut written = Vec::new();
        for stage in self.stages.iter().filter(|s| s.enabled) {
            if let Err(source) = std::fs::create_dir_all(&stage.dir) {
                failures.record(ExportError::CreateDirectory {
                    event,
                    path: stage.dir.clone(),
                    source,
                })?;
                continue;
            }
            for writer in &stage.writers {
                debug!(writer = writer.name(), dir = %stage.dir.display(), "writing");
                match writer.write(context, &self.geometry) {
                    Ok(files) => written.extend(files),
                    Err(source) => failures.record(ExportError::Write {
                        event,
                        writer: writer.name().to_owned(),
                        source,
                    })?,
                }
            }
            if stage.kind == OutputKind::Json && event == 0 {
                match self.write_material(context, stage) {
                    Ok(path) => written.push(path),
                    Err(error) => failures.record(error)?,
                }
            }
        }
        failures.finish()?;
        Ok(written)
    }

    /// Converts and writes the material map with the event's geometry
    /// context.
    fn write_material(&self, context: &AlgorithmContext<'_>, stage: &Stage) -> Result<PathBuf, ExportError> {
        let event = context.event_number();
        let geometry_context = context
            .geometry_context()
            .map_err(|source| ExportError::Store { event, source })?;
        let map = MaterialMapConverter::new(self.config.material, geometry_context)
            .execute(&self.geometry)
            .map_err(|source| ExportError::MaterialConversion { event, source })?;
        info!(entries = map.len(), "material map converted");
        JsonMaterialWriter::new(self.config.material_writer.clone(), &stage.dir)
            .write(&map)
            .map_err(|source| ExportError::Write {
                event,
                writer: "JsonMaterialWriter".to_owned(),
                source,
            })
    }

    fn finalize(&self) -> Result<Vec<PathBuf>, ExportError> {
        let mut written = Vec::new();
        for stage in self.stages.iter().filter(|s| s.enabled) {
            for writer in &stage.writers {
                let files = writer
                    .finalize(&self.geometry)
                    .map_err(|source| ExportError::Finalize {
                        writer: writer.name().to_owned(),
                        source,
                    })?;
                written.extend(files);
            }
        }
        if let Some(name) = &self.config.identifier_map {
            let path = self.config.output_dir.join(name);
            let finalize_error = |source| ExportError::Finalize {
                writer: "IdentifierMapWriter".to_owned(),
                source,
            };
            std::fs::create_dir_all(&self.config.output_dir)
                .map_err(|e| finalize_error(WriterError::io(&self.config.output_dir, e)))?;
            if let Some(path) = IdentifierMapWriter::new(path)
                .write(&self.geometry)
                .map_err(finalize_error)?
            {
                written.push(path);
            }
        }
        Ok(written)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn fail_fast_returns_the_first_failure() {
        let mut failures = Failures::new(WriterFailurePolicy::FailFast);
        let err = failures
            .record(ExportError::Write {
                event: 0,
                writer: "w".to_owned(),
                source: WriterError::io("x", std::io::ErrorKind::Other.into()),
            })
            .unwrap_err();
        assert_eq!(err.event(), Some(0));
    }

    #[test]
    fn finish_event_keeps_the_first_failure() {
        let mut failures = Failures::new(WriterFailurePolicy::FinishEvent);
        for writer in ["first", "second"] {
            failures
                .record(ExportError::Write {
                    event: 3,
                    writer: writer.to_owned(),
                    source: WriterError::io("x", std::io::ErrorKind::Other.into()),
                })
                .unwrap();
        }
        match failures.finish() {
            Err(ExportError::Write { writer, .. }) => assert_eq!(writer, "first"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn stages_follow_output_switches() {
        let config = ExportConfig {
            output_obj: false,
            ..ExportConfig::default()
        };
        let export = ExportGeometry::new(Arc::new(TrackingGeometry::new()), Vec::new(), config);
        let enabled: Vec<_> = export
            .stages
            .iter()
            .filter(|s| s.enabled)
            .map(|s| s.kind)
            .collect();
        assert_eq!(enabled, vec![OutputKind::Csv, OutputKind::Json]);
        assert!(export.stages[1].dir.ends_with("obj"));
    }
}
