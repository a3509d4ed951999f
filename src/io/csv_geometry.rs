use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::context::AlgorithmContext;
use crate::error::WriterError;
use crate::geometry::{GeometryContext, SurfaceKind, SurfaceRef, TrackingGeometry};
use crate::math::Placement;

use super::{per_event_path, EventWriter};

const DETECTORS_FILE: &str = "detectors.csv";
const VOLUMES_FILE: &str = "volumes.csv";
/// Value written for bound parameters a bounds type does not use.
const UNUSED_PARAM: f64 = -1.0;

/// Options of the tabular geometry writer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvWriterConfig {
    /// Write one file set per event instead of one after the run.
    pub per_event: bool,
    pub write_sensitive: bool,
    pub write_boundary: bool,
    /// Write representing and approach surfaces.
    pub write_layer: bool,
    /// Also write a table of volumes.
    pub write_volumes: bool,
}

impl Default for CsvWriterConfig {
    fn default() -> Self {
        Self {
            per_event: true,
            write_sensitive: true,
            write_boundary: false,
            write_layer: false,
            write_volumes: false,
        }
    }
}

#[derive(Debug, Serialize)]
struct SurfaceRow {
    geometry_id: u64,
    volume_id: u64,
    boundary_id: u64,
    layer_id: u64,
    approach_id: u64,
    sensitive_id: u64,
    extra_id: u64,
    kind: SurfaceKind,
    cx: f64,
    cy: f64,
    cz: f64,
    rot_xu: f64,
    rot_xv: f64,
    rot_xw: f64,
    rot_yu: f64,
    rot_yv: f64,
    rot_yw: f64,
    rot_zu: f64,
    rot_zv: f64,
    rot_zw: f64,
    bounds_type: u8,
    bound_param0: f64,
    bound_param1: f64,
    bound_param2: f64,
    bound_param3: f64,
}

impl SurfaceRow {
    fn new(surface: &SurfaceRef<'_>, context: &GeometryContext) -> Self {
        let data = surface.data;
        let id = data.geometry_id;
        let p = Placement::from_transform(&context.resolve(id, &data.transform));
        let [cx, cy, cz] = p.translation;
        let [rot_xu, rot_xv, rot_xw, rot_yu, rot_yv, rot_yw, rot_zu, rot_zv, rot_zw] = p.rotation;
        let values = data.bounds.values();
        let param = |i: usize| values.get(i).copied().unwrap_or(UNUSED_PARAM);
        Self {
            geometry_id: id.value(),
            volume_id: id.volume(),
            boundary_id: id.boundary(),
            layer_id: id.layer(),
            approach_id: id.approach(),
            sensitive_id: id.sensitive(),
            extra_id: id.extra(),
            kind: data.kind,
            cx,
            cy,
            cz,
            rot_xu,
            rot_xv,
            rot_xw,
            rot_yu,
            rot_yv,
            rot_yw,
            rot_zu,
            rot_zv,
            rot_zw,
            bounds_type: data.bounds.bounds_type().tag(),
            bound_param0: param(0),
            bound_param1: param(1),
            bound_param2: param(2),
            bound_param3: param(3),
        }
    }
}

#[derive(Debug, Serialize)]
struct VolumeRow<'a> {
    volume_id: u64,
    name: &'a str,
    cx: f64,
    cy: f64,
    cz: f64,
    bounds_type: u8,
    bound_param0: f64,
    bound_param1: f64,
    bound_param2: f64,
}

/// Writes the tracking geometry as CSV tables.
///
/// The surface table has one row per selected surface with its identifier
/// fields, center, rotation and bounds.
pub struct CsvTrackingGeometryWriter {
    config: CsvWriterConfig,
    output_dir: PathBuf,
    geometry: Arc<TrackingGeometry>,
}

impl CsvTrackingGeometryWriter {
    #[must_use]
    pub fn new(config: CsvWriterConfig, output_dir: impl Into<PathBuf>, geometry: Arc<TrackingGeometry>) -> Self {
        Self {
            config,
            output_dir: output_dir.into(),
            geometry,
        }
    }

    fn selects(&self, kind: SurfaceKind) -> bool {
        match kind {
            SurfaceKind::Sensitive => self.config.write_sensitive,
            SurfaceKind::Boundary => self.config.write_boundary,
            SurfaceKind::Representing | SurfaceKind::Approach => self.config.write_layer,
            SurfaceKind::Passive => false,
        }
    }

    fn write_tables(
        &self,
        context: &GeometryContext,
        path_for: impl Fn(&str) -> PathBuf,
    ) -> Result<Vec<PathBuf>, WriterError> {
        let mut written = Vec::new();

        let detectors = path_for(DETECTORS_FILE);
        let mut writer = open(&detectors)?;
        let mut rows = 0usize;
        for surface in self.geometry.surfaces()? {
            if self.selects(surface.data.kind) {
                writer.serialize(SurfaceRow::new(&surface, context))?;
                rows += 1;
            }
        }
        writer.flush().map_err(|e| WriterError::io(&detectors, e))?;
        debug!(path = %detectors.display(), rows, "wrote surface table");
        written.push(detectors);

        if self.config.write_volumes {
            let volumes = path_for(VOLUMES_FILE);
            let mut writer = open(&volumes)?;
            for id in self.geometry.volumes_depth_first()? {
                let volume = self.geometry.volume(id)?;
                let placement = context.resolve(volume.geometry_id, &volume.transform);
                let t = placement.translation.vector;
                let values = volume.bounds.values();
                let param = |i: usize| values.get(i).copied().unwrap_or(UNUSED_PARAM);
                writer.serialize(VolumeRow {
                    volume_id: volume.geometry_id.volume(),
                    name: &volume.name,
                    cx: t.x,
                    cy: t.y,
                    cz: t.z,
                    bounds_type: volume.bounds.bounds_type().tag(),
                    bound_param0: param(0),
                    bound_param1: param(1),
                    bound_param2: param(2),
                })?;
            }
            writer.flush().map_err(|e| WriterError::io(&volumes, e))?;
            written.push(volumes);
        }
        Ok(written)
    }
}

fn open(path: &Path) -> Result<csv::Writer<std::fs::File>, WriterError> {
    csv::Writer::from_path(path).map_err(WriterError::from)
}

impl EventWriter for CsvTrackingGeometryWriter {
    fn name(&self) -> &str {
        "CsvTrackingGeometryWriter"
    }

    fn write(&self, context: &AlgorithmContext<'_>) -> Result<Vec<PathBuf>, WriterError> {
        if !self.config.per_event {
            return Ok(Vec::new());
        }
        let geometry_context = context.geometry_context()?;
        let event = context.event_number();
        self.write_tables(&geometry_context, |name| {
            per_event_path(&self.output_dir, event, name)
        })
    }

    fn finalize(&self) -> Result<Vec<PathBuf>, WriterError> {
        if self.config.per_event {
            return Ok(Vec::new());
        }
        self.write_tables(&GeometryContext::nominal(), |name| self.output_dir.join(name))
    }
}
