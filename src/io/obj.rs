use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::context::AlgorithmContext;
use crate::error::WriterError;
use crate::geometry::{GeometryContext, SurfaceKind, TrackingGeometry};
use crate::tessellation::{PolygonMesh, TessellateSurface, TessellationParams};

use super::{create_file, per_event_path, SnapshotWriter};

/// Options of the mesh writer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjWriterConfig {
    /// Write one file set per event instead of one after the run.
    pub per_event: bool,
    /// Only tessellate sensitive surfaces.
    pub sensitive_only: bool,
    /// Number of decimals written for vertex coordinates.
    pub precision: usize,
    /// Scale factor applied to vertex coordinates.
    pub scalor: f64,
    pub tessellation: TessellationParams,
}

impl Default for ObjWriterConfig {
    fn default() -> Self {
        Self {
            per_event: false,
            sensitive_only: true,
            precision: 6,
            scalor: 1.0,
            tessellation: TessellationParams::default(),
        }
    }
}

/// Writes one Wavefront OBJ file per volume, one group per surface.
pub struct ObjTrackingGeometryWriter {
    config: ObjWriterConfig,
    output_dir: PathBuf,
}

impl ObjTrackingGeometryWriter {
    #[must_use]
    pub fn new(config: ObjWriterConfig, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            config,
            output_dir: output_dir.into(),
        }
    }

    fn selects(&self, kind: SurfaceKind) -> bool {
        match kind {
            SurfaceKind::Sensitive => true,
            SurfaceKind::Passive => false,
            _ => !self.config.sensitive_only,
        }
    }

    fn write_volumes(
        &self,
        geometry: &TrackingGeometry,
        context: &GeometryContext,
        path_for: impl Fn(&str) -> PathBuf,
    ) -> Result<Vec<PathBuf>, WriterError> {
        let mut written = Vec::new();
        let mut stems = HashSet::new();
        for volume_id in geometry.volumes_depth_first()? {
            let volume = geometry.volume(volume_id)?;
            let mut groups = Vec::new();
            for surface in geometry.volume_surfaces(volume_id)? {
                let data = surface.data;
                if !self.selects(data.kind) {
                    continue;
                }
                let transform = context.resolve(data.geometry_id, &data.transform);
                let mesh = TessellateSurface::new(&data.bounds, transform, self.config.tessellation)
                    .execute()?;
                if mesh.is_empty() {
                    continue;
                }
                groups.push((data.geometry_id.to_string(), mesh));
            }
            if groups.is_empty() {
                continue;
            }
            let stem = unique_stem(&mut stems, &volume.name, volume.geometry_id.volume());
            let path = path_for(&format!("{stem}.obj"));
            self.write_file(&path, &volume.name, &groups)?;
            debug!(path = %path.display(), surfaces = groups.len(), "wrote volume mesh");
            written.push(path);
        }
        Ok(written)
    }

    fn write_file(&self, path: &Path, name: &str, groups: &[(String, PolygonMesh)]) -> Result<(), WriterError> {
        let mut out = create_file(path)?;
        self.write_groups(&mut out, name, groups)
            .and_then(|()| out.flush())
            .map_err(|e| WriterError::io(path, e))
    }

    fn write_groups(&self, out: &mut impl Write, name: &str, groups: &[(String, PolygonMesh)]) -> std::io::Result<()> {
        let precision = self.config.precision;
        let scalor = self.config.scalor;
        writeln!(out, "# geoport tracking geometry")?;
        writeln!(out, "o {name}")?;
        // OBJ indices are global to the file and start at 1
        let mut offset = 1usize;
        for (group, mesh) in groups {
            writeln!(out, "g {group}")?;
            for v in &mesh.vertices {
                writeln!(
                    out,
                    "v {:.*} {:.*} {:.*}",
                    precision,
                    v.x * scalor,
                    precision,
                    v.y * scalor,
                    precision,
                    v.z * scalor
                )?;
            }
            for face in &mesh.faces {
                write!(out, "f")?;
                for &i in face {
                    write!(out, " {}", offset + i as usize)?;
                }
                writeln!(out)?;
            }
            offset += mesh.vertices.len();
        }
        Ok(())
    }
}

/// File name stem for a volume name.
fn file_stem(name: &str) -> String {
    let stem: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if stem.is_empty() {
        "volume".to_owned()
    } else {
        stem
    }
}

/// File name stem not yet used in this file set. A clash falls back to the
/// volume number, then to a counter.
fn unique_stem(taken: &mut HashSet<String>, name: &str, volume: u64) -> String {
    let base = file_stem(name);
    if taken.insert(base.clone()) {
        return base;
    }
    let mut candidate = format!("{base}-vol{volume}");
    let mut n = 1usize;
    while !taken.insert(candidate.clone()) {
        n += 1;
        candidate = format!("{base}-vol{volume}-{n}");
    }
    candidate
}

impl SnapshotWriter for ObjTrackingGeometryWriter {
    fn name(&self) -> &str {
        "ObjTrackingGeometryWriter"
    }

    fn write(
        &self,
        context: &AlgorithmContext<'_>,
        geometry: &TrackingGeometry,
    ) -> Result<Vec<PathBuf>, WriterError> {
        if !self.config.per_event {
            return Ok(Vec::new());
        }
        let event = context.event_number();
        let geometry_context = context.geometry_context()?;
        self.write_volumes(geometry, &geometry_context, |name| {
            per_event_path(&self.output_dir, event, name)
        })
    }

    fn finalize(&self, geometry: &TrackingGeometry) -> Result<Vec<PathBuf>, WriterError> {
        if self.config.per_event {
            return Ok(Vec::new());
        }
        self.write_volumes(geometry, &GeometryContext::nominal(), |name| {
            self.output_dir.join(name)
        })
    }
}
