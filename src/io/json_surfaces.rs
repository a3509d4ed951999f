use std::collections::HashSet;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::context::AlgorithmContext;
use crate::error::WriterError;
use crate::geometry::{BoundsType, GeometryContext, SurfaceKind, TrackingGeometry};
use crate::math::Placement;

use super::{create_file, per_event_path, EventWriter, IdentifierFields};

const DETECTOR_FILE: &str = "detector.json";

/// Options of the surfaces document writer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JsonSurfacesConfig {
    pub per_event: bool,
    pub write_sensitive: bool,
    pub write_approach: bool,
    /// Write representing surfaces.
    pub write_layer: bool,
    pub write_boundary: bool,
}

impl Default for JsonSurfacesConfig {
    fn default() -> Self {
        Self {
            per_event: true,
            write_sensitive: true,
            write_approach: false,
            write_layer: false,
            write_boundary: false,
        }
    }
}

#[derive(Serialize)]
struct BoundsRecord {
    #[serde(rename = "type")]
    kind: BoundsType,
    values: Vec<f64>,
}

#[derive(Serialize)]
struct SurfaceRecord {
    #[serde(flatten)]
    id: IdentifierFields,
    kind: SurfaceKind,
    placement: Placement,
    bounds: BoundsRecord,
}

#[derive(Serialize)]
struct VolumeRecord<'a> {
    volume: u64,
    name: &'a str,
    surfaces: Vec<SurfaceRecord>,
}

#[derive(Serialize)]
struct SurfacesDocument<'a> {
    event: Option<usize>,
    volumes: Vec<VolumeRecord<'a>>,
}

/// Writes the selected surfaces as a JSON document grouped by volume.
pub struct JsonSurfacesWriter {
    config: JsonSurfacesConfig,
    output_dir: PathBuf,
    geometry: Arc<TrackingGeometry>,
}

impl JsonSurfacesWriter {
    #[must_use]
    pub fn new(config: JsonSurfacesConfig, output_dir: impl Into<PathBuf>, geometry: Arc<TrackingGeometry>) -> Self {
        Self {
            config,
            output_dir: output_dir.into(),
            geometry,
        }
    }

    fn selects(&self, kind: SurfaceKind) -> bool {
        match kind {
            SurfaceKind::Sensitive => self.config.write_sensitive,
            SurfaceKind::Approach => self.config.write_approach,
            SurfaceKind::Representing => self.config.write_layer,
            SurfaceKind::Boundary => self.config.write_boundary,
            SurfaceKind::Passive => false,
        }
    }

    fn document(&self, context: &GeometryContext, event: Option<usize>) -> Result<SurfacesDocument<'_>, WriterError> {
        let mut volumes = Vec::new();
        // shared boundaries stay with the first volume that lists them
        let mut seen = HashSet::new();
        for volume_id in self.geometry.volumes_depth_first()? {
            let volume = self.geometry.volume(volume_id)?;
            let surfaces: Vec<_> = self
                .geometry
                .volume_surfaces(volume_id)?
                .into_iter()
                .filter(|s| seen.insert(s.id) && self.selects(s.data.kind))
                .map(|s| {
                    let data = s.data;
                    let placement = context.resolve(data.geometry_id, &data.transform);
                    SurfaceRecord {
                        id: data.geometry_id.into(),
                        kind: data.kind,
                        placement: Placement::from_transform(&placement),
                        bounds: BoundsRecord {
                            kind: data.bounds.bounds_type(),
                            values: data.bounds.values(),
                        },
                    }
                })
                .collect();
            if !surfaces.is_empty() {
                volumes.push(VolumeRecord {
                    volume: volume.geometry_id.volume(),
                    name: &volume.name,
                    surfaces,
                });
            }
        }
        Ok(SurfacesDocument { event, volumes })
    }

    fn write_document(&self, document: &SurfacesDocument<'_>, path: PathBuf) -> Result<Vec<PathBuf>, WriterError> {
        let mut out = create_file(&path)?;
        serde_json::to_writer_pretty(&mut out, document)?;
        out.write_all(b"\n")
            .and_then(|()| out.flush())
            .map_err(|e| WriterError::io(&path, e))?;
        debug!(path = %path.display(), volumes = document.volumes.len(), "wrote surfaces document");
        Ok(vec![path])
    }
}

impl EventWriter for JsonSurfacesWriter {
    fn name(&self) -> &str {
        "JsonSurfacesWriter"
    }

    fn write(&self, context: &AlgorithmContext<'_>) -> Result<Vec<PathBuf>, WriterError> {
        if !self.config.per_event {
            return Ok(Vec::new());
        }
        let event = context.event_number();
        let geometry_context = context.geometry_context()?;
        let document = self.document(&geometry_context, Some(event))?;
        self.write_document(&document, per_event_path(&self.output_dir, event, DETECTOR_FILE))
    }

    fn finalize(&self) -> Result<Vec<PathBuf>, WriterError> {
        if self.config.per_event {
            return Ok(Vec::new());
        }
        let document = self.document(&GeometryContext::nominal(), None)?;
        self.write_document(&document, self.output_dir.join(DETECTOR_FILE))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::context::{ContextStore, GEOMETRY_CONTEXT};
    use crate::geometry::{
        GeometryIdentifier, LayerData, SurfaceBounds, SurfaceData, VolumeBounds, VolumeData,
    };
    use crate::math::Transform3;
    use std::collections::BTreeMap;

    fn sensitive_id() -> GeometryIdentifier {
        GeometryIdentifier::default().with_volume(1).with_layer(2).with_sensitive(1)
    }

    fn geometry() -> Arc<TrackingGeometry> {
        let mut geometry = TrackingGeometry::new();
        let vol = GeometryIdentifier::default().with_volume(1);
        let mut layer = LayerData::new(vol.with_layer(2));
        layer.sensitives.push(geometry.add_surface(SurfaceData::new(
            sensitive_id(),
            SurfaceKind::Sensitive,
            Transform3::translation(0.0, 0.0, 50.0),
            SurfaceBounds::rectangle(4.0, 8.0).unwrap(),
        )));
        layer.approaches.push(geometry.add_surface(SurfaceData::new(
            vol.with_layer(2).with_approach(1),
            SurfaceKind::Approach,
            Transform3::translation(0.0, 0.0, 45.0),
            SurfaceBounds::disc(0.0, 100.0).unwrap(),
        )));
        let layer = geometry.add_layer(layer);
        let mut world = VolumeData::new(
            "pixel",
            vol,
            Transform3::identity(),
            VolumeBounds::cylinder(0.0, 100.0, 200.0).unwrap(),
        );
        world.layers.push(layer);
        let world = geometry.add_volume(world);
        geometry.set_world(world).unwrap();
        Arc::new(geometry)
    }

    fn read(path: &std::path::Path) -> serde_json::Value {
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
    }

    #[test]
    fn writes_sensitive_surfaces_grouped_by_volume() {
        let dir = tempfile::tempdir().unwrap();
        let writer = JsonSurfacesWriter::new(JsonSurfacesConfig::default(), dir.path(), geometry());
        let store = ContextStore::for_event(1);
        let files = writer.write(&AlgorithmContext::new(0, 1, &store)).unwrap();
        assert_eq!(files, vec![dir.path().join("event000000001-detector.json")]);

        let doc = read(&files[0]);
        assert_eq!(doc["event"], 1);
        let volumes = doc["volumes"].as_array().unwrap();
        assert_eq!(volumes.len(), 1);
        assert_eq!(volumes[0]["name"], "pixel");
        let surfaces = volumes[0]["surfaces"].as_array().unwrap();
        assert_eq!(surfaces.len(), 1);
        assert_eq!(surfaces[0]["geometry_id"], sensitive_id().value());
        assert_eq!(surfaces[0]["sensitive"], 1);
        assert_eq!(surfaces[0]["kind"], "sensitive");
        assert_eq!(surfaces[0]["bounds"]["type"], "rectangle");
        assert_eq!(surfaces[0]["placement"]["translation"][2], 50.0);
    }

    #[test]
    fn approach_flag_adds_approach_surfaces() {
        let dir = tempfile::tempdir().unwrap();
        let config = JsonSurfacesConfig {
            write_approach: true,
            ..JsonSurfacesConfig::default()
        };
        let writer = JsonSurfacesWriter::new(config, dir.path(), geometry());
        let store = ContextStore::for_event(0);
        let files = writer.write(&AlgorithmContext::new(0, 0, &store)).unwrap();
        let doc = read(&files[0]);
        assert_eq!(doc["volumes"][0]["surfaces"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn decorated_context_moves_surfaces() {
        let dir = tempfile::tempdir().unwrap();
        let writer = JsonSurfacesWriter::new(JsonSurfacesConfig::default(), dir.path(), geometry());
        let store = ContextStore::for_event(0);
        let mut deltas = BTreeMap::new();
        deltas.insert(sensitive_id(), Transform3::translation(0.0, 0.0, 1.0));
        store
            .add(GEOMETRY_CONTEXT, GeometryContext::aligned(0, deltas))
            .unwrap();
        let files = writer.write(&AlgorithmContext::new(0, 0, &store)).unwrap();
        let doc = read(&files[0]);
        assert_eq!(
            doc["volumes"][0]["surfaces"][0]["placement"]["translation"][2],
            51.0
        );
    }

    #[test]
    fn shared_boundary_is_written_under_first_volume_only() {
        let mut geometry = TrackingGeometry::new();
        let shared = geometry.add_surface(SurfaceData::new(
            GeometryIdentifier::default().with_volume(2).with_boundary(3),
            SurfaceKind::Boundary,
            Transform3::identity(),
            SurfaceBounds::cylinder(50.0, 200.0).unwrap(),
        ));
        let mut children = Vec::new();
        for (name, n) in [("inner", 2), ("outer", 3)] {
            let mut data = VolumeData::new(
                name,
                GeometryIdentifier::default().with_volume(n),
                Transform3::identity(),
                VolumeBounds::cylinder(0.0, 100.0, 200.0).unwrap(),
            );
            data.boundaries.push(shared);
            children.push(geometry.add_volume(data));
        }
        let mut world = VolumeData::new(
            "world",
            GeometryIdentifier::default().with_volume(1),
            Transform3::identity(),
            VolumeBounds::cylinder(0.0, 100.0, 200.0).unwrap(),
        );
        world.children = children;
        let world = geometry.add_volume(world);
        geometry.set_world(world).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let config = JsonSurfacesConfig {
            write_boundary: true,
            ..JsonSurfacesConfig::default()
        };
        let writer = JsonSurfacesWriter::new(config, dir.path(), Arc::new(geometry));
        let store = ContextStore::for_event(0);
        let files = writer.write(&AlgorithmContext::new(0, 0, &store)).unwrap();
        let volumes = read(&files[0])["volumes"].as_array().unwrap().clone();
        assert_eq!(volumes.len(), 1);
        assert_eq!(volumes[0]["name"], "inner");
        assert_eq!(volumes[0]["surfaces"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn aggregated_mode_has_no_event_number() {
        let dir = tempfile::tempdir().unwrap();
        let config = JsonSurfacesConfig {
            per_event: false,
            ..JsonSurfacesConfig::default()
        };
        let writer = JsonSurfacesWriter::new(config, dir.path(), geometry());
        let files = writer.finalize().unwrap();
        assert_eq!(files, vec![dir.path().join("detector.json")]);
        assert!(read(&files[0])["event"].is_null());
    }
}
