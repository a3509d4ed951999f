use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::MaterialError;
use crate::geometry::{GeometryContext, GeometryIdentifier, SurfaceId, TrackingGeometry, VolumeId};
use crate::math::Placement;

use super::map::{ElementKind, MaterialEntry, MaterialMap, MaterialPayload};
use super::SurfaceMaterial;

/// Which geometry elements enter the material map. Everything is excluded
/// unless enabled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialMapConfig {
    pub process_sensitives: bool,
    pub process_approaches: bool,
    pub process_representing: bool,
    pub process_boundaries: bool,
    pub process_volumes: bool,
    /// Also record enabled elements that carry no material, as empty entries.
    pub process_non_material: bool,
}

impl MaterialMapConfig {
    /// Configuration with every flag enabled.
    #[must_use]
    pub fn all() -> Self {
        Self {
            process_sensitives: true,
            process_approaches: true,
            process_representing: true,
            process_boundaries: true,
            process_volumes: true,
            process_non_material: true,
        }
    }

    #[must_use]
    pub fn includes(&self, kind: ElementKind) -> bool {
        match kind {
            ElementKind::Volume => self.process_volumes,
            ElementKind::Sensitive => self.process_sensitives,
            ElementKind::Approach => self.process_approaches,
            ElementKind::Representing => self.process_representing,
            ElementKind::Boundary => self.process_boundaries,
        }
    }
}

/// A geometry element reached during the traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Element {
    Volume(VolumeId),
    Surface(SurfaceId),
}

/// Identifiers claimed so far, with the element that claimed them.
#[derive(Default)]
struct Claims(HashMap<GeometryIdentifier, Element>);

impl Claims {
    fn claim(&mut self, id: GeometryIdentifier, element: Element) -> Result<(), MaterialError> {
        match self.0.insert(id, element) {
            Some(previous) if previous != element => Err(MaterialError::DuplicateIdentifier(id)),
            _ => Ok(()),
        }
    }
}

/// Builds the material map of a geometry in one traversal.
pub struct MaterialMapConverter {
    config: MaterialMapConfig,
    context: Arc<GeometryContext>,
}

impl MaterialMapConverter {
    /// Creates a new `MaterialMapConverter` resolving placements with
    /// `context`.
    #[must_use]
    pub fn new(config: MaterialMapConfig, context: Arc<GeometryContext>) -> Self {
        Self { config, context }
    }

    #[must_use]
    pub fn config(&self) -> &MaterialMapConfig {
        &self.config
    }

    /// Executes the conversion.
    ///
    /// # Errors
    ///
    /// Returns an error if the hierarchy is inconsistent, two distinct
    /// elements carry the same identifier, or a binned material does not
    /// match its bin counts. A surface shared by several volumes is
    /// recorded once.
    pub fn execute(&self, geometry: &TrackingGeometry) -> Result<MaterialMap, MaterialError> {
        let mut map = MaterialMap::new();
        let mut claims = Claims::default();
        let mut visited = HashSet::new();
        for volume_id in geometry.volumes_depth_first()? {
            let volume = geometry.volume(volume_id)?;
            if self.config.includes(ElementKind::Volume) {
                claims.claim(volume.geometry_id, Element::Volume(volume_id))?;
                let material = volume
                    .material
                    .as_ref()
                    .filter(|m| m.is_non_trivial())
                    .map(|m| MaterialPayload::Volume(m.clone()));
                let placement = self.context.resolve(volume.geometry_id, &volume.transform);
                self.record(
                    &mut map,
                    volume.geometry_id,
                    MaterialEntry {
                        kind: ElementKind::Volume,
                        bounds: None,
                        placement: Placement::from_transform(&placement),
                        material,
                    },
                )?;
            }

            for surface in geometry.volume_surfaces(volume_id)? {
                if !visited.insert(surface.id) {
                    continue;
                }
                let data = surface.data;
                let Some(kind) = ElementKind::of_surface(data.kind) else {
                    continue;
                };
                if !self.config.includes(kind) {
                    continue;
                }
                claims.claim(data.geometry_id, Element::Surface(surface.id))?;
                if let Some(material) = &data.material {
                    check_binning(data.geometry_id, material)?;
                }
                let material = data
                    .material
                    .as_ref()
                    .filter(|m| m.is_non_trivial())
                    .map(|m| MaterialPayload::Surface(m.clone()));
                let placement = self.context.resolve(data.geometry_id, &data.transform);
                self.record(
                    &mut map,
                    data.geometry_id,
                    MaterialEntry {
                        kind,
                        bounds: Some(data.bounds.bounds_type()),
                        placement: Placement::from_transform(&placement),
                        material,
                    },
                )?;
            }
        }
        debug!(
            entries = map.len(),
            empty = map.iter().filter(|(_, e)| e.is_empty()).count(),
            "converted material map"
        );
        Ok(map)
    }

    fn record(
        &self,
        map: &mut MaterialMap,
        id: GeometryIdentifier,
        entry: MaterialEntry,
    ) -> Result<(), MaterialError> {
        if entry.material.is_none() && !self.config.process_non_material {
            return Ok(());
        }
        trace!(%id, kind = ?entry.kind, empty = entry.is_empty(), "material entry");
        map.insert(id, entry)
    }
}

fn check_binning(id: GeometryIdentifier, material: &SurfaceMaterial) -> Result<(), MaterialError> {
    if let SurfaceMaterial::Binned { bins0, bins1, slabs } = material {
        if bins0.checked_mul(*bins1) != Some(slabs.len()) {
            return Err(MaterialError::MalformedBinning {
                id,
                bins0: *bins0,
                bins1: *bins1,
                actual: slabs.len(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::geometry::{
        LayerData, SurfaceBounds, SurfaceData, SurfaceKind, VolumeBounds, VolumeData,
    };
    use crate::material::{Material, MaterialSlab, VolumeMaterial};
    use crate::math::Transform3;

    fn silicon() -> MaterialSlab {
        MaterialSlab::new(Material::new(93.7, 465.2, 28.0855, 14.0, 2.329), 0.15)
    }

    fn surface(id: GeometryIdentifier, kind: SurfaceKind, material: Option<SurfaceMaterial>) -> SurfaceData {
        let mut data = SurfaceData::new(
            id,
            kind,
            Transform3::identity(),
            SurfaceBounds::rectangle(5.0, 10.0).unwrap(),
        );
        data.material = material;
        data
    }

    /// One volume with material, one boundary, one layer with a
    /// representing surface, two approaches and `sensitives` modules of
    /// which only the first carries material.
    fn geometry(sensitives: u64) -> TrackingGeometry {
        let mut geometry = TrackingGeometry::new();
        let vol = GeometryIdentifier::default().with_volume(1);
        let lay = vol.with_layer(2);
        let homogeneous = || Some(SurfaceMaterial::Homogeneous(silicon()));

        let mut layer = LayerData::new(lay);
        for i in 1..=sensitives {
            let material = if i == 1 { homogeneous() } else { None };
            layer.sensitives.push(geometry.add_surface(surface(
                lay.with_sensitive(i),
                SurfaceKind::Sensitive,
                material,
            )));
        }
        layer.representing =
            Some(geometry.add_surface(surface(lay, SurfaceKind::Representing, homogeneous())));
        for a in 1..=2 {
            layer.approaches.push(geometry.add_surface(surface(
                lay.with_approach(a),
                SurfaceKind::Approach,
                None,
            )));
        }
        let layer = geometry.add_layer(layer);

        let boundary = geometry.add_surface(surface(
            vol.with_boundary(1),
            SurfaceKind::Boundary,
            homogeneous(),
        ));
        let mut world = VolumeData::new(
            "world",
            vol,
            Transform3::identity(),
            VolumeBounds::cylinder(0.0, 100.0, 200.0).unwrap(),
        )
        .with_material(VolumeMaterial::Homogeneous {
            material: silicon().material,
        });
        world.layers.push(layer);
        world.boundaries.push(boundary);
        let world = geometry.add_volume(world);
        geometry.set_world(world).unwrap();
        geometry
    }

    fn convert(config: MaterialMapConfig, geometry: &TrackingGeometry) -> MaterialMap {
        MaterialMapConverter::new(config, Arc::new(GeometryContext::nominal()))
            .execute(geometry)
            .unwrap()
    }

    #[test]
    fn all_flags_disabled_yields_empty_map() {
        let map = convert(MaterialMapConfig::default(), &geometry(4));
        assert!(map.is_empty());
    }

    #[test]
    fn all_flags_enabled_records_every_sensitive_surface() {
        let map = convert(MaterialMapConfig::all(), &geometry(4));
        assert_eq!(map.count(ElementKind::Sensitive), 4);
        assert_eq!(map.count(ElementKind::Approach), 2);
        assert_eq!(map.count(ElementKind::Representing), 1);
        assert_eq!(map.count(ElementKind::Boundary), 1);
        assert_eq!(map.count(ElementKind::Volume), 1);

        let lay = GeometryIdentifier::default().with_volume(1).with_layer(2);
        assert!(!map.get(lay.with_sensitive(1)).unwrap().is_empty());
        assert!(map.get(lay.with_sensitive(2)).unwrap().is_empty());
    }

    #[test]
    fn surfaces_without_material_are_omitted_by_default() {
        let config = MaterialMapConfig {
            process_sensitives: true,
            process_approaches: true,
            ..MaterialMapConfig::default()
        };
        let map = convert(config, &geometry(4));
        assert_eq!(map.len(), 1);
        assert_eq!(map.count(ElementKind::Sensitive), 1);
    }

    #[test]
    fn single_flag_selects_single_kind() {
        let config = MaterialMapConfig {
            process_volumes: true,
            ..MaterialMapConfig::default()
        };
        let map = convert(config, &geometry(2));
        assert_eq!(map.len(), 1);
        let (id, entry) = map.iter().next().unwrap();
        assert_eq!(id, GeometryIdentifier::default().with_volume(1));
        assert_eq!(entry.kind, ElementKind::Volume);
        assert!(entry.bounds.is_none());
    }

    #[test]
    fn malformed_binning_aborts_conversion() {
        let mut geometry = geometry(1);
        let lay = GeometryIdentifier::default().with_volume(1).with_layer(2);
        let bad = geometry.add_surface(surface(
            lay.with_sensitive(9),
            SurfaceKind::Sensitive,
            Some(SurfaceMaterial::Binned {
                bins0: 2,
                bins1: 2,
                slabs: vec![silicon(); 3],
            }),
        ));
        let world = geometry.world().unwrap();
        let layer = geometry.volume(world).unwrap().layers[0];
        let mut layer_data = geometry.layer(layer).unwrap().clone();
        layer_data.sensitives.push(bad);
        let new_layer = geometry.add_layer(layer_data);
        geometry.volume_mut(world).unwrap().layers = vec![new_layer];

        let result = MaterialMapConverter::new(
            MaterialMapConfig::all(),
            Arc::new(GeometryContext::nominal()),
        )
        .execute(&geometry);
        assert!(matches!(
            result,
            Err(MaterialError::MalformedBinning { actual: 3, .. })
        ));
    }

    #[test]
    fn overflowing_bin_counts_are_malformed() {
        let material = SurfaceMaterial::Binned {
            bins0: usize::MAX,
            bins1: 2,
            slabs: Vec::new(),
        };
        let id = GeometryIdentifier::default().with_volume(1).with_sensitive(1);
        assert!(matches!(
            check_binning(id, &material),
            Err(MaterialError::MalformedBinning { bins0: usize::MAX, bins1: 2, actual: 0, .. })
        ));
    }

    #[test]
    fn distinct_surfaces_sharing_an_identifier_abort_conversion() {
        let mut geometry = TrackingGeometry::new();
        let id = GeometryIdentifier::default().with_volume(1).with_boundary(1);
        let mut world = VolumeData::new(
            "world",
            GeometryIdentifier::default().with_volume(1),
            Transform3::identity(),
            VolumeBounds::cylinder(0.0, 100.0, 200.0).unwrap(),
        );
        // neither surface carries material, so neither reaches the map
        for _ in 0..2 {
            world
                .boundaries
                .push(geometry.add_surface(surface(id, SurfaceKind::Boundary, None)));
        }
        let world = geometry.add_volume(world);
        geometry.set_world(world).unwrap();

        let config = MaterialMapConfig {
            process_boundaries: true,
            ..MaterialMapConfig::default()
        };
        let result = MaterialMapConverter::new(config, Arc::new(GeometryContext::nominal()))
            .execute(&geometry);
        assert!(matches!(result, Err(MaterialError::DuplicateIdentifier(dup)) if dup == id));
    }

    #[test]
    fn boundary_shared_by_two_volumes_is_recorded_once() {
        let mut geometry = TrackingGeometry::new();
        let shared_id = GeometryIdentifier::default().with_volume(2).with_boundary(3);
        let shared = geometry.add_surface(surface(
            shared_id,
            SurfaceKind::Boundary,
            Some(SurfaceMaterial::Homogeneous(silicon())),
        ));
        let child = |geometry: &mut TrackingGeometry, name: &str, n: u64| {
            let mut data = VolumeData::new(
                name,
                GeometryIdentifier::default().with_volume(n),
                Transform3::identity(),
                VolumeBounds::cylinder(0.0, 100.0, 200.0).unwrap(),
            );
            data.boundaries.push(shared);
            geometry.add_volume(data)
        };
        let inner = child(&mut geometry, "inner", 2);
        let outer = child(&mut geometry, "outer", 3);
        let mut world = VolumeData::new(
            "world",
            GeometryIdentifier::default().with_volume(1),
            Transform3::identity(),
            VolumeBounds::cylinder(0.0, 100.0, 200.0).unwrap(),
        );
        world.children = vec![inner, outer];
        let world = geometry.add_volume(world);
        geometry.set_world(world).unwrap();

        let config = MaterialMapConfig {
            process_boundaries: true,
            ..MaterialMapConfig::default()
        };
        let map = convert(config, &geometry);
        assert_eq!(map.len(), 1);
        assert!(!map.get(shared_id).unwrap().is_empty());
    }
}
