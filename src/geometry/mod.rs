pub mod bounds;
pub mod context;
pub mod identifier;
pub mod layer;
pub mod surface;
pub mod volume;

pub use bounds::{BoundsType, SurfaceBounds, VolumeBounds};
pub use context::GeometryContext;
pub use identifier::GeometryIdentifier;
pub use layer::{LayerData, LayerId};
pub use surface::{SurfaceData, SurfaceId, SurfaceKind};
pub use volume::{VolumeData, VolumeId};

use std::collections::{BTreeMap, HashSet};

use slotmap::SlotMap;

use crate::error::GeometryError;

/// Central arena that owns the tracking-geometry hierarchy.
///
/// Volumes, layers and surfaces reference each other via typed IDs
/// (generational indices). The geometry source fills the arena once; the
/// export pipeline only reads it, usually through an `Arc` shared by every
/// writer.
#[derive(Debug, Default)]
pub struct TrackingGeometry {
    volumes: SlotMap<VolumeId, VolumeData>,
    layers: SlotMap<LayerId, LayerData>,
    surfaces: SlotMap<SurfaceId, SurfaceData>,
    world: Option<VolumeId>,
}

/// A surface reached by traversal, together with the volume it belongs to.
#[derive(Debug, Clone, Copy)]
pub struct SurfaceRef<'a> {
    pub id: SurfaceId,
    pub volume: VolumeId,
    pub data: &'a SurfaceData,
}

impl TrackingGeometry {
    /// Creates a new, empty geometry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // --- Surface operations ---

    /// Inserts a surface and returns its ID.
    pub fn add_surface(&mut self, data: SurfaceData) -> SurfaceId {
        self.surfaces.insert(data)
    }

    /// Returns a reference to the surface data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the geometry.
    pub fn surface(&self, id: SurfaceId) -> Result<&SurfaceData, GeometryError> {
        self.surfaces
            .get(id)
            .ok_or_else(|| GeometryError::EntityNotFound("surface".into()))
    }

    // --- Layer operations ---

    /// Inserts a layer and returns its ID.
    pub fn add_layer(&mut self, data: LayerData) -> LayerId {
        self.layers.insert(data)
    }

    /// Returns a reference to the layer data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the geometry.
    pub fn layer(&self, id: LayerId) -> Result<&LayerData, GeometryError> {
        self.layers
            .get(id)
            .ok_or_else(|| GeometryError::EntityNotFound("layer".into()))
    }

    // --- Volume operations ---

    /// Inserts a volume and returns its ID.
    pub fn add_volume(&mut self, data: VolumeData) -> VolumeId {
        self.volumes.insert(data)
    }

    /// Returns a reference to the volume data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the geometry.
    pub fn volume(&self, id: VolumeId) -> Result<&VolumeData, GeometryError> {
        self.volumes
            .get(id)
            .ok_or_else(|| GeometryError::EntityNotFound("volume".into()))
    }

    /// Returns a mutable reference to the volume data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the geometry.
    pub fn volume_mut(&mut self, id: VolumeId) -> Result<&mut VolumeData, GeometryError> {
        self.volumes
            .get_mut(id)
            .ok_or_else(|| GeometryError::EntityNotFound("volume".into()))
    }

    /// Marks a volume as the root of the hierarchy.
    ///
    /// # Errors
    ///
    /// Returns an error if the volume is not in the geometry.
    pub fn set_world(&mut self, id: VolumeId) -> Result<(), GeometryError> {
        self.volume(id)?;
        self.world = Some(id);
        Ok(())
    }

    /// Returns the root volume.
    ///
    /// # Errors
    ///
    /// Returns an error if no world volume was set.
    pub fn world(&self) -> Result<VolumeId, GeometryError> {
        self.world.ok_or(GeometryError::MissingWorld)
    }

    /// Number of volumes in the arena.
    #[must_use]
    pub fn volume_count(&self) -> usize {
        self.volumes.len()
    }

    /// Number of surfaces in the arena.
    #[must_use]
    pub fn surface_count(&self) -> usize {
        self.surfaces.len()
    }

    // --- Traversal ---

    /// Returns all volumes reachable from the world, depth-first with
    /// children in their stored order.
    ///
    /// # Errors
    ///
    /// Returns an error if there is no world volume, a child reference
    /// dangles, or a volume is reachable twice.
    pub fn volumes_depth_first(&self) -> Result<Vec<VolumeId>, GeometryError> {
        let mut order = Vec::with_capacity(self.volumes.len());
        let mut seen = HashSet::new();
        let mut stack = vec![self.world()?];
        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                return Err(GeometryError::InvalidHierarchy(format!(
                    "volume '{}' is reachable twice",
                    self.volume(id)?.name
                )));
            }
            let volume = self.volume(id)?;
            order.push(id);
            stack.extend(volume.children.iter().rev().copied());
        }
        Ok(order)
    }

    /// Returns the surfaces of one volume: boundaries first, then for every
    /// layer its representing, approach and sensitive surfaces.
    ///
    /// # Errors
    ///
    /// Returns an error if a layer or surface reference dangles.
    pub fn volume_surfaces(&self, volume: VolumeId) -> Result<Vec<SurfaceRef<'_>>, GeometryError> {
        let data = self.volume(volume)?;
        let mut out = Vec::new();
        let mut push = |id: SurfaceId| -> Result<(), GeometryError> {
            out.push(SurfaceRef {
                id,
                volume,
                data: self.surface(id)?,
            });
            Ok(())
        };
        for &id in &data.boundaries {
            push(id)?;
        }
        for &layer_id in &data.layers {
            let layer = self.layer(layer_id)?;
            if let Some(id) = layer.representing {
                push(id)?;
            }
            for &id in &layer.approaches {
                push(id)?;
            }
            for &id in &layer.sensitives {
                push(id)?;
            }
        }
        Ok(out)
    }

    /// Returns every surface reachable from the world, grouped by volume in
    /// depth-first order. A boundary shared by neighbouring volumes is
    /// listed once, with the first volume that reaches it.
    ///
    /// # Errors
    ///
    /// Returns an error if the hierarchy is inconsistent.
    pub fn surfaces(&self) -> Result<Vec<SurfaceRef<'_>>, GeometryError> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for volume in self.volumes_depth_first()? {
            out.extend(
                self.volume_surfaces(volume)?
                    .into_iter()
                    .filter(|s| seen.insert(s.id)),
            );
        }
        Ok(out)
    }

    /// Maps source identifiers to geometry identifiers for every surface
    /// that carries one. Empty if the source provided none.
    ///
    /// # Errors
    ///
    /// Returns an error if the hierarchy is inconsistent or two surfaces
    /// share a source identifier.
    pub fn source_identifier_map(&self) -> Result<BTreeMap<u64, GeometryIdentifier>, GeometryError> {
        let mut map = BTreeMap::new();
        for surface in self.surfaces()? {
            let Some(source_id) = surface.data.source_id else {
                continue;
            };
            if let Some(first) = map.insert(source_id, surface.data.geometry_id) {
                return Err(GeometryError::DuplicateSourceIdentifier {
                    source_id,
                    first,
                    second: surface.data.geometry_id,
                });
            }
        }
        Ok(map)
    }
}
