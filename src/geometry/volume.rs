use crate::material::VolumeMaterial;
use crate::math::Transform3;

use super::bounds::VolumeBounds;
use super::identifier::GeometryIdentifier;
use super::layer::LayerId;
use super::surface::SurfaceId;

slotmap::new_key_type! {
    /// Unique identifier for a volume in the tracking geometry.
    pub struct VolumeId;
}

/// Data associated with a tracking volume.
///
/// Volumes form a tree rooted at the world volume. A volume either
/// confines layers directly or contains child volumes.
#[derive(Debug, Clone)]
pub struct VolumeData {
    pub name: String,
    pub geometry_id: GeometryIdentifier,
    pub transform: Transform3,
    pub bounds: VolumeBounds,
    pub material: Option<VolumeMaterial>,
    pub layers: Vec<LayerId>,
    pub boundaries: Vec<SurfaceId>,
    pub children: Vec<VolumeId>,
}

impl VolumeData {
    /// Creates an empty volume with no layers, boundaries or children.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        geometry_id: GeometryIdentifier,
        transform: Transform3,
        bounds: VolumeBounds,
    ) -> Self {
        Self {
            name: name.into(),
            geometry_id,
            transform,
            bounds,
            material: None,
            layers: Vec::new(),
            boundaries: Vec::new(),
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_material(mut self, material: VolumeMaterial) -> Self {
        self.material = Some(material);
        self
    }
}
