use serde::Serialize;

use crate::material::SurfaceMaterial;
use crate::math::Transform3;

use super::bounds::SurfaceBounds;
use super::identifier::GeometryIdentifier;

slotmap::new_key_type! {
    /// Unique identifier for a surface in the tracking geometry.
    pub struct SurfaceId;
}

/// The role a surface plays in the geometry hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceKind {
    /// Detector module recording particle interactions.
    Sensitive,
    /// Navigation surface in front of or behind a layer.
    Approach,
    /// The surface standing in for a whole layer.
    Representing,
    /// Volume boundary (portal).
    Boundary,
    /// Structural surface with no navigation role.
    Passive,
}

/// Data associated with a surface.
#[derive(Debug, Clone)]
pub struct SurfaceData {
    /// Hierarchical identity of the surface.
    pub geometry_id: GeometryIdentifier,
    pub kind: SurfaceKind,
    /// Nominal placement in the global frame.
    pub transform: Transform3,
    pub bounds: SurfaceBounds,
    pub material: Option<SurfaceMaterial>,
    /// Identifier of the element in the geometry source, if it has one.
    pub source_id: Option<u64>,
}

impl SurfaceData {
    /// Creates a surface without material or source identifier.
    #[must_use]
    pub fn new(
        geometry_id: GeometryIdentifier,
        kind: SurfaceKind,
        transform: Transform3,
        bounds: SurfaceBounds,
    ) -> Self {
        Self {
            geometry_id,
            kind,
            transform,
            bounds,
            material: None,
            source_id: None,
        }
    }

    #[must_use]
    pub fn with_material(mut self, material: SurfaceMaterial) -> Self {
        self.material = Some(material);
        self
    }

    #[must_use]
    pub fn with_source_id(mut self, source_id: u64) -> Self {
        self.source_id = Some(source_id);
        self
    }
}
