use super::identifier::GeometryIdentifier;
use super::surface::SurfaceId;

slotmap::new_key_type! {
    /// Unique identifier for a layer in the tracking geometry.
    pub struct LayerId;
}

/// Data associated with a layer.
///
/// A layer groups the sensitive surfaces at one radius or `z` position,
/// optionally with a representing surface and approach surfaces on either
/// side.
#[derive(Debug, Clone, Default)]
pub struct LayerData {
    pub geometry_id: GeometryIdentifier,
    pub representing: Option<SurfaceId>,
    pub approaches: Vec<SurfaceId>,
    pub sensitives: Vec<SurfaceId>,
}

impl LayerData {
    #[must_use]
    pub fn new(geometry_id: GeometryIdentifier) -> Self {
        Self {
            geometry_id,
            ..Self::default()
        }
    }
}
