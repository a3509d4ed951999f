mod tessellate_surface;

pub use tessellate_surface::TessellateSurface;

use serde::{Deserialize, Serialize};

use crate::error::TessellationError;
use crate::math::Point3;

/// Parameters controlling tessellation quality of curved bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TessellationParams {
    /// Number of segments a full turn in phi is divided into.
    pub segments_per_turn: usize,
    /// Minimum number of segments for any curved edge.
    pub min_segments: usize,
    /// Maximum number of segments for any curved edge.
    pub max_segments: usize,
}

impl Default for TessellationParams {
    fn default() -> Self {
        Self {
            segments_per_turn: 72,
            min_segments: 4,
            max_segments: 256,
        }
    }
}

impl TessellationParams {
    /// Checks that the segment counts are usable.
    ///
    /// # Errors
    ///
    /// Returns an error if the minimum is zero or exceeds the maximum.
    pub fn validate(&self) -> Result<(), TessellationError> {
        if self.min_segments == 0 || self.min_segments > self.max_segments {
            return Err(TessellationError::InvalidParameters(format!(
                "segment range [{}, {}] is empty",
                self.min_segments, self.max_segments
            )));
        }
        Ok(())
    }

    /// Number of segments for an arc spanning `opening` radians.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn segments(&self, opening: f64) -> usize {
        let share = opening / std::f64::consts::TAU;
        let n = (share * self.segments_per_turn as f64).ceil() as usize;
        n.clamp(self.min_segments, self.max_segments)
    }
}

/// A polygon mesh with zero-based vertex indices.
#[derive(Debug, Clone, Default)]
pub struct PolygonMesh {
    /// Vertex positions.
    pub vertices: Vec<Point3>,
    /// Faces as counter-clockwise vertex index loops.
    pub faces: Vec<Vec<u32>>,
}

impl PolygonMesh {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segments_are_clamped() {
        let params = TessellationParams::default();
        assert_eq!(params.segments(std::f64::consts::TAU), 72);
        assert_eq!(params.segments(0.01), 4);
        let coarse = TessellationParams {
            segments_per_turn: 10_000,
            ..params
        };
        assert_eq!(coarse.segments(std::f64::consts::TAU), 256);
    }

    #[test]
    fn empty_segment_range_is_invalid() {
        let params = TessellationParams {
            min_segments: 10,
            max_segments: 5,
            ..TessellationParams::default()
        };
        assert!(params.validate().is_err());
        assert!(TessellationParams::default().validate().is_ok());
    }

    #[test]
    fn default_mesh_is_empty() {
        assert!(PolygonMesh::default().is_empty());
    }
}
