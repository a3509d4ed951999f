use serde::Serialize;

/// 3D point type.
pub type Point3 = nalgebra::Point3<f64>;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;

/// 3x3 rotation matrix.
pub type Matrix3 = nalgebra::Matrix3<f64>;

/// Rigid placement (rotation followed by translation) of a surface or volume.
pub type Transform3 = nalgebra::Isometry3<f64>;

/// Global geometric tolerance for floating-point comparisons.
pub const TOLERANCE: f64 = 1e-10;

/// Returns the rotation part of a transform as a matrix, rows first.
#[must_use]
pub fn rotation_rows(transform: &Transform3) -> [f64; 9] {
    let m: Matrix3 = transform.rotation.to_rotation_matrix().into_inner();
    [
        m[(0, 0)],
        m[(0, 1)],
        m[(0, 2)],
        m[(1, 0)],
        m[(1, 1)],
        m[(1, 2)],
        m[(2, 0)],
        m[(2, 1)],
        m[(2, 2)],
    ]
}

/// Flattened placement used by the document and tabular writers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Placement {
    pub translation: [f64; 3],
    /// Rotation matrix, rows first.
    pub rotation: [f64; 9],
}

impl Placement {
    #[must_use]
    pub fn from_transform(transform: &Transform3) -> Self {
        let t = transform.translation.vector;
        Self {
            translation: [t.x, t.y, t.z],
            rotation: rotation_rows(transform),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn identity_rotation_rows() {
        let rows = rotation_rows(&Transform3::identity());
        assert_eq!(rows, [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn quarter_turn_about_z() {
        let t = Transform3::new(
            Vector3::zeros(),
            Vector3::new(0.0, 0.0, std::f64::consts::FRAC_PI_2),
        );
        let rows = rotation_rows(&t);
        assert_relative_eq!(rows[0], 0.0, epsilon = 1e-12);
        assert_relative_eq!(rows[1], -1.0, epsilon = 1e-12);
        assert_relative_eq!(rows[3], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn placement_carries_translation() {
        let p = Placement::from_transform(&Transform3::translation(1.0, -2.0, 3.5));
        assert_eq!(p.translation, [1.0, -2.0, 3.5]);
        assert_eq!(p.rotation[8], 1.0);
    }
}
