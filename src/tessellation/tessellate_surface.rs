use crate::error::TessellationError;
use crate::geometry::SurfaceBounds;
use crate::math::{Point3, Transform3};

use super::{PolygonMesh, TessellationParams};

/// Tessellates a bounded surface into a polygon mesh in the global frame.
pub struct TessellateSurface<'a> {
    bounds: &'a SurfaceBounds,
    transform: Transform3,
    params: TessellationParams,
}

impl<'a> TessellateSurface<'a> {
    /// Creates a new `TessellateSurface` operation.
    #[must_use]
    pub fn new(bounds: &'a SurfaceBounds, transform: Transform3, params: TessellationParams) -> Self {
        Self {
            bounds,
            transform,
            params,
        }
    }

    /// Executes the tessellation, returning the placed mesh.
    ///
    /// # Errors
    ///
    /// Returns an error if the tessellation parameters are invalid.
    pub fn execute(&self) -> Result<PolygonMesh, TessellationError> {
        self.params.validate()?;
        let mut mesh = match *self.bounds {
            SurfaceBounds::Rectangle { half_x, half_y } => planar(&[
                (-half_x, -half_y),
                (half_x, -half_y),
                (half_x, half_y),
                (-half_x, half_y),
            ]),
            SurfaceBounds::Trapezoid {
                half_x_neg_y,
                half_x_pos_y,
                half_y,
            } => planar(&[
                (-half_x_neg_y, -half_y),
                (half_x_neg_y, -half_y),
                (half_x_pos_y, half_y),
                (-half_x_pos_y, half_y),
            ]),
            SurfaceBounds::Disc {
                r_min,
                r_max,
                half_phi,
                avg_phi,
            } => {
                let phis = self.phi_samples(half_phi, avg_phi);
                disc(r_min, r_max, &phis, self.bounds.is_full_turn())
            }
            SurfaceBounds::Cylinder {
                r,
                half_z,
                half_phi,
                avg_phi,
            } => {
                let phis = self.phi_samples(half_phi, avg_phi);
                cylinder(r, half_z, &phis, self.bounds.is_full_turn())
            }
        };
        for v in &mut mesh.vertices {
            *v = self.transform * *v;
        }
        Ok(mesh)
    }

    /// Phi values along the arc. A full turn omits the closing sample.
    #[allow(clippy::cast_precision_loss)]
    fn phi_samples(&self, half_phi: f64, avg_phi: f64) -> Vec<f64> {
        let n = self.params.segments(2.0 * half_phi);
        let step = 2.0 * half_phi / n as f64;
        let count = if self.bounds.is_full_turn() { n } else { n + 1 };
        (0..count)
            .map(|i| avg_phi - half_phi + step * i as f64)
            .collect()
    }
}

fn planar(corners: &[(f64, f64)]) -> PolygonMesh {
    PolygonMesh {
        vertices: corners
            .iter()
            .map(|&(x, y)| Point3::new(x, y, 0.0))
            .collect(),
        faces: vec![(0..index(corners.len())).collect()],
    }
}

fn disc(r_min: f64, r_max: f64, phis: &[f64], closed: bool) -> PolygonMesh {
    let n = phis.len();
    let mut vertices: Vec<Point3> = phis
        .iter()
        .map(|phi| Point3::new(r_max * phi.cos(), r_max * phi.sin(), 0.0))
        .collect();
    let mut faces = Vec::new();
    let spans = if closed { n } else { n - 1 };
    if r_min > 0.0 {
        vertices.extend(
            phis.iter()
                .map(|phi| Point3::new(r_min * phi.cos(), r_min * phi.sin(), 0.0)),
        );
        for i in 0..spans {
            let j = (i + 1) % n;
            faces.push(vec![index(n + i), index(n + j), index(j), index(i)]);
        }
    } else {
        vertices.push(Point3::origin());
        let center = index(n);
        for i in 0..spans {
            let j = (i + 1) % n;
            faces.push(vec![center, index(i), index(j)]);
        }
    }
    PolygonMesh { vertices, faces }
}

fn cylinder(r: f64, half_z: f64, phis: &[f64], closed: bool) -> PolygonMesh {
    let n = phis.len();
    let mut vertices = Vec::with_capacity(2 * n);
    for z in [-half_z, half_z] {
        vertices.extend(
            phis.iter()
                .map(|phi| Point3::new(r * phi.cos(), r * phi.sin(), z)),
        );
    }
    let spans = if closed { n } else { n - 1 };
    let faces = (0..spans)
        .map(|i| {
            let j = (i + 1) % n;
            vec![index(i), index(j), index(n + j), index(n + i)]
        })
        .collect();
    PolygonMesh { vertices, faces }
}

#[allow(clippy::cast_possible_truncation)]
fn index(i: usize) -> u32 {
    i as u32
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn params() -> TessellationParams {
        TessellationParams {
            segments_per_turn: 8,
            min_segments: 2,
            max_segments: 64,
        }
    }

    #[test]
    fn rectangle_is_one_quad_in_place() {
        let bounds = SurfaceBounds::rectangle(1.0, 2.0).unwrap();
        let mesh = TessellateSurface::new(&bounds, Transform3::translation(0.0, 0.0, 5.0), params())
            .execute()
            .unwrap();
        assert_eq!(mesh.vertices.len(), 4);
        assert_eq!(mesh.faces, vec![vec![0, 1, 2, 3]]);
        for v in &mesh.vertices {
            assert_relative_eq!(v.z, 5.0);
        }
    }

    #[test]
    fn full_cylinder_wraps_around() {
        let bounds = SurfaceBounds::cylinder(10.0, 20.0).unwrap();
        let mesh = TessellateSurface::new(&bounds, Transform3::identity(), params())
            .execute()
            .unwrap();
        assert_eq!(mesh.vertices.len(), 16);
        assert_eq!(mesh.faces.len(), 8);
        assert_eq!(mesh.faces[7], vec![7, 0, 8, 15]);
        for v in &mesh.vertices {
            assert_relative_eq!((v.x * v.x + v.y * v.y).sqrt(), 10.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn cylinder_sector_is_open() {
        let bounds =
            SurfaceBounds::cylinder_sector(10.0, 20.0, std::f64::consts::FRAC_PI_2, 0.0).unwrap();
        let mesh = TessellateSurface::new(&bounds, Transform3::identity(), params())
            .execute()
            .unwrap();
        // half a turn at 8 segments per turn
        assert_eq!(mesh.faces.len(), 4);
        assert_eq!(mesh.vertices.len(), 10);
    }

    #[test]
    fn ring_disc_has_quads_and_full_disc_has_fan() {
        let ring = SurfaceBounds::disc(5.0, 10.0).unwrap();
        let mesh = TessellateSurface::new(&ring, Transform3::identity(), params())
            .execute()
            .unwrap();
        assert_eq!(mesh.faces.len(), 8);
        assert!(mesh.faces.iter().all(|f| f.len() == 4));

        let full = SurfaceBounds::Disc {
            r_min: 0.0,
            r_max: 10.0,
            half_phi: std::f64::consts::PI,
            avg_phi: 0.0,
        };
        let mesh = TessellateSurface::new(&full, Transform3::identity(), params())
            .execute()
            .unwrap();
        assert_eq!(mesh.faces.len(), 8);
        assert!(mesh.faces.iter().all(|f| f.len() == 3));
        assert_eq!(mesh.vertices.len(), 9);
    }

    #[test]
    fn invalid_params_are_rejected() {
        let bounds = SurfaceBounds::rectangle(1.0, 1.0).unwrap();
        let bad = TessellationParams {
            min_segments: 0,
            ..params()
        };
        assert!(TessellateSurface::new(&bounds, Transform3::identity(), bad)
            .execute()
            .is_err());
    }
}
