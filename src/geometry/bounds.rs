use std::f64::consts::PI;

use serde::Serialize;

use crate::error::GeometryError;
use crate::math::TOLERANCE;

/// Numeric bounds type tags used in tabular output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundsType {
    Cylinder = 1,
    Disc = 3,
    Rectangle = 6,
    Trapezoid = 7,
}

impl BoundsType {
    /// Returns the numeric tag.
    #[must_use]
    pub fn tag(self) -> u8 {
        self as u8
    }
}

/// The extent of a surface in its local frame.
///
/// Planar bounds live in the local `xy` plane, discs are centered on the
/// local origin in the `xy` plane, and cylinders are aligned with local `z`.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceBounds {
    /// Axis-aligned rectangle centered on the origin.
    Rectangle { half_x: f64, half_y: f64 },
    /// Symmetric trapezoid with different half-widths at `-y` and `+y`.
    Trapezoid {
        half_x_neg_y: f64,
        half_x_pos_y: f64,
        half_y: f64,
    },
    /// Annular disc sector.
    Disc {
        r_min: f64,
        r_max: f64,
        half_phi: f64,
        avg_phi: f64,
    },
    /// Cylinder sector around the local `z` axis.
    Cylinder {
        r: f64,
        half_z: f64,
        half_phi: f64,
        avg_phi: f64,
    },
}

impl SurfaceBounds {
    /// Creates rectangle bounds.
    ///
    /// # Errors
    ///
    /// Returns an error if either half-length is not positive.
    pub fn rectangle(half_x: f64, half_y: f64) -> Result<Self, GeometryError> {
        positive("rectangle half_x", half_x)?;
        positive("rectangle half_y", half_y)?;
        Ok(Self::Rectangle { half_x, half_y })
    }

    /// Creates trapezoid bounds.
    ///
    /// # Errors
    ///
    /// Returns an error if any half-length is not positive.
    pub fn trapezoid(half_x_neg_y: f64, half_x_pos_y: f64, half_y: f64) -> Result<Self, GeometryError> {
        positive("trapezoid half_x_neg_y", half_x_neg_y)?;
        positive("trapezoid half_x_pos_y", half_x_pos_y)?;
        positive("trapezoid half_y", half_y)?;
        Ok(Self::Trapezoid {
            half_x_neg_y,
            half_x_pos_y,
            half_y,
        })
    }

    /// Creates a full annular disc.
    ///
    /// # Errors
    ///
    /// Returns an error if `r_min` is negative or not below `r_max`.
    pub fn disc(r_min: f64, r_max: f64) -> Result<Self, GeometryError> {
        Self::disc_sector(r_min, r_max, PI, 0.0)
    }

    /// Creates an annular disc sector.
    ///
    /// # Errors
    ///
    /// Returns an error if the radii are inverted or the sector is empty or
    /// wider than a full turn.
    pub fn disc_sector(r_min: f64, r_max: f64, half_phi: f64, avg_phi: f64) -> Result<Self, GeometryError> {
        if r_min < 0.0 || r_max - r_min < TOLERANCE {
            return Err(GeometryError::InvalidBounds(format!(
                "disc radii [{r_min}, {r_max}] are not ordered"
            )));
        }
        half_phi_in_range(half_phi)?;
        Ok(Self::Disc {
            r_min,
            r_max,
            half_phi,
            avg_phi,
        })
    }

    /// Creates a full cylinder.
    ///
    /// # Errors
    ///
    /// Returns an error if the radius or half-length is not positive.
    pub fn cylinder(r: f64, half_z: f64) -> Result<Self, GeometryError> {
        Self::cylinder_sector(r, half_z, PI, 0.0)
    }

    /// Creates a cylinder sector.
    ///
    /// # Errors
    ///
    /// Returns an error if the radius or half-length is not positive or the
    /// sector is empty or wider than a full turn.
    pub fn cylinder_sector(r: f64, half_z: f64, half_phi: f64, avg_phi: f64) -> Result<Self, GeometryError> {
        positive("cylinder r", r)?;
        positive("cylinder half_z", half_z)?;
        half_phi_in_range(half_phi)?;
        Ok(Self::Cylinder {
            r,
            half_z,
            half_phi,
            avg_phi,
        })
    }

    #[must_use]
    pub fn bounds_type(&self) -> BoundsType {
        match self {
            Self::Rectangle { .. } => BoundsType::Rectangle,
            Self::Trapezoid { .. } => BoundsType::Trapezoid,
            Self::Disc { .. } => BoundsType::Disc,
            Self::Cylinder { .. } => BoundsType::Cylinder,
        }
    }

    /// Returns the defining parameters in a fixed order per bounds type.
    #[must_use]
    pub fn values(&self) -> Vec<f64> {
        match *self {
            Self::Rectangle { half_x, half_y } => vec![-half_x, -half_y, half_x, half_y],
            Self::Trapezoid {
                half_x_neg_y,
                half_x_pos_y,
                half_y,
            } => vec![half_x_neg_y, half_x_pos_y, half_y],
            Self::Disc {
                r_min,
                r_max,
                half_phi,
                avg_phi,
            } => vec![r_min, r_max, half_phi, avg_phi],
            Self::Cylinder {
                r,
                half_z,
                half_phi,
                avg_phi,
            } => vec![r, half_z, half_phi, avg_phi],
        }
    }

    /// Returns `true` if the bounds cover a full turn in phi.
    #[must_use]
    pub fn is_full_turn(&self) -> bool {
        match *self {
            Self::Disc { half_phi, .. } | Self::Cylinder { half_phi, .. } => {
                (half_phi - PI).abs() < TOLERANCE
            }
            Self::Rectangle { .. } | Self::Trapezoid { .. } => false,
        }
    }
}

/// The extent of a volume in its local frame.
#[derive(Debug, Clone, PartialEq)]
pub enum VolumeBounds {
    /// Hollow cylinder aligned with local `z`.
    Cylinder { r_min: f64, r_max: f64, half_z: f64 },
}

impl VolumeBounds {
    /// Creates cylinder volume bounds.
    ///
    /// # Errors
    ///
    /// Returns an error if the radii are inverted or the half-length is not
    /// positive.
    pub fn cylinder(r_min: f64, r_max: f64, half_z: f64) -> Result<Self, GeometryError> {
        if r_min < 0.0 || r_max - r_min < TOLERANCE {
            return Err(GeometryError::InvalidBounds(format!(
                "cylinder volume radii [{r_min}, {r_max}] are not ordered"
            )));
        }
        positive("cylinder volume half_z", half_z)?;
        Ok(Self::Cylinder {
            r_min,
            r_max,
            half_z,
        })
    }

    #[must_use]
    pub fn bounds_type(&self) -> BoundsType {
        BoundsType::Cylinder
    }

    #[must_use]
    pub fn values(&self) -> Vec<f64> {
        match *self {
            Self::Cylinder {
                r_min,
                r_max,
                half_z,
            } => vec![r_min, r_max, half_z],
        }
    }
}

fn positive(what: &str, value: f64) -> Result<(), GeometryError> {
    if value < TOLERANCE {
        return Err(GeometryError::InvalidBounds(format!(
            "{what} must be positive, got {value}"
        )));
    }
    Ok(())
}

fn half_phi_in_range(half_phi: f64) -> Result<(), GeometryError> {
    if half_phi < TOLERANCE || half_phi > PI + TOLERANCE {
        return Err(GeometryError::InvalidBounds(format!(
            "half phi {half_phi} outside (0, pi]"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rectangle_rejects_zero_extent() {
        assert!(SurfaceBounds::rectangle(0.0, 1.0).is_err());
        assert!(SurfaceBounds::rectangle(1.0, 2.0).is_ok());
    }

    #[test]
    fn rectangle_values_are_corners() {
        let b = SurfaceBounds::Rectangle {
            half_x: 2.0,
            half_y: 3.0,
        };
        assert_eq!(b.values(), vec![-2.0, -3.0, 2.0, 3.0]);
        assert_eq!(b.bounds_type().tag(), 6);
    }

    #[test]
    fn disc_requires_ordered_radii() {
        assert!(SurfaceBounds::disc(10.0, 5.0).is_err());
        let disc = SurfaceBounds::disc(5.0, 10.0);
        assert!(matches!(disc, Ok(ref d) if d.is_full_turn()));
    }

    #[test]
    fn sector_wider_than_full_turn_is_rejected() {
        assert!(SurfaceBounds::cylinder_sector(10.0, 5.0, 4.0, 0.0).is_err());
        assert!(SurfaceBounds::cylinder_sector(10.0, 5.0, 0.5, 0.0).is_ok());
    }

    #[test]
    fn volume_cylinder_values() {
        let v = VolumeBounds::Cylinder {
            r_min: 1.0,
            r_max: 2.0,
            half_z: 3.0,
        };
        assert_eq!(v.values(), vec![1.0, 2.0, 3.0]);
        assert!(VolumeBounds::cylinder(2.0, 1.0, 3.0).is_err());
    }
}
