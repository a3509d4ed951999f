mod convert;
mod map;

pub use convert::{MaterialMapConfig, MaterialMapConverter};
pub use map::{ElementKind, MaterialEntry, MaterialMap, MaterialPayload};

use serde::Serialize;

/// Bulk material properties.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Material {
    /// Radiation length.
    #[serde(rename = "X0")]
    pub x0: f64,
    /// Nuclear interaction length.
    #[serde(rename = "L0")]
    pub l0: f64,
    /// Relative atomic mass.
    #[serde(rename = "Ar")]
    pub ar: f64,
    /// Atomic number.
    #[serde(rename = "Z")]
    pub z: f64,
    /// Mass density.
    pub rho: f64,
}

impl Material {
    #[must_use]
    pub fn new(x0: f64, l0: f64, ar: f64, z: f64, rho: f64) -> Self {
        Self { x0, l0, ar, z, rho }
    }

    /// Material with no interaction; not a valid association on its own.
    #[must_use]
    pub fn vacuum() -> Self {
        Self::new(f64::INFINITY, f64::INFINITY, 0.0, 0.0, 0.0)
    }

    /// A material is valid when it has mass.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.ar > 0.0 && self.rho > 0.0
    }
}

/// A material of a given thickness.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MaterialSlab {
    pub material: Material,
    pub thickness: f64,
}

impl MaterialSlab {
    #[must_use]
    pub fn new(material: Material, thickness: f64) -> Self {
        Self {
            material,
            thickness,
        }
    }

    /// The empty slab.
    #[must_use]
    pub fn vacuum() -> Self {
        Self::new(Material::vacuum(), 0.0)
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.material.is_valid() && self.thickness > 0.0
    }

    /// Thickness in units of radiation length.
    #[must_use]
    pub fn thickness_in_x0(&self) -> f64 {
        if self.is_valid() {
            self.thickness / self.material.x0
        } else {
            0.0
        }
    }
}

/// Material attached to a surface.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SurfaceMaterial {
    /// One slab over the whole surface.
    Homogeneous(MaterialSlab),
    /// A `bins0 x bins1` grid of slabs, `bins1` varying fastest.
    Binned {
        bins0: usize,
        bins1: usize,
        slabs: Vec<MaterialSlab>,
    },
}

impl SurfaceMaterial {
    /// Returns `true` if any slab carries material.
    #[must_use]
    pub fn is_non_trivial(&self) -> bool {
        match self {
            Self::Homogeneous(slab) => slab.is_valid(),
            Self::Binned { slabs, .. } => slabs.iter().any(MaterialSlab::is_valid),
        }
    }
}

/// Material filling a volume.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VolumeMaterial {
    Homogeneous { material: Material },
}

impl VolumeMaterial {
    #[must_use]
    pub fn is_non_trivial(&self) -> bool {
        match self {
            Self::Homogeneous { material } => material.is_valid(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn silicon() -> Material {
        Material::new(93.7, 465.2, 28.0855, 14.0, 2.329)
    }

    #[test]
    fn vacuum_is_not_valid() {
        assert!(!Material::vacuum().is_valid());
        assert!(!MaterialSlab::vacuum().is_valid());
        assert_eq!(MaterialSlab::vacuum().thickness_in_x0(), 0.0);
    }

    #[test]
    fn slab_thickness_in_x0() {
        let slab = MaterialSlab::new(silicon(), 0.15);
        assert_relative_eq!(slab.thickness_in_x0(), 0.15 / 93.7);
    }

    #[test]
    fn binned_material_with_one_valid_bin_is_non_trivial() {
        let m = SurfaceMaterial::Binned {
            bins0: 1,
            bins1: 2,
            slabs: vec![MaterialSlab::vacuum(), MaterialSlab::new(silicon(), 0.1)],
        };
        assert!(m.is_non_trivial());

        let empty = SurfaceMaterial::Homogeneous(MaterialSlab::vacuum());
        assert!(!empty.is_non_trivial());
    }

    #[test]
    fn material_serializes_with_short_names() {
        let value = serde_json::to_value(silicon()).unwrap();
        assert_eq!(value["Z"], 14.0);
        assert!(value.get("X0").is_some());
    }
}
