use std::collections::btree_map::{self, BTreeMap};

use serde::Serialize;

use crate::error::MaterialError;
use crate::geometry::{BoundsType, GeometryIdentifier, SurfaceKind};
use crate::math::Placement;

use super::{SurfaceMaterial, VolumeMaterial};

/// Kind of geometry element a material entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    Volume,
    Sensitive,
    Approach,
    Representing,
    Boundary,
}

impl ElementKind {
    /// Kind of a surface, or `None` for surfaces no inclusion flag covers.
    #[must_use]
    pub fn of_surface(kind: SurfaceKind) -> Option<Self> {
        match kind {
            SurfaceKind::Sensitive => Some(Self::Sensitive),
            SurfaceKind::Approach => Some(Self::Approach),
            SurfaceKind::Representing => Some(Self::Representing),
            SurfaceKind::Boundary => Some(Self::Boundary),
            SurfaceKind::Passive => None,
        }
    }
}

/// Material carried by one element.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MaterialPayload {
    Surface(SurfaceMaterial),
    Volume(VolumeMaterial),
}

/// One element of the material map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaterialEntry {
    pub kind: ElementKind,
    /// Surface bounds type; `None` for volumes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounds: Option<BoundsType>,
    /// Placement resolved with the converter's geometry context.
    pub placement: Placement,
    /// `None` marks an element recorded without material.
    pub material: Option<MaterialPayload>,
}

impl MaterialEntry {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.material.is_none()
    }
}

/// Material associations keyed by geometry identifier.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaterialMap {
    entries: BTreeMap<GeometryIdentifier, MaterialEntry>,
}

impl MaterialMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the identifier already has an entry.
    pub fn insert(&mut self, id: GeometryIdentifier, entry: MaterialEntry) -> Result<(), MaterialError> {
        match self.entries.entry(id) {
            btree_map::Entry::Occupied(_) => Err(MaterialError::DuplicateIdentifier(id)),
            btree_map::Entry::Vacant(slot) => {
                slot.insert(entry);
                Ok(())
            }
        }
    }

    #[must_use]
    pub fn get(&self, id: GeometryIdentifier) -> Option<&MaterialEntry> {
        self.entries.get(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in ascending identifier order.
    pub fn iter(&self) -> impl Iterator<Item = (GeometryIdentifier, &MaterialEntry)> {
        self.entries.iter().map(|(id, entry)| (*id, entry))
    }

    /// Number of entries of one kind.
    #[must_use]
    pub fn count(&self, kind: ElementKind) -> usize {
        self.entries.values().filter(|e| e.kind == kind).count()
    }
}
