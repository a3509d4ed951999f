use std::collections::BTreeMap;

use crate::math::Transform3;

use super::identifier::GeometryIdentifier;

/// Event-dependent view of the geometry placement.
///
/// The nominal context leaves every surface at its constructed transform.
/// An aligned context carries per-surface corrections that are applied on
/// top of the nominal transform.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeometryContext {
    iov: Option<u64>,
    deltas: BTreeMap<GeometryIdentifier, Transform3>,
}

impl GeometryContext {
    /// The context that applies no corrections.
    #[must_use]
    pub fn nominal() -> Self {
        Self::default()
    }

    /// Creates an aligned context for one interval of validity.
    #[must_use]
    pub fn aligned(iov: u64, deltas: BTreeMap<GeometryIdentifier, Transform3>) -> Self {
        Self {
            iov: Some(iov),
            deltas,
        }
    }

    #[must_use]
    pub fn is_nominal(&self) -> bool {
        self.iov.is_none() && self.deltas.is_empty()
    }

    /// The interval of validity this context was produced for.
    #[must_use]
    pub fn iov(&self) -> Option<u64> {
        self.iov
    }

    /// Returns the correction for an element, if any.
    #[must_use]
    pub fn delta(&self, id: GeometryIdentifier) -> Option<&Transform3> {
        self.deltas.get(&id)
    }

    /// Resolves the placement of an element from its nominal transform.
    #[must_use]
    pub fn resolve(&self, id: GeometryIdentifier, nominal: &Transform3) -> Transform3 {
        match self.deltas.get(&id) {
            Some(delta) => nominal * delta,
            None => *nominal,
        }
    }

    /// Number of corrected elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.deltas.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.deltas.is_empty()
    }
}
