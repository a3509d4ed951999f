use std::sync::Arc;

use crate::error::StoreError;
use crate::geometry::GeometryContext;

use super::store::{ContextKey, ContextStore};

/// Store slot holding the event's geometry context.
pub const GEOMETRY_CONTEXT: ContextKey<GeometryContext> = ContextKey::new("geometry_context");

/// Everything a decorator or writer needs to know about the current event.
///
/// Built once per event before decoration and never changed afterwards;
/// event-varying data is published into the store instead.
#[derive(Debug, Clone, Copy)]
pub struct AlgorithmContext<'a> {
    algorithm_number: usize,
    event_number: usize,
    store: &'a ContextStore,
}

impl<'a> AlgorithmContext<'a> {
    #[must_use]
    pub fn new(algorithm_number: usize, event_number: usize, store: &'a ContextStore) -> Self {
        Self {
            algorithm_number,
            event_number,
            store,
        }
    }

    #[must_use]
    pub fn algorithm_number(&self) -> usize {
        self.algorithm_number
    }

    #[must_use]
    pub fn event_number(&self) -> usize {
        self.event_number
    }

    #[must_use]
    pub fn store(&self) -> &'a ContextStore {
        self.store
    }

    /// The geometry context published by the decorators, or the nominal one
    /// if none was.
    ///
    /// # Errors
    ///
    /// Returns an error if the geometry-context slot holds another type.
    pub fn geometry_context(&self) -> Result<Arc<GeometryContext>, StoreError> {
        Ok(self
            .store
            .find(GEOMETRY_CONTEXT)?
            .unwrap_or_else(|| Arc::new(GeometryContext::nominal())))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn undecorated_event_uses_nominal_geometry() {
        let store = ContextStore::for_event(2);
        let ctx = AlgorithmContext::new(0, 2, &store);
        assert_eq!(ctx.event_number(), 2);
        assert_eq!(ctx.algorithm_number(), 0);
        assert!(ctx.geometry_context().unwrap().is_nominal());
    }

    #[test]
    fn published_geometry_context_is_returned() {
        let store = ContextStore::for_event(0);
        store
            .add(GEOMETRY_CONTEXT, GeometryContext::aligned(4, BTreeMap::new()))
            .unwrap();
        let ctx = AlgorithmContext::new(0, 0, &store);
        assert_eq!(ctx.geometry_context().unwrap().iov(), Some(4));
    }
}
