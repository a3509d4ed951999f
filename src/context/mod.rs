mod algorithm;
mod store;

pub use algorithm::{AlgorithmContext, GEOMETRY_CONTEXT};
pub use store::{ContextKey, ContextStore};
