pub mod config;
pub mod context;
pub mod decorator;
pub mod error;
pub mod export;
pub mod geometry;
pub mod io;
pub mod logging;
pub mod material;
pub mod math;
pub mod tessellation;

pub use config::ExportConfig;
pub use error::{GeoportError, Result};
pub use export::{ExportGeometry, ExportSummary};
