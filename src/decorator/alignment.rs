use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, error};

use crate::context::{AlgorithmContext, GEOMETRY_CONTEXT};
use crate::error::{ConfigError, GeometryError};
use crate::geometry::{GeometryContext, SurfaceKind, TrackingGeometry};
use crate::math::{Transform3, Vector3};

use super::{ContextDecorator, ProcessCode};

/// Parameters of the time-dependent misalignment.
#[derive(Debug, Clone)]
pub struct AlignmentConfig {
    /// Number of consecutive events sharing one alignment.
    pub iov_size: usize,
    /// Maximum shift along the local `x` and `y` axes.
    pub shift_in_plane: f64,
    /// Maximum shift along the local `z` axis.
    pub shift_out_of_plane: f64,
    /// Maximum rotation angle about each local axis.
    pub rotation: f64,
    pub seed: u64,
    /// Misalign only sensitive surfaces.
    pub sensitive_only: bool,
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            iov_size: 100,
            shift_in_plane: 0.1,
            shift_out_of_plane: 0.1,
            rotation: 0.001,
            seed: 1_324_354_657,
            sensitive_only: true,
        }
    }
}

/// Publishes a misaligned geometry context that changes every `iov_size`
/// events.
///
/// The corrections for an interval of validity depend only on the seed and
/// the interval index, so rerunning an export reproduces them. Computed
/// contexts are cached per interval.
pub struct AlignmentDecorator {
    config: AlignmentConfig,
    geometry: Arc<TrackingGeometry>,
    cache: Mutex<HashMap<u64, Arc<GeometryContext>>>,
}

impl AlignmentDecorator {
    /// Creates a new `AlignmentDecorator`.
    ///
    /// # Errors
    ///
    /// Returns an error if the interval size is zero or a magnitude is
    /// negative or not finite.
    pub fn new(config: AlignmentConfig, geometry: Arc<TrackingGeometry>) -> Result<Self, ConfigError> {
        if config.iov_size == 0 {
            return Err(ConfigError::Invalid {
                field: "iov_size",
                reason: "must be at least 1".into(),
            });
        }
        let magnitudes = [
            ("shift_in_plane", config.shift_in_plane),
            ("shift_out_of_plane", config.shift_out_of_plane),
            ("rotation", config.rotation),
        ];
        for (field, value) in magnitudes {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("must be finite and non-negative, got {value}"),
                });
            }
        }
        Ok(Self {
            config,
            geometry,
            cache: Mutex::new(HashMap::new()),
        })
    }

    /// Interval of validity an event falls into.
    #[must_use]
    pub fn iov(&self, event: usize) -> u64 {
        (event / self.config.iov_size) as u64
    }

    fn context_for(&self, iov: u64) -> Result<Arc<GeometryContext>, GeometryError> {
        if let Ok(cache) = self.cache.lock() {
            if let Some(ctx) = cache.get(&iov) {
                return Ok(Arc::clone(ctx));
            }
        }
        let ctx = Arc::new(self.compute(iov)?);
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(iov, Arc::clone(&ctx));
        }
        Ok(ctx)
    }

    fn compute(&self, iov: u64) -> Result<GeometryContext, GeometryError> {
        let mut rng = StdRng::seed_from_u64(self.config.seed.wrapping_add(iov));
        let mut deltas = BTreeMap::new();
        for surface in self.geometry.surfaces()? {
            if self.config.sensitive_only && surface.data.kind != SurfaceKind::Sensitive {
                continue;
            }
            let shift = Vector3::new(
                symmetric(&mut rng, self.config.shift_in_plane),
                symmetric(&mut rng, self.config.shift_in_plane),
                symmetric(&mut rng, self.config.shift_out_of_plane),
            );
            let rotation = Vector3::new(
                symmetric(&mut rng, self.config.rotation),
                symmetric(&mut rng, self.config.rotation),
                symmetric(&mut rng, self.config.rotation),
            );
            deltas.insert(surface.data.geometry_id, Transform3::new(shift, rotation));
        }
        debug!(iov, surfaces = deltas.len(), "computed alignment");
        Ok(GeometryContext::aligned(iov, deltas))
    }
}

fn symmetric(rng: &mut StdRng, magnitude: f64) -> f64 {
    if magnitude == 0.0 {
        0.0
    } else {
        rng.gen_range(-magnitude..=magnitude)
    }
}

impl ContextDecorator for AlignmentDecorator {
    fn name(&self) -> &str {
        "AlignmentDecorator"
    }

    fn decorate(&self, context: &AlgorithmContext<'_>) -> ProcessCode {
        let iov = self.iov(context.event_number());
        let geometry_context = match self.context_for(iov) {
            Ok(ctx) => ctx,
            Err(err) => {
                error!(event = context.event_number(), %err, "alignment failed");
                return ProcessCode::Abort;
            }
        };
        match context
            .store()
            .add_shared(GEOMETRY_CONTEXT, geometry_context)
        {
            Ok(()) => ProcessCode::Success,
            Err(err) => {
                error!(event = context.event_number(), %err, "cannot publish alignment");
                ProcessCode::Abort
            }
        }
    }
}
