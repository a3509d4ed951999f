mod alignment;

pub use alignment::{AlignmentConfig, AlignmentDecorator};

use crate::context::AlgorithmContext;

/// Outcome of one processing step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessCode {
    Success,
    /// Stop the run because of an error.
    Abort,
    /// Stop the run without an error on this step's side.
    End,
}

impl ProcessCode {
    #[must_use]
    pub fn is_success(self) -> bool {
        self == Self::Success
    }
}

/// Injects event-dependent geometry context before any writer runs.
///
/// Called exactly once per event, in list order, with the event's context.
/// Anything other than [`ProcessCode::Success`] stops the export.
pub trait ContextDecorator {
    /// Name used in logs and error reports.
    fn name(&self) -> &str;

    fn decorate(&self, context: &AlgorithmContext<'_>) -> ProcessCode;
}
