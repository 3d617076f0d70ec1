//! Validation observers.
//!
//! The chain reports its progress through a [`ValidationObserver`] instead of
//! writing to any output itself. Callers pick [`TracingObserver`] to get
//! structured log events, [`NoopObserver`] for silence, or their own
//! implementation (the tests use one to record which checks ran).

use crate::checks::{CheckKind, ResolvedStep};
use crate::result::ResultOutput;
use crate::ValidationError;

/// Hooks invoked while a scenario is validated. All methods default to
/// doing nothing.
pub trait ValidationObserver: Send + Sync {
    /// A check is about to run.
    fn check_started(&self, _check: CheckKind) {}

    /// A check finished without finding a problem.
    fn check_passed(&self, _check: CheckKind) {}

    /// A check stopped the chain.
    fn check_failed(&self, _check: CheckKind, _error: &ValidationError) {}

    /// A step was substituted and matched against the catalog.
    fn step_resolved(&self, _step: &ResolvedStep) {}

    /// Validation produced its final result.
    fn finished(&self, _result: &ResultOutput) {}
}

/// Observer that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl ValidationObserver for NoopObserver {}

/// Observer that emits `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl ValidationObserver for TracingObserver {
    fn check_started(&self, check: CheckKind) {
        tracing::trace!(check = %check, "Running scenario check");
    }

    fn check_passed(&self, check: CheckKind) {
        tracing::debug!(check = %check, "Scenario check passed");
    }

    fn check_failed(&self, check: CheckKind, error: &ValidationError) {
        tracing::info!(check = %check, error = %error, "Scenario check failed");
    }

    fn step_resolved(&self, step: &ResolvedStep) {
        tracing::debug!(
            step = step.position,
            expression = %step.expression.id,
            sentence = %step.sentence,
            "Resolved step"
        );
    }

    fn finished(&self, result: &ResultOutput) {
        tracing::debug!(valid = result.valid, message = %result.message, "Validation finished");
    }
}
