//! Tolerance utilities for root-finding algorithms.
//!
//! Provides types and helpers for computing stopping tolerances
//! consistently across algorithm categories.
//!
//! `DynamicTolerance` : method-specific per-iteration tolerance
//! - `WidthTol(a, b)`       : bracketing methods
//! - `StepTol(next)`        : Newton steps
//!
//! Each [`Algorithm`] variant enforces that only the correct dynamic
//! tolerance type is used via `calculate_tolerance`.


use crate::root_finding::errors::ToleranceError;
use crate::root_finding::algorithms::Algorithm;


/// Floor on `|x|` in the relative step test, so the test degrades to an
/// absolute one of size `rel_x * eps` when iterates approach zero.
pub(crate) const REL_STEP_FLOOR: f64 = f64::EPSILON;


/// Bracketing methods use DynamicTolerance::WidthTol
/// Open methods       use DynamicTolerance::StepTol
/// Hybrid methods     use both
#[derive(Debug, Copy, Clone)]
pub(crate) enum DynamicTolerance {
    WidthTol { a: f64, b: f64 },
    StepTol  { next: f64 }
}
impl DynamicTolerance {
    pub fn width(a: f64, b: f64) -> Self {
        DynamicTolerance::WidthTol { a, b }
    }
    pub fn step(next: f64) -> Self {
        DynamicTolerance::StepTol { next }
    }
}


impl Algorithm {
    /// Compute the method-specific dynamic tolerance for an algorithm.
    /// - [`Algorithm::Bracket`] methods ([`DynamicTolerance::WidthTol`]):
    ///   `abs_x + rel_x * max(|a|, |b|, 1.0)`
    /// - [`Algorithm::Open`] methods ([`DynamicTolerance::StepTol`]):
    ///   `abs_x + rel_x * max(|x_next|, eps)`
    /// - [`Algorithm::Hybrid`] methods can do both, but measure widths
    ///   relative to `max(|a|, |b|, eps)` like their steps.
    ///
    /// # Notes
    /// - With `abs_x = 0` the step test `|x_next - x| <= tol` is the relative
    ///   change `|x_next - x| / max(|x_next|, eps) <= rel_x`.
    ///
    /// # Errors
    /// - Returns a [`ToleranceError`] if the tolerance type does not
    ///   match the algorithm type (e.g. width tolerance for an open method)
    ///   or if the result is invalid (non-finite or <= 0).
    pub(crate) fn calculate_tolerance(
        &self,
        dynamic_tol : &DynamicTolerance,
        abs_x   : f64,
        rel_x   : f64
    ) -> Result<f64, ToleranceError> {

        let calculated_tol = match (self, dynamic_tol) {
            (Algorithm::Bracket(..), DynamicTolerance::WidthTol { a, b })
            => abs_x + rel_x * a.abs().max(b.abs()).max(1.0),

            (Algorithm::Hybrid(..), DynamicTolerance::WidthTol { a, b })
            => abs_x + rel_x * a.abs().max(b.abs()).max(REL_STEP_FLOOR),

            (
                Algorithm::Open(..) | Algorithm::Hybrid(..),
                DynamicTolerance::StepTol { next }
            )
            => abs_x + rel_x * next.abs().max(REL_STEP_FLOOR),

            (_, DynamicTolerance::WidthTol { .. })
            => return Err(ToleranceError::WidthTolNotApplicable { algorithm: *self }),

            (_, DynamicTolerance::StepTol { .. })
            => return Err(ToleranceError::StepTolNotApplicable { algorithm: *self }),
        };

        if calculated_tol <= 0.0 || !calculated_tol.is_finite() {
            return Err(ToleranceError::InvalidTolerance { got: calculated_tol });
        }

        Ok(calculated_tol)
    }
}
