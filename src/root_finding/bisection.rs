//! Bisection method

use super::algorithms::{Algorithm, BracketFamily, GLOBAL_MAX_ITER_FALLBACK};
use super::report::{RootFindingReport, TerminationReason, ToleranceSatisfied, Stencil};
use super::tolerances::DynamicTolerance;
use super::signs::opposite_sign;
use super::errors::{RootFindingError, ToleranceError};
use super::config::{CommonCfg, impl_common_cfg};
use thiserror::Error;

const ALGORITHM: Algorithm = Algorithm::Bracket(BracketFamily::Bisection);


#[derive(Debug, Clone, PartialEq, Error)]
pub enum BisectionError {
    #[error(transparent)]
    RootFinding(#[from] RootFindingError),

    #[error(transparent)]
    Tolerance(#[from] ToleranceError),

    #[error("no sign change on [{a}, {b}]: f(a) * f(b) > 0")]
    NoSignChange  { a: f64, b: f64 },

    #[error("invalid bounds: a and b must be finite with a < b. got [{a}, {b}]")]
    InvalidBounds { a: f64, b: f64 },
}


/// Bisection configuration.
///
/// # Fields
/// - `common` : [`CommonCfg`] with tolerances and optional `max_iter`.
///
/// # Construction
/// - Use [`BisectionCfg::new`] then optional setters.
///
/// # Defaults
/// - If `common.max_iter` is `None`, [`bisection`] resolves it to the
///   theoretical number of halvings needed for the initial width tolerance,
///   capped at [`GLOBAL_MAX_ITER_FALLBACK`].
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BisectionCfg {
    common: CommonCfg
}
impl BisectionCfg {
    #[must_use]
    pub fn new() -> Self {
        Self {
            common: CommonCfg::new()
        }
    }
}
impl Default for BisectionCfg {
    fn default() -> Self { Self::new() }
}
impl_common_cfg!(BisectionCfg);


/// Midpoint of [a, b] without overflow for large same-sign endpoints.
#[inline]
pub(crate) fn midpoint(a: f64, b: f64) -> f64 {
    a + (b - a) * 0.5
}


/// Number of halvings needed to shrink `[a, b]` below `width_tol`.
///
/// `width_tol` must already be validated as finite and > 0.
#[inline]
pub(crate) fn theoretical_iter(a: f64, b: f64, width_tol: f64) -> usize {
    let w0 = b - a;
    if w0 <= width_tol { 0 } else { (w0 / width_tol).log2().ceil() as usize }
}


#[inline]
fn eval_fx_checked<F>(
    f: &mut F,
    x: f64,
    evals: &mut usize
) -> Result<f64, BisectionError> where F: FnMut(f64) -> f64 {
    let fx = { *evals += 1; f(x) };
    if !fx.is_finite() {
        return Err(RootFindingError::NonFiniteEvaluation { x, fx }.into());
    }

    Ok(fx)
}


/// Bisection loop on `[a, b]` with known endpoint values.
///
/// Shared by [`bisection`] and the hybrid refiner, which already holds
/// `f(a)` and `f(b)` from the scan. `evals` counts only new evaluations.
pub(crate) fn bisection_loop<F>(
    f: &mut F,
    (mut a, mut fa): (f64, f64),
    (mut b, mut fb): (f64, f64),
    cfg: BisectionCfg,
    mut evals: usize,
) -> Result<RootFindingReport, BisectionError>
where F: FnMut(f64) -> f64 {

    let algo_name = ALGORITHM.algorithm_name();
    let abs_fx = cfg.abs_fx();
    let abs_x  = cfg.abs_x();
    let rel_x  = cfg.rel_x();

    let report = |root: f64, f_root: f64, iterations: usize, evaluations: usize,
                  termination_reason: TerminationReason,
                  tolerance_satisfied: ToleranceSatisfied,
                  (a, b): (f64, f64)| RootFindingReport {
        root,
        f_root,
        iterations,
        evaluations,
        termination_reason,
        tolerance_satisfied,
        stencil: Stencil::bracket(a, b),
        algorithm_name: algo_name,
    };

    // immediate bounds are roots
    if fa.abs() <= abs_fx {
        return Ok(report(a, fa, 0, evals, TerminationReason::ToleranceReached,
                         ToleranceSatisfied::AbsFxReached, (a, b)));
    }
    if fb.abs() <= abs_fx {
        return Ok(report(b, fb, 0, evals, TerminationReason::ToleranceReached,
                         ToleranceSatisfied::AbsFxReached, (a, b)));
    }

    if !opposite_sign(fa, fb) {
        return Err(BisectionError::NoSignChange { a, b });
    }

    let width_tol0 = ALGORITHM.calculate_tolerance(&DynamicTolerance::width(a, b), abs_x, rel_x)?;
    let num_iter = match cfg.max_iter() {
        Some(0) => return Err(RootFindingError::InvalidMaxIter { got: 0 }.into()),
        Some(m) => m,
        None    => theoretical_iter(a, b, width_tol0).min(GLOBAL_MAX_ITER_FALLBACK),
    };

    // immediate narrow width success
    if b - a <= width_tol0 {
        let m  = midpoint(a, b);
        let fm = eval_fx_checked(f, m, &mut evals)?;
        return Ok(report(m, fm, 0, evals, TerminationReason::ToleranceReached,
                         ToleranceSatisfied::WidthTolReached, (a, b)));
    }

    let mut m  = midpoint(a, b);
    let mut fm = fa;
    for iter in 1..=num_iter {
        m = midpoint(a, b);

        // [a, b] holds no representable interior point
        if m <= a || m >= b {
            let (root, f_root) = if fa.abs() <= fb.abs() { (a, fa) } else { (b, fb) };
            return Ok(report(root, f_root, iter, evals,
                             TerminationReason::MachinePrecisionReached,
                             ToleranceSatisfied::WidthTolReached, (a, b)));
        }

        fm = eval_fx_checked(f, m, &mut evals)?;
        log::trace!("{algo_name}: iter={iter} [{a}, {b}] f(m)={fm}");

        if fm.abs() <= abs_fx {
            return Ok(report(m, fm, iter, evals, TerminationReason::ToleranceReached,
                             ToleranceSatisfied::AbsFxReached, (a, b)));
        }

        // shrink interval, keeping the sign change
        if opposite_sign(fa, fm) {
            b  = m;
            fb = fm;
        } else {
            a  = m;
            fa = fm;
        }

        let width_tol = ALGORITHM.calculate_tolerance(&DynamicTolerance::width(a, b), abs_x, rel_x)?;
        if b - a <= width_tol {
            let m  = midpoint(a, b);
            let fm = eval_fx_checked(f, m, &mut evals)?;
            return Ok(report(m, fm, iter, evals, TerminationReason::ToleranceReached,
                             ToleranceSatisfied::WidthTolReached, (a, b)));
        }
    }

    Ok(report(m, fm, num_iter, evals, TerminationReason::IterationLimit,
              ToleranceSatisfied::ToleranceNotReached, (a, b)))
}


/// Finds a root of a function using the
/// [bisection method](https://en.wikipedia.org/wiki/Bisection_method).
///
/// This method assumes that the function `func` is continuous on the interval `[a, b]`
/// and that `func(a)` and `func(b)` have opposite signs, guaranteeing a root exists
/// within the interval.
///
/// # Arguments
///
/// ┌ `func` - The function whose root is to be found.
/// ├ `a`    - Lower bound of the search interval. Must be finite and less than `b`.
/// ├ `b`    - Upper bound of the search interval. Must be finite and greater than `a`.
/// └ `cfg`  - [`BisectionCfg`]
///    Defaults:
///    ├ cfg.abs_fx = 1e-12
///    ├ cfg.abs_x  = 0.0
///    └ cfg.rel_x  = 4 * machine_epsilon
///
/// # Returns
///
/// [`RootFindingReport`] with `stencil` = [`Stencil::Bracket`] holding the final bounds.
/// ├ `termination_reason`
/// │  ├ [`TerminationReason::ToleranceReached`]
/// │  ├ [`TerminationReason::MachinePrecisionReached`] (no midpoint left between bounds)
/// │  └ [`TerminationReason::IterationLimit`]
/// └ `tolerance_satisfied`
///    ├ [`ToleranceSatisfied::AbsFxReached`]
///    ├ [`ToleranceSatisfied::WidthTolReached`]
///    └ [`ToleranceSatisfied::ToleranceNotReached`]
///
/// # Errors
///
/// ┌ [`BisectionError::InvalidBounds`]  - `a` or `b` is NaN/inf or if `a >= b`.
/// ├ [`BisectionError::NoSignChange`]   - `func(a)` and `func(b)` do not have opposite signs.
/// ├ [`RootFindingError::NonFiniteEvaluation`] via [`BisectionError::RootFinding`]
/// └ [`ToleranceError::InvalidTolerance`]      via [`BisectionError::Tolerance`]
///
/// # Notes
/// └ On width-tolerance success the midpoint of the final bounds is evaluated
///   for reporting. This incurs exactly one extra evaluation.
pub fn bisection<F>(
    mut func: F,
    a: f64,
    b: f64,
    cfg: BisectionCfg
) -> Result<RootFindingReport, BisectionError>
where F: FnMut(f64) -> f64 {

    if !(a.is_finite() && b.is_finite()) || a >= b {
        return Err(BisectionError::InvalidBounds { a, b });
    }

    let mut evals = 0;
    let fa = eval_fx_checked(&mut func, a, &mut evals)?;
    let fb = eval_fx_checked(&mut func, b, &mut evals)?;

    bisection_loop(&mut func, (a, fa), (b, fb), cfg, evals)
}
