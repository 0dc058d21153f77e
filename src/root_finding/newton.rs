//! Newton-Raphson method, open and bracket-safeguarded.

use super::algorithms::{Algorithm, HybridFamily, OpenFamily, GLOBAL_MAX_ITER_FALLBACK};
use super::report::{RootFindingReport, TerminationReason, ToleranceSatisfied, Stencil};
use super::tolerances::DynamicTolerance;
use super::errors::{RootFindingError, ToleranceError};
use super::config::{CommonCfg, impl_common_cfg};
use super::signs::{same_sign, strictly_opposite};
use super::bisection::midpoint;
use thiserror::Error;


#[derive(Debug, Clone, PartialEq, Error)]
pub enum NewtonError {
    #[error(transparent)]
    RootFinding(#[from] RootFindingError),

    #[error(transparent)]
    Tolerance(#[from] ToleranceError),

    #[error("invalid initial guess: x0={x0} must be finite")]
    InvalidGuess { x0: f64 },

    #[error("invalid bounds: a and b must be finite with a < b. got [{a}, {b}]")]
    InvalidBounds { a: f64, b: f64 },

    #[error("no sign change on [{a}, {b}]: f(a) * f(b) >= 0")]
    NoSignChange { a: f64, b: f64 },

    #[error("invalid max step, must be > 0 or f64::INFINITY")]
    InvalidMaxStep { step: f64 },

    #[error("invalid bracket margin: must be finite and >= 0. got {got}")]
    InvalidMargin { got: f64 },

    #[error("step non-finite at x={x}, step={step}; x + step undefined")]
    StepNotFinite { x: f64, step: f64 },

    #[error("step non-finite from vanishing derivative at x={x}, f'(x)={dfx}")]
    DerivativeTooSmall { x: f64, dfx: f64 },

    #[error("derivative non-finite at x={x}, f'(x)={dfx}")]
    DerivativeNotFinite { x: f64, dfx: f64 },

    #[error("finite-difference step not representable at x={x}, h={h};\
             try smaller |x| scaling or analytic derivative"
    )]
    FiniteDifferenceStepUnrepresentable { x: f64, h: f64 }
}


/// What safeguarded Newton does with a step it cannot take, i.e. a
/// vanishing derivative or an iterate outside the (widened) bracket.
///
/// - [`NewtonFallback::Bisect`] : take the midpoint of the current
///   sign-change sub-bracket instead, then resume Newton
/// - [`NewtonFallback::Reject`] : stop; the run ends as
///   [`TerminationReason::DivergedOutOfBracket`] or
///   [`TerminationReason::DegenerateDerivative`]
///
/// Open Newton ([`newton`]) has no bracket and always errors instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NewtonFallback {
    #[default]
    Bisect,
    Reject,
}


/// Newton configuration.
///
/// # Fields
/// - `common`   : [`CommonCfg`] with tolerances and optional `max_iter`.
/// - `max_step` : optional limit on the absolute Newton step (default: ∞).
/// - `margin`   : how far a safeguarded iterate may leave its bracket (default: 0).
/// - `fallback` : [`NewtonFallback`] for rejected safeguarded steps (default: bisect).
///
/// # Construction
/// - Use [`NewtonCfg::new`] then optional setters.
///
/// # Defaults
/// - If `common.max_iter` is `None`, the iteration cap is resolved with
///   [`Algorithm::default_max_iter`], or [`GLOBAL_MAX_ITER_FALLBACK`] if unavailable.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct NewtonCfg {
    common:   CommonCfg,
    max_step: f64,
    margin:   f64,
    fallback: NewtonFallback,
}
impl NewtonCfg {
    #[must_use]
    pub fn new() -> Self {
        Self {
            common:   CommonCfg::new(),
            max_step: f64::INFINITY,
            margin:   0.0,
            fallback: NewtonFallback::Bisect,
        }
    }
    pub fn set_max_step(mut self, v: f64) -> Result<Self, NewtonError> {
        if  v <= 0.0 || v.is_nan() {
            return Err(NewtonError::InvalidMaxStep { step: v });
        }
        self.max_step = v;
        Ok(self)
    }
    pub fn set_margin(mut self, v: f64) -> Result<Self, NewtonError> {
        if !v.is_finite() || v < 0.0 {
            return Err(NewtonError::InvalidMargin { got: v });
        }
        self.margin = v;
        Ok(self)
    }
    #[must_use]
    pub fn with_fallback(mut self, v: NewtonFallback) -> Self {
        self.fallback = v;
        self
    }

    #[inline] #[must_use] pub fn max_step(&self) -> f64 { self.max_step }
    #[inline] #[must_use] pub fn margin(&self)   -> f64 { self.margin }
    #[inline] #[must_use] pub fn fallback(&self) -> NewtonFallback { self.fallback }
}
impl Default for NewtonCfg {
    fn default() -> Self { Self::new() }
}
impl_common_cfg!(NewtonCfg);


/// Sign-change sub-bracket kept by safeguarded Newton.
///
/// `f_lo` is only used for its sign; `f(hi)` has the opposite one.
#[derive(Debug, Copy, Clone, PartialEq)]
pub(crate) struct Guard {
    pub lo:   f64,
    pub hi:   f64,
    pub f_lo: f64,
}
impl Guard {
    pub fn new(lo: f64, hi: f64, f_lo: f64) -> Self {
        Self { lo, hi, f_lo }
    }
    #[inline]
    fn width(&self) -> f64 { self.hi - self.lo }

    #[inline]
    fn midpoint(&self) -> f64 { midpoint(self.lo, self.hi) }

    #[inline]
    fn admits(&self, x: f64, margin: f64) -> bool {
        self.lo - margin <= x && x <= self.hi + margin
    }

    /// Shrinks the bracket onto `x` if `x` lies strictly inside it.
    fn tighten(&mut self, x: f64, fx: f64) {
        if !(self.lo < x && x < self.hi) {
            return;
        }
        if same_sign(fx, self.f_lo) {
            self.lo   = x;
            self.f_lo = fx;
        } else {
            self.hi = x;
        }
    }
}


/// ULP helpers for finite-difference fallback near representability edges
#[inline]
fn next_up(x: f64) -> f64 {
    if x.is_nan() || x == f64::INFINITY { return x; }
    // smallest positive subnormal
    if x == 0.0 { return f64::from_bits(1); }

    let bits   = x.to_bits();
    let bumped = if x > 0.0 { bits + 1 } else { bits - 1 };
    f64::from_bits(bumped)
}
#[inline]
fn next_down(x: f64) -> f64 {
    if x.is_nan() || x == f64::NEG_INFINITY { return x; }
    // largest negative subnormal
    if x == 0.0 { return -f64::from_bits(1); }

    let bits = x.to_bits();
    let bumped = if x > 0.0 { bits - 1 } else { bits + 1 };
    f64::from_bits(bumped)
}


/// Helpers
/// - `eval_fx_checked`   : evaluates `f(x)` with finite-check
/// - `eval_dfx_analytic` : evaluates user-supplied derivative `df(x)`
/// - `eval_dfx_fd`       : central finite-difference with ULP rescue
#[inline]
fn eval_fx_checked<F>(
    f: &mut F,
    x: f64,
    evals: &mut usize
) -> Result<f64, NewtonError>  where F: FnMut(f64) -> f64 {
    let fx = { *evals += 1; f(x) };
    if !fx.is_finite() {
        return Err(RootFindingError::NonFiniteEvaluation { x, fx }.into());
    }

    Ok(fx)
}
#[inline]
fn eval_dfx_analytic<G>(
    df: &mut G,
    x: f64,
    evals: &mut usize
) -> Result<f64, NewtonError> where G: FnMut(f64) -> f64 {
    let dfx = { *evals += 1; df(x) };
    if !dfx.is_finite() {
        return Err(NewtonError::DerivativeNotFinite { x, dfx });
    }

    Ok(dfx)
}
#[inline]
fn eval_dfx_fd<F>(
    f: &mut F,
    x: f64,
    evals: &mut usize
) -> Result<f64, NewtonError>  where F: FnMut(f64) -> f64 {
    // central finite-difference
    let mut h  = f64::EPSILON.cbrt() * x.abs().max(1.0);
    let mut xp = x + h;
    let mut xm = x - h;

    // try rescue if representability collapses
    if !xp.is_finite() || !xm.is_finite() || xp == x || xm == x {
        xp = next_up(x);
        xm = next_down(x);
        h = 0.5 * (xp - xm);

        if !xp.is_finite() || !xm.is_finite() || xp == x || xm == x {
            return Err(NewtonError::FiniteDifferenceStepUnrepresentable { x, h });
        }
    }

    let fxp = eval_fx_checked(f, xp, evals)?;
    let fxm = eval_fx_checked(f, xm, evals)?;
    let dfx = (fxp - fxm) / (2.0 * h);
    if !dfx.is_finite() {
        return Err(NewtonError::DerivativeNotFinite { x, dfx });
    }

    Ok(dfx)
}


/// Newton iteration shared by [`newton`], [`safeguarded_newton`] and the
/// hybrid refiner. With `guard = None` this is plain open Newton.
pub(crate) fn newton_loop<F, G>(
    f: &mut F,
    mut df: Option<G>,
    x0: f64,
    mut guard: Option<Guard>,
    cfg: NewtonCfg,
    algorithm: Algorithm,
    mut evals: usize,
) -> Result<RootFindingReport, NewtonError>
where
    F: FnMut(f64) -> f64,
    G: FnMut(f64) -> f64
{
    let algo_name = algorithm.algorithm_name();

    let abs_fx    = cfg.abs_fx();
    let abs_x     = cfg.abs_x();
    let rel_x     = cfg.rel_x();
    let max_step  = cfg.max_step;
    let margin    = cfg.margin;

    let num_iter  = match cfg.max_iter() {
        Some(0) => {
            return Err(RootFindingError::InvalidMaxIter { got: 0 }.into());
        },

        Some(v) => v,
        None    => algorithm
            .default_max_iter()
            .unwrap_or(GLOBAL_MAX_ITER_FALLBACK)
    };

    // bracketed runs report the final sub-bracket, open runs the previous iterate
    let stencil = |guard: &Option<Guard>, prev: f64| match guard {
        Some(g) => Stencil::bracket(g.lo, g.hi),
        None    => Stencil::singleton(prev),
    };
    let report = |root: f64, f_root: f64, iterations: usize, evaluations: usize,
                  termination_reason: TerminationReason,
                  tolerance_satisfied: ToleranceSatisfied,
                  stencil: Stencil| RootFindingReport {
        root,
        f_root,
        iterations,
        evaluations,
        termination_reason,
        tolerance_satisfied,
        stencil,
        algorithm_name: algo_name,
    };

    // early exit: x0 is root
    let mut x  = x0;
    let mut fx = eval_fx_checked(f, x, &mut evals)?;
    if fx.abs() <= abs_fx {
        return Ok(report(x0, fx, 0, evals, TerminationReason::ToleranceReached,
                         ToleranceSatisfied::AbsFxReached, stencil(&guard, x0)));
    }
    if let Some(g) = guard.as_mut() {
        g.tighten(x, fx);
    }

    // main loop
    let mut prev_x = x;
    for iter in 1..=num_iter {
        // compute derivative
        let dfx = match df.as_mut() {
            Some(v) => eval_dfx_analytic(v, x, &mut evals)?,
            None    => eval_dfx_fd(f, x, &mut evals)?
        };

        // raw step, clipped to max_step
        let mut step = -fx / dfx;
        let step_ok  = step.is_finite();
        if step_ok && step.abs() > max_step {
            step = step.signum() * max_step;
        }
        let proposal = x + step;

        let mut bisected = false;
        let x_next = match guard.as_mut() {
            None => {
                if !step_ok {
                    return Err(NewtonError::DerivativeTooSmall { x, dfx });
                }
                if !proposal.is_finite() {
                    return Err(NewtonError::StepNotFinite { x, step });
                }
                proposal
            }
            Some(g) => {
                let rejected = if !step_ok {
                    Some(TerminationReason::DegenerateDerivative)
                } else if !proposal.is_finite() || !g.admits(proposal, margin) {
                    Some(TerminationReason::DivergedOutOfBracket)
                } else {
                    None
                };

                match (rejected, cfg.fallback) {
                    (None, _) => proposal,
                    (Some(reason), NewtonFallback::Reject) => {
                        log::debug!(
                            "{algo_name}: {reason:?} at x={x}, f'(x)={dfx}, bracket [{}, {}]",
                            g.lo, g.hi
                        );
                        return Ok(report(x, fx, iter, evals, reason,
                                         ToleranceSatisfied::ToleranceNotReached,
                                         Stencil::bracket(g.lo, g.hi)));
                    }
                    (Some(reason), NewtonFallback::Bisect) => {
                        log::trace!("{algo_name}: {reason:?} at x={x}, bisecting [{}, {}]", g.lo, g.hi);
                        bisected = true;
                        g.midpoint()
                    }
                }
            }
        };

        // machine stagnation
        if x_next == x {
            return Ok(report(x, fx, iter, evals, TerminationReason::MachinePrecisionReached,
                             ToleranceSatisfied::StepSizeReached, stencil(&guard, x)));
        }

        // check |f(x)| tolerance
        let fx_next = eval_fx_checked(f, x_next, &mut evals)?;
        log::trace!("{algo_name}: iter={iter} x={x_next} f(x)={fx_next}");
        if fx_next.abs() <= abs_fx {
            return Ok(report(x_next, fx_next, iter, evals, TerminationReason::ToleranceReached,
                             ToleranceSatisfied::AbsFxReached, stencil(&guard, x)));
        }
        if let Some(g) = guard.as_mut() {
            g.tighten(x_next, fx_next);
        }

        // a bisection step converges on bracket width, a newton step on step size
        match guard {
            Some(g) if bisected => {
                let width_tol = algorithm.calculate_tolerance(
                    &DynamicTolerance::width(g.lo, g.hi),
                    abs_x,
                    rel_x
                )?;
                if g.width() <= width_tol {
                    return Ok(report(x_next, fx_next, iter, evals,
                                     TerminationReason::ToleranceReached,
                                     ToleranceSatisfied::WidthTolReached,
                                     Stencil::bracket(g.lo, g.hi)));
                }
            }
            _ => {
                let step_tol = algorithm.calculate_tolerance(
                    &DynamicTolerance::step(x_next),
                    abs_x,
                    rel_x
                )?;
                if (x_next - x).abs() <= step_tol {
                    return Ok(report(x_next, fx_next, iter, evals,
                                     TerminationReason::ToleranceReached,
                                     ToleranceSatisfied::StepSizeReached,
                                     stencil(&guard, x)));
                }
            }
        }

        prev_x = x;
        x  = x_next;
        fx = fx_next;
    }

    Ok(report(x, fx, num_iter, evals, TerminationReason::IterationLimit,
              ToleranceSatisfied::ToleranceNotReached, stencil(&guard, prev_x)))
}


/// Finds a root of `func` using the
/// [Newton–Raphson method](https://en.wikipedia.org/wiki/Newton_method).
/// Supports analytic derivatives or a central finite-difference fallback.
///
/// # Arguments
/// - `func`  : function whose root is sought
/// - `dfunc` : optional analytic derivative; if `None`, use finite-difference
/// - `x0`    : finite initial guess
/// - `cfg`   : [`NewtonCfg`] (tolerances, optional `max_iter`, optional `max_step`)
///
/// # Returns
/// [`RootFindingReport`] with:
/// - `root`                : approximate root
/// - `f_root`              : function value at `root`
/// - `iterations`          : number of iterations performed
/// - `evaluations`         : total evaluations (f and f')
/// - `termination_reason`  : why it stopped
/// - `tolerance_satisfied` : which tolerance triggered
/// - `stencil`             : previous iterate used to form the step
/// - `algorithm_name`      : "newton"
///
/// # Errors
/// - [`NewtonError::InvalidGuess`]                 : `x0` non-finite
/// - [`NewtonError::StepNotFinite`]                : `x + step` not representable
/// - [`NewtonError::DerivativeTooSmall`]           : derivative too small for a finite step
/// - [`NewtonError::DerivativeNotFinite`]          : derivative non-finite
/// - [`NewtonError::FiniteDifferenceStepUnrepresentable`]  : FD step unrepresentable near `x`
///
/// * Propagated via [`NewtonError::RootFinding`]:
/// - [`RootFindingError::NonFiniteEvaluation`]     : `f(x)` produced NaN/inf
/// - [`RootFindingError::InvalidMaxIter`]          : `max_iter = 0`
///
/// # Behavior
/// - Step: raw step `-f/df`, clipped to `max_step`.
/// - Convergence: `|f(x)| <= abs_fx`, or
///   `|x_n - x_{n-1}| <= abs_x + rel_x * max(|x_n|, eps)`; with `abs_x = 0`
///   this is a pure relative-change test.
/// - Stagnation: if `x + step == x`, returns [`TerminationReason::MachinePrecisionReached`]
///
/// # Notes
/// - Convergence is *local only* and depends on a good initial guess `x0` and
///   smoothness of `f`. Poor guesses or ill-behaved functions can diverge or cycle.
///   For guaranteed convergence, use [`safeguarded_newton`] or a bracketed method.
pub fn newton<F, G>(
    mut func: F,
    dfunc: Option<G>,
    x0: f64,
    cfg: NewtonCfg,
) -> Result<RootFindingReport, NewtonError>
where
    F: FnMut(f64) -> f64,
    G: FnMut(f64) -> f64 {

    if !x0.is_finite() {
        return Err(NewtonError::InvalidGuess { x0 });
    }

    newton_loop(&mut func, dfunc, x0, None, cfg, Algorithm::Open(OpenFamily::Newton), 0)
}


/// Newton–Raphson confined to a sign-change bracket `[a, b]`.
///
/// Seeds at the midpoint of `[a, b]` and keeps a sub-bracket that every
/// evaluated iterate strictly inside it shrinks. A step is rejected when the
/// derivative yields a non-finite step or the iterate leaves
/// `[lo - margin, hi + margin]`; `cfg.fallback` then either bisects the
/// sub-bracket ([`NewtonFallback::Bisect`]) or ends the run
/// ([`NewtonFallback::Reject`]).
///
/// # Returns
/// [`RootFindingReport`] with `stencil` = final sub-bracket and
/// `algorithm_name` = `"safeguarded_newton"`. Rejected runs end with
/// [`TerminationReason::DivergedOutOfBracket`] or
/// [`TerminationReason::DegenerateDerivative`]; after a bisection step the
/// run may also converge on [`ToleranceSatisfied::WidthTolReached`].
///
/// # Errors
/// - [`NewtonError::InvalidBounds`] : `a`, `b` non-finite or `a >= b`
/// - [`NewtonError::NoSignChange`]  : `f(a)`, `f(b)` not strictly opposite
/// - evaluation errors as for [`newton`]
pub fn safeguarded_newton<F, G>(
    mut func: F,
    dfunc: Option<G>,
    a: f64,
    b: f64,
    cfg: NewtonCfg,
) -> Result<RootFindingReport, NewtonError>
where
    F: FnMut(f64) -> f64,
    G: FnMut(f64) -> f64 {

    if !(a.is_finite() && b.is_finite()) || a >= b {
        return Err(NewtonError::InvalidBounds { a, b });
    }

    let algorithm = Algorithm::Hybrid(HybridFamily::SafeguardedNewton);
    let mut evals = 0;
    let fa = eval_fx_checked(&mut func, a, &mut evals)?;
    let fb = eval_fx_checked(&mut func, b, &mut evals)?;

    // endpoint roots
    for (x, fx) in [(a, fa), (b, fb)] {
        if fx.abs() <= cfg.abs_fx() {
            return Ok(RootFindingReport {
                root                : x,
                f_root              : fx,
                iterations          : 0,
                evaluations         : evals,
                termination_reason  : TerminationReason::ToleranceReached,
                tolerance_satisfied : ToleranceSatisfied::AbsFxReached,
                stencil             : Stencil::bracket(a, b),
                algorithm_name      : algorithm.algorithm_name(),
            });
        }
    }

    if !strictly_opposite(fa, fb) {
        return Err(NewtonError::NoSignChange { a, b });
    }

    let guard = Guard::new(a, b, fa);
    newton_loop(&mut func, dfunc, midpoint(a, b), Some(guard), cfg, algorithm, evals)
}
