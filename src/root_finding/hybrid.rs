//! Hybrid bisection / Newton search for every root on an interval.
//!
//! ```text
//! f, f', [xmin, xmax], n ──▶ scan ──▶ brackets ──▶ bisection (tol1, max_iter1)
//!                             │                       │
//!                             │                       ▼
//!                             │            safeguarded newton (tol2, max_iter2)
//!                             ▼                       │
//!                        exact zeros ────────▶ merge + order ◀┘
//! ```

use super::algorithms::{Algorithm, HybridFamily, GLOBAL_MAX_ITER_FALLBACK};
use super::bisection::{bisection_loop, midpoint, BisectionCfg, BisectionError};
use super::errors::{RootFindingError, ToleranceError};
use super::newton::{newton_loop, Guard, NewtonCfg, NewtonError, NewtonFallback};
use super::report::{RefineState, RootFindingReport, TerminationReason, ToleranceSatisfied};
use super::scan::{
    scan, validate_interval, validate_subdivisions, Bracket, EvaluationPolicy, ScanCfg, ScanError, ScanReport
};
use thiserror::Error;

const ALGORITHM: Algorithm = Algorithm::Hybrid(HybridFamily::BisectionNewton);


/// Errors surfaced to the caller. All of them are raised before or during
/// the scan; failures while refining a single bracket never escape
/// (see [`CandidateError`]).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HybridError {
    #[error(transparent)]
    RootFinding(#[from] RootFindingError),

    #[error(transparent)]
    Tolerance(#[from] ToleranceError),

    #[error("invalid interval: xmin and xmax must be finite with xmin < xmax. got [{xmin}, {xmax}]")]
    InvalidInterval { xmin: f64, xmax: f64 },

    #[error("invalid subdivision count: must be >= 1. got n={got}")]
    InvalidSubdivisions { got: usize },
}
impl From<ScanError> for HybridError {
    fn from(e: ScanError) -> Self {
        match e {
            ScanError::RootFinding(e)                 => HybridError::RootFinding(e),
            ScanError::InvalidBounds { xmin, xmax }   => HybridError::InvalidInterval { xmin, xmax },
            ScanError::InvalidSubdivisions { got }    => HybridError::InvalidSubdivisions { got },
        }
    }
}


/// Why a single candidate bracket could not be refined.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CandidateError {
    #[error("bisection stage: {0}")]
    Bisection(#[from] BisectionError),

    #[error("newton stage: {0}")]
    Newton(#[from] NewtonError),
}


/// What happens to candidates that end in
/// [`RefineState::MaxIterExceeded`] or [`RefineState::DivergedOutOfBracket`].
///
/// - [`NonConvergedPolicy::Drop`] : excluded from the roots, kept in diagnostics
/// - [`NonConvergedPolicy::Flag`] : last estimate kept with `converged = false`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NonConvergedPolicy {
    #[default]
    Drop,
    Flag,
}


/// Where a root came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootOrigin {
    /// `f` was exactly zero at a scan boundary; no refinement ran.
    ExactBoundary,
    /// Converged (or flagged) estimate from a refined bracket.
    Refined,
}


#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Root {
    pub value     : f64,
    pub f_value   : f64,
    pub converged : bool,
    pub origin    : RootOrigin,
}


/// Stage a candidate finished in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefineStage {
    Bisection,
    Newton,
}


/// Diagnostics for one scanned bracket.
///
/// - `bracket` : the scanned sign-change subinterval
/// - `state`   : terminal [`RefineState`]
/// - `stage`   : [`RefineStage`] that produced `outcome`
/// - `outcome` : final report of that stage, or the error that ended it
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateReport {
    pub bracket : Bracket,
    pub state   : RefineState,
    pub stage   : RefineStage,
    pub outcome : Result<RootFindingReport, CandidateError>,
}
impl CandidateReport {
    /// Root estimate, if the final stage produced one.
    pub fn estimate(&self) -> Option<f64> {
        self.outcome.as_ref().ok().map(|r| r.root)
    }
    /// Evaluations spent on this candidate (0 if it errored).
    pub fn evaluations(&self) -> usize {
        self.outcome.as_ref().map_or(0, |r| r.evaluations)
    }
}


/// Full result of [`hybrid`].
///
/// - `roots`              : ascending, merged roots (see [`HybridCfg`])
/// - `candidates`         : one [`CandidateReport`] per scanned bracket, left to right
/// - `exact_zeros`        : scan boundaries with `f(x) == 0`
/// - `skipped_boundaries` : interior scan boundaries where `f` was non-finite
/// - `evaluations`        : total `f` and `f'` evaluations
#[derive(Debug, Clone, PartialEq)]
pub struct HybridReport {
    pub roots              : Vec<Root>,
    pub candidates         : Vec<CandidateReport>,
    pub exact_zeros        : Vec<f64>,
    pub skipped_boundaries : Vec<f64>,
    pub evaluations        : usize,
}
impl HybridReport {
    /// Root values in ascending order.
    pub fn values(&self) -> Vec<f64> {
        self.roots.iter().map(|r| r.value).collect()
    }
    /// Candidates that did not converge.
    pub fn failures(&self) -> impl Iterator<Item = &CandidateReport> {
        self.candidates.iter().filter(|c| c.state != RefineState::Converged)
    }
}


/// Hybrid search configuration.
///
/// # Fields
/// ┌ `tol1`            : bisection width tolerance, also Newton's bracket margin (required)
/// ├ `tol2`            : Newton relative step tolerance (required)
/// ├ `max_iter1`       : bisection cap per candidate           (default 500)
/// ├ `max_iter2`       : Newton cap per candidate              (default 500)
/// ├ `subdivisions`    : scan subintervals `n`                 (default 50)
/// ├ `merge_threshold` : roots closer than this are merged     (default `max(tol1, tol2) * 10`)
/// ├ `abs_fx`          : `|f(x)|` treated as an exact hit      (default `f64::MIN_POSITIVE`)
/// ├ `fallback`        : [`NewtonFallback`]                    (default bisect)
/// ├ `non_converged`   : [`NonConvergedPolicy`]                (default drop)
/// └ `evaluation`      : [`EvaluationPolicy`] for the scan     (default lenient)
///
/// # Construction
/// - [`HybridCfg::new`] validates the two tolerances; every setter validates its value.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct HybridCfg {
    tol1:            f64,
    tol2:            f64,
    max_iter1:       usize,
    max_iter2:       usize,
    subdivisions:    usize,
    merge_threshold: Option<f64>,
    abs_fx:          f64,
    fallback:        NewtonFallback,
    non_converged:   NonConvergedPolicy,
    evaluation:      EvaluationPolicy,
}
impl HybridCfg {
    pub const DEFAULT_MAX_ITER:     usize = GLOBAL_MAX_ITER_FALLBACK;
    pub const DEFAULT_SUBDIVISIONS: usize = ScanCfg::DEFAULT_SUBDIVISIONS;
    pub const DEFAULT_ABS_FX:       f64   = f64::MIN_POSITIVE;
    pub const MERGE_FACTOR:         f64   = 10.0;

    pub fn new(tol1: f64, tol2: f64) -> Result<Self, ToleranceError> {
        if !tol1.is_finite() || tol1 <= 0.0 {
            return Err(ToleranceError::InvalidTol1 { got: tol1 });
        }
        if !tol2.is_finite() || tol2 <= 0.0 {
            return Err(ToleranceError::InvalidTol2 { got: tol2 });
        }
        Ok(Self {
            tol1,
            tol2,
            max_iter1:       Self::DEFAULT_MAX_ITER,
            max_iter2:       Self::DEFAULT_MAX_ITER,
            subdivisions:    Self::DEFAULT_SUBDIVISIONS,
            merge_threshold: None,
            abs_fx:          Self::DEFAULT_ABS_FX,
            fallback:        NewtonFallback::default(),
            non_converged:   NonConvergedPolicy::default(),
            evaluation:      EvaluationPolicy::default(),
        })
    }

    pub fn set_max_iter1(mut self, v: usize) -> Result<Self, RootFindingError> {
        if v == 0 {
            return Err(RootFindingError::InvalidMaxIter { got: v });
        }
        self.max_iter1 = v;
        Ok(self)
    }
    pub fn set_max_iter2(mut self, v: usize) -> Result<Self, RootFindingError> {
        if v == 0 {
            return Err(RootFindingError::InvalidMaxIter { got: v });
        }
        self.max_iter2 = v;
        Ok(self)
    }
    pub fn set_subdivisions(mut self, n: usize) -> Result<Self, HybridError> {
        validate_subdivisions(n)?;
        self.subdivisions = n;
        Ok(self)
    }
    pub fn set_merge_threshold(mut self, v: f64) -> Result<Self, ToleranceError> {
        if !v.is_finite() || v <= 0.0 {
            return Err(ToleranceError::InvalidMergeThreshold { got: v });
        }
        self.merge_threshold = Some(v);
        Ok(self)
    }
    pub fn set_abs_fx(mut self, v: f64) -> Result<Self, ToleranceError> {
        if !v.is_finite() || v <= 0.0 {
            return Err(ToleranceError::InvalidAbsFx { got: v });
        }
        self.abs_fx = v;
        Ok(self)
    }
    #[must_use]
    pub fn with_fallback(mut self, v: NewtonFallback) -> Self { self.fallback = v; self }
    #[must_use]
    pub fn with_non_converged(mut self, v: NonConvergedPolicy) -> Self { self.non_converged = v; self }
    #[must_use]
    pub fn with_evaluation(mut self, v: EvaluationPolicy) -> Self { self.evaluation = v; self }

    #[inline] #[must_use] pub fn tol1(&self)          -> f64 { self.tol1 }
    #[inline] #[must_use] pub fn tol2(&self)          -> f64 { self.tol2 }
    #[inline] #[must_use] pub fn max_iter1(&self)     -> usize { self.max_iter1 }
    #[inline] #[must_use] pub fn max_iter2(&self)     -> usize { self.max_iter2 }
    #[inline] #[must_use] pub fn subdivisions(&self)  -> usize { self.subdivisions }
    #[inline] #[must_use] pub fn abs_fx(&self)        -> f64 { self.abs_fx }
    #[inline] #[must_use] pub fn fallback(&self)      -> NewtonFallback { self.fallback }
    #[inline] #[must_use] pub fn non_converged(&self) -> NonConvergedPolicy { self.non_converged }
    #[inline] #[must_use] pub fn evaluation(&self)    -> EvaluationPolicy { self.evaluation }

    /// Explicit threshold, or `max(tol1, tol2) * MERGE_FACTOR`.
    #[must_use]
    pub fn merge_threshold(&self) -> f64 {
        self.merge_threshold
            .unwrap_or(self.tol1.max(self.tol2) * Self::MERGE_FACTOR)
    }

    fn scan_cfg(&self) -> Result<ScanCfg, HybridError> {
        Ok(ScanCfg::new()
            .set_subdivisions(self.subdivisions)?
            .with_evaluation(self.evaluation))
    }

    fn stages(&self) -> Result<Stages, HybridError> {
        let bisection = BisectionCfg::new()
            .set_abs_fx(self.abs_fx)?
            .set_abs_x(self.tol1)?
            .set_rel_x(0.0)?
            .set_max_iter(self.max_iter1)?;

        let newton = NewtonCfg::new()
            .set_abs_fx(self.abs_fx)?
            .set_rel_x(self.tol2)?
            .set_abs_x(0.0)?
            .set_max_iter(self.max_iter2)?
            .set_margin(self.tol1)
            .map_err(|_| ToleranceError::InvalidTol1 { got: self.tol1 })?
            .with_fallback(self.fallback);

        Ok(Stages { bisection, newton })
    }
}


/// Per-candidate stage configurations derived from [`HybridCfg`].
#[derive(Debug, Copy, Clone)]
struct Stages {
    bisection: BisectionCfg,
    newton:    NewtonCfg,
}


/// Refines one bracket: bisection to `tol1`, then safeguarded Newton from the
/// midpoint of the narrowed bracket.
fn refine_candidate<F, G>(
    f: &mut F,
    df: Option<G>,
    bracket: &Bracket,
    stages: &Stages,
) -> CandidateReport
where
    F: FnMut(f64) -> f64,
    G: FnMut(f64) -> f64
{
    log::trace!("candidate [{}, {}]: {:?}", bracket.a, bracket.b, RefineState::Seeded);

    let finish = |state: RefineState, stage: RefineStage,
                  outcome: Result<RootFindingReport, CandidateError>| {
        debug_assert!(state.is_terminal());
        log::debug!(
            "candidate [{}, {}]: {state:?} after {stage:?} stage, estimate {:?}",
            bracket.a, bracket.b, outcome.as_ref().map(|r| r.root)
        );
        CandidateReport { bracket: *bracket, state, stage, outcome }
    };

    let narrowed = match bisection_loop(
        f,
        (bracket.a, bracket.fa),
        (bracket.b, bracket.fb),
        stages.bisection,
        0,
    ) {
        Ok(r)  => r,
        Err(e) => return finish(RefineState::DivergedOutOfBracket, RefineStage::Bisection, Err(e.into())),
    };

    if narrowed.termination_reason == TerminationReason::IterationLimit {
        return finish(RefineState::MaxIterExceeded, RefineStage::Bisection, Ok(narrowed));
    }
    if narrowed.tolerance_satisfied == ToleranceSatisfied::AbsFxReached {
        return finish(RefineState::Converged, RefineStage::Bisection, Ok(narrowed));
    }

    // bisection only moves `a` onto points sharing the sign of f(a)
    let (lo, hi) = narrowed.stencil.bounds().unwrap_or((bracket.a, bracket.b));
    log::trace!(
        "candidate [{}, {}]: {:?}, newton on [{lo}, {hi}]",
        bracket.a, bracket.b, RefineState::Iterating
    );
    let guard = Guard::new(lo, hi, bracket.fa);

    match newton_loop(
        f,
        df,
        midpoint(lo, hi),
        Some(guard),
        stages.newton,
        ALGORITHM,
        narrowed.evaluations,
    ) {
        Ok(r) => finish(RefineState::from_termination(r.termination_reason), RefineStage::Newton, Ok(r)),
        Err(e) => finish(RefineState::DivergedOutOfBracket, RefineStage::Newton, Err(e.into())),
    }
}


/// Sorts `roots` ascending and merges neighbours closer than `threshold`.
///
/// The leftmost member of a cluster is kept, unless it is unconverged and a
/// later member converged.
fn merge_roots(mut roots: Vec<Root>, threshold: f64) -> Vec<Root> {
    roots.sort_by(|a, b| a.value.total_cmp(&b.value));

    let mut merged: Vec<Root> = Vec::with_capacity(roots.len());
    for root in roots {
        match merged.last_mut() {
            Some(last) if root.value - last.value < threshold => {
                if !last.converged && root.converged {
                    *last = root;
                }
            }
            _ => merged.push(root),
        }
    }
    merged
}


/// Collects exact zeros and candidate estimates into the final report.
fn assemble(
    scanned: ScanReport,
    candidates: Vec<CandidateReport>,
    cfg: &HybridCfg,
    (xmin, xmax): (f64, f64),
) -> HybridReport {
    if scanned.is_empty() {
        log::debug!("no sign change or exact zero on [{xmin}, {xmax}]");
    }

    let mut roots: Vec<Root> = scanned.exact_zeros
        .iter()
        .map(|&x| Root { value: x, f_value: 0.0, converged: true, origin: RootOrigin::ExactBoundary })
        .collect();

    for c in &candidates {
        let converged = c.state == RefineState::Converged;
        match (&c.outcome, converged, cfg.non_converged) {
            (Ok(r), true, _) | (Ok(r), false, NonConvergedPolicy::Flag) => {
                if !converged {
                    log::warn!(
                        "flagging non-converged root {} from [{}, {}]: {:?}",
                        r.root, c.bracket.a, c.bracket.b, c.state
                    );
                }
                roots.push(Root {
                    // newton may stop up to one margin outside the interval
                    value:     r.root.clamp(xmin, xmax),
                    f_value:   r.f_root,
                    converged,
                    origin:    RootOrigin::Refined,
                });
            }
            (Ok(r), false, NonConvergedPolicy::Drop) => {
                log::warn!(
                    "dropping candidate [{}, {}]: {:?}, last estimate {}",
                    c.bracket.a, c.bracket.b, c.state, r.root
                );
            }
            (Err(e), ..) => {
                log::warn!("dropping candidate [{}, {}]: {e}", c.bracket.a, c.bracket.b);
            }
        }
    }

    let evaluations = scanned.evaluations
        + candidates.iter().map(CandidateReport::evaluations).sum::<usize>();
    let roots = merge_roots(roots, cfg.merge_threshold());

    log::debug!(
        "{}: {} root(s) from {} candidate(s) and {} exact zero(s), {} evaluations",
        ALGORITHM.algorithm_name(), roots.len(), candidates.len(),
        scanned.exact_zeros.len(), evaluations
    );

    HybridReport {
        roots,
        candidates,
        exact_zeros: scanned.exact_zeros,
        skipped_boundaries: scanned.skipped_boundaries,
        evaluations,
    }
}


/// Finds every root of `func` on `[xmin, xmax]` that shows up as a sign
/// change or an exact zero on the scan grid.
///
/// # Arguments
/// ┌ `func`  - scalar function, finite on `[xmin, xmax]`
/// ├ `dfunc` - derivative of `func`; `None` uses a central finite difference
/// ├ `xmin`  - left end of the interval
/// ├ `xmax`  - right end, `> xmin`
/// └ `cfg`   - [`HybridCfg`]
///
/// # Returns
/// [`HybridReport`] with ascending, merged roots and per-bracket diagnostics.
/// No sign change anywhere is a valid, empty result.
///
/// # Errors
/// Only input problems and scan failures reach the caller, never partial results:
/// ┌ [`HybridError::InvalidInterval`]     - bounds non-finite or `xmin >= xmax`, before any evaluation
/// ├ [`HybridError::InvalidSubdivisions`] - `n == 0`
/// ├ [`HybridError::Tolerance`]           - inconsistent tolerances
/// └ [`HybridError::RootFinding`]         - non-finite `f` at `xmin`/`xmax`, or at any
///                                          boundary under [`EvaluationPolicy::Strict`]
///
/// Failures inside a bracket (non-finite values, iteration caps, divergence)
/// only remove that bracket's root; see [`HybridReport::candidates`].
pub fn hybrid<F, G>(
    mut func: F,
    mut dfunc: Option<G>,
    xmin: f64,
    xmax: f64,
    cfg: HybridCfg,
) -> Result<HybridReport, HybridError>
where
    F: FnMut(f64) -> f64,
    G: FnMut(f64) -> f64
{
    validate_interval(xmin, xmax)?;
    let stages  = cfg.stages()?;
    let scanned = scan(&mut func, xmin, xmax, cfg.scan_cfg()?)?;

    let candidates: Vec<CandidateReport> = scanned.brackets
        .iter()
        .map(|bracket| refine_candidate(&mut func, dfunc.as_mut(), bracket, &stages))
        .collect();

    Ok(assemble(scanned, candidates, &cfg, (xmin, xmax)))
}


/// Ascending, distinct roots of `f` on `[xmin, xmax]`.
///
/// Thin wrapper over [`hybrid`] with an analytic derivative; see there for
/// the algorithm and errors.
///
/// ```
/// use rootsweep::{find_roots, HybridCfg};
///
/// let cfg   = HybridCfg::new(1e-6, 1e-12).unwrap();
/// let roots = find_roots(|x: f64| x * x - 4.0, |x: f64| 2.0 * x, -3.0, 3.0, cfg).unwrap();
/// assert_eq!(roots.len(), 2);
/// assert!((roots[0] + 2.0).abs() < 1e-9 && (roots[1] - 2.0).abs() < 1e-9);
/// ```
pub fn find_roots<F, G>(
    f: F,
    dfdx: G,
    xmin: f64,
    xmax: f64,
    cfg: HybridCfg,
) -> Result<Vec<f64>, HybridError>
where
    F: FnMut(f64) -> f64,
    G: FnMut(f64) -> f64
{
    Ok(hybrid(f, Some(dfdx), xmin, xmax, cfg)?.values())
}


/// Parallel [`hybrid`]: the scan runs sequentially, brackets are refined on
/// the rayon pool and reassembled in scan order, so the result equals the
/// sequential one.
#[cfg(feature = "parallel")]
pub fn hybrid_par<F, G>(
    func: F,
    dfunc: Option<G>,
    xmin: f64,
    xmax: f64,
    cfg: HybridCfg,
) -> Result<HybridReport, HybridError>
where
    F: Fn(f64) -> f64 + Sync,
    G: Fn(f64) -> f64 + Sync
{
    use rayon::prelude::*;

    validate_interval(xmin, xmax)?;
    let stages  = cfg.stages()?;
    let scanned = scan(&func, xmin, xmax, cfg.scan_cfg()?)?;

    let candidates: Vec<CandidateReport> = scanned.brackets
        .par_iter()
        .map(|bracket| {
            let mut f = &func;
            refine_candidate(&mut f, dfunc.as_ref(), bracket, &stages)
        })
        .collect();

    Ok(assemble(scanned, candidates, &cfg, (xmin, xmax)))
}


/// Parallel [`find_roots`].
#[cfg(feature = "parallel")]
pub fn find_roots_par<F, G>(
    f: F,
    dfdx: G,
    xmin: f64,
    xmax: f64,
    cfg: HybridCfg,
) -> Result<Vec<f64>, HybridError>
where
    F: Fn(f64) -> f64 + Sync,
    G: Fn(f64) -> f64 + Sync
{
    Ok(hybrid_par(f, Some(dfdx), xmin, xmax, cfg)?.values())
}
