//! Bracket scan.
//!
//! Splits `[xmin, xmax]` into `n` equal subintervals, evaluates `f` once at
//! every boundary, and reports the subintervals across which `f` changes
//! sign. Boundaries where `f` is exactly zero are reported separately.

use super::errors::RootFindingError;
use super::signs::strictly_opposite;
use thiserror::Error;


#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScanError {
    #[error(transparent)]
    RootFinding(#[from] RootFindingError),

    #[error("invalid interval: xmin and xmax must be finite with xmin < xmax. got [{xmin}, {xmax}]")]
    InvalidBounds { xmin: f64, xmax: f64 },

    #[error("invalid subdivision count: must be in 1..=2^24. got n={got}")]
    InvalidSubdivisions { got: usize },
}


/// What to do when `f` is non-finite at an interior scan boundary.
///
/// - [`EvaluationPolicy::Lenient`] : skip the boundary; neither neighbouring
///   subinterval can become a bracket
/// - [`EvaluationPolicy::Strict`]  : abort the scan
///
/// The two outer endpoints are always strict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EvaluationPolicy {
    #[default]
    Lenient,
    Strict,
}


/// Subinterval `[a, b]` with `f(a)`, `f(b)` finite and of strictly opposite sign.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bracket {
    pub a  : f64,
    pub b  : f64,
    pub fa : f64,
    pub fb : f64,
}
impl Bracket {
    #[inline] pub fn width(&self) -> f64 { self.b - self.a }
    #[inline] pub fn midpoint(&self) -> f64 { self.a + (self.b - self.a) * 0.5 }
    #[inline] pub fn contains(&self, x: f64) -> bool { self.a <= x && x <= self.b }
}


/// Scan configuration.
///
/// # Fields
/// - `subdivisions` : number of equal subintervals `n` (default 50, `1..=MAX_SUBDIVISIONS`)
/// - `evaluation`   : [`EvaluationPolicy`] for interior boundaries (default lenient)
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ScanCfg {
    subdivisions: usize,
    evaluation:   EvaluationPolicy,
}
impl ScanCfg {
    pub const DEFAULT_SUBDIVISIONS: usize = 50;
    /// Upper bound on `n`; the scan caches all `n + 1` boundary values.
    pub const MAX_SUBDIVISIONS:     usize = 1 << 24;

    #[must_use]
    pub fn new() -> Self { Self::default() }

    pub fn set_subdivisions(mut self, n: usize) -> Result<Self, ScanError> {
        validate_subdivisions(n)?;
        self.subdivisions = n;
        Ok(self)
    }
    #[must_use]
    pub fn with_evaluation(mut self, policy: EvaluationPolicy) -> Self {
        self.evaluation = policy;
        self
    }

    #[inline] #[must_use] pub fn subdivisions(&self) -> usize { self.subdivisions }
    #[inline] #[must_use] pub fn evaluation(&self) -> EvaluationPolicy { self.evaluation }
}
impl Default for ScanCfg {
    fn default() -> Self {
        Self {
            subdivisions: Self::DEFAULT_SUBDIVISIONS,
            evaluation:   EvaluationPolicy::Lenient,
        }
    }
}


/// Result of [`scan`]. Every list is ordered left to right.
///
/// - `brackets`           : sign-change subintervals
/// - `exact_zeros`        : boundaries with `f(x) == 0.0`
/// - `skipped_boundaries` : interior boundaries where `f` was non-finite
/// - `evaluations`        : number of `f` evaluations (always `n + 1` on success)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScanReport {
    pub brackets           : Vec<Bracket>,
    pub exact_zeros        : Vec<f64>,
    pub skipped_boundaries : Vec<f64>,
    pub evaluations        : usize,
}
impl ScanReport {
    /// `true` if neither brackets nor exact zeros were found.
    pub fn is_empty(&self) -> bool {
        self.brackets.is_empty() && self.exact_zeros.is_empty()
    }
}


/// Checks `xmin < xmax`, both finite, and a representable width.
pub(crate) fn validate_interval(xmin: f64, xmax: f64) -> Result<(), ScanError> {
    if !(xmin.is_finite() && xmax.is_finite()) || xmin >= xmax || !(xmax - xmin).is_finite() {
        return Err(ScanError::InvalidBounds { xmin, xmax });
    }
    Ok(())
}


pub(crate) fn validate_subdivisions(n: usize) -> Result<(), ScanError> {
    if n == 0 || n > ScanCfg::MAX_SUBDIVISIONS {
        return Err(ScanError::InvalidSubdivisions { got: n });
    }
    Ok(())
}


/// `i`-th of the `n + 1` boundary points; the last one is `xmax` exactly.
///
/// The step `(xmax - xmin) / n` is taken first so that `i * step` never
/// exceeds the (finite) width.
#[inline]
pub(crate) fn boundary(xmin: f64, xmax: f64, n: usize, i: usize) -> f64 {
    if i >= n {
        return xmax;
    }
    xmin + i as f64 * ((xmax - xmin) / n as f64)
}


/// Scans `[xmin, xmax]` for sign changes of `func`.
///
/// # Arguments
/// ┌ `func` - function to scan; evaluated exactly `n + 1` times
/// ├ `xmin` - left end of the interval, finite
/// ├ `xmax` - right end of the interval, finite and `> xmin`
/// └ `cfg`  - [`ScanCfg`] (subdivision count, evaluation policy)
///
/// # Returns
/// A [`ScanReport`]. A pair `(x_i, x_{i+1})` is a bracket iff
/// `f(x_i) * f(x_{i+1}) < 0`. A boundary with `f(x_i) == 0` goes to
/// `exact_zeros` and, having no strict sign change on either side, is
/// never part of a bracket. No sign change at all is a valid, empty result.
///
/// # Errors
/// ┌ [`ScanError::InvalidBounds`]       - bounds non-finite or `xmin >= xmax`; nothing evaluated
/// ├ [`ScanError::InvalidSubdivisions`] - `n` outside `1..=MAX_SUBDIVISIONS`
/// └ [`RootFindingError::NonFiniteEvaluation`] via [`ScanError::RootFinding`]
///     ├ at `xmin` or `xmax`, always
///     └ at an interior boundary under [`EvaluationPolicy::Strict`]
pub fn scan<F>(
    mut func: F,
    xmin: f64,
    xmax: f64,
    cfg: ScanCfg,
) -> Result<ScanReport, ScanError>
where F: FnMut(f64) -> f64 {

    validate_interval(xmin, xmax)?;
    let n = cfg.subdivisions();
    validate_subdivisions(n)?;

    let mut report = ScanReport::default();

    // cached boundary values; `None` marks a skipped boundary
    let mut samples: Vec<(f64, Option<f64>)> = Vec::with_capacity(n + 1);
    for i in 0..=n {
        let x  = boundary(xmin, xmax, n, i);
        let fx = { report.evaluations += 1; func(x) };

        if !fx.is_finite() {
            let endpoint = i == 0 || i == n;
            if endpoint || cfg.evaluation() == EvaluationPolicy::Strict {
                return Err(RootFindingError::NonFiniteEvaluation { x, fx }.into());
            }
            log::warn!("scan: skipping boundary x={x}, f(x)={fx} is non-finite");
            report.skipped_boundaries.push(x);
            samples.push((x, None));
            continue;
        }

        if fx == 0.0 {
            report.exact_zeros.push(x);
        }
        samples.push((x, Some(fx)));
    }

    report.brackets = samples
        .windows(2)
        .filter_map(|pair| match (pair[0], pair[1]) {
            ((a, Some(fa)), (b, Some(fb))) if strictly_opposite(fa, fb) => {
                Some(Bracket { a, b, fa, fb })
            }
            _ => None,
        })
        .collect();

    log::debug!(
        "scan: [{xmin}, {xmax}] n={n}: {} bracket(s), {} exact zero(s), {} skipped",
        report.brackets.len(),
        report.exact_zeros.len(),
        report.skipped_boundaries.len(),
    );

    Ok(report)
}
