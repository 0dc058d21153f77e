//! Defines the [`RootFindingReport`] struct returned by all
//! single-root algorithms, and the [`RefineState`] a candidate
//! bracket ends in.

/// Reasons a root-finding algorithm may terminate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    ToleranceReached,
    IterationLimit,
    MachinePrecisionReached,
    /// Safeguarded Newton produced an iterate outside its bracket
    /// and was configured not to fall back.
    DivergedOutOfBracket,
    /// Safeguarded Newton met a zero (or vanishing) derivative
    /// and was configured not to fall back.
    DegenerateDerivative,
}
impl TerminationReason {
    /// `true` for outcomes whose root estimate may be trusted.
    pub const fn is_converged(self) -> bool {
        matches!(
            self,
            TerminationReason::ToleranceReached | TerminationReason::MachinePrecisionReached
        )
    }
}


/// Which tolerance condition was satisfied (or not).
/// - [`ToleranceSatisfied::AbsFxReached`]
///     - All methods
///     - |f(x)| <= tol
/// - [`ToleranceSatisfied::WidthTolReached`]
///     - bracketing methods, and safeguarded Newton after a bisection step
///     - [a, b] -> (b - a).abs() <= tol
/// - [`ToleranceSatisfied::StepSizeReached`]
///     - Newton steps
///     - |x_n - x_{n - 1}| <= abs_x + rel_x * max(|x_n|, eps)
/// - [`ToleranceSatisfied::ToleranceNotReached`]
///     - All methods
///     - Tolerance not reached, usually with [`TerminationReason::IterationLimit`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToleranceSatisfied {
    AbsFxReached,
    WidthTolReached,
    StepSizeReached,
    ToleranceNotReached
}


/// Method-specific data returned by a solver.
/// Contains the last set of points used in the update formula.
/// - [`Stencil::Bracket`] : bracketing methods
///     - `left`, `right` bounds of the final interval
/// - [`Stencil::Open`]    : open methods
///     - `x` = last iterate used to compute the root
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Stencil {
    Bracket { bounds: [f64; 2] },
    Open    { x: [f64; 3], len: usize },
}
impl Stencil {
    pub fn singleton(x: f64) -> Self {
        Stencil::Open { x: [x, 0.0, 0.0], len: 1 }
    }
    pub fn bracket(a: f64, b: f64) -> Self {
        Stencil::Bracket { bounds: [a, b] }
    }
    /// Final bounds for [`Stencil::Bracket`], `None` otherwise.
    pub fn bounds(&self) -> Option<(f64, f64)> {
        match self {
            Stencil::Bracket { bounds } => Some((bounds[0], bounds[1])),
            Stencil::Open { .. }        => None,
        }
    }
}


/// Final report returned by all single-root algorithms.
///
/// [`RootFindingReport`]
/// - `root`                : best root estimate
/// - `f_root`              : function value at `root`
/// - `iterations`          : total iterations
/// - `evaluations`         : total function evaluations (f and f')
/// - `termination_reason`  : why the solver stopped  ([`TerminationReason`])
/// - `tolerance_satisfied` : which tolerance was met ([`ToleranceSatisfied`])
/// - `stencil`             : last set of points used in update formula
/// - `algorithm_name`      : algorithm name (e.g. `"bisection"`)
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RootFindingReport {
    pub root                : f64,
    pub f_root              : f64,
    pub iterations          : usize,
    pub evaluations         : usize,
    pub termination_reason  : TerminationReason,
    pub tolerance_satisfied : ToleranceSatisfied,
    pub stencil             : Stencil,
    pub algorithm_name      : &'static str,
}


/// Lifecycle of a single candidate bracket.
///
/// ```text
/// Seeded ─▶ Iterating ─┬▶ Converged
///              ▲   │   ├▶ MaxIterExceeded
///              └───┘   └▶ DivergedOutOfBracket
/// ```
///
/// Only [`RefineState::Converged`] contributes to the default root output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefineState {
    Seeded,
    Iterating,
    Converged,
    MaxIterExceeded,
    DivergedOutOfBracket,
}
impl RefineState {
    pub const fn is_terminal(self) -> bool {
        !matches!(self, RefineState::Seeded | RefineState::Iterating)
    }

    /// Terminal state reached by a run that stopped for `reason`.
    pub const fn from_termination(reason: TerminationReason) -> Self {
        match reason {
            TerminationReason::ToleranceReached
            | TerminationReason::MachinePrecisionReached => RefineState::Converged,
            TerminationReason::IterationLimit           => RefineState::MaxIterExceeded,
            TerminationReason::DivergedOutOfBracket
            | TerminationReason::DegenerateDerivative   => RefineState::DivergedOutOfBracket,
        }
    }
}
