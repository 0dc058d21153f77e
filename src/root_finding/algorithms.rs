//! Root-finding algorithm definitions.
//!
//! Provides the [`Algorithm`] enum, which enumerates all supported methods,
//! along with shared [`GLOBAL_MAX_ITER_FALLBACK`] hard cap.


/// Most methods use heuristic defaults from [`Algorithm::default_max_iter`].
/// This cap is only applied when a bracket algorithm’s theoretical iteration bound
/// would otherwise exceed it (e.g. [`BracketFamily::Bisection`]).
///
/// It is also the default per-candidate cap for both stages of
/// [`HybridFamily::BisectionNewton`].
pub const GLOBAL_MAX_ITER_FALLBACK: usize = 500;


/// Root-finding algorithm variants.
/// - [`Algorithm::Bracket`] contains bracket methods for root-finding
/// - [`Algorithm::Open`]    contains open methods for root-finding
/// - [`Algorithm::Hybrid`]  contains methods mixing bracketing with open steps
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Algorithm {
    Bracket(BracketFamily),
    Open(OpenFamily),
    Hybrid(HybridFamily)
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BracketFamily {
    Bisection,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum OpenFamily {
    Newton
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum HybridFamily {
    /// Newton confined to a shrinking sign-change bracket.
    SafeguardedNewton,
    /// Interval scan, bisection narrowing, then safeguarded Newton.
    BisectionNewton,
}

impl Algorithm {
    /// Default iteration count if `max_iter` is unset in config.
    ///
    /// # Notes
    /// - Applied only when `max_iter` is unset.
    /// - Values are heuristic and method-specific.
    /// - Methods with theoretical bounds (e.g. [`BracketFamily::Bisection`])
    ///   return `None`, meaning “compute theoretical bound instead”.
    ///   - If that bound exceeds practical limits,
    ///     [`GLOBAL_MAX_ITER_FALLBACK`] is used.
    pub const fn default_max_iter(self) -> Option<usize> {
        match self {
            Algorithm::Bracket(BracketFamily::Bisection)      => None,
            Algorithm::Open(OpenFamily::Newton)               => Some(50),
            Algorithm::Hybrid(HybridFamily::SafeguardedNewton) => Some(100),
            Algorithm::Hybrid(HybridFamily::BisectionNewton)   => Some(GLOBAL_MAX_ITER_FALLBACK),
        }
    }

    pub const fn algorithm_name(self) -> &'static str {
        match self {
            Algorithm::Bracket(BracketFamily::Bisection)      => "bisection",
            Algorithm::Open(OpenFamily::Newton)               => "newton",
            Algorithm::Hybrid(HybridFamily::SafeguardedNewton) => "safeguarded_newton",
            Algorithm::Hybrid(HybridFamily::BisectionNewton)   => "bisection_newton",
        }
    }
}
