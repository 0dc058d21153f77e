//! Plot data for a function and its roots.
//!
//! Prepares everything a 2D plot of `f` on `[xmin, xmax]` needs: an evenly
//! sampled curve, one marker per root found by [`find_roots`], and fixed
//! y-limits. Nothing is drawn here; a renderer consumes [`RootPlot`].

use crate::root_finding::hybrid::{find_roots, HybridCfg, HybridError};
use thiserror::Error;


#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlotError {
    #[error(transparent)]
    Hybrid(#[from] HybridError),

    #[error("invalid sample count: must be >= 2. got npts={got}")]
    InvalidPoints { got: usize },

    #[error("invalid y-limits: must be finite with y_min < y_max. got ({y_min}, {y_max})")]
    InvalidYLimits { y_min: f64, y_max: f64 },
}


/// Plot configuration.
///
/// - `npts`     : curve samples including both ends (default 1000, must be >= 2)
/// - `y_limits` : fixed vertical range (default `(-1.0, 1.0)`)
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PlotCfg {
    npts:     usize,
    y_limits: (f64, f64),
}
impl PlotCfg {
    pub const DEFAULT_NPTS:     usize      = 1000;
    pub const DEFAULT_Y_LIMITS: (f64, f64) = (-1.0, 1.0);

    #[must_use]
    pub fn new() -> Self { Self::default() }

    pub fn set_npts(mut self, v: usize) -> Result<Self, PlotError> {
        if v < 2 {
            return Err(PlotError::InvalidPoints { got: v });
        }
        self.npts = v;
        Ok(self)
    }
    pub fn set_y_limits(mut self, y_min: f64, y_max: f64) -> Result<Self, PlotError> {
        if !(y_min.is_finite() && y_max.is_finite()) || y_min >= y_max {
            return Err(PlotError::InvalidYLimits { y_min, y_max });
        }
        self.y_limits = (y_min, y_max);
        Ok(self)
    }

    #[inline] #[must_use] pub fn npts(&self) -> usize { self.npts }
    #[inline] #[must_use] pub fn y_limits(&self) -> (f64, f64) { self.y_limits }
}
impl Default for PlotCfg {
    fn default() -> Self {
        Self { npts: Self::DEFAULT_NPTS, y_limits: Self::DEFAULT_Y_LIMITS }
    }
}


/// A root to mark on the plot, labelled `"x = {x}"`.
#[derive(Debug, Clone, PartialEq)]
pub struct RootMarker {
    pub x:     f64,
    pub y:     f64,
    pub label: String,
}


#[derive(Debug, Clone, PartialEq)]
pub struct RootPlot {
    pub curve:    Vec<(f64, f64)>,
    pub markers:  Vec<RootMarker>,
    pub y_limits: (f64, f64),
}


/// `npts` evenly spaced points from `xmin` to `xmax`, both included.
fn linspace(xmin: f64, xmax: f64, npts: usize) -> impl Iterator<Item = f64> {
    let last = npts - 1;
    (0..npts).map(move |i| {
        if i == last { xmax } else { xmin + i as f64 * ((xmax - xmin) / last as f64) }
    })
}


/// Finds the roots of `f` with [`find_roots`] and samples `f` for display.
///
/// Roots come only from the public search; `f` is then re-evaluated at each
/// root for the marker height and at `npts` grid points for the curve.
/// Non-finite samples are kept as-is for the renderer to skip.
///
/// # Errors
/// - [`PlotError::Hybrid`] : anything [`find_roots`] rejects
pub fn plot_root<F, G>(
    mut f: F,
    dfdx: G,
    xmin: f64,
    xmax: f64,
    cfg: HybridCfg,
    plot: PlotCfg,
) -> Result<RootPlot, PlotError>
where
    F: FnMut(f64) -> f64,
    G: FnMut(f64) -> f64
{
    let roots = find_roots(&mut f, dfdx, xmin, xmax, cfg)?;

    let curve = linspace(xmin, xmax, plot.npts())
        .map(|x| (x, f(x)))
        .collect();

    let markers = roots
        .into_iter()
        .map(|x| RootMarker { x, y: f(x), label: format!("x = {x}") })
        .collect();

    Ok(RootPlot { curve, markers, y_limits: plot.y_limits() })
}
