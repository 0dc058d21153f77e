//! Per-stage tolerances shared by bisection and Newton.
//!
//! [`CommonCfg`] is embedded by [`BisectionCfg`] and [`NewtonCfg`]:
//! ┌ `abs_fx`   : `|f(x)|` accepted as a root
//! ├ `abs_x`    : absolute part of the width/step test
//! ├ `rel_x`    : relative part of the width/step test
//! └ `max_iter` : iteration cap; `None` lets the algorithm pick
//!
//! At least one of `abs_x`, `rel_x` must stay positive, so every stopping
//! test has a non-zero tolerance.
//!
//! The hybrid search fills both stages from its two tolerances:
//! ```text
//! tol1 ──▶ bisection abs_x   (rel_x = 0)   and   newton margin
//! tol2 ──▶ newton    rel_x   (abs_x = 0)
//! ```
//! `impl_common_cfg!` adds the validated `set_*` setters and getters to any
//! config holding a `common: CommonCfg` field.
//!
//! [`BisectionCfg`]: super::bisection::BisectionCfg
//! [`NewtonCfg`]: super::newton::NewtonCfg


use super::errors::ToleranceError;


pub const DEFAULT_ABS_FX : f64 = 1e-12;
pub const DEFAULT_ABS_X  : f64 = 0.0;
pub const DEFAULT_REL_X  : f64 = 4.0 * f64::EPSILON;


#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CommonCfg {
    abs_fx: f64,
    abs_x:  f64,
    rel_x:  f64,
    max_iter: Option<usize>,
}

impl CommonCfg {
    pub fn new() -> Self {
        Self {
            abs_fx   : DEFAULT_ABS_FX,
            abs_x    : DEFAULT_ABS_X,
            rel_x    : DEFAULT_REL_X,
            max_iter : None
        }
    }

    pub fn abs_fx(&self)   -> f64 { self.abs_fx }
    pub fn abs_x(&self)    -> f64 { self.abs_x }
    pub fn rel_x(&self)    -> f64 { self.rel_x }
    pub fn max_iter(&self) -> Option<usize> { self.max_iter }

    /// Rejects `abs_x == 0` together with `rel_x <= 0`.
    pub(crate) fn check_abs_rel(abs_x: f64, rel_x: f64) -> Result<(), ToleranceError> {
        if abs_x == 0.0 && rel_x <= 0.0 {
            return Err(ToleranceError::InvalidAbsRelX { abs_x, rel_x });
        }
        Ok(())
    }

    pub(crate) fn with_abs_fx   (&mut self, v: f64)   { self.abs_fx   = v; }
    pub(crate) fn with_abs_x    (&mut self, v: f64)   { self.abs_x    = v; }
    pub(crate) fn with_rel_x    (&mut self, v: f64)   { self.rel_x    = v; }
    pub(crate) fn with_max_iter (&mut self, v: usize) { self.max_iter = Some(v); }
}

impl Default for CommonCfg {
    fn default() -> Self { Self::new() }
}

macro_rules! impl_common_cfg {
    ($cfg:ty) => {
        impl $cfg {
            pub fn set_abs_fx(
                mut self, v: f64
            ) -> Result<Self, $crate::root_finding::errors::ToleranceError> {
                if !v.is_finite() || v <= 0.0 {
                    return Err(
                        $crate::root_finding::errors::ToleranceError::InvalidAbsFx { got: v }
                    );
                }
                self.common.with_abs_fx(v);
                Ok(self)
            }
            pub fn set_abs_x(
                mut self, v: f64
            ) -> Result<Self, $crate::root_finding::errors::ToleranceError> {
                if !v.is_finite() || v < 0.0 {
                    return Err(
                        $crate::root_finding::errors::ToleranceError::InvalidAbsX { got: v }
                    );
                }
                $crate::root_finding::config::CommonCfg::check_abs_rel(v, self.common.rel_x())?;
                self.common.with_abs_x(v);
                Ok(self)
            }
            pub fn set_rel_x(
                mut self, v: f64
            ) -> Result<Self, $crate::root_finding::errors::ToleranceError> {
                if !v.is_finite() || v < 0.0 {
                    return Err(
                        $crate::root_finding::errors::ToleranceError::InvalidRelX { got: v }
                    );
                }
                $crate::root_finding::config::CommonCfg::check_abs_rel(self.common.abs_x(), v)?;
                self.common.with_rel_x(v);
                Ok(self)
            }
            pub fn set_max_iter(
                mut self, v: usize
            ) -> Result<Self, $crate::root_finding::errors::RootFindingError> {
                if v == 0 {
                    return Err(
                        $crate::root_finding::errors::RootFindingError::InvalidMaxIter { got: v }
                    );
                }
                self.common.with_max_iter(v);
                Ok(self)
            }

            #[inline] #[must_use] pub fn abs_fx(&self) -> f64 { self.common.abs_fx() }
            #[inline] #[must_use] pub fn abs_x (&self) -> f64 { self.common.abs_x()  }
            #[inline] #[must_use] pub fn rel_x (&self) -> f64 { self.common.rel_x()  }
            #[inline] #[must_use] pub fn max_iter(&self) -> Option<usize> { self.common.max_iter() }
        }
    };
}
pub(crate) use impl_common_cfg;
