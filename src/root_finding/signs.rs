//! Sign utilities for root-finding algorithms.
//! - `opposite_sign`      : `true` if values have opposite sign bits
//! - `same_sign`          : `true` if values share the same sign bit
//! - `strictly_opposite`  : `true` if one value is `< 0` and the other `> 0`

/// Returns `true` if `x` and `y` have opposite signs.
#[inline]
pub(crate) fn opposite_sign(x: f64, y: f64) -> bool {
    x.is_sign_positive() != y.is_sign_positive()
}


/// Returns `true` if `x` and `y` have the same sign.
#[inline]
pub(crate) fn same_sign(x: f64, y: f64) -> bool {
    x.is_sign_positive() == y.is_sign_positive()
}


/// Equivalent to `x * y < 0.0` without the product.
///
/// Exact zeros (either sign) never count, and the test cannot be fooled by
/// `x * y` underflowing to `-0.0`.
#[inline]
pub(crate) fn strictly_opposite(x: f64, y: f64) -> bool {
    (x < 0.0 && y > 0.0) || (x > 0.0 && y < 0.0)
}
