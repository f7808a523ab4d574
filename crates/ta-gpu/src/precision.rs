//! Precision tiers for device (f32) vs reference (f32) validation.
//!
//! The kernels and the sequential reference run the same f32 operations in
//! the same order, so the contract is bitwise equality. Looser tiers exist for
//! runtimes that may fuse or reorder arithmetic.
//!
//! # Tiers
//!
//! | Tier | Tolerance   | Use Case                                          |
//! |------|-------------|---------------------------------------------------|
//! | T0   | bitwise     | Same op order on both sides (the default)          |
//! | T1   | ≈1.19e-7    | One rounding step apart (fused multiply-add)       |
//! | T2   | ≤1e-6       | A few reassociated operations                      |
//! | T3   | ≤1e-5       | Recurrences with reordered accumulation            |
//! | T4   | ≤1e-3       | Long running sums, differences of close values     |

/// T0: exact bit pattern. NaN matches NaN.
pub const TIER_T0_TOLERANCE: f64 = 0.0;

/// T1: one f32 ULP of relative error, `2^{-23} ≈ 1.19e-7`.
pub const TIER_T1_TOLERANCE: f64 = 1.2e-7;

pub const TIER_T2_TOLERANCE: f64 = 1.0e-6;

pub const TIER_T3_TOLERANCE: f64 = 1.0e-5;

pub const TIER_T4_TOLERANCE: f64 = 1.0e-3;

/// Named tier, for reports and CLI flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum Tier {
    T0,
    T1,
    T2,
    T3,
    T4,
}

impl Tier {
    pub fn tolerance(self) -> f64 {
        match self {
            Self::T0 => TIER_T0_TOLERANCE,
            Self::T1 => TIER_T1_TOLERANCE,
            Self::T2 => TIER_T2_TOLERANCE,
            Self::T3 => TIER_T3_TOLERANCE,
            Self::T4 => TIER_T4_TOLERANCE,
        }
    }

    pub fn from_index(idx: u8) -> Option<Self> {
        match idx {
            0 => Some(Self::T0),
            1 => Some(Self::T1),
            2 => Some(Self::T2),
            3 => Some(Self::T3),
            4 => Some(Self::T4),
            _ => None,
        }
    }
}

/// Bitwise equality, treating any two NaNs as equal.
pub fn bitwise_eq(expected: f32, actual: f32) -> bool {
    expected.to_bits() == actual.to_bits() || (expected.is_nan() && actual.is_nan())
}

/// Check whether `actual` is within `tier_tol` relative error of `expected`.
///
/// A zero tolerance means bitwise equality. Otherwise NaN only matches NaN;
/// with `expected == 0` the absolute value of `actual` is compared instead.
pub fn within_tolerance(expected: f32, actual: f32, tier_tol: f64) -> bool {
    if tier_tol == TIER_T0_TOLERANCE {
        return bitwise_eq(expected, actual);
    }
    if expected.is_nan() || actual.is_nan() {
        return expected.is_nan() && actual.is_nan();
    }
    let (e, a) = (expected as f64, actual as f64);
    if e == 0.0 {
        return a.abs() < tier_tol;
    }
    ((a - e) / e).abs() <= tier_tol
}

/// Relative error `|actual − expected| / |expected|`.
///
/// Returns `0.0` when both values are zero or both NaN, and `f64::INFINITY`
/// when only one side is NaN or `expected` is zero and `actual` is not.
pub fn relative_error(expected: f32, actual: f32) -> f64 {
    if expected.is_nan() || actual.is_nan() {
        return if expected.is_nan() && actual.is_nan() {
            0.0
        } else {
            f64::INFINITY
        };
    }
    let (e, a) = (expected as f64, actual as f64);
    if e == 0.0 && a == 0.0 {
        return 0.0;
    }
    if e == 0.0 {
        return f64::INFINITY;
    }
    ((a - e) / e).abs()
}

/// Distance in units of least precision. NaN vs NaN is 0, NaN vs a number is
/// `u32::MAX`; `+0.0` and `-0.0` are 0 apart.
pub fn ulp_distance(a: f32, b: f32) -> u32 {
    if a.is_nan() || b.is_nan() {
        return if a.is_nan() && b.is_nan() { 0 } else { u32::MAX };
    }
    fn ordered(x: f32) -> i64 {
        let bits = x.to_bits() as i32;
        if bits < 0 {
            i32::MIN as i64 - bits as i64
        } else {
            bits as i64
        }
    }
    let d = (ordered(a) - ordered(b)).unsigned_abs();
    u32::try_from(d).unwrap_or(u32::MAX)
}
