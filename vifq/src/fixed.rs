//! Fixed-point primitives: top-16-bit normalization and the base-2 log table.
//!
//! The scale aggregator works on 32- and 64-bit magnitudes but looks
//! logarithms up in a 16-bit-indexed table. `top16_u32` / `top16_u64` reduce
//! a magnitude to its top 16 significant bits plus a binary exponent offset;
//! the offset is carried algebraically through the accumulators instead of
//! being folded into every lookup.

use crate::consts::LOG2_POLY;

/// Normalizes `v` to its top 16 significant bits.
///
/// Returns `(m, x)` with `m` in `[2¹⁵, 2¹⁶)` and `v ≈ m · 2⁻ˣ`. Only the
/// shift-down case is implemented: callers guarantee `v ≥ 2¹⁶` (the
/// aggregator only applies this to `2·σ_nsq + sigma1_sq`, which is at least
/// 2¹⁸).
#[inline]
pub fn top16_u32(v: u32) -> (u16, i32) {
    debug_assert!(v > u32::from(u16::MAX));
    let j = 16 - v.leading_zeros() as i32;
    ((v >> j) as u16, -j)
}

/// Normalizes a 64-bit magnitude to its top 16 significant bits.
///
/// Returns `(m, x)` with `m` in `[2¹⁵, 2¹⁶)` and `v ≈ m · 2⁻ˣ`. Unlike
/// [`top16_u32`] this handles magnitudes below 2¹⁵ by shifting up (`x`
/// positive). Undefined for `v == 0`; callers guarantee `v > 0`.
#[inline]
pub fn top16_u64(v: u64) -> (u16, i32) {
    debug_assert!(v > 0);
    let k = v.leading_zeros() as i32;
    if k > 48 {
        let j = k - 48;
        ((v << j) as u16, j)
    } else if k < 47 {
        let j = 48 - k;
        ((v >> j) as u16, -j)
    } else if v >> 16 != 0 {
        ((v >> 1) as u16, -1)
    } else {
        (v as u16, 0)
    }
}

/// Horner evaluation of a polynomial, leading coefficient first.
///
/// Kept in `f32` throughout: the table contents depend on single-precision
/// rounding at every step.
#[inline]
fn horner(poly: &[f32], x: f32) -> f32 {
    poly.iter().fold(0.0f32, |acc, &c| acc * x + c)
}

/// Bit-level log₂ approximation of an IEEE-754 single.
///
/// Splits the value into exponent and mantissa and evaluates the minimax
/// polynomial on (mantissa − 1.0). This is the exact argument reduction the
/// reference uses; a library `log2` would produce a different table.
#[must_use]
pub fn log2_approx(x: f32) -> f32 {
    if x == 0.0 {
        return f32::NEG_INFINITY;
    }
    if x < 0.0 {
        return f32::NAN;
    }

    let bits = x.to_bits();
    let exponent = ((bits >> 23) & 0xFF) as i32;
    let remain = f32::from_bits((bits & 0x007F_FFFF) | 0x3F80_0000);

    (exponent - 127) as f32 + horner(&LOG2_POLY, remain - 1.0)
}

/// Base-2 logarithm lookup table, Q11.
///
/// `get(i)` for i in `[2¹⁵, 2¹⁶)` is `round(log₂(i) · 2048)`. Entries below
/// 2¹⁵ are never produced by the normalizers and stay zero. Built once at
/// extractor construction, read-only afterwards.
#[derive(Debug, Clone)]
pub struct LogTable {
    values: Box<[u16]>,
}

impl LogTable {
    /// Builds the table. 128 KiB, filled for indices 32 768..=65 535.
    #[must_use]
    pub fn new() -> Self {
        let mut values = vec![0u16; 1 << 16].into_boxed_slice();
        for i in 32_768..=65_535u32 {
            values[i as usize] = (log2_approx(i as f32) * 2048.0).round() as u16;
        }
        Self { values }
    }

    /// Looks up `log₂(m) · 2048` for a normalized magnitude.
    #[inline]
    #[must_use]
    pub fn get(&self, m: u16) -> u16 {
        self.values[usize::from(m)]
    }
}

impl Default for LogTable {
    fn default() -> Self {
        Self::new()
    }
}
