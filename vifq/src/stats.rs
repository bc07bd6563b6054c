//! Scale aggregator: turns the five statistic planes into one (num, den)
//! pair.
//!
//! Every pixel contributes to exactly one of two accumulator families. Below
//! the variance floor the contribution is the closed form 1 − σ₂²·k
//! (accumulated as raw σ₂² counts against a pixel count); above it the
//! contribution is a log₂ ratio assembled from table lookups on top-16
//! normalized magnitudes, with the binary exponents carried in separate
//! accumulators and folded in once at the end. All per-pixel work is integer
//! and commutative, so traversal order is unobservable.

use crate::consts::SIGMA_NSQ;
use crate::fixed::{top16_u32, top16_u64, LogTable};

/// Walks the five planes of one scale and produces its (num, den) pair.
///
/// The pair is narrowed to `f32`, which is the precision the reference
/// carries per-scale scores at; the final ratio is formed in `f64` by the
/// caller.
#[allow(clippy::too_many_arguments)]
pub(crate) fn scale_statistics(
    mu1: &[u32],
    mu2: &[u32],
    ref_sq: &[u32],
    dis_sq: &[u32],
    ref_dis: &[u32],
    stride: usize,
    w: usize,
    h: usize,
    log_table: &LogTable,
) -> (f32, f32) {
    let mut accum_num_log: i64 = 0;
    let mut accum_den_log: i64 = 0;
    let mut accum_num_non_log: i64 = 0;
    let mut accum_den_non_log: i64 = 0;
    let mut accum_x: i64 = 0;
    let mut accum_x2: i64 = 0;
    let mut num_accum_x: i64 = 0;

    for i in 0..h {
        for j in 0..w {
            let idx = i * stride + j;
            let mu1_val = u64::from(mu1[idx]);
            let mu2_val = u64::from(mu2[idx]);

            // Squared/product means drop from Q64 back to Q32 with rounding.
            let mu1_sq = ((mu1_val * mu1_val + (1 << 31)) >> 32) as u32;
            let mu2_sq = ((mu2_val * mu2_val + (1 << 31)) >> 32) as u32;
            let mu1_mu2 = ((mu1_val * mu2_val + (1 << 31)) >> 32) as u32;

            // Two's-complement reinterpretation: small negative variances
            // from rounding are legitimate and expected.
            let sigma1_sq = ref_sq[idx].wrapping_sub(mu1_sq) as i32;
            let sigma2_sq = dis_sq[idx].wrapping_sub(mu2_sq) as i32;

            if sigma1_sq >= SIGMA_NSQ {
                let sigma12 = ref_dis[idx].wrapping_sub(mu1_mu2) as i32;

                // den contribution is log2(sigma_nsq + sigma1_sq) − 17,
                // with the −17 and the exponent offset applied once at the
                // end. Every high-variance pixel lands here, even those that
                // fall back to the non-log numerator below.
                let stage1 = (SIGMA_NSQ as u32) + sigma1_sq as u32;
                let (m_den, x) = top16_u32(stage1);
                num_accum_x += 1;
                accum_x += i64::from(x);
                let den_val = i64::from(log_table.get(m_den));

                if sigma12 >= 0 {
                    let numer1 = sigma2_sq.wrapping_add(SIGMA_NSQ);
                    let prod = i64::from(numer1) * i64::from(sigma1_sq);
                    let sigma12_sq = i64::from(sigma12) * i64::from(sigma12);
                    let denom = prod - sigma12_sq;

                    if denom > 0 {
                        let (m_num, x1) = top16_u64(prod as u64);
                        let (m_denom, x2) = top16_u64(denom as u64);
                        accum_x2 += i64::from(x2 - x1);
                        accum_num_log +=
                            i64::from(log_table.get(m_num)) - i64::from(log_table.get(m_denom));
                        accum_den_log += den_val;
                    } else {
                        // denom ≤ 0 would take log of a non-positive value;
                        // route the pixel through the closed form instead.
                        accum_num_non_log += i64::from(sigma2_sq);
                        accum_den_non_log += 1;
                    }
                } else {
                    // Negative covariance: zero numerator, full denominator.
                    accum_den_log += den_val;
                }
            } else {
                accum_num_non_log += i64::from(sigma2_sq);
                accum_den_non_log += 1;
            }
        }
    }

    // The non-log numerator is 1 − sigma2_sq·k per pixel with
    // k = 4/255² · 2⁻¹⁶: the pixel count lives in accum_den_non_log and the
    // σ₂² sum is rescaled here. The log accumulators are Q11 and the carried
    // exponents are integer scale-wide sums.
    let num = accum_num_log as f64 / 2048.0
        + accum_x2 as f64
        + (accum_den_non_log as f64 - (accum_num_non_log as f64 / 16_384.0) / 65_025.0);
    let den = accum_den_log as f64 / 2048.0 - (accum_x + num_accum_x * 17) as f64
        + accum_den_non_log as f64;

    (num as f32, den as f32)
}
