//! Separable five-moment filter.
//!
//! One vertical + one horizontal pass of the scale's Gaussian kernel, jointly
//! accumulating five weighted sums per pixel: the two means μ₁/μ₂ and the
//! three second moments Σref², Σdis², Σref·dis. The per-scale Q-format shifts
//! are data ([`QShift`]), not control flow, so a single generic body covers
//! the 8-bit scale-0 input and every 16-bit case.
//!
//! Accumulator widths are load-bearing:
//! - mean accumulators are `u32` (Q16 taps summing to 2¹⁶ × 16-bit samples
//!   peaks just below 2³²),
//! - second-moment accumulators are `u64` (taps × squared samples peaks near
//!   2⁴⁸),
//! and the vertical mean line buffers are truncated to 16 bits before the
//! horizontal pass reads them, matching the reference bit-for-bit.

/// Per-scale vertical-pass shift constants (§Q-format table).
#[derive(Debug, Clone, Copy)]
pub(crate) struct QShift {
    pub shift_vp: u32,
    pub round_vp: u32,
    pub shift_vp_sq: u32,
    pub round_vp_sq: u64,
}

/// Horizontal-pass rescale is the same at every scale: Q48 → Q32.
const SHIFT_HP: u32 = 16;
const ROUND_HP: u64 = 32_768;

impl QShift {
    /// Constants for the five-moment filter at `scale` with `bit_depth`-bit
    /// scale-0 input. Scales ≥ 1 always see 16-bit downsampled input.
    pub fn moment(scale: usize, bit_depth: u32) -> Self {
        if scale == 0 {
            let shift_vp_sq = 2 * (bit_depth - 8);
            Self {
                shift_vp: bit_depth,
                round_vp: 1 << (bit_depth - 1),
                shift_vp_sq,
                round_vp_sq: if bit_depth == 8 {
                    0
                } else {
                    1 << (shift_vp_sq - 1)
                },
            }
        } else {
            Self {
                shift_vp: 16,
                round_vp: 32_768,
                shift_vp_sq: 16,
                round_vp_sq: 32_768,
            }
        }
    }
}

/// Output planes of the five-moment filter, all sharing one element stride.
pub(crate) struct MomentPlanes<'a> {
    pub mu1: &'a mut [u32],
    pub mu2: &'a mut [u32],
    pub ref_sq: &'a mut [u32],
    pub dis_sq: &'a mut [u32],
    pub ref_dis: &'a mut [u32],
    pub stride: usize,
}

/// Vertical-pass line buffers, one row each.
pub(crate) struct MomentLines<'a> {
    pub mu1: &'a mut [u32],
    pub mu2: &'a mut [u32],
    pub ref_sq: &'a mut [u32],
    pub dis_sq: &'a mut [u32],
    pub ref_dis: &'a mut [u32],
}

/// Reflects an out-of-range index back into `[0, len)` without repeating the
/// left edge sample: −k maps to k, len maps to len−1.
#[inline]
pub(crate) fn mirror(idx: isize, len: usize) -> usize {
    if idx < 0 {
        (-idx) as usize
    } else if (idx as usize) >= len {
        2 * len - idx as usize - 1
    } else {
        idx as usize
    }
}

/// Runs both passes over a `w`×`h` grid, writing the five statistic planes.
///
/// `ref_src`/`dis_src` are row-major with their own element strides; the
/// sample type is `u8` only for 8-bit scale-0 input.
#[allow(clippy::too_many_arguments)]
pub(crate) fn moment_filter<T: Copy + Into<u32>>(
    kernel: &[u16],
    ref_src: &[T],
    ref_stride: usize,
    dis_src: &[T],
    dis_stride: usize,
    w: usize,
    h: usize,
    q: QShift,
    out: MomentPlanes<'_>,
    line: MomentLines<'_>,
) {
    let fwidth = kernel.len();
    let half = (fwidth / 2) as isize;

    for i in 0..h {
        // Vertical pass into the line buffers.
        for j in 0..w {
            let mut acc_mu1: u32 = 0;
            let mut acc_mu2: u32 = 0;
            let mut acc_ref: u64 = 0;
            let mut acc_dis: u64 = 0;
            let mut acc_ref_dis: u64 = 0;

            for (fi, &fc) in kernel.iter().enumerate() {
                let ii = mirror(i as isize - half + fi as isize, h);
                let r: u32 = ref_src[ii * ref_stride + j].into();
                let d: u32 = dis_src[ii * dis_stride + j].into();
                let fc = u32::from(fc);

                acc_mu1 += fc * r;
                acc_mu2 += fc * d;
                acc_ref += u64::from(fc) * u64::from(r * r);
                acc_dis += u64::from(fc) * u64::from(d * d);
                acc_ref_dis += u64::from(fc) * u64::from(r * d);
            }

            // Scale 0: accum is Q32 (Q8 sample × Q16 tap); scales ≥ 1: Q48.
            // Means drop to 16 bits, second moments to 32.
            line.mu1[j] = u32::from(((acc_mu1 + q.round_vp) >> q.shift_vp) as u16);
            line.mu2[j] = u32::from(((acc_mu2 + q.round_vp) >> q.shift_vp) as u16);
            line.ref_sq[j] = ((acc_ref + q.round_vp_sq) >> q.shift_vp_sq) as u32;
            line.dis_sq[j] = ((acc_dis + q.round_vp_sq) >> q.shift_vp_sq) as u32;
            line.ref_dis[j] = ((acc_ref_dis + q.round_vp_sq) >> q.shift_vp_sq) as u32;
        }

        // Horizontal pass from the line buffers into the planes.
        for j in 0..w {
            let mut acc_mu1: u32 = 0;
            let mut acc_mu2: u32 = 0;
            let mut acc_ref: u64 = 0;
            let mut acc_dis: u64 = 0;
            let mut acc_ref_dis: u64 = 0;

            for (fj, &fc) in kernel.iter().enumerate() {
                let jj = mirror(j as isize - half + fj as isize, w);
                let fc = u32::from(fc);

                acc_mu1 += fc * line.mu1[jj];
                acc_mu2 += fc * line.mu2[jj];
                acc_ref += u64::from(fc) * u64::from(line.ref_sq[jj]);
                acc_dis += u64::from(fc) * u64::from(line.dis_sq[jj]);
                acc_ref_dis += u64::from(fc) * u64::from(line.ref_dis[jj]);
            }

            // Means stay raw Q32 accumulators; the second moments shift back
            // from Q48 to Q32 with rounding.
            let o = i * out.stride + j;
            out.mu1[o] = acc_mu1;
            out.mu2[o] = acc_mu2;
            out.ref_sq[o] = ((acc_ref + ROUND_HP) >> SHIFT_HP) as u32;
            out.dis_sq[o] = ((acc_dis + ROUND_HP) >> SHIFT_HP) as u32;
            out.ref_dis[o] = ((acc_ref_dis + ROUND_HP) >> SHIFT_HP) as u32;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{FILTER_SCALE0, FILTER_SCALE3};

    #[test]
    fn mirror_reflects_without_edge_repeat() {
        assert_eq!(mirror(-1, 8), 1);
        assert_eq!(mirror(-3, 8), 3);
        assert_eq!(mirror(0, 8), 0);
        assert_eq!(mirror(7, 8), 7);
        assert_eq!(mirror(8, 8), 7);
        assert_eq!(mirror(10, 8), 5);
    }

    fn run_filter<T: Copy + Into<u32>>(
        kernel: &[u16],
        r: &[T],
        d: &[T],
        w: usize,
        h: usize,
        q: QShift,
    ) -> (Vec<u32>, Vec<u32>, Vec<u32>, Vec<u32>, Vec<u32>) {
        let mut mu1 = vec![0u32; w * h];
        let mut mu2 = vec![0u32; w * h];
        let mut ref_sq = vec![0u32; w * h];
        let mut dis_sq = vec![0u32; w * h];
        let mut ref_dis = vec![0u32; w * h];
        let mut l = vec![0u32; 5 * w];
        let (l1, rest) = l.split_at_mut(w);
        let (l2, rest) = rest.split_at_mut(w);
        let (l3, rest) = rest.split_at_mut(w);
        let (l4, l5) = rest.split_at_mut(w);
        moment_filter(
            kernel,
            r,
            w,
            d,
            w,
            w,
            h,
            q,
            MomentPlanes {
                mu1: &mut mu1,
                mu2: &mut mu2,
                ref_sq: &mut ref_sq,
                dis_sq: &mut dis_sq,
                ref_dis: &mut ref_dis,
                stride: w,
            },
            MomentLines {
                mu1: l1,
                mu2: l2,
                ref_sq: l3,
                dis_sq: l4,
                ref_dis: l5,
            },
        );
        (mu1, mu2, ref_sq, dis_sq, ref_dis)
    }

    #[test]
    fn constant_image_yields_exact_moments() {
        // A constant 8-bit frame passes through every shift without rounding
        // residue: μ = v·2²⁴ in Q32 and Σv² stays v²·2¹⁶ after both passes.
        let (w, h) = (24, 16);
        let v = 100u8;
        let img = vec![v; w * h];
        let (mu1, mu2, ref_sq, ..) = run_filter(
            &FILTER_SCALE0,
            &img,
            &img,
            w,
            h,
            QShift::moment(0, 8),
        );
        let expect_mu = u32::from(v) * 256 * 65_536;
        let expect_sq = u32::from(v) * u32::from(v) * 65_536;
        assert!(mu1.iter().all(|&m| m == expect_mu));
        assert_eq!(mu1, mu2);
        assert!(ref_sq.iter().all(|&s| s == expect_sq));
    }

    #[test]
    fn u8_and_u16_paths_agree_at_bit_depth_8() {
        // The generic body must make the 8-bit fast path indistinguishable
        // from feeding the same samples through the 16-bit instantiation.
        let (w, h) = (20, 12);
        let img8: Vec<u8> = (0..w * h).map(|i| (i * 7 % 251) as u8).collect();
        let img16: Vec<u16> = img8.iter().map(|&v| u16::from(v)).collect();
        let q = QShift::moment(0, 8);
        let a = run_filter(&FILTER_SCALE0, &img8, &img8, w, h, q);
        let b = run_filter(&FILTER_SCALE0, &img16, &img16, w, h, q);
        assert_eq!(a, b);
    }

    #[test]
    fn cross_term_matches_squares_for_identical_inputs() {
        let (w, h) = (16, 16);
        let img: Vec<u16> = (0..w * h).map(|i| (i * 131 % 60_000) as u16).collect();
        let (_, _, ref_sq, dis_sq, ref_dis) =
            run_filter(&FILTER_SCALE3, &img, &img, w, h, QShift::moment(1, 8));
        assert_eq!(ref_sq, dis_sq);
        assert_eq!(ref_sq, ref_dis);
    }
}
