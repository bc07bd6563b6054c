//! Four-scale orchestration.
//!
//! The scale loop is strictly sequential: scale s+1 reads the decimated blur
//! planes scale s wrote, so nothing here can be reordered. Scale 0 filters
//! the caller's pictures directly (8- or 16-bit); every later scale filters
//! the 16-bit planes the reducer produced.

use crate::buffer::VifBuffers;
use crate::consts::{NUM_SCALES, VIF_FILTER_1D};
use crate::filter::{moment_filter, MomentLines, MomentPlanes, QShift};
use crate::fixed::LogTable;
use crate::reduce::{decimate, reduce_blur, ReduceShift};
use crate::stats::scale_statistics;
use crate::{PictureRef, VifScores};

/// Runs the full pipeline for one frame pair, assuming the caller has
/// already validated dimensions and sample format.
pub(crate) fn extract_frame(
    buffers: &mut VifBuffers,
    log_table: &LogTable,
    bit_depth: u32,
    ref_pic: PictureRef<'_>,
    dis_pic: PictureRef<'_>,
) -> VifScores {
    let stride = buffers.stride();
    let v = &mut buffers.views_mut();

    let mut w = ref_pic.width();
    let mut h = ref_pic.height();
    let mut num = [0f32; NUM_SCALES];
    let mut den = [0f32; NUM_SCALES];

    for scale in 0..NUM_SCALES {
        let kernel = VIF_FILTER_1D[scale];

        if scale > 0 {
            let q = ReduceShift::for_scale(scale, bit_depth);
            if scale == 1 {
                // The first reduction reads the caller's pictures.
                match (ref_pic, dis_pic) {
                    (PictureRef::Luma8(r), PictureRef::Luma8(d)) => {
                        let rb: &[u8] = r.buf();
                        let db: &[u8] = d.buf();
                        reduce_blur(
                            kernel,
                            rb,
                            r.stride(),
                            db,
                            d.stride(),
                            w,
                            h,
                            q,
                            v.mu1_small,
                            v.mu2_small,
                            stride,
                            v.line.ref_convol,
                            v.line.dis_convol,
                        );
                    }
                    (PictureRef::Luma16(r), PictureRef::Luma16(d)) => {
                        let rb: &[u16] = r.buf();
                        let db: &[u16] = d.buf();
                        reduce_blur(
                            kernel,
                            rb,
                            r.stride(),
                            db,
                            d.stride(),
                            w,
                            h,
                            q,
                            v.mu1_small,
                            v.mu2_small,
                            stride,
                            v.line.ref_convol,
                            v.line.dis_convol,
                        );
                    }
                    _ => unreachable!("validated by the extractor"),
                }
            } else {
                reduce_blur(
                    kernel,
                    &*v.ref_scale,
                    stride,
                    &*v.dis_scale,
                    stride,
                    w,
                    h,
                    q,
                    v.mu1_small,
                    v.mu2_small,
                    stride,
                    v.line.ref_convol,
                    v.line.dis_convol,
                );
            }

            decimate(v.mu1_small, v.ref_scale, w, h, stride);
            decimate(v.mu2_small, v.dis_scale, w, h, stride);
            w /= 2;
            h /= 2;
        }

        let q = QShift::moment(scale, bit_depth);
        let planes = MomentPlanes {
            mu1: &mut *v.mu1,
            mu2: &mut *v.mu2,
            ref_sq: &mut *v.ref_sq,
            dis_sq: &mut *v.dis_sq,
            ref_dis: &mut *v.ref_dis,
            stride,
        };
        let lines = MomentLines {
            mu1: &mut *v.line.mu1,
            mu2: &mut *v.line.mu2,
            ref_sq: &mut *v.line.ref_sq,
            dis_sq: &mut *v.line.dis_sq,
            ref_dis: &mut *v.line.ref_dis,
        };
        if scale == 0 {
            match (ref_pic, dis_pic) {
                (PictureRef::Luma8(r), PictureRef::Luma8(d)) => {
                    let rb: &[u8] = r.buf();
                    let db: &[u8] = d.buf();
                    moment_filter(kernel, rb, r.stride(), db, d.stride(), w, h, q, planes, lines);
                }
                (PictureRef::Luma16(r), PictureRef::Luma16(d)) => {
                    let rb: &[u16] = r.buf();
                    let db: &[u16] = d.buf();
                    moment_filter(kernel, rb, r.stride(), db, d.stride(), w, h, q, planes, lines);
                }
                _ => unreachable!("validated by the extractor"),
            }
        } else {
            moment_filter(
                kernel,
                &*v.ref_scale,
                stride,
                &*v.dis_scale,
                stride,
                w,
                h,
                q,
                planes,
                lines,
            );
        }

        let (n, d) = scale_statistics(
            v.mu1, v.mu2, v.ref_sq, v.dis_sq, v.ref_dis, stride, w, h, log_table,
        );
        num[scale] = n;
        den[scale] = d;
    }

    VifScores { num, den }
}
