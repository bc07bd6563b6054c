//! Constants for the integer VIF pipeline.
//!
//! The kernel taps and the log₂ polynomial are from the libvmaf integer
//! reference implementation and must not be altered: the fixed-point
//! pipeline is bit-exact against those values.

/// Number of spatial scales in the VIF pyramid.
pub const NUM_SCALES: usize = 4;

/// Symmetric 1-D Gaussian kernel for scale 0 (17 taps, Q16, sums to 2¹⁶).
pub const FILTER_SCALE0: [u16; 17] = [
    489, 935, 1640, 2640, 3896, 5274, 6547, 7455, 7784, 7455, 6547, 5274, 3896, 2640, 1640, 935,
    489,
];

/// Symmetric 1-D Gaussian kernel for scale 1 (9 taps, Q16).
pub const FILTER_SCALE1: [u16; 9] = [1244, 3663, 7925, 12590, 14692, 12590, 7925, 3663, 1244];

/// Symmetric 1-D Gaussian kernel for scale 2 (5 taps, Q16).
pub const FILTER_SCALE2: [u16; 5] = [3571, 16004, 26386, 16004, 3571];

/// Symmetric 1-D Gaussian kernel for scale 3 (3 taps, Q16).
pub const FILTER_SCALE3: [u16; 3] = [10904, 43728, 10904];

/// Kernel taps per scale. Width shrinks with resolution: {17, 9, 5, 3}.
pub const VIF_FILTER_1D: [&[u16]; NUM_SCALES] = [
    &FILTER_SCALE0,
    &FILTER_SCALE1,
    &FILTER_SCALE2,
    &FILTER_SCALE3,
];

/// Noise variance floor, Q16. Float equivalent is 2.0 (2 × 65536).
///
/// Pixels whose local reference variance falls below this threshold take the
/// closed-form (non-log) accumulator path in the scale aggregator.
pub const SIGMA_NSQ: i32 = 65536 << 1;

/// Minimax polynomial for log₂(m), m ∈ [1, 2), degree 8, leading order first.
/// Evaluated by Horner on (mantissa − 1.0) of an IEEE-754 single.
pub const LOG2_POLY: [f32; 9] = [
    -0.012671635276421,
    0.064841182402670,
    -0.157048836463065,
    0.257167726303123,
    -0.353800560300520,
    0.480131410397451,
    -0.721314327952201,
    1.442694803896991,
    0.0,
];

/// Feature names emitted to the collector, one per scale.
pub const FEATURE_NAMES: [&str; NUM_SCALES] = [
    "VMAF_feature_vif_scale0_integer_score",
    "VMAF_feature_vif_scale1_integer_score",
    "VMAF_feature_vif_scale2_integer_score",
    "VMAF_feature_vif_scale3_integer_score",
];
