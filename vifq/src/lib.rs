//! # vifq
//!
//! Integer fixed-point implementation of the Visual Information Fidelity
//! (VIF) video quality feature extractor, bit-exact against the libvmaf
//! integer reference.
//!
//! Given a pristine *reference* frame and a *distorted* frame (single-plane
//! luma, 8/10/12-bit), the extractor computes four scalar scores, one per
//! spatial scale of a Gaussian pyramid. Each score is the ratio of preserved
//! to available visual information at that scale: values near 1.0 mean the
//! distortion retained nearly everything, values near 0.0 mean it destroyed
//! it.
//!
//! The whole pipeline is scalar integer arithmetic in carefully chosen
//! fixed-point formats; only the final per-scale combine touches floating
//! point. Two runs over the same frames produce byte-identical scores.
//!
//! ## Example
//!
//! ```rust
//! use imgref::Img;
//! use vifq::{PictureRef, VifExtractor};
//!
//! let (w, h) = (32, 32);
//! let reference = Img::new(vec![128u8; w * h], w, h);
//! let distorted = Img::new(vec![129u8; w * h], w, h);
//!
//! let mut vif = VifExtractor::new(8, w, h).unwrap();
//! let scores = vif
//!     .scores(
//!         PictureRef::Luma8(reference.as_ref()),
//!         PictureRef::Luma8(distorted.as_ref()),
//!     )
//!     .unwrap();
//!
//! for (scale, ratio) in scores.ratios().iter().enumerate() {
//!     println!("scale {scale}: {ratio:.4}");
//! }
//! ```
//!
//! ## Feeding a feature collector
//!
//! Per-frame observations can be appended to any [`FeatureSink`] under the
//! standard `VMAF_feature_vif_scale{N}_integer_score` keys:
//!
//! ```rust
//! use imgref::Img;
//! use vifq::{MemorySink, PictureRef, VifExtractor};
//!
//! let (w, h) = (32, 32);
//! let frame = Img::new(vec![100u8; w * h], w, h);
//!
//! let mut vif = VifExtractor::new(8, w, h).unwrap();
//! let mut sink = MemorySink::default();
//! vif.extract(
//!     PictureRef::Luma8(frame.as_ref()),
//!     PictureRef::Luma8(frame.as_ref()),
//!     0,
//!     &mut sink,
//! )
//! .unwrap();
//! assert_eq!(sink.observations.len(), 4);
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)]
// Fixed-point code ported from a C reference: casts and literals are exact.
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::unreadable_literal)]
#![allow(clippy::many_single_char_names)]
#![allow(clippy::needless_range_loop)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

mod buffer;
pub mod consts;
pub mod fixed;
mod filter;
mod pipeline;
mod reduce;
mod stats;

use imgref::ImgRef;

use crate::buffer::VifBuffers;
use crate::fixed::LogTable;

pub use crate::consts::{FEATURE_NAMES, NUM_SCALES};

/// Smallest frame edge the four-scale pyramid supports.
///
/// At scale 3 the frame has been halved three times and the 3-tap kernel's
/// mirror reflection needs at least two rows and columns to fold into.
pub const MIN_DIMENSION: usize = 16;

/// Error type for VIF extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum VifError {
    /// The scratch buffer allocation was refused.
    OutOfMemory {
        /// Bytes requested.
        bytes: usize,
    },
    /// Frame dimensions are below [`MIN_DIMENSION`].
    InvalidDimensions {
        /// Width provided.
        width: usize,
        /// Height provided.
        height: usize,
    },
    /// Bit depth is not one of 8, 10, 12.
    UnsupportedBitDepth {
        /// Bit depth provided.
        bit_depth: u32,
    },
    /// A picture's dimensions don't match the extractor's.
    DimensionMismatch {
        /// Dimensions the extractor was built for (width, height).
        expected: (usize, usize),
        /// Dimensions of the offending picture.
        actual: (usize, usize),
    },
    /// The picture's sample format doesn't match the extractor's bit depth
    /// (8-bit frames must be `Luma8`, deeper frames `Luma16`).
    PixelFormatMismatch {
        /// Bit depth the extractor was built for.
        bit_depth: u32,
    },
    /// The feature sink rejected an observation.
    Sink(SinkError),
}

impl std::fmt::Display for VifError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OutOfMemory { bytes } => {
                write!(f, "failed to allocate {bytes} bytes of scratch memory")
            }
            Self::InvalidDimensions { width, height } => {
                write!(
                    f,
                    "invalid dimensions: {width}x{height} (minimum {MIN_DIMENSION}x{MIN_DIMENSION})"
                )
            }
            Self::UnsupportedBitDepth { bit_depth } => {
                write!(f, "unsupported bit depth {bit_depth} (expected 8, 10 or 12)")
            }
            Self::DimensionMismatch { expected, actual } => {
                write!(
                    f,
                    "picture dimensions {}x{} don't match extractor dimensions {}x{}",
                    actual.0, actual.1, expected.0, expected.1
                )
            }
            Self::PixelFormatMismatch { bit_depth } => {
                write!(
                    f,
                    "picture sample format doesn't match extractor bit depth {bit_depth}"
                )
            }
            Self::Sink(e) => write!(f, "feature sink rejected observation: {}", e.message),
        }
    }
}

impl std::error::Error for VifError {}

impl From<SinkError> for VifError {
    fn from(e: SinkError) -> Self {
        Self::Sink(e)
    }
}

/// Error a [`FeatureSink`] may return from [`FeatureSink::append`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkError {
    /// Human-readable reason.
    pub message: String,
}

impl SinkError {
    /// Creates a sink error from any message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for SinkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for SinkError {}

/// Destination for named per-frame observations.
///
/// [`VifExtractor::extract`] appends the four per-scale scores here, keyed by
/// frame index. Appends happen in scale order and stop at the first failure.
pub trait FeatureSink {
    /// Records one named scalar observation for frame `index`.
    ///
    /// # Errors
    /// Implementations may refuse an observation; the error propagates out of
    /// [`VifExtractor::extract`] as [`VifError::Sink`].
    fn append(&mut self, name: &'static str, value: f64, index: u32) -> Result<(), SinkError>;
}

/// One recorded observation of a [`MemorySink`].
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    /// Feature name, one of [`FEATURE_NAMES`].
    pub name: &'static str,
    /// Score value.
    pub value: f64,
    /// Frame index.
    pub index: u32,
}

/// In-memory [`FeatureSink`] that never fails. Useful for tests and simple
/// callers.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    /// Everything appended so far, in append order.
    pub observations: Vec<Observation>,
}

impl FeatureSink for MemorySink {
    fn append(&mut self, name: &'static str, value: f64, index: u32) -> Result<(), SinkError> {
        self.observations.push(Observation { name, value, index });
        Ok(())
    }
}

/// Borrowed single-plane picture view.
///
/// Only the luminance plane participates in VIF; chroma is a caller concern.
/// `Luma8` carries 8-bit samples, `Luma16` carries 10- or 12-bit samples
/// stored in 16 bits. The view's stride is in elements and may exceed its
/// width.
#[derive(Debug, Clone, Copy)]
pub enum PictureRef<'a> {
    /// 8-bit samples.
    Luma8(ImgRef<'a, u8>),
    /// 10- or 12-bit samples stored in `u16`.
    Luma16(ImgRef<'a, u16>),
}

impl PictureRef<'_> {
    /// Picture width in pixels.
    #[inline]
    pub fn width(&self) -> usize {
        match self {
            Self::Luma8(img) => img.width(),
            Self::Luma16(img) => img.width(),
        }
    }

    /// Picture height in pixels.
    #[inline]
    pub fn height(&self) -> usize {
        match self {
            Self::Luma8(img) => img.height(),
            Self::Luma16(img) => img.height(),
        }
    }

    fn is_luma8(&self) -> bool {
        matches!(self, Self::Luma8(_))
    }
}

/// Per-frame VIF result: one (num, den) pair per scale.
///
/// The per-scale pairs are the raw aggregator outputs; the observable scores
/// are the ratios. A degenerate frame with a zero denominator yields a
/// non-finite ratio, which consumers treat as such.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VifScores {
    /// Information preserved per scale (numerators).
    pub num: [f32; NUM_SCALES],
    /// Information available per scale (denominators).
    pub den: [f32; NUM_SCALES],
}

impl VifScores {
    /// The score for one scale: `num / den`, formed in `f64`.
    #[inline]
    pub fn ratio(&self, scale: usize) -> f64 {
        f64::from(self.num[scale]) / f64::from(self.den[scale])
    }

    /// All four per-scale scores.
    pub fn ratios(&self) -> [f64; NUM_SCALES] {
        std::array::from_fn(|s| self.ratio(s))
    }
}

/// Integer VIF feature extractor.
///
/// Owns the log table and one aligned scratch block sized for the frame
/// dimensions given at construction; both are reused across frames and freed
/// on drop. An extractor processes one frame at a time — score several frame
/// pairs concurrently by giving each thread its own extractor.
#[derive(Debug)]
pub struct VifExtractor {
    buffers: VifBuffers,
    log_table: LogTable,
    width: usize,
    height: usize,
    bit_depth: u32,
}

impl VifExtractor {
    /// Creates an extractor for frames of the given dimensions and depth.
    ///
    /// # Errors
    /// - [`VifError::UnsupportedBitDepth`] unless `bit_depth` is 8, 10 or 12.
    /// - [`VifError::InvalidDimensions`] below [`MIN_DIMENSION`].
    /// - [`VifError::OutOfMemory`] if the scratch block cannot be allocated.
    pub fn new(bit_depth: u32, width: usize, height: usize) -> Result<Self, VifError> {
        if !matches!(bit_depth, 8 | 10 | 12) {
            return Err(VifError::UnsupportedBitDepth { bit_depth });
        }
        if width < MIN_DIMENSION || height < MIN_DIMENSION {
            return Err(VifError::InvalidDimensions { width, height });
        }

        Ok(Self {
            buffers: VifBuffers::new(width, height)?,
            log_table: LogTable::new(),
            width,
            height,
            bit_depth,
        })
    }

    /// The bit depth this extractor was built for.
    #[inline]
    pub fn bit_depth(&self) -> u32 {
        self.bit_depth
    }

    /// Frame dimensions this extractor was built for.
    #[inline]
    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Computes the four per-scale scores for one frame pair.
    ///
    /// # Errors
    /// [`VifError::DimensionMismatch`] or [`VifError::PixelFormatMismatch`]
    /// if the pictures don't match the constructor arguments.
    pub fn scores(
        &mut self,
        ref_pic: PictureRef<'_>,
        dis_pic: PictureRef<'_>,
    ) -> Result<VifScores, VifError> {
        self.validate(ref_pic)?;
        self.validate(dis_pic)?;
        Ok(pipeline::extract_frame(
            &mut self.buffers,
            &self.log_table,
            self.bit_depth,
            ref_pic,
            dis_pic,
        ))
    }

    /// Computes the per-scale scores and appends them to `sink` keyed by
    /// `index`, under the [`FEATURE_NAMES`] keys.
    ///
    /// # Errors
    /// Validation errors as in [`Self::scores`], or [`VifError::Sink`] when
    /// the sink refuses an observation. Appends already made stay recorded.
    pub fn extract(
        &mut self,
        ref_pic: PictureRef<'_>,
        dis_pic: PictureRef<'_>,
        index: u32,
        sink: &mut dyn FeatureSink,
    ) -> Result<VifScores, VifError> {
        let scores = self.scores(ref_pic, dis_pic)?;
        for (scale, name) in FEATURE_NAMES.iter().enumerate() {
            sink.append(name, scores.ratio(scale), index)?;
        }
        Ok(scores)
    }

    fn validate(&self, pic: PictureRef<'_>) -> Result<(), VifError> {
        if pic.width() != self.width || pic.height() != self.height {
            return Err(VifError::DimensionMismatch {
                expected: (self.width, self.height),
                actual: (pic.width(), pic.height()),
            });
        }
        if pic.is_luma8() != (self.bit_depth == 8) {
            return Err(VifError::PixelFormatMismatch {
                bit_depth: self.bit_depth,
            });
        }
        Ok(())
    }
}

/// One-shot convenience: builds an extractor, scores one frame pair.
///
/// Both pictures must share dimensions and sample format. Prefer holding a
/// [`VifExtractor`] when scoring many frames — the scratch block and log
/// table are then built once.
///
/// # Errors
/// As for [`VifExtractor::new`] and [`VifExtractor::scores`].
pub fn compute_vif(
    ref_pic: PictureRef<'_>,
    dis_pic: PictureRef<'_>,
    bit_depth: u32,
) -> Result<VifScores, VifError> {
    let mut extractor = VifExtractor::new(bit_depth, ref_pic.width(), ref_pic.height())?;
    extractor.scores(ref_pic, dis_pic)
}
