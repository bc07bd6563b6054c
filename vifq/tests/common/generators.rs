//! Shared luma image generation and distortion functions for VIF tests.
//!
//! These produce deterministic synthetic frames using an LCG PRNG,
//! ensuring identical test inputs across all platforms.

/// LCG pseudo-random number generator (deterministic).
pub struct Lcg {
    state: u64,
}

impl Lcg {
    pub const fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.state >> 33
    }

    pub fn next_u8(&mut self) -> u8 {
        (self.next() & 0xFF) as u8
    }

    /// Uniform sample over `bits`-bit range.
    pub fn next_bits(&mut self, bits: u32) -> u16 {
        (self.next() & ((1 << bits) - 1)) as u16
    }
}

// ============================================================================
// Frame generation
// ============================================================================

/// Constant-valued frame.
pub fn gen_uniform(width: usize, height: usize, value: u8) -> Vec<u8> {
    vec![value; width * height]
}

/// Constant-valued 16-bit frame.
pub fn gen_uniform16(width: usize, height: usize, value: u16) -> Vec<u16> {
    vec![value; width * height]
}

/// Horizontal ramp covering the full 8-bit range, identical on every row.
pub fn gen_ramp(width: usize, height: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(width * height);
    for _y in 0..height {
        for x in 0..width {
            data.push((x * 255 / (width - 1)) as u8);
        }
    }
    data
}

/// Vertical step edge: `lo` on the left half, `hi` on the right.
pub fn gen_step_edge(width: usize, height: usize, lo: u8, hi: u8) -> Vec<u8> {
    let mid = width / 2;
    let mut data = Vec::with_capacity(width * height);
    for _y in 0..height {
        for x in 0..width {
            data.push(if x < mid { lo } else { hi });
        }
    }
    data
}

/// Checkerboard pattern.
pub fn gen_checkerboard(width: usize, height: usize, block: usize, lo: u8, hi: u8) -> Vec<u8> {
    let mut data = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            let on = ((x / block) + (y / block)) % 2 == 0;
            data.push(if on { hi } else { lo });
        }
    }
    data
}

/// Seeded random frame.
pub fn gen_random(width: usize, height: usize, seed: u64) -> Vec<u8> {
    let mut rng = Lcg::new(seed);
    (0..width * height).map(|_| rng.next_u8()).collect()
}

/// Seeded random frame at a deeper bit depth.
pub fn gen_random16(width: usize, height: usize, seed: u64, bits: u32) -> Vec<u16> {
    let mut rng = Lcg::new(seed);
    (0..width * height).map(|_| rng.next_bits(bits)).collect()
}

// ============================================================================
// Distortions
// ============================================================================

/// Per-pixel noise with fixed seed and peak amplitude.
pub fn distort_noise(img: &[u8], seed: u64, amplitude: u8) -> Vec<u8> {
    let mut rng = Lcg::new(seed);
    img.iter()
        .map(|&v| {
            let noise = i16::from(rng.next_u8()) - 128;
            let scaled = noise * i16::from(amplitude) / 128;
            (i16::from(v) + scaled).clamp(0, 255) as u8
        })
        .collect()
}

/// Per-pixel noise for deeper bit depths.
pub fn distort_noise16(img: &[u16], seed: u64, amplitude: u16, bits: u32) -> Vec<u16> {
    let mut rng = Lcg::new(seed);
    let max = (1i32 << bits) - 1;
    img.iter()
        .map(|&v| {
            let noise = i32::from(rng.next_u8()) - 128;
            let scaled = noise * i32::from(amplitude) / 128;
            (i32::from(v) + scaled).clamp(0, max) as u16
        })
        .collect()
}

/// Separable 3-tap blur ([1, 2, 1] / 4) with edge clamping.
pub fn distort_blur3(img: &[u8], width: usize, height: usize) -> Vec<u8> {
    let mut tmp = vec![0u16; width * height];
    for y in 0..height {
        for x in 0..width {
            let l = img[y * width + x.saturating_sub(1)];
            let c = img[y * width + x];
            let r = img[y * width + (x + 1).min(width - 1)];
            tmp[y * width + x] = u16::from(l) + 2 * u16::from(c) + u16::from(r);
        }
    }
    let mut out = vec![0u8; width * height];
    for y in 0..height {
        for x in 0..width {
            let u = tmp[y.saturating_sub(1) * width + x];
            let c = tmp[y * width + x];
            let d = tmp[(y + 1).min(height - 1) * width + x];
            out[y * width + x] = ((u + 2 * c + d + 8) / 16) as u8;
        }
    }
    out
}

/// Mirrors a frame left-to-right.
pub fn flip_horizontal(img: &[u8], width: usize, height: usize) -> Vec<u8> {
    let mut out = vec![0u8; width * height];
    for y in 0..height {
        for x in 0..width {
            out[y * width + x] = img[y * width + (width - 1 - x)];
        }
    }
    out
}
