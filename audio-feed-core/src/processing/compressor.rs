use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

/// Block-based spectral soft-knee compressor.
///
/// Each call transforms one packet's channel series to the frequency domain,
/// scales every bin whose magnitude exceeds `threshold` so the excess is
/// divided by `ratio`, and transforms back with `1/N` normalization. Blocks
/// are not windowed or overlapped, so consecutive packets may show an edge
/// discontinuity. The FFT planner is cached; no signal state is kept.
pub struct SpectralCompressor {
    threshold: f32,
    ratio: f32,
    planner: FftPlanner<f32>,
}

impl SpectralCompressor {
    pub const DEFAULT_THRESHOLD: f32 = 0.5;
    pub const DEFAULT_RATIO: f32 = 4.0;

    pub fn new() -> Self {
        Self::with_params(Self::DEFAULT_THRESHOLD, Self::DEFAULT_RATIO)
    }

    pub fn with_params(threshold: f32, ratio: f32) -> Self {
        Self {
            threshold,
            ratio,
            planner: FftPlanner::new(),
        }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn ratio(&self) -> f32 {
        self.ratio
    }

    /// Gain applied to a bin of the given magnitude.
    pub fn gain(&self, magnitude: f32) -> f32 {
        if magnitude > self.threshold {
            (self.threshold + (magnitude - self.threshold) / self.ratio) / magnitude
        } else {
            1.0
        }
    }

    /// Compress `samples` in place. An empty slice is left untouched.
    pub fn process(&mut self, samples: &mut [f32]) {
        let n = samples.len();
        if n == 0 {
            return;
        }

        let mut bins: Vec<Complex<f32>> = samples.iter().map(|&s| Complex::new(s, 0.0)).collect();

        self.planner.plan_fft_forward(n).process(&mut bins);

        for bin in bins.iter_mut() {
            let gain = self.gain(bin.norm());
            if gain != 1.0 {
                *bin *= gain;
            }
        }

        self.planner.plan_fft_inverse(n).process(&mut bins);

        let scale = 1.0 / n as f32;
        for (sample, bin) in samples.iter_mut().zip(&bins) {
            *sample = bin.re * scale;
        }
    }
}

impl Default for SpectralCompressor {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SpectralCompressor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpectralCompressor")
            .field("threshold", &self.threshold)
            .field("ratio", &self.ratio)
            .finish()
    }
}
