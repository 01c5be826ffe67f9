use rustfft::num_complex::Complex;
use rustfft::num_traits::Zero;
use rustfft::{Fft, FftPlanner};
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;
use std::sync::Arc;

use super::features::{AnalysisWindow, WindowFeatures};

/// Total bin magnitude below which a window counts as silent.
const SILENCE_EPSILON: f32 = 1e-10;

/// How a centroid in Hz is folded onto [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CentroidScale {
    /// Fraction of the Nyquist frequency.
    #[default]
    Linear,
    /// log10 position inside `[low_hz, high_hz]`, clamped at both ends.
    Logarithmic { low_hz: f32, high_hz: f32 },
}

impl CentroidScale {
    /// The perceptual range the classic waveform thumbnails used.
    pub const PERCEPTUAL: CentroidScale = CentroidScale::Logarithmic {
        low_hz: 100.0,
        high_hz: 22050.0,
    };

    fn apply(self, nyquist_fraction: f32, sample_rate: u32) -> f32 {
        match self {
            CentroidScale::Linear => nyquist_fraction.clamp(0.0, 1.0),
            CentroidScale::Logarithmic { low_hz, high_hz } => {
                let hz = (nyquist_fraction * sample_rate as f32 * 0.5).clamp(low_hz, high_hz);
                let (low, high) = (low_hz.log10(), high_hz.log10());
                ((hz.log10() - low) / (high - low)).clamp(0.0, 1.0)
            }
        }
    }
}

/// Reusable per-worker buffers, so rayon workers don't allocate per column.
pub struct AnalyzerScratch {
    buffer: Vec<Complex<f32>>,
    fft_scratch: Vec<Complex<f32>>,
}

/// Peak and spectral-centroid extraction with one FFT plan shared across threads.
///
/// Only the first `fft_size` samples of a window feed the transform; longer windows
/// are not averaged.
pub struct SpectralAnalyzer {
    fft: Arc<dyn Fft<f32>>,
    window: Box<[f32]>,
    fft_size: usize,
    scale: CentroidScale,
    sample_rate: u32,
}

impl SpectralAnalyzer {
    pub fn new(fft_size: usize, scale: CentroidScale, sample_rate: u32) -> SpectralAnalyzer {
        debug_assert!(fft_size >= 2 && fft_size.is_power_of_two());
        let fft = FftPlanner::<f32>::new().plan_fft_forward(fft_size);
        SpectralAnalyzer {
            fft,
            window: hann_window(fft_size).into_boxed_slice(),
            fft_size,
            scale,
            sample_rate,
        }
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    pub fn scratch(&self) -> AnalyzerScratch {
        AnalyzerScratch {
            buffer: vec![Complex::zero(); self.fft_size],
            fft_scratch: vec![Complex::zero(); self.fft.get_inplace_scratch_len()],
        }
    }

    pub fn analyze_window(&self, window: &AnalysisWindow) -> WindowFeatures {
        self.analyze(&window.samples, &mut self.scratch())
    }

    pub fn analyze(&self, samples: &[f32], scratch: &mut AnalyzerScratch) -> WindowFeatures {
        if samples.len() < 2 {
            return WindowFeatures::SILENT;
        }

        let (min_peak, max_peak) = samples
            .iter()
            .fold((0.0f32, 0.0f32), |(min, max), &s| (min.min(s), max.max(s)));
        let amplitude = min_peak.abs().max(max_peak);

        let centroid = match self.nyquist_fraction(samples, scratch) {
            Some(fraction) => self.scale.apply(fraction, self.sample_rate),
            None => 0.0,
        };

        WindowFeatures {
            amplitude,
            centroid,
            min_peak,
            max_peak,
        }
    }

    /// Magnitude-weighted mean bin over bins `1..=N/2`, as a fraction of N/2.
    /// `None` when the segment carries no energy once its DC offset is removed.
    fn nyquist_fraction(&self, samples: &[f32], scratch: &mut AnalyzerScratch) -> Option<f32> {
        let segment = &samples[..samples.len().min(self.fft_size)];
        let mean = (segment.iter().map(|&s| s as f64).sum::<f64>() / segment.len() as f64) as f32;

        let short_window;
        let weights: &[f32] = if segment.len() == self.fft_size {
            &self.window
        } else {
            short_window = hann_window(segment.len());
            &short_window
        };

        scratch
            .buffer
            .iter_mut()
            .zip(
                segment
                    .iter()
                    .zip(weights.iter())
                    .map(|(&s, &w)| (s - mean) * w)
                    .chain(std::iter::repeat(0.0)),
            )
            .for_each(|(slot, v)| *slot = Complex::new(v, 0.0));
        self.fft.process_with_scratch(&mut scratch.buffer, &mut scratch.fft_scratch);

        let half = self.fft_size / 2;
        let (weighted, total) = scratch.buffer[1..=half]
            .iter()
            .enumerate()
            .fold((0.0f64, 0.0f64), |(weighted, total), (i, c)| {
                let mag = c.norm() as f64;
                (weighted + (i + 1) as f64 * mag, total + mag)
            });

        if !(total.is_finite() && total as f32 >= SILENCE_EPSILON) {
            return None;
        }
        Some((weighted / total / half as f64) as f32)
    }
}

/// Periodic Hann window, so a two-sample segment still has a non-zero tap.
fn hann_window(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f32 / size as f32).cos()))
        .collect()
}
