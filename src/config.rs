use anyhow::Context;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::audio::analysis::CentroidScale;
use crate::audio::source::ChannelMix;
use crate::error::{Result, ThumbnailError};
use crate::render::color::Palette;
use crate::render::compositor::BarStyle;

/// Largest accepted width or height in pixels.
pub const MAX_DIMENSION: u32 = 16_384;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default)]
    pub palette: Palette,
    #[serde(default)]
    pub style: BarStyle,
    /// Brighten the middle row, like a zero line on a waveform.
    #[serde(default)]
    pub center_line: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    /// FFT length used for the centroid. Must be a power of two.
    #[serde(default = "default_fft_size")]
    pub fft_size: usize,
    #[serde(default)]
    pub channel_mix: ChannelMix,
    #[serde(default)]
    pub centroid_scale: CentroidScale,
    /// Scale amplitudes so the loudest column reaches full height.
    #[serde(default)]
    pub normalize: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Only the first `max_duration_secs` of audio are decoded and analyzed.
    #[serde(default)]
    pub max_duration_secs: Option<f64>,
    #[serde(default)]
    pub max_frames: Option<u64>,
    /// Wall-clock budget for a single file, decoding included. `0` disables it.
    #[serde(default = "default_max_processing_secs")]
    pub max_processing_secs: Option<f64>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            palette: Palette::default(),
            style: BarStyle::default(),
            center_line: false,
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            fft_size: default_fft_size(),
            channel_mix: ChannelMix::default(),
            centroid_scale: CentroidScale::default(),
            normalize: false,
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_duration_secs: None,
            max_frames: None,
            max_processing_secs: default_max_processing_secs(),
        }
    }
}

impl LimitsConfig {
    /// The tighter of `max_frames` and `max_duration_secs` at the given rate.
    pub fn frame_cap(&self, sample_rate: u32) -> Option<u64> {
        let from_duration = self
            .max_duration_secs
            .map(|secs| (secs * sample_rate as f64).ceil() as u64);
        match (self.max_frames, from_duration) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// `None` when unset, zero, or not representable as a `Duration`.
    pub fn time_budget(&self) -> Option<Duration> {
        self.max_processing_secs
            .filter(|&secs| secs > 0.0)
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(ThumbnailError::InvalidConfig(msg));

        let (width, height) = (self.output.width, self.output.height);
        if width == 0 || height == 0 || width > MAX_DIMENSION || height > MAX_DIMENSION {
            return invalid(format!(
                "output size must be between 1x1 and {max}x{max}, got {}x{}",
                width,
                height,
                max = MAX_DIMENSION
            ));
        }
        let fft_size = self.analysis.fft_size;
        if fft_size < 2 || !fft_size.is_power_of_two() {
            return invalid(format!("fft_size must be a power of two >= 2, got {}", fft_size));
        }
        if let CentroidScale::Logarithmic { low_hz, high_hz } = self.analysis.centroid_scale {
            if !(low_hz > 0.0 && high_hz > low_hz && high_hz.is_finite()) {
                return invalid(format!(
                    "logarithmic centroid range must satisfy 0 < low < high, got {}..{}",
                    low_hz, high_hz
                ));
            }
        }
        if let Some(secs) = self.limits.max_duration_secs {
            if !(secs.is_finite() && secs >= 0.0) {
                return invalid(format!("max_duration_secs must be >= 0, got {}", secs));
            }
        }
        if let Some(secs) = self.limits.max_processing_secs {
            if !(secs >= 0.0 && Duration::try_from_secs_f64(secs).is_ok()) {
                return invalid(format!(
                    "max_processing_secs must be >= 0 and fit a duration, got {}",
                    secs
                ));
            }
        }
        Ok(())
    }
}

fn default_width() -> u32 { 80 }
fn default_height() -> u32 { 40 }
fn default_fft_size() -> usize { 2048 }
fn default_max_processing_secs() -> Option<f64> { Some(30.0) }

pub fn load_config(path: &Path) -> anyhow::Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config: {}", path.display()))?;
    Ok(config)
}
