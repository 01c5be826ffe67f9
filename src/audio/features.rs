use serde::Serialize;
use std::ops::Range;

/// The mono samples assigned to one output column.
#[derive(Clone, Debug)]
pub struct AnalysisWindow {
    pub column: usize,
    pub start: u64,
    pub samples: Vec<f32>,
}

impl AnalysisWindow {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn range(&self) -> Range<u64> {
        self.start..self.start + self.samples.len() as u64
    }
}

/// Per-window measurements, all finite.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct WindowFeatures {
    /// Peak absolute sample value (0.0 = silence)
    pub amplitude: f32,
    /// Spectral centroid, normalized (0.0 = DC or no energy, 1.0 = top of range)
    pub centroid: f32,
    /// Most negative sample
    pub min_peak: f32,
    /// Most positive sample
    pub max_peak: f32,
}

impl WindowFeatures {
    pub const SILENT: WindowFeatures = WindowFeatures {
        amplitude: 0.0,
        centroid: 0.0,
        min_peak: 0.0,
        max_peak: 0.0,
    };

    /// Divides the loudness fields by `peak`; no-op for a non-positive peak.
    pub fn scaled(self, peak: f32) -> WindowFeatures {
        if !(peak > 0.0) {
            return self;
        }
        WindowFeatures {
            amplitude: (self.amplitude / peak).min(1.0),
            centroid: self.centroid,
            min_peak: (self.min_peak / peak).max(-1.0),
            max_peak: (self.max_peak / peak).min(1.0),
        }
    }
}
