//! Orchestrates source → windows → features → colors → image for one file.

mod budget;
mod listener;

pub use budget::{Budget, CancelHandle};
pub use listener::{NoOpListener, PipelineEvent, PipelineListener};

use rayon::prelude::*;
use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::audio::analysis::SpectralAnalyzer;
use crate::audio::decode;
use crate::audio::features::{AnalysisWindow, WindowFeatures};
use crate::audio::source::SampleSource;
use crate::audio::window;
use crate::config::Config;
use crate::error::Result;
use crate::render::color::{ColorMapper, ColorSample};
use crate::render::compositor::{Compositor, ThumbnailImage};
use crate::render::sink::ImageSink;

/// States a run passes through. Any error ends the run in the failed state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    Start,
    Decoded,
    Scheduled,
    Analyzed,
    Colored,
    Composited,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Start => "start",
            Stage::Decoded => "decoded",
            Stage::Scheduled => "scheduled",
            Stage::Analyzed => "analyzed",
            Stage::Colored => "colored",
            Stage::Composited => "composited",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

/// What one output column was made from.
#[derive(Clone, Debug, Serialize)]
pub struct ColumnRecord {
    pub column: usize,
    pub start_frame: u64,
    pub frame_count: u64,
    pub features: WindowFeatures,
    pub color: ColorSample,
}

#[derive(Clone, Debug, Serialize)]
pub struct RenderStats {
    pub sample_rate: u32,
    pub channels: u16,
    pub total_frames: u64,
    /// Frames covered by the windows after the duration/frame cap.
    pub analyzed_frames: u64,
    pub width: u32,
    pub height: u32,
    pub elapsed_ms: f64,
}

/// A fully composited thumbnail and the data behind it.
#[derive(Clone, Debug, Serialize)]
pub struct Thumbnail {
    #[serde(skip)]
    pub image: ThumbnailImage,
    pub stats: RenderStats,
    pub columns: Vec<ColumnRecord>,
}

impl Thumbnail {
    pub fn write_to(&self, sink: &mut dyn ImageSink) -> Result<()> {
        sink.write_image(&self.image)
    }

    /// Stats and per-column features as pretty JSON.
    pub fn report_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Renders thumbnails with a fixed configuration. Holds no per-file state.
pub struct Thumbnailer {
    config: Config,
    mapper: ColorMapper,
}

impl Thumbnailer {
    pub fn new(config: Config) -> Result<Thumbnailer> {
        config.validate()?;
        let mapper = ColorMapper::new(config.output.palette);
        Ok(Thumbnailer { config, mapper })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// A fresh budget from the configured processing limit.
    pub fn budget(&self) -> Budget {
        Budget::from_limits(&self.config.limits)
    }

    pub fn render(&self, source: &dyn SampleSource, budget: &Budget) -> Result<Thumbnail> {
        self.render_with_listener(source, budget, &NoOpListener)
    }

    /// Decodes `path` (stopping at the frame cap) and renders it.
    pub fn render_file(
        &self,
        path: &Path,
        budget: &Budget,
        listener: &dyn PipelineListener,
    ) -> Result<Thumbnail> {
        log::info!("Decoding {}...", path.display());
        let source = match decode::open_file(path, &self.config.limits, budget) {
            Ok(source) => source,
            Err(e) => {
                log::warn!("Thumbnail failed at {}: {}", Stage::Start, e);
                listener.on_event(PipelineEvent::Failed { last: Stage::Start });
                return Err(e);
            }
        };
        self.render_with_listener(&source, budget, listener)
    }

    pub fn render_with_listener(
        &self,
        source: &dyn SampleSource,
        budget: &Budget,
        listener: &dyn PipelineListener,
    ) -> Result<Thumbnail> {
        let mut run = Run {
            stage: Stage::Start,
            listener,
        };
        let result = self.run(source, budget, &mut run);
        if let Err(ref e) = result {
            log::warn!("Thumbnail failed after {}: {}", run.stage, e);
            listener.on_event(PipelineEvent::Failed { last: run.stage });
        }
        result
    }

    fn run(&self, source: &dyn SampleSource, budget: &Budget, run: &mut Run<'_>) -> Result<Thumbnail> {
        let output = &self.config.output;
        let analysis = &self.config.analysis;

        // Decoded: the stream is open and its layout can be mixed down
        analysis.channel_mix.check(source.channel_count())?;
        let sample_rate = source.sample_rate();
        let total_frames = source.total_frames();
        run.advance(Stage::Decoded);

        // Scheduled
        budget.check(run.stage)?;
        let frame_cap = self.config.limits.frame_cap(sample_rate);
        let ranges = window::schedule(total_frames, output.width, frame_cap)?;
        let analyzed_frames = window::used_frames(total_frames, frame_cap);
        if analyzed_frames < total_frames {
            log::info!(
                "Analyzing first {} of {} frames ({:.1}s cap)",
                analyzed_frames,
                total_frames,
                analyzed_frames as f64 / sample_rate as f64
            );
        }
        run.advance(Stage::Scheduled);

        // Analyzed
        log::info!(
            "Analyzing {} windows (fft={}, mix={:?})...",
            ranges.len(),
            analysis.fft_size,
            analysis.channel_mix
        );
        let analyzer = SpectralAnalyzer::new(analysis.fft_size, analysis.centroid_scale, sample_rate);
        let total = ranges.len();
        let done = AtomicUsize::new(0);
        let listener = run.listener;
        let mix = analysis.channel_mix;

        let mut features: Vec<WindowFeatures> = ranges
            .par_iter()
            .enumerate()
            .map_init(
                || analyzer.scratch(),
                |scratch, (column, range)| -> Result<WindowFeatures> {
                    budget.check(Stage::Scheduled)?;
                    let window = AnalysisWindow {
                        column,
                        start: range.start,
                        samples: source.read_mono(range.clone(), mix)?,
                    };
                    let features = analyzer.analyze(&window.samples, scratch);
                    let n = done.fetch_add(1, Ordering::Relaxed) + 1;
                    listener.on_event(PipelineEvent::ColumnAnalyzed { done: n, total });
                    Ok(features)
                },
            )
            .collect::<Result<Vec<_>>>()?;

        if analysis.normalize {
            let peak = features.iter().map(|f| f.amplitude).fold(0.0f32, f32::max);
            log::debug!("Normalizing to peak amplitude {:.4}", peak);
            for f in features.iter_mut() {
                *f = f.scaled(peak);
            }
        }
        run.advance(Stage::Analyzed);

        // Colored
        budget.check(run.stage)?;
        let colors: Vec<ColorSample> = features.par_iter().map(|f| self.mapper.map(f)).collect();
        run.advance(Stage::Colored);

        // Composited
        budget.check(run.stage)?;
        let painted: Vec<(WindowFeatures, ColorSample)> =
            features.iter().copied().zip(colors.iter().copied()).collect();
        let image = Compositor::new(output.height, output.style, self.mapper.background())
            .with_center_line(output.center_line)
            .compose(&painted);
        run.advance(Stage::Composited);

        let columns = ranges
            .iter()
            .zip(painted)
            .enumerate()
            .map(|(column, (range, (features, color)))| ColumnRecord {
                column,
                start_frame: range.start,
                frame_count: range.end - range.start,
                features,
                color,
            })
            .collect();

        let stats = RenderStats {
            sample_rate,
            channels: source.channel_count(),
            total_frames,
            analyzed_frames,
            width: image.width(),
            height: image.height(),
            elapsed_ms: budget.elapsed().as_secs_f64() * 1000.0,
        };
        run.advance(Stage::Done);

        log::info!(
            "Rendered {}x{} thumbnail in {:.1}ms",
            stats.width,
            stats.height,
            stats.elapsed_ms
        );

        Ok(Thumbnail {
            image,
            stats,
            columns,
        })
    }
}

struct Run<'a> {
    stage: Stage,
    listener: &'a dyn PipelineListener,
}

impl Run<'_> {
    fn advance(&mut self, next: Stage) {
        debug_assert!(next > self.stage);
        log::debug!("Stage {} -> {}", self.stage, next);
        self.stage = next;
        self.listener.on_event(PipelineEvent::StageCompleted(next));
    }
}
