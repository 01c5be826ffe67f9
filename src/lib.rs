//! Fixed-size "fingerprint" thumbnails for audio files.
//!
//! Each pixel column covers one time window. Its bar height follows the window's peak
//! amplitude and its color follows the spectral centroid, so a glance at the image shows
//! both loudness and brightness of the sound over time.
//!
//! ```no_run
//! use wavethumb::{Config, PngFileSink, Thumbnailer, NoOpListener};
//!
//! let thumbnailer = Thumbnailer::new(Config::default())?;
//! let thumb = thumbnailer.render_file("song.flac".as_ref(), &thumbnailer.budget(), &NoOpListener)?;
//! thumb.write_to(&mut PngFileSink::new("song.png"))?;
//! # Ok::<(), wavethumb::ThumbnailError>(())
//! ```

pub mod audio;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod render;

pub use audio::source::{ChannelMix, PcmBuffer, SampleSource};
pub use config::Config;
pub use error::{Result, ThumbnailError};
pub use pipeline::{Budget, CancelHandle, NoOpListener, PipelineEvent, PipelineListener, Stage, Thumbnail, Thumbnailer};
pub use render::color::{ColorSample, Palette};
pub use render::compositor::{BarStyle, ThumbnailImage};
pub use render::sink::{ImageSink, PngFileSink, PngMemorySink};
