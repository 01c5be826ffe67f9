//! Random-access PCM frames and mono mix-down.

use serde::{Deserialize, Serialize};
use std::ops::Range;

use crate::error::{Result, ThumbnailError};

/// How multi-channel frames are folded into the single signal that gets analyzed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChannelMix {
    /// Mean across channels. Never leaves [-1, 1].
    #[default]
    Average,
    /// Sum across channels, clamped to [-1, 1].
    SumClamped,
    /// A single channel by zero-based index.
    Channel(usize),
}

impl ChannelMix {
    /// Fails if this strategy cannot be applied to `channels` channels.
    pub fn check(self, channels: u16) -> Result<()> {
        if channels == 0 {
            return Err(ThumbnailError::UnsupportedChannelLayout {
                channels,
                reason: "stream reports no channels".into(),
            });
        }
        if let ChannelMix::Channel(index) = self {
            if index >= channels as usize {
                return Err(ThumbnailError::UnsupportedChannelLayout {
                    channels,
                    reason: format!("channel {} requested", index),
                });
            }
        }
        Ok(())
    }

    fn mix(self, frame: &[f32]) -> f32 {
        let value = match self {
            ChannelMix::Average => frame.iter().copied().map(sanitize).sum::<f32>() / frame.len() as f32,
            ChannelMix::SumClamped => frame.iter().copied().map(sanitize).sum::<f32>(),
            ChannelMix::Channel(index) => frame.get(index).copied().map_or(0.0, sanitize),
        };
        value.clamp(-1.0, 1.0)
    }
}

fn sanitize(sample: f32) -> f32 {
    if sample.is_finite() { sample } else { 0.0 }
}

/// One multi-channel sample at a point in time.
#[derive(Debug, Clone, Copy)]
pub struct SampleFrame<'a> {
    pub index: u64,
    pub channels: &'a [f32],
}

/// A contiguous run of interleaved frames starting at `start`.
#[derive(Debug, Clone)]
pub struct FrameBlock {
    start: u64,
    channels: u16,
    samples: Vec<f32>,
}

impl FrameBlock {
    pub fn new(start: u64, channels: u16, samples: Vec<f32>) -> Self {
        debug_assert!(channels > 0 && samples.len() % channels as usize == 0);
        Self { start, channels, samples }
    }

    pub fn start(&self) -> u64 {
        self.start
    }

    pub fn frame_count(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    pub fn frames(&self) -> impl Iterator<Item = SampleFrame<'_>> + '_ {
        self.samples
            .chunks_exact(self.channels as usize)
            .enumerate()
            .map(move |(i, channels)| SampleFrame {
                index: self.start + i as u64,
                channels,
            })
    }

    pub fn mix_down(&self, mix: ChannelMix) -> Vec<f32> {
        if self.channels == 1 {
            return self.samples.iter().map(|&s| sanitize(s).clamp(-1.0, 1.0)).collect();
        }
        self.frames().map(|frame| mix.mix(frame.channels)).collect()
    }
}

/// A decoded PCM stream. Reads may happen from several threads at once.
pub trait SampleSource: Send + Sync {
    fn sample_rate(&self) -> u32;

    fn channel_count(&self) -> u16;

    fn total_frames(&self) -> u64;

    /// Reads up to `count` frames from `start`. Reads past the end are truncated.
    fn read_frames(&self, start: u64, count: u64) -> Result<FrameBlock>;

    fn read_mono(&self, range: Range<u64>, mix: ChannelMix) -> Result<Vec<f32>> {
        let count = range.end.saturating_sub(range.start);
        Ok(self.read_frames(range.start, count)?.mix_down(mix))
    }
}

/// Interleaved samples held in memory.
#[derive(Debug, Clone)]
pub struct PcmBuffer {
    samples: Vec<f32>,
    sample_rate: u32,
    channels: u16,
}

impl PcmBuffer {
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Result<Self> {
        ChannelMix::Average.check(channels)?;
        if samples.len() % channels as usize != 0 {
            return Err(ThumbnailError::UnreadableStream(format!(
                "{} samples do not divide into {} channels",
                samples.len(),
                channels
            )));
        }
        if sample_rate == 0 {
            return Err(ThumbnailError::UnreadableStream("sample rate is zero".into()));
        }
        Ok(Self { samples, sample_rate, channels })
    }

    pub fn mono(samples: Vec<f32>, sample_rate: u32) -> Result<Self> {
        Self::new(samples, sample_rate, 1)
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }
}

impl SampleSource for PcmBuffer {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn channel_count(&self) -> u16 {
        self.channels
    }

    fn total_frames(&self) -> u64 {
        (self.samples.len() / self.channels as usize) as u64
    }

    fn read_frames(&self, start: u64, count: u64) -> Result<FrameBlock> {
        let total = self.total_frames();
        let start = start.min(total);
        let end = start.saturating_add(count).min(total);
        let ch = self.channels as usize;
        let slice = &self.samples[start as usize * ch..end as usize * ch];
        Ok(FrameBlock::new(start, self.channels, slice.to_vec()))
    }
}
