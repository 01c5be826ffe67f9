use std::io::{Cursor, ErrorKind};
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSource, MediaSourceStream};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use super::source::PcmBuffer;
use crate::config::LimitsConfig;
use crate::error::{Result, ThumbnailError};
use crate::pipeline::{Budget, Stage};

/// Decodes the default track of an audio file into memory, honouring the frame cap.
pub fn open_file(path: &Path, limits: &LimitsConfig, budget: &Budget) -> Result<PcmBuffer> {
    let file = std::fs::File::open(path).map_err(|e| {
        ThumbnailError::UnreadableStream(format!("failed to open {}: {}", path.display(), e))
    })?;
    let extension = path.extension().and_then(|e| e.to_str());
    decode(Box::new(file), extension, limits, budget)
}

/// Same as [`open_file`] for an in-memory encoded stream.
pub fn open_bytes(
    bytes: Vec<u8>,
    extension: Option<&str>,
    limits: &LimitsConfig,
    budget: &Budget,
) -> Result<PcmBuffer> {
    decode(Box::new(Cursor::new(bytes)), extension, limits, budget)
}

fn unreadable(context: &str, err: impl std::fmt::Display) -> ThumbnailError {
    ThumbnailError::UnreadableStream(format!("{}: {}", context, err))
}

/// A zero cap still decodes one frame so the thumbnail has something to show.
fn decode_cap(limits: &LimitsConfig, sample_rate: u32) -> Option<u64> {
    limits.frame_cap(sample_rate).map(|cap| cap.max(1))
}

fn decode(
    source: Box<dyn MediaSource>,
    extension: Option<&str>,
    limits: &LimitsConfig,
    budget: &Budget,
) -> Result<PcmBuffer> {
    let mss = MediaSourceStream::new(source, Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = extension {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| unreadable("failed to probe audio format", e))?;

    let mut format = probed.format;

    let track = format
        .default_track()
        .filter(|t| t.codec_params.codec != symphonia::core::codecs::CODEC_TYPE_NULL)
        .or_else(|| {
            format
                .tracks()
                .iter()
                .find(|t| t.codec_params.codec != symphonia::core::codecs::CODEC_TYPE_NULL)
        })
        .ok_or_else(|| ThumbnailError::UnreadableStream("no audio tracks found".into()))?;

    let track_id = track.id;
    let codec_params = track.codec_params.clone();
    let mut sample_rate = codec_params.sample_rate;
    let mut channels = codec_params.channels.map(|c| c.count() as u16);

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| unreadable("failed to create audio decoder", e))?;

    let mut frame_cap = sample_rate.and_then(|sr| decode_cap(limits, sr));
    let mut interleaved: Vec<f32> = Vec::new();
    if let (Some(n), Some(ch)) = (codec_params.n_frames, channels) {
        let expected = frame_cap.map_or(n, |cap| n.min(cap));
        interleaved.reserve(expected.min(1 << 28) as usize * ch as usize);
    }
    let mut frames: u64 = 0;

    loop {
        budget.check(Stage::Start)?;

        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(ref e)) if e.kind() == ErrorKind::UnexpectedEof => break,
            Err(SymphoniaError::ResetRequired) => {
                decoder.reset();
                continue;
            }
            Err(e) if frames > 0 => {
                log::warn!("Stream ended early after {} frames: {}", frames, e);
                break;
            }
            Err(e) => return Err(unreadable("failed to read packet", e)),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(SymphoniaError::DecodeError(msg)) => {
                log::warn!("Skipping undecodable packet: {}", msg);
                continue;
            }
            Err(e) if frames > 0 => {
                log::warn!("Decoder failed after {} frames: {}", frames, e);
                break;
            }
            Err(e) => return Err(unreadable("failed to decode packet", e)),
        };

        let spec = *decoded.spec();
        let packet_channels = spec.channels.count() as u16;
        match channels {
            Some(ch) if ch != packet_channels && frames > 0 => {
                return Err(ThumbnailError::UnsupportedChannelLayout {
                    channels: packet_channels,
                    reason: format!("channel count changed mid-stream from {}", ch),
                });
            }
            _ => channels = Some(packet_channels),
        }
        if sample_rate.is_none() {
            sample_rate = Some(spec.rate);
            frame_cap = decode_cap(limits, spec.rate);
        }

        let num_frames = decoded.frames();
        if num_frames == 0 {
            continue;
        }
        let mut sample_buf = SampleBuffer::<f32>::new(num_frames as u64, spec);
        sample_buf.copy_interleaved_ref(decoded);

        let take = match frame_cap {
            Some(cap) => (cap.saturating_sub(frames)).min(num_frames as u64) as usize,
            None => num_frames,
        };
        interleaved.extend_from_slice(&sample_buf.samples()[..take * packet_channels as usize]);
        frames += take as u64;

        if frame_cap.is_some_and(|cap| frames >= cap) {
            log::debug!("Frame cap of {} reached, stopping decode", frames);
            break;
        }
    }

    let (Some(sample_rate), Some(channels)) = (sample_rate, channels) else {
        return Err(ThumbnailError::UnreadableStream("missing sample rate or channel layout".into()));
    };
    if frames == 0 {
        return Err(ThumbnailError::EmptyStream);
    }

    log::info!(
        "Decoded audio: {} frames, {} channels, {}Hz, {:.1}s",
        frames,
        channels,
        sample_rate,
        frames as f64 / sample_rate as f64
    );

    PcmBuffer::new(interleaved, sample_rate, channels)
}
