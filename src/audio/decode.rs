use anyhow::{Context, Result};
use ogg::reading::PacketReader;
use opus::{Channels, Decoder as OpusDecoder};
use std::io::Cursor;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use super::format::{detect_format, ClipFormat};

/// Opus always decodes at 48 kHz regardless of the encoded rate.
const OPUS_SAMPLE_RATE: u32 = 48_000;
/// Largest Opus frame at 48 kHz: 120 ms per channel.
const MAX_FRAME_SAMPLES: usize = 5760;

/// Primary-channel samples of a decoded clip plus the duration the decoder
/// reports for them.
pub struct DecodedClip {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub duration_seconds: f64,
}

/// Decode an in-memory clip to primary-channel samples.
///
/// Ogg Opus goes through libopus directly; everything else goes through the
/// symphonia probe, with `extension` as a format hint when the input path
/// had one.
pub fn decode_clip(bytes: Vec<u8>, extension: Option<&str>) -> Result<DecodedClip> {
    if detect_format(&bytes) == ClipFormat::OggOpus {
        return decode_ogg_opus(&bytes);
    }
    decode_with_symphonia(bytes, extension)
}

fn decode_ogg_opus(bytes: &[u8]) -> Result<DecodedClip> {
    let mut reader = PacketReader::new(Cursor::new(bytes));

    // Id header: channel layout lives at byte 9 (RFC 7845, section 5.1).
    let head = reader
        .read_packet()
        .context("Malformed Ogg stream")?
        .context("Ogg stream has no packets")?;
    let channels = if head.data.len() >= 10 && head.data.starts_with(b"OpusHead") {
        (head.data[9] as usize).clamp(1, 2)
    } else {
        1
    };
    let layout = if channels == 2 {
        Channels::Stereo
    } else {
        Channels::Mono
    };
    let mut decoder =
        OpusDecoder::new(OPUS_SAMPLE_RATE, layout).context("Failed to create Opus decoder")?;

    // Comment header (OpusTags) carries no audio.
    let _ = reader.read_packet().context("Malformed Ogg stream")?;

    let mut samples: Vec<f32> = Vec::new();
    let mut pcm = vec![0.0f32; MAX_FRAME_SAMPLES * 2];

    while let Some(packet) = reader.read_packet().context("Malformed Ogg stream")? {
        match decoder.decode_float(&packet.data, &mut pcm, false) {
            Ok(frames) => {
                samples.extend(pcm[..frames * channels].chunks(channels).map(|frame| frame[0]));
            }
            Err(e) => log::warn!("Skipping undecodable Opus packet: {}", e),
        }
    }

    let duration_seconds = samples.len() as f64 / OPUS_SAMPLE_RATE as f64;

    log::info!(
        "Decoded Opus clip: {} samples, {}Hz, {:.1}s",
        samples.len(),
        OPUS_SAMPLE_RATE,
        duration_seconds
    );

    Ok(DecodedClip {
        samples,
        sample_rate: OPUS_SAMPLE_RATE,
        duration_seconds,
    })
}

fn decode_with_symphonia(bytes: Vec<u8>, extension: Option<&str>) -> Result<DecodedClip> {
    let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = extension {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .context("Failed to probe audio format")?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != symphonia::core::codecs::CODEC_TYPE_NULL)
        .context("No audio tracks found")?;

    let track_id = track.id;
    let channels = track.codec_params.channels.map_or(1, |c| c.count()).max(1);
    let sample_rate = track.codec_params.sample_rate.context("Unknown sample rate")?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .context("Failed to create audio decoder")?;

    let mut samples: Vec<f32> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(symphonia::core::errors::Error::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => return Err(e.into()),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(symphonia::core::errors::Error::DecodeError(_)) => continue,
            Err(e) => return Err(e.into()),
        };

        let spec = *decoded.spec();
        let num_frames = decoded.frames();

        let mut sample_buf = SampleBuffer::<f32>::new(num_frames as u64, spec);
        sample_buf.copy_interleaved_ref(decoded);

        // Keep the primary channel; the envelope is drawn from one channel,
        // not a downmix.
        let interleaved = sample_buf.samples();
        if channels == 1 {
            samples.extend_from_slice(interleaved);
        } else {
            samples.extend(interleaved.chunks(channels).map(|frame| frame[0]));
        }
    }

    let duration_seconds = samples.len() as f64 / sample_rate as f64;

    log::info!(
        "Decoded clip: {} samples, {}Hz, {:.1}s",
        samples.len(),
        sample_rate,
        duration_seconds
    );

    Ok(DecodedClip {
        samples,
        sample_rate,
        duration_seconds,
    })
}
