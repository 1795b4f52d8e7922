use anyhow::{Context, Result};

use crate::audio::decode;
use crate::audio::envelope::{self, Envelope};
use crate::message::descriptor::{VoiceAttachment, VoiceMessagePayload};

/// Knobs for one preparation run.
#[derive(Clone, Debug)]
pub struct ComposeOptions {
    /// Substitute the flat placeholder envelope instead of decoding.
    pub skip_metadata: bool,
    /// Attachment filename embedded in the descriptor.
    pub filename: String,
}

impl Default for ComposeOptions {
    fn default() -> Self {
        Self {
            skip_metadata: false,
            filename: "voice-message.ogg".to_string(),
        }
    }
}

/// Turn an encoded clip into an outbound voice-message payload.
///
/// With `skip_metadata` set the clip is never decoded and the placeholder
/// envelope goes out instead; long clips can then be attached without paying
/// for a decode.
pub fn prepare_voice_message(
    audio: Vec<u8>,
    extension: Option<&str>,
    options: &ComposeOptions,
) -> Result<VoiceMessagePayload> {
    if audio.is_empty() {
        anyhow::bail!("Voice message data is empty; nothing to prepare");
    }

    let envelope = if options.skip_metadata {
        log::info!("Envelope computation skipped, sending the flat placeholder");
        Envelope::placeholder()
    } else {
        let clip = decode::decode_clip(audio, extension).context("Failed to decode audio clip")?;
        let envelope = envelope::summarize(&clip.samples, clip.duration_seconds)?;
        log::info!(
            "Envelope: {} bins from {} samples at {}Hz",
            envelope.bins.len(),
            clip.samples.len(),
            clip.sample_rate
        );
        envelope
    };

    let attachment = VoiceAttachment::from_envelope(&envelope, &options.filename);
    Ok(VoiceMessagePayload::new(attachment))
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::prelude::BASE64_STANDARD;
    use base64::Engine as _;
    use ogg::writing::{PacketWriteEndInfo, PacketWriter};
    use opus::{Application, Channels, Encoder as OpusEncoder};

    /// Minimal PCM16 WAV: 44-byte header followed by interleaved samples.
    fn wav_fixture(sample_rate: u32, channels: u16, interleaved: &[f32]) -> Vec<u8> {
        let data_len = (interleaved.len() * 2) as u32;
        let block_align = channels * 2;
        let mut bytes = Vec::with_capacity(44 + data_len as usize);
        bytes.extend_from_slice(b"RIFF");
        bytes.extend_from_slice(&(36 + data_len).to_le_bytes());
        bytes.extend_from_slice(b"WAVE");
        bytes.extend_from_slice(b"fmt ");
        bytes.extend_from_slice(&16u32.to_le_bytes());
        bytes.extend_from_slice(&1u16.to_le_bytes()); // PCM
        bytes.extend_from_slice(&channels.to_le_bytes());
        bytes.extend_from_slice(&sample_rate.to_le_bytes());
        bytes.extend_from_slice(&(sample_rate * block_align as u32).to_le_bytes());
        bytes.extend_from_slice(&block_align.to_le_bytes());
        bytes.extend_from_slice(&16u16.to_le_bytes());
        bytes.extend_from_slice(b"data");
        bytes.extend_from_slice(&data_len.to_le_bytes());
        for &s in interleaved {
            let v = (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        bytes
    }

    fn waveform_bins(payload: &VoiceMessagePayload) -> Vec<u8> {
        BASE64_STANDARD
            .decode(&payload.attachments[0].waveform)
            .unwrap()
    }

    /// One second of mono audio encoded as Opus and framed into Ogg pages:
    /// id header page, comment header page, then 20 ms packets.
    fn ogg_opus_fixture(samples: &[f32]) -> Vec<u8> {
        let mut id_header = Vec::new();
        id_header.extend_from_slice(b"OpusHead");
        id_header.push(1); // version
        id_header.push(1); // channel count
        id_header.extend_from_slice(&312u16.to_le_bytes()); // pre-skip
        id_header.extend_from_slice(&48000u32.to_le_bytes());
        id_header.extend_from_slice(&0u16.to_le_bytes()); // output gain
        id_header.push(0); // channel mapping family

        let mut comment_header = Vec::new();
        comment_header.extend_from_slice(b"OpusTags");
        comment_header.extend_from_slice(&0u32.to_le_bytes()); // vendor length
        comment_header.extend_from_slice(&0u32.to_le_bytes()); // comment count

        let mut encoder = OpusEncoder::new(48000, Channels::Mono, Application::Voip).unwrap();

        let mut bytes = Vec::new();
        let mut writer = PacketWriter::new(&mut bytes);
        writer
            .write_packet(id_header, 1, PacketWriteEndInfo::EndPage, 0)
            .unwrap();
        writer
            .write_packet(comment_header, 1, PacketWriteEndInfo::EndPage, 0)
            .unwrap();

        let frames: Vec<&[f32]> = samples.chunks_exact(960).collect();
        let mut granule = 0u64;
        for (i, frame) in frames.iter().enumerate() {
            let packet = encoder.encode_vec_float(frame, 4000).unwrap();
            granule += 960;
            let end = if i == frames.len() - 1 {
                PacketWriteEndInfo::EndStream
            } else {
                PacketWriteEndInfo::NormalPacket
            };
            writer.write_packet(packet, 1, end, granule).unwrap();
        }
        drop(writer);
        bytes
    }

    #[test]
    fn empty_input_is_rejected() {
        let err = prepare_voice_message(Vec::new(), None, &ComposeOptions::default())
            .unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn undecodable_input_is_an_error() {
        let err = prepare_voice_message(vec![0xAB; 64], None, &ComposeOptions::default())
            .unwrap_err();
        assert!(err.to_string().contains("decode"));
    }

    #[test]
    fn skip_metadata_substitutes_placeholder() {
        let options = ComposeOptions {
            skip_metadata: true,
            ..ComposeOptions::default()
        };
        // Input bytes are never inspected when metadata is skipped.
        let payload = prepare_voice_message(vec![1, 2, 3], None, &options).unwrap();
        let attachment = &payload.attachments[0];
        assert_eq!(attachment.waveform, "AAAAAAAAAAAA");
        assert_eq!(attachment.duration_secs, 1.0);
        assert_eq!(payload.flags, 8192);
    }

    #[test]
    fn wav_clip_produces_envelope() {
        // Two seconds of constant half-scale tone at 8 kHz.
        let samples = vec![0.5f32; 16_000];
        let wav = wav_fixture(8000, 1, &samples);

        let options = ComposeOptions {
            filename: "clip.ogg".to_string(),
            ..ComposeOptions::default()
        };
        let payload = prepare_voice_message(wav, Some("wav"), &options).unwrap();

        let attachment = &payload.attachments[0];
        assert_eq!(attachment.filename, "clip.ogg");
        assert_eq!(attachment.duration_secs, 2.0);

        let bins = waveform_bins(&payload);
        assert_eq!(bins.len(), 32);
        assert!(bins.iter().all(|&b| b >= 254));
    }

    #[test]
    fn ogg_opus_clip_produces_envelope() {
        // One second of a 440 Hz tone at half scale.
        let samples: Vec<f32> = (0..48_000)
            .map(|i| (i as f32 * 440.0 * 2.0 * std::f32::consts::PI / 48_000.0).sin() * 0.5)
            .collect();
        let clip = ogg_opus_fixture(&samples);

        let payload =
            prepare_voice_message(clip, Some("ogg"), &ComposeOptions::default()).unwrap();
        let attachment = &payload.attachments[0];
        assert_eq!(attachment.duration_secs, 1.0);

        let bins = waveform_bins(&payload);
        assert_eq!(bins.len(), 32);
        // The loudest window normalizes to the ceiling.
        assert!(bins.iter().any(|&b| b >= 254));
        // A steady tone stays loud everywhere past the codec warm-up.
        assert!(bins[2..].iter().all(|&b| b >= 150));
    }

    #[test]
    fn stereo_clip_uses_primary_channel() {
        // Left: half scale then eighth scale. Right: silent throughout. A
        // downmix would halve the left level; the primary channel keeps it.
        let mut interleaved = Vec::with_capacity(32_000);
        for frame in 0..16_000 {
            let left = if frame < 8000 { 0.5f32 } else { 0.125 };
            interleaved.push(left);
            interleaved.push(0.0);
        }
        let wav = wav_fixture(8000, 2, &interleaved);

        let payload =
            prepare_voice_message(wav, Some("wav"), &ComposeOptions::default()).unwrap();
        let bins = waveform_bins(&payload);

        assert_eq!(bins.len(), 32);
        // Quantized 0.5 maps to raw 127 and normalizes to the ceiling.
        assert!(bins[..16].iter().all(|&b| b >= 254));
        // Quantized 0.125 maps to raw 31, scaled by 255/127.
        assert!(bins[16..].iter().all(|&b| b == 62));
    }
}
