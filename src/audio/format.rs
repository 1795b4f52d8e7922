/// Container identified from a clip's leading bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClipFormat {
    /// Ogg container holding an Opus stream, the native voice-message format.
    OggOpus,
    /// Ogg container holding some other codec (Vorbis, FLAC).
    OggOther,
    Wav,
    Flac,
    Mp3,
    Unknown,
}

impl ClipFormat {
    /// Extension hint for the decoder probe, for inputs without one.
    pub fn extension(self) -> Option<&'static str> {
        match self {
            ClipFormat::OggOpus | ClipFormat::OggOther => Some("ogg"),
            ClipFormat::Wav => Some("wav"),
            ClipFormat::Flac => Some("flac"),
            ClipFormat::Mp3 => Some("mp3"),
            ClipFormat::Unknown => None,
        }
    }

    /// Whether chat clients will play the clip inline as a voice message.
    /// Anything but Ogg Opus gets shown as a plain file attachment on most
    /// mobile clients.
    pub fn plays_as_voice_message(self) -> bool {
        matches!(self, ClipFormat::OggOpus)
    }
}

/// Identify the container from the first bytes of the clip.
///
/// Ogg Opus detection looks for the `OpusHead` id header inside the first
/// page; RFC 7845 puts it right after the 27-byte page header and the
/// segment table.
pub fn detect_format(bytes: &[u8]) -> ClipFormat {
    if bytes.starts_with(b"OggS") {
        let first_page = &bytes[..bytes.len().min(128)];
        if contains(first_page, b"OpusHead") {
            ClipFormat::OggOpus
        } else {
            ClipFormat::OggOther
        }
    } else if bytes.len() >= 12 && bytes.starts_with(b"RIFF") && &bytes[8..12] == b"WAVE" {
        ClipFormat::Wav
    } else if bytes.starts_with(b"fLaC") {
        ClipFormat::Flac
    } else if bytes.starts_with(b"ID3") || (bytes.len() >= 2 && bytes[0] == 0xFF && bytes[1] & 0xE0 == 0xE0) {
        ClipFormat::Mp3
    } else {
        ClipFormat::Unknown
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|window| window == needle)
}
