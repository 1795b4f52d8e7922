use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "voicenote", about = "Voice-message waveform and attachment descriptor builder")]
pub struct Cli {
    /// Input audio clip (OGG/Opus, WAV, MP3, FLAC)
    pub input: Option<PathBuf>,

    /// Write the descriptor JSON here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Skip envelope computation and send the flat placeholder waveform
    #[arg(long)]
    pub skip_metadata: bool,

    /// Attachment filename recorded in the descriptor
    #[arg(long, default_value = "voice-message.ogg")]
    pub filename: String,

    /// Pretty-print the descriptor JSON
    #[arg(long)]
    pub pretty: bool,

    /// Config file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}
