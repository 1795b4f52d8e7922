mod cli;
mod config;
mod audio;
mod message;

use anyhow::{Context, Result};
use clap::Parser;

use cli::Cli;
use message::compose::{self, ComposeOptions};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let mut cli = Cli::parse();

    // Load config: explicit --config path, or auto-detect voicenote.toml / global config
    let config_path = cli.config.clone().or_else(|| {
        let local = std::path::PathBuf::from("voicenote.toml");
        if local.exists() {
            return Some(local);
        }
        if let Some(home) = dirs::home_dir() {
            let xdg = home.join(".config").join("voicenote").join("config.toml");
            if xdg.exists() {
                return Some(xdg);
            }
        }
        if let Some(config_dir) = dirs::config_dir() {
            let platform = config_dir.join("voicenote").join("config.toml");
            if platform.exists() {
                return Some(platform);
            }
        }
        None
    });
    if let Some(ref path) = config_path {
        if let Some(cfg) = config::load_config(path) {
            log::info!("Loaded config from {}", path.display());
            // Merge: config values apply only when CLI is at its default
            if !cli.skip_metadata { cli.skip_metadata = cfg.audio.skip_metadata; }
            if cli.filename == "voice-message.ogg" { cli.filename = cfg.message.filename; }
            if !cli.pretty { cli.pretty = cfg.output.pretty; }
        } else {
            log::warn!("Failed to load config from {}", path.display());
        }
    }

    let input = cli.input.as_ref().context("Input audio file is required")?;
    if !input.exists() {
        anyhow::bail!("Input file not found: {}", input.display());
    }

    log::info!("voicenote - voice message attachment builder");
    log::info!("Input: {}", input.display());

    // 1. Read the clip
    let bytes = std::fs::read(input)
        .with_context(|| format!("Failed to read audio file: {}", input.display()))?;

    // 2. Sniff the container; clients only play Ogg Opus inline
    let container = audio::format::detect_format(&bytes);
    log::info!("Container: {:?} ({} bytes)", container, bytes.len());
    if !container.plays_as_voice_message() {
        log::warn!(
            "Clip is {:?}, not Ogg Opus; most clients will show it as a plain file attachment",
            container
        );
    }

    // 3. Decode, summarize, and build the descriptor
    let extension = input
        .extension()
        .and_then(|e| e.to_str())
        .or_else(|| container.extension());
    let options = ComposeOptions {
        skip_metadata: cli.skip_metadata,
        filename: cli.filename.clone(),
    };
    let payload = compose::prepare_voice_message(bytes, extension, &options)?;

    // 4. Emit the descriptor JSON
    let json = if cli.pretty {
        serde_json::to_string_pretty(&payload)?
    } else {
        serde_json::to_string(&payload)?
    };

    match cli.output {
        Some(ref path) => {
            std::fs::write(path, &json)
                .with_context(|| format!("Failed to write descriptor: {}", path.display()))?;
            log::info!("Descriptor written to {}", path.display());
        }
        None => println!("{}", json),
    }

    let attachment = &payload.attachments[0];
    log::info!(
        "Done: {} ({})",
        attachment.filename,
        format_clip_length(attachment.duration_secs)
    );

    Ok(())
}

/// Clip length as m:ss, the way clients caption voice messages.
fn format_clip_length(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    format!("{}:{:02}", total / 60, total % 60)
}
