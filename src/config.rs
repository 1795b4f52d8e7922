use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub message: MessageConfig,
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize)]
pub struct MessageConfig {
    #[serde(default = "default_filename")]
    pub filename: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct AudioConfig {
    #[serde(default)]
    pub skip_metadata: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub pretty: bool,
}

impl Default for MessageConfig {
    fn default() -> Self {
        Self {
            filename: default_filename(),
        }
    }
}

fn default_filename() -> String { "voice-message.ogg".into() }

pub fn load_config(path: &PathBuf) -> Option<Config> {
    let content = std::fs::read_to_string(path).ok()?;
    toml::from_str(&content).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.message.filename, "voice-message.ogg");
        assert!(!config.audio.skip_metadata);
        assert!(!config.output.pretty);
    }

    #[test]
    fn partial_config_overrides_some_fields() {
        let config: Config = toml::from_str(
            r#"
            [audio]
            skip_metadata = true

            [message]
            filename = "note.ogg"
            "#,
        )
        .unwrap();
        assert_eq!(config.message.filename, "note.ogg");
        assert!(config.audio.skip_metadata);
        assert!(!config.output.pretty);
    }
}
