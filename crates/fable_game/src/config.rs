use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use fable_core::coro::DEFAULT_STACK_SIZE;
use fable_core::message::MessageStyle;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("validation failed: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
    /// Frames per second; zero falls back to the engine default.
    pub framerate: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            framerate: 50,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EncounterConfig {
    /// Fewest pixels walked between two encounters.
    pub low: u32,
    pub high: u32,
    pub seed: u64,
}

impl Default for EncounterConfig {
    fn default() -> Self {
        Self {
            low: 300,
            high: 900,
            seed: 0x5eed,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub window: WindowConfig,
    pub actions_max: usize,
    pub drawables_max: usize,
    pub coroutine_stack_size: usize,
    pub message: MessageStyle,
    pub encounters: EncounterConfig,
    pub splash_ms: u32,
    pub replay: Option<PathBuf>,
    /// The headless run quits after this many frames.
    pub frames_max: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            actions_max: 16,
            drawables_max: 16,
            coroutine_stack_size: DEFAULT_STACK_SIZE,
            message: MessageStyle::default(),
            encounters: EncounterConfig::default(),
            splash_ms: 1000,
            replay: None,
            frames_max: 600,
        }
    }
}

pub fn load_config_from_path(path: &Path) -> Result<GameConfig, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config: GameConfig = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &GameConfig) -> Result<(), ConfigError> {
    if config.window.width == 0 || config.window.height == 0 {
        return Err(ConfigError::Invalid(format!(
            "window must not be empty ({}x{})",
            config.window.width, config.window.height
        )));
    }
    if config.actions_max == 0 || config.drawables_max == 0 {
        return Err(ConfigError::Invalid(
            "actions_max and drawables_max must be > 0".to_string(),
        ));
    }
    if config.encounters.low > config.encounters.high {
        return Err(ConfigError::Invalid(format!(
            "encounters.low ({}) is above encounters.high ({})",
            config.encounters.low, config.encounters.high
        )));
    }
    if config.frames_max == 0 {
        return Err(ConfigError::Invalid("frames_max must be > 0".to_string()));
    }
    if config.window.framerate == 0 {
        log::warn!("framerate is zero, the loop falls back to its default");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_file_path(name_hint: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "fable_config_test_{}_{}_{}.json",
            name_hint,
            std::process::id(),
            nanos
        ))
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let path = temp_file_path("partial");
        fs::write(
            &path,
            r#"{ "window": { "framerate": 30 }, "message": { "delay": 80 } }"#,
        )
        .expect("write config file");

        let config = load_config_from_path(&path).expect("config should load");
        assert_eq!(config.window.framerate, 30);
        assert_eq!(config.window.width, 640);
        assert_eq!(config.message.delay, 80);
        assert_eq!(config.message.timeout, 5000);
        assert_eq!(config.coroutine_stack_size, DEFAULT_STACK_SIZE);
        assert!(config.replay.is_none());

        let _ = fs::remove_file(path);
    }

    #[test]
    fn rejects_inverted_encounter_range() {
        let path = temp_file_path("encounters");
        fs::write(&path, r#"{ "encounters": { "low": 50, "high": 10 } }"#)
            .expect("write config file");

        let err = load_config_from_path(&path).expect_err("range must be rejected");
        assert!(err.to_string().contains("encounters.low"));

        let _ = fs::remove_file(path);
    }

    #[test]
    fn rejects_empty_window() {
        let path = temp_file_path("window");
        fs::write(&path, r#"{ "window": { "width": 0 } }"#).expect("write config file");

        assert!(matches!(
            load_config_from_path(&path),
            Err(ConfigError::Invalid(_))
        ));

        let _ = fs::remove_file(path);
    }

    #[test]
    fn reports_parse_errors_with_path() {
        let path = temp_file_path("broken");
        fs::write(&path, "{ not json").expect("write config file");

        let err = load_config_from_path(&path).expect_err("broken json");
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("fable_config_test_broken"));

        let _ = fs::remove_file(path);
    }

    #[test]
    fn missing_file_is_io_error() {
        let path = temp_file_path("missing");
        assert!(matches!(
            load_config_from_path(&path),
            Err(ConfigError::Io { .. })
        ));
    }
}
