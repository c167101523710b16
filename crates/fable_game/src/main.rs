//! fable demo -- headless driver for the play field.
//!
//! The game runs against [`platform::HeadlessPlatform`]: input comes from an
//! optional replay file, drawing goes to a recording painter and the clock is
//! simulated, so a run is deterministic for a given config and replay.
//!
//! Usage: `fable_game [config.json]` (defaults to `assets/config.json`; a
//! missing file means built-in defaults).

mod chest;
mod config;
mod dialog;
mod encounter;
mod guide;
mod platform;
mod play;
mod replay;
mod states;
mod teleport;
mod world;

use std::path::{Path, PathBuf};

use fable_core::game::{Game, GameError};
use fable_core::time::FrameClock;
use thiserror::Error;

use config::{load_config_from_path, ConfigError, GameConfig};
use platform::HeadlessPlatform;
use replay::load_replay_from_path;
use states::SplashState;

const CONFIG_PATH: &str = "assets/config.json";

#[derive(Debug, Error)]
enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Game(#[from] GameError),
}

fn load_config(path: &Path) -> Result<GameConfig, ConfigError> {
    if !path.exists() {
        log::warn!("{} not found, using default config", path.display());
        return Ok(GameConfig::default());
    }
    let config = load_config_from_path(path)?;
    log::info!("loaded config from {}", path.display());
    Ok(config)
}

fn run(config_path: &Path) -> Result<(), AppError> {
    let config = load_config(config_path)?;

    let replay = match &config.replay {
        Some(path) => {
            let replay = load_replay_from_path(path)?;
            log::info!(
                "replaying {} events up to frame {} from {}",
                replay.len(),
                replay.last_frame(),
                path.display()
            );
            Some(replay)
        }
        None => None,
    };

    let mut platform = HeadlessPlatform::new(replay, config.frames_max);
    let mut clock = FrameClock::new(config.window.framerate);
    let mut game = Game::new();

    game.push(Box::new(SplashState::new(config)))?;
    game.run(&mut platform, &mut clock)?;

    log::info!(
        "{} frames polled, {} presented, {} draw commands",
        platform.frames(),
        platform.frames_presented(),
        platform.commands_total
    );
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(CONFIG_PATH));

    if let Err(err) = run(&config_path) {
        log::error!("{err}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_path(name_hint: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "fable_main_test_{}_{}_{}.json",
            name_hint,
            std::process::id(),
            nanos
        ))
    }

    #[test]
    fn headless_run_plays_a_replay_to_the_end() {
        let replay = temp_path("replay");
        fs::write(
            &replay,
            r#"[
                { "frame": 2, "event": { "type": "key_down", "key": "space" } },
                { "frame": 12, "event": { "type": "key_down", "key": "enter" } },
                { "frame": 30, "event": { "type": "key_down", "key": "right" } }
            ]"#,
        )
        .unwrap();

        let config = temp_path("config");
        let body = format!(
            r#"{{ "splash_ms": 100, "frames_max": 60, "replay": {} }}"#,
            serde_json::to_string(&replay.display().to_string()).unwrap()
        );
        fs::write(&config, body).unwrap();

        run(&config).unwrap();

        let _ = fs::remove_file(&replay);
        let _ = fs::remove_file(&config);
    }

    #[test]
    fn missing_config_falls_back_to_defaults() {
        let config = load_config(Path::new("definitely/not/here.json")).unwrap();
        assert_eq!(config.frames_max, GameConfig::default().frames_max);
    }

    #[test]
    fn broken_replay_is_an_error() {
        let replay = temp_path("broken_replay");
        fs::write(&replay, "[]").unwrap();
        let config = temp_path("broken_config");
        let body = format!(
            r#"{{ "replay": {} }}"#,
            serde_json::to_string(&replay.display().to_string()).unwrap()
        );
        fs::write(&config, body).unwrap();

        assert!(matches!(run(&config), Err(AppError::Config(_))));

        let _ = fs::remove_file(&replay);
        let _ = fs::remove_file(&config);
    }
}
