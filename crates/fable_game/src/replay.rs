//! Scripted input for headless runs: a JSON list of `{ "frame": n, "event": {...} }`.

use std::fs;
use std::path::Path;

use fable_core::input::Event;
use serde::Deserialize;

use crate::config::ConfigError;

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct ReplayEntry {
    pub frame: u64,
    pub event: Event,
}

#[derive(Debug, Clone)]
pub struct Replay {
    entries: Vec<ReplayEntry>,
    cursor: usize,
}

impl Replay {
    pub fn new(entries: Vec<ReplayEntry>) -> Result<Self, ConfigError> {
        validate_replay(&entries)?;
        Ok(Self { entries, cursor: 0 })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last_frame(&self) -> u64 {
        self.entries.last().map_or(0, |entry| entry.frame)
    }

    /// Events scheduled for `frame`. Frames must be asked for in increasing
    /// order; entries of skipped frames are dropped.
    pub fn events_for(&mut self, frame: u64) -> Vec<Event> {
        let mut out = Vec::new();
        while let Some(entry) = self.entries.get(self.cursor) {
            if entry.frame > frame {
                break;
            }
            if entry.frame == frame {
                out.push(entry.event);
            } else {
                log::warn!("replay entry for past frame {} dropped", entry.frame);
            }
            self.cursor += 1;
        }
        out
    }
}

pub fn load_replay_from_path(path: &Path) -> Result<Replay, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let entries: Vec<ReplayEntry> =
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    Replay::new(entries)
}

fn validate_replay(entries: &[ReplayEntry]) -> Result<(), ConfigError> {
    if entries.is_empty() {
        return Err(ConfigError::Invalid("replay has no entries".to_string()));
    }
    if let Some(pair) = entries.windows(2).find(|pair| pair[1].frame < pair[0].frame) {
        return Err(ConfigError::Invalid(format!(
            "replay frames go backwards ({} after {})",
            pair[1].frame, pair[0].frame
        )));
    }
    Ok(())
}
