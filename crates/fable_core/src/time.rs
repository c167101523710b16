//! Frame pacing for the game loop.
//!
//! The loop is variable-step: every update receives the real duration of the
//! previous frame in milliseconds. [`FrameClock`] turns the configured
//! framerate into a frame budget, tells the loop how long to sleep when a frame
//! finished early, and keeps a smoothed FPS reading for diagnostics.

/// Used when the configuration leaves the framerate at zero.
pub const DEFAULT_FRAMERATE: u32 = 50;

/// Longest frame fed to `update`; anything slower is clamped.
pub const MAX_FRAME_MS: u32 = 250;

const FPS_SAMPLE_COUNT: usize = 60;

pub struct FrameClock {
    frametime: u32,
    pub frame_count: u64,
    /// Duration of the last completed frame, after clamping.
    pub last_frame_ms: u32,

    fps_samples: [u32; FPS_SAMPLE_COUNT],
    fps_sample_index: usize,
    pub smoothed_fps: f64,
    pub smoothed_frame_time_ms: f64,
}

impl FrameClock {
    pub fn new(framerate: u32) -> Self {
        let framerate = if framerate > 0 {
            framerate
        } else {
            DEFAULT_FRAMERATE
        };
        let frametime = 1000 / framerate;

        Self {
            frametime,
            frame_count: 0,
            last_frame_ms: 0,
            fps_samples: [frametime; FPS_SAMPLE_COUNT],
            fps_sample_index: 0,
            smoothed_fps: framerate as f64,
            smoothed_frame_time_ms: frametime as f64,
        }
    }

    /// Milliseconds budgeted per frame.
    pub fn frametime(&self) -> u32 {
        self.frametime
    }

    /// How long to sleep after `busy` milliseconds of work, if at all.
    pub fn remaining(&self, busy: u32) -> Option<u32> {
        (busy < self.frametime).then(|| self.frametime - busy)
    }

    /// Record the full duration of a frame (work plus sleep) and return the
    /// ticks to feed the next update.
    pub fn end_frame(&mut self, elapsed: u32) -> u32 {
        let elapsed = if elapsed > MAX_FRAME_MS {
            log::warn!(
                "frame took {}ms, capping update to {}ms",
                elapsed,
                MAX_FRAME_MS
            );
            MAX_FRAME_MS
        } else {
            elapsed
        };

        self.frame_count += 1;
        self.last_frame_ms = elapsed;

        self.fps_samples[self.fps_sample_index] = elapsed;
        self.fps_sample_index = (self.fps_sample_index + 1) % FPS_SAMPLE_COUNT;
        let avg_ms = self.fps_samples.iter().map(|&s| s as f64).sum::<f64>()
            / FPS_SAMPLE_COUNT as f64;
        self.smoothed_frame_time_ms = avg_ms;
        self.smoothed_fps = if avg_ms > 0.0 { 1000.0 / avg_ms } else { 0.0 };

        elapsed
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(DEFAULT_FRAMERATE)
    }
}
