//! Headless host: replayed input, a recording painter and a simulated clock.

use fable_core::game::Platform;
use fable_core::input::Event;
use fable_core::painter::{Painter, RecordingPainter};

use crate::replay::Replay;

pub struct HeadlessPlatform {
    replay: Option<Replay>,
    frame: u64,
    frames_max: u64,
    now: u32,
    painter: RecordingPainter,
    pub commands_total: usize,
}

impl HeadlessPlatform {
    pub fn new(replay: Option<Replay>, frames_max: u64) -> Self {
        Self {
            replay,
            frame: 0,
            frames_max,
            now: 0,
            painter: RecordingPainter::new(),
            commands_total: 0,
        }
    }

    pub fn frames(&self) -> u64 {
        self.frame
    }

    pub fn frames_presented(&self) -> u64 {
        self.painter.frames_presented()
    }
}

impl Platform for HeadlessPlatform {
    fn poll_events(&mut self) -> Vec<Event> {
        if self.frame > 0 {
            let count = self.painter.take_frame();
            self.commands_total += count;
            log::debug!("frame {}: {} draw commands", self.frame - 1, count);
        }

        let frame = self.frame;
        self.frame += 1;

        if frame >= self.frames_max {
            log::info!("headless run reached {} frames", self.frames_max);
            return vec![Event::Quit];
        }
        self.replay
            .as_mut()
            .map(|replay| replay.events_for(frame))
            .unwrap_or_default()
    }

    fn painter(&mut self) -> &mut dyn Painter {
        &mut self.painter
    }

    fn ticks(&self) -> u32 {
        self.now
    }

    fn delay(&mut self, ms: u32) {
        self.now = self.now.wrapping_add(ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replay::ReplayEntry;
    use fable_core::input::Key;

    #[test]
    fn quits_after_frames_max() {
        let mut platform = HeadlessPlatform::new(None, 2);
        assert!(platform.poll_events().is_empty());
        assert!(platform.poll_events().is_empty());
        assert_eq!(platform.poll_events(), vec![Event::Quit]);
    }

    #[test]
    fn replays_events_on_their_frame() {
        let replay = Replay::new(vec![ReplayEntry {
            frame: 1,
            event: Event::KeyDown { key: Key::Enter },
        }])
        .unwrap();
        let mut platform = HeadlessPlatform::new(Some(replay), 10);
        assert!(platform.poll_events().is_empty());
        assert_eq!(
            platform.poll_events(),
            vec![Event::KeyDown { key: Key::Enter }]
        );
    }

    #[test]
    fn delay_advances_the_clock() {
        let mut platform = HeadlessPlatform::new(None, 1);
        platform.delay(20);
        platform.delay(20);
        assert_eq!(platform.ticks(), 40);
    }

    #[test]
    fn counts_commands_between_frames() {
        let mut platform = HeadlessPlatform::new(None, 10);
        platform.poll_events();
        platform.painter().clear();
        platform.painter().present();
        platform.poll_events();
        assert_eq!(platform.commands_total, 2);
        assert_eq!(platform.frames_presented(), 1);
    }
}
