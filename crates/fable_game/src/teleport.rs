//! Teleport pad: touching it freezes input and fades the screen to black,
//! then moves the player and completes.

use fable_core::action::Action;
use fable_core::game::Inhibit;
use fable_core::maths::Rect;
use fable_core::painter::Painter;
use fable_core::stack::Record;
use glam::IVec2;

use crate::world::{SharedWorld, PLAYER_SIZE};

/// Milliseconds between two fade steps.
const FADE_STEP_MS: u32 = 10;
const FADE_STEP_ALPHA: u8 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Touch,
    FadeOut,
}

pub struct Teleport {
    pub area: Rect,
    pub destination: IVec2,
    world: SharedWorld,
    phase: Phase,
    alpha: u8,
    elapsed: u32,
}

impl Teleport {
    pub fn new(area: Rect, destination: IVec2, world: SharedWorld) -> Self {
        Self {
            area,
            destination,
            world,
            phase: Phase::Touch,
            alpha: 0,
            elapsed: 0,
        }
    }

    pub fn alpha(&self) -> u8 {
        self.alpha
    }

    fn update_touch(&mut self) -> bool {
        let reach = Rect::new(
            self.area.x - PLAYER_SIZE as i32,
            self.area.y - PLAYER_SIZE as i32,
            self.area.w + PLAYER_SIZE,
            self.area.h + PLAYER_SIZE,
        );

        let mut world = self.world.borrow_mut();
        if reach.contains(world.player.position) {
            log::info!("teleport to {} triggered", self.destination);
            world.player.stop();
            world.inhibit.insert(Inhibit::INPUT);
            self.phase = Phase::FadeOut;
        }
        false
    }

    fn update_fadeout(&mut self, ticks: u32) -> bool {
        self.elapsed += ticks;

        if self.elapsed >= FADE_STEP_MS {
            if self.alpha == u8::MAX {
                let mut world = self.world.borrow_mut();
                world.player.position = self.destination;
                world.inhibit.remove(Inhibit::INPUT);
                return true;
            }
            self.elapsed = 0;
            self.alpha = self.alpha.saturating_add(FADE_STEP_ALPHA);
        }
        false
    }
}

impl Record for Teleport {
    fn update(&mut self, ticks: u32) -> bool {
        match self.phase {
            Phase::Touch => self.update_touch(),
            Phase::FadeOut => self.update_fadeout(ticks),
        }
    }

    fn draw(&self, painter: &mut dyn Painter) {
        if self.phase != Phase::FadeOut {
            return;
        }

        let screen = self.world.borrow().screen;
        let overlay = painter.create_target(screen.w, screen.h);
        painter.begin_target(overlay);
        painter.set_color(0x000000ff);
        painter.clear();
        painter.end_target();
        painter.set_alpha(overlay, self.alpha);
        painter.blit_scaled(overlay, Rect::new(0, 0, screen.w, screen.h), screen);
        painter.destroy_texture(overlay);
    }

    fn finish(self: Box<Self>) {
        // Torn down mid-fade: give input back.
        if self.phase == Phase::FadeOut {
            self.world.borrow_mut().inhibit.remove(Inhibit::INPUT);
        }
    }
}

impl Action for Teleport {}
