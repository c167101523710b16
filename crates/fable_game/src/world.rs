//! Shared play-field state the actions observe and mutate.

use std::cell::RefCell;
use std::rc::Rc;

use fable_core::game::Inhibit;
use fable_core::maths::Rect;
use glam::IVec2;

/// Size of the player sprite cell, used for proximity tests.
pub const PLAYER_SIZE: u32 = 16;

#[derive(Debug, Clone)]
pub struct Player {
    pub position: IVec2,
    pub direction: IVec2,
    /// Pixels per second.
    pub speed: i32,
    remainder: i32,
}

impl Player {
    pub fn new(position: IVec2, speed: i32) -> Self {
        Self {
            position,
            direction: IVec2::ZERO,
            speed,
            remainder: 0,
        }
    }

    pub fn is_moving(&self) -> bool {
        self.direction != IVec2::ZERO
    }

    pub fn stop(&mut self) {
        self.direction = IVec2::ZERO;
        self.remainder = 0;
    }

    /// Walk for `ticks` milliseconds. Sub-pixel progress carries over to the
    /// next step so slow frames and fast frames cover the same ground.
    pub fn step(&mut self, ticks: u32) {
        if !self.is_moving() {
            return;
        }
        let travel = self.remainder + self.speed * ticks as i32;
        let pixels = travel / 1000;
        self.remainder = travel % 1000;
        self.position += self.direction * pixels;
    }
}

pub struct World {
    pub screen: Rect,
    pub player: Player,
    /// Loop parts the play state should freeze, mirrored into the driver.
    pub inhibit: Inhibit,
    pub gold: u32,
    pub encounters: u32,
    /// Raised by the chest, polled by the guide script.
    pub chest_opened: bool,
}

pub type SharedWorld = Rc<RefCell<World>>;

impl World {
    pub fn new(screen: Rect, player: Player) -> Self {
        Self {
            screen,
            player,
            inhibit: Inhibit::empty(),
            gold: 0,
            encounters: 0,
            chest_opened: false,
        }
    }

    pub fn shared(self) -> SharedWorld {
        Rc::new(RefCell::new(self))
    }

    pub fn is_chest_opened(&self) -> bool {
        self.chest_opened
    }
}
