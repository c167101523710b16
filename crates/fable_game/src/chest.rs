//! Treasure chest: Enter next to it, or a click on it, plays the opening
//! animation and then runs the open callback. The chest stays on the map, so
//! it never completes.

use fable_core::action::Action;
use fable_core::animation::Animation;
use fable_core::input::Event;
use fable_core::input::Key;
use fable_core::maths::Rect;
use fable_core::painter::Painter;
use fable_core::stack::Record;
use glam::IVec2;

use crate::world::{SharedWorld, World, PLAYER_SIZE};

/// Extra pixels around the chest where the player still counts as near.
const TOLERANCE: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChestState {
    Closed,
    Animating,
    Opened,
}

pub struct Chest {
    pub position: IVec2,
    animation: Animation,
    state: ChestState,
    world: SharedWorld,
    on_open: Option<Box<dyn FnMut(&mut World)>>,
}

impl Chest {
    pub fn new(position: IVec2, animation: Animation, world: SharedWorld) -> Self {
        Self {
            position,
            animation,
            state: ChestState::Closed,
            world,
            on_open: None,
        }
    }

    pub fn on_open(mut self, callback: impl FnMut(&mut World) + 'static) -> Self {
        self.on_open = Some(Box::new(callback));
        self
    }

    pub fn state(&self) -> ChestState {
        self.state
    }

    fn bounds(&self) -> Rect {
        let sprite = &self.animation.sprite;
        Rect::new(self.position.x, self.position.y, sprite.cell_w, sprite.cell_h)
    }

    fn is_near(&self) -> bool {
        let bounds = self.bounds();
        let reach = Rect::new(
            bounds.x - (PLAYER_SIZE + TOLERANCE) as i32,
            bounds.y - (PLAYER_SIZE + TOLERANCE) as i32,
            bounds.w + PLAYER_SIZE + TOLERANCE * 2,
            bounds.h + PLAYER_SIZE + TOLERANCE * 2,
        );
        reach.contains(self.world.borrow().player.position)
    }

    fn invoke(&mut self) {
        log::debug!("chest at {} opening", self.position);
        self.state = ChestState::Animating;
        self.animation.start();
    }
}

impl Record for Chest {
    fn update(&mut self, ticks: u32) -> bool {
        if self.state == ChestState::Animating && self.animation.update(ticks) {
            self.state = ChestState::Opened;

            let mut world = self.world.borrow_mut();
            world.chest_opened = true;
            if let Some(callback) = self.on_open.as_mut() {
                callback(&mut *world);
            }
        }
        false
    }

    fn draw(&self, painter: &mut dyn Painter) {
        let IVec2 { x, y } = self.position;
        match self.state {
            ChestState::Closed => self.animation.sprite.draw(painter, 0, 0, x, y),
            ChestState::Animating => self.animation.draw(painter, x, y),
            ChestState::Opened => self.animation.sprite.draw_last(painter, x, y),
        }
    }
}

impl Action for Chest {
    fn handle(&mut self, event: &Event) {
        if self.state != ChestState::Closed || !self.is_near() {
            return;
        }

        match *event {
            Event::KeyDown { key: Key::Enter } => self.invoke(),
            Event::ClickDown { x, y, .. } if self.bounds().contains(IVec2::new(x, y)) => {
                self.invoke()
            }
            _ => {}
        }
    }
}
