//! Drawables: positioned records without event handling, e.g. visual effects
//! that play out and disappear on their own.

use glam::IVec2;

use crate::stack::{Record, Spawner, Stack};

pub trait Drawable: Record {
    fn position(&self) -> IVec2;
}

pub type DrawableStack = Stack<dyn Drawable>;
pub type DrawableSpawner = Spawner<dyn Drawable>;
