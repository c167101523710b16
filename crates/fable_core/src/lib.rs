//! Core of the fable engine: the game loop, scripted coroutines and the
//! bounded record containers that host in-game behaviours.

pub mod action;
pub mod animation;
pub mod coro;
pub mod drawable;
pub mod game;
pub mod input;
pub mod maths;
pub mod message;
pub mod painter;
pub mod stack;
pub mod time;
pub mod waiters;

pub use action::{Action, ActionSpawner, ActionStack};
pub use coro::{CoroError, CoroState, Coroutine, Scheduler, Suspend};
pub use drawable::{Drawable, DrawableSpawner, DrawableStack};
pub use game::{Context, Game, GameError, Inhibit, Platform, State};
pub use input::{Event, Key, MouseBtn};
pub use maths::Rect;
pub use painter::{Painter, RecordingPainter, TextureId};
pub use stack::{Record, StackError};
