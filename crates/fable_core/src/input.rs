//! Input events and held-state tracking.
//!
//! [`Event`] is what the platform hands the driver each frame; it is dispatched
//! to states, records and waiting coroutines as-is.
//!
//! [`InputState`] folds the same events into queries:
//!
//! - **Level-triggered (held):** `is_held(key)` is true every frame the key is
//!   physically down. Used for continuous actions like walking.
//! - **Edge-triggered (just_pressed / just_released):** true only during the
//!   frame the transition happened, cleared by `end_frame()`.

use std::collections::HashSet;

use glam::IVec2;
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Key {
    Left,
    Right,
    Up,
    Down,
    Enter,
    Escape,
    Space,
    W,
    A,
    S,
    D,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseBtn {
    Left,
    Right,
    Middle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    Quit,
    KeyDown { key: Key },
    KeyUp { key: Key },
    MouseMove { x: i32, y: i32 },
    ClickDown { button: MouseBtn, x: i32, y: i32 },
    ClickUp { button: MouseBtn, x: i32, y: i32 },
}

impl Event {
    /// Pointer position carried by mouse events.
    pub fn position(&self) -> Option<IVec2> {
        match *self {
            Event::MouseMove { x, y }
            | Event::ClickDown { x, y, .. }
            | Event::ClickUp { x, y, .. } => Some(IVec2::new(x, y)),
            _ => None,
        }
    }

    pub fn is_key_down(&self, wanted: Key) -> bool {
        matches!(*self, Event::KeyDown { key } if key == wanted)
    }
}

pub struct InputState {
    held: HashSet<Key>,
    just_pressed: HashSet<Key>,
    just_released: HashSet<Key>,

    mouse_held: HashSet<MouseBtn>,
    mouse_just_pressed: HashSet<MouseBtn>,

    pub mouse_position: IVec2,
}

impl InputState {
    pub fn new() -> Self {
        Self {
            held: HashSet::new(),
            just_pressed: HashSet::new(),
            just_released: HashSet::new(),
            mouse_held: HashSet::new(),
            mouse_just_pressed: HashSet::new(),
            mouse_position: IVec2::ZERO,
        }
    }

    pub fn apply(&mut self, event: &Event) {
        match *event {
            Event::KeyDown { key } => {
                if self.held.insert(key) {
                    self.just_pressed.insert(key);
                }
            }
            Event::KeyUp { key } => {
                if self.held.remove(&key) {
                    self.just_released.insert(key);
                }
            }
            Event::MouseMove { x, y } => self.mouse_position = IVec2::new(x, y),
            Event::ClickDown { button, x, y } => {
                self.mouse_position = IVec2::new(x, y);
                if self.mouse_held.insert(button) {
                    self.mouse_just_pressed.insert(button);
                }
            }
            Event::ClickUp { button, x, y } => {
                self.mouse_position = IVec2::new(x, y);
                self.mouse_held.remove(&button);
            }
            Event::Quit => {}
        }
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    pub fn is_just_pressed(&self, key: Key) -> bool {
        self.just_pressed.contains(&key)
    }

    pub fn is_just_released(&self, key: Key) -> bool {
        self.just_released.contains(&key)
    }

    pub fn is_mouse_held(&self, btn: MouseBtn) -> bool {
        self.mouse_held.contains(&btn)
    }

    pub fn is_mouse_just_pressed(&self, btn: MouseBtn) -> bool {
        self.mouse_just_pressed.contains(&btn)
    }

    /// Unit direction from the held arrow/WASD keys.
    pub fn direction(&self) -> IVec2 {
        let mut dir = IVec2::ZERO;
        if self.is_held(Key::Left) || self.is_held(Key::A) {
            dir.x -= 1;
        }
        if self.is_held(Key::Right) || self.is_held(Key::D) {
            dir.x += 1;
        }
        if self.is_held(Key::Up) || self.is_held(Key::W) {
            dir.y -= 1;
        }
        if self.is_held(Key::Down) || self.is_held(Key::S) {
            dir.y += 1;
        }
        dir
    }

    pub fn end_frame(&mut self) {
        self.just_pressed.clear();
        self.just_released.clear();
        self.mouse_just_pressed.clear();
    }
}

impl Default for InputState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn down(key: Key) -> Event {
        Event::KeyDown { key }
    }

    fn up(key: Key) -> Event {
        Event::KeyUp { key }
    }

    #[test]
    fn test_key_down_sets_held_and_just_pressed() {
        let mut input = InputState::new();
        input.apply(&down(Key::A));
        assert!(input.is_held(Key::A));
        assert!(input.is_just_pressed(Key::A));
    }

    #[test]
    fn test_key_up_without_down_is_no_op() {
        let mut input = InputState::new();
        input.apply(&up(Key::Enter));
        assert!(!input.is_just_released(Key::Enter));
        assert!(!input.is_held(Key::Enter));
    }

    #[test]
    fn test_end_frame_keeps_held_keys() {
        let mut input = InputState::new();
        input.apply(&down(Key::Left));
        input.apply(&down(Key::Space));
        input.end_frame();
        assert!(!input.is_just_pressed(Key::Left));
        assert!(input.is_held(Key::Left));
        assert!(input.is_held(Key::Space));
    }

    #[test]
    fn test_click_tracks_position_and_button() {
        let mut input = InputState::new();
        input.apply(&Event::ClickDown {
            button: MouseBtn::Left,
            x: 40,
            y: 12,
        });
        assert!(input.is_mouse_held(MouseBtn::Left));
        assert!(input.is_mouse_just_pressed(MouseBtn::Left));
        assert_eq!(input.mouse_position, IVec2::new(40, 12));

        input.end_frame();
        input.apply(&Event::ClickUp {
            button: MouseBtn::Left,
            x: 41,
            y: 12,
        });
        assert!(!input.is_mouse_held(MouseBtn::Left));
    }

    #[test]
    fn test_direction_combines_keys() {
        let mut input = InputState::new();
        input.apply(&down(Key::Right));
        input.apply(&down(Key::W));
        assert_eq!(input.direction(), IVec2::new(1, -1));

        input.apply(&down(Key::Left));
        assert_eq!(input.direction().x, 0);
    }

    #[test]
    fn test_event_position_only_for_mouse() {
        assert_eq!(
            Event::MouseMove { x: 3, y: 4 }.position(),
            Some(IVec2::new(3, 4))
        );
        assert_eq!(down(Key::Enter).position(), None);
        assert!(down(Key::Enter).is_key_down(Key::Enter));
        assert!(!up(Key::Enter).is_key_down(Key::Enter));
    }

    #[test]
    fn test_event_deserializes_from_tagged_json() {
        let event: Event = serde_json::from_str(r#"{ "type": "key_down", "key": "enter" }"#)
            .expect("valid event json");
        assert_eq!(event, down(Key::Enter));
    }
}
