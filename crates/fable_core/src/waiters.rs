//! Coroutines parked on a class of input event.
//!
//! A script coroutine registers itself for, say, the next key press and
//! suspends. When the driver sees a matching event it clears the slot and
//! posts the event to the waiter; the driver's coroutine pass resumes it later
//! in the same frame, after every event was handled. The waiter may register
//! again from inside that resumption.

use std::cell::{RefCell, RefMut};
use std::rc::Rc;

use glam::IVec2;

use crate::coro::{CoroState, Coroutine, Suspend};
use crate::input::{Event, Key, MouseBtn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOn {
    KeyPressed,
    KeyReleased,
    MouseMoved,
    Click,
}

impl WaitOn {
    pub fn of(event: &Event) -> Option<WaitOn> {
        match event {
            Event::KeyDown { .. } => Some(WaitOn::KeyPressed),
            Event::KeyUp { .. } => Some(WaitOn::KeyReleased),
            Event::MouseMove { .. } => Some(WaitOn::MouseMoved),
            Event::ClickDown { .. } => Some(WaitOn::Click),
            Event::ClickUp { .. } | Event::Quit => None,
        }
    }
}

#[derive(Default)]
struct Slots {
    key_pressed: Option<Coroutine<Event>>,
    key_released: Option<Coroutine<Event>>,
    mouse_moved: Option<Coroutine<Event>>,
    click: Option<Coroutine<Event>>,
}

impl Slots {
    fn get(&mut self, class: WaitOn) -> &mut Option<Coroutine<Event>> {
        match class {
            WaitOn::KeyPressed => &mut self.key_pressed,
            WaitOn::KeyReleased => &mut self.key_released,
            WaitOn::MouseMoved => &mut self.mouse_moved,
            WaitOn::Click => &mut self.click,
        }
    }
}

/// One waiter slot per event class, shared between the driver and scripts.
#[derive(Clone, Default)]
pub struct EventWaiters {
    slots: Rc<RefCell<Slots>>,
}

impl EventWaiters {
    pub fn new() -> Self {
        Self::default()
    }

    fn slots(&self) -> RefMut<'_, Slots> {
        self.slots.borrow_mut()
    }

    pub fn is_waiting(&self, class: WaitOn) -> bool {
        self.slots().get(class).is_some()
    }

    /// Park `waiter` on `class`, replacing any previous waiter.
    pub fn register(&self, class: WaitOn, waiter: Coroutine<Event>) {
        let previous = self.slots().get(class).replace(waiter);
        if let Some(previous) = previous {
            log::warn!(
                "coroutine '{}' no longer waits on {:?}",
                previous.name(),
                class
            );
        }
    }

    /// Post `event` to the coroutine waiting on its class, if any. Returns
    /// whether a coroutine received it.
    pub fn dispatch(&self, event: &Event) -> bool {
        let Some(class) = WaitOn::of(event) else {
            return false;
        };
        let Some(waiter) = self.slots().get(class).take() else {
            return false;
        };

        if waiter.state() != CoroState::Suspended {
            log::warn!(
                "coroutine '{}' registered on {:?} but is {:?}",
                waiter.name(),
                class,
                waiter.state()
            );
            return false;
        }
        waiter.post(*event);
        true
    }

    /// Forget every waiter. Coroutines with no other handle are abandoned.
    pub fn detach_all(&self) {
        let detached = std::mem::take(&mut *self.slots());
        drop(detached);
    }

    /// Register the calling coroutine on `class` and suspend until an event of
    /// that class arrives.
    pub fn await_event(&self, co: &Suspend<'_, Event>, class: WaitOn) -> Event {
        self.register(class, co.current());
        co.wait()
    }

    pub fn key_pressed(&self, co: &Suspend<'_, Event>) -> Key {
        loop {
            if let Event::KeyDown { key } = self.await_event(co, WaitOn::KeyPressed) {
                return key;
            }
        }
    }

    pub fn key_released(&self, co: &Suspend<'_, Event>) -> Key {
        loop {
            if let Event::KeyUp { key } = self.await_event(co, WaitOn::KeyReleased) {
                return key;
            }
        }
    }

    pub fn mouse_moved(&self, co: &Suspend<'_, Event>) -> IVec2 {
        loop {
            if let Event::MouseMove { x, y } = self.await_event(co, WaitOn::MouseMoved) {
                return IVec2::new(x, y);
            }
        }
    }

    pub fn click(&self, co: &Suspend<'_, Event>) -> (MouseBtn, IVec2) {
        loop {
            if let Event::ClickDown { button, x, y } = self.await_event(co, WaitOn::Click) {
                return (button, IVec2::new(x, y));
            }
        }
    }
}
