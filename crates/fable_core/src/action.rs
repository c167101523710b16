//! Actions: records that also receive input events.

use crate::input::Event;
use crate::stack::{Record, Spawner, Stack};

/// A record that reacts to events in addition to updating and drawing.
pub trait Action: Record {
    /// Called when the owning stack is started.
    fn start(&mut self) {}

    fn handle(&mut self, _event: &Event) {}
}

pub type ActionStack = Stack<dyn Action>;
pub type ActionSpawner = Spawner<dyn Action>;

impl Stack<dyn Action> {
    pub fn start(&mut self) {
        self.flush();
        for action in self.records_mut() {
            action.start();
        }
    }

    /// Forward `event` to every action in slot order.
    pub fn handle(&mut self, event: &Event) {
        self.flush();
        for action in self.records_mut() {
            action.handle(event);
        }
        self.flush();
    }
}
