//! Scripted guide NPC.
//!
//! The dialogue is plain sequential code running in a coroutine that
//! [`GuideAction`] resumes once per update. The script opens its own message
//! boxes and yields frame after frame until the player answered, so a whole
//! conversation reads top to bottom in [`guide_script`].

use crossbeam_channel::{unbounded, TryRecvError};
use fable_core::action::Action;
use fable_core::coro::{CoroResult, Coroutine, Suspend};
use fable_core::stack::Record;

use crate::dialog::Dialogs;
use crate::world::SharedWorld;

/// Script-side handle; every call runs on the coroutine stack.
pub struct Script<'a> {
    co: &'a Suspend<'a, ()>,
    world: SharedWorld,
    dialogs: Dialogs,
}

impl Script<'_> {
    pub fn say(&self, lines: &[&str]) {
        self.ask(lines, 0);
    }

    /// Ask a question; returns the index of the chosen line.
    pub fn ask(&self, lines: &[&str], selectable: u32) -> usize {
        let (reply, choice) = unbounded();
        let lines = lines.iter().map(|line| line.to_string()).collect();
        if let Err(err) = self.dialogs.open(lines, selectable, Some(reply)) {
            log::error!("guide dialog not shown: {err}");
            return 0;
        }

        loop {
            match choice.try_recv() {
                Ok(line) => return line,
                Err(TryRecvError::Empty) => self.co.yield_now(),
                Err(TryRecvError::Disconnected) => {
                    log::debug!("guide dialog closed without an answer");
                    return 0;
                }
            }
        }
    }

    pub fn reward(&self, gold: u32) {
        self.world.borrow_mut().gold += gold;
        log::info!("guide gave {} gold", gold);
    }

    /// Yield frame after frame until the chest has been opened.
    pub fn chest_opened(&self) {
        while !self.world.borrow().is_chest_opened() {
            self.co.yield_now();
        }
    }
}

pub fn guide_script(script: &Script<'_>) {
    script.say(&["Hello traveller!", "The old chest to the east is yours."]);

    let answer = script.ask(
        &["Shall I tell you about the portal?", "Yes please", "No thanks"],
        0b110,
    );
    if answer == 1 {
        script.say(&["Step on the portal and", "it will carry you home."]);
    } else {
        script.say(&["As you wish."]);
    }

    script.chest_opened();
    script.say(&["You opened it! Take this as well."]);
    script.reward(5);
}

pub struct GuideAction {
    coroutine: Coroutine<()>,
}

impl GuideAction {
    pub fn spawn<F>(
        stack_size: usize,
        world: SharedWorld,
        dialogs: Dialogs,
        body: F,
    ) -> CoroResult<Self>
    where
        F: FnOnce(&Script<'_>) + 'static,
    {
        let coroutine = Coroutine::spawn("guide", stack_size, move |co: &Suspend<'_, ()>| {
            let script = Script { co, world, dialogs };
            body(&script);
        })?;
        Ok(Self { coroutine })
    }
}

impl Record for GuideAction {
    fn update(&mut self, _ticks: u32) -> bool {
        if !self.coroutine.is_done() {
            self.coroutine.resume(None);
        }
        self.coroutine.is_done()
    }

    fn finish(self: Box<Self>) {
        if !self.coroutine.is_done() {
            log::debug!("guide script abandoned mid-dialogue");
        }
    }
}

impl Action for GuideAction {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{Player, World};
    use fable_core::action::ActionStack;
    use fable_core::coro::DEFAULT_STACK_SIZE;
    use fable_core::input::{Event, Key};
    use fable_core::maths::Rect;
    use fable_core::message::MessageStyle;
    use fable_core::painter::RecordingPainter;
    use glam::IVec2;

    fn world() -> SharedWorld {
        World::new(Rect::new(0, 0, 640, 480), Player::new(IVec2::ZERO, 100)).shared()
    }

    fn press(stack: &mut ActionStack, key: Key) {
        stack.handle(&Event::KeyDown { key });
    }

    /// Let the current message finish opening, confirm it and let it close.
    fn confirm(stack: &mut ActionStack) {
        stack.update(MessageStyle::LIGHT.delay);
        press(stack, Key::Enter);
        stack.update(MessageStyle::LIGHT.delay);
    }

    fn texts(stack: &mut ActionStack) -> Vec<String> {
        let mut painter = RecordingPainter::new();
        stack.draw(&mut painter);
        painter.texts().into_iter().map(str::to_string).collect()
    }

    #[test]
    fn dialogue_follows_the_answers() {
        let world = world();
        let mut stack = ActionStack::new("actions", 4);
        let dialogs = Dialogs::new(stack.spawner(), MessageStyle::LIGHT, world.borrow().screen);
        let guide = GuideAction::spawn(DEFAULT_STACK_SIZE, world.clone(), dialogs, guide_script)
            .unwrap();
        stack.add(Box::new(guide)).unwrap();

        // First update starts the script, which opens the greeting.
        stack.update(0);
        assert_eq!(texts(&mut stack)[0], "Hello traveller!");
        confirm(&mut stack);

        // The reply reaches the script on the next update.
        stack.update(0);
        assert_eq!(texts(&mut stack)[1], "Yes please");
        stack.update(MessageStyle::LIGHT.delay);
        press(&mut stack, Key::Down);
        press(&mut stack, Key::Down);
        press(&mut stack, Key::Enter);
        stack.update(MessageStyle::LIGHT.delay);

        stack.update(0);
        assert_eq!(texts(&mut stack), vec!["As you wish."]);
        confirm(&mut stack);

        // Waiting on the chest: the script yields every frame.
        for _ in 0..5 {
            assert!(!stack.update(16));
        }
        assert!(texts(&mut stack).is_empty());

        world.borrow_mut().chest_opened = true;
        stack.update(0);
        assert_eq!(texts(&mut stack), vec!["You opened it! Take this as well."]);
        confirm(&mut stack);

        assert!(stack.update(0));
        assert_eq!(world.borrow().gold, 5);
    }

    #[test]
    fn first_answer_explains_the_portal() {
        let world = world();
        let mut stack = ActionStack::new("actions", 4);
        let dialogs = Dialogs::new(stack.spawner(), MessageStyle::LIGHT, world.borrow().screen);
        let guide = GuideAction::spawn(DEFAULT_STACK_SIZE, world.clone(), dialogs, guide_script)
            .unwrap();
        stack.add(Box::new(guide)).unwrap();

        stack.update(0);
        confirm(&mut stack);
        stack.update(0);

        // The cursor starts on the question line; one Down is the first answer.
        stack.update(MessageStyle::LIGHT.delay);
        press(&mut stack, Key::Down);
        press(&mut stack, Key::Enter);
        stack.update(MessageStyle::LIGHT.delay);

        stack.update(0);
        assert_eq!(
            texts(&mut stack),
            vec!["Step on the portal and", "it will carry you home."]
        );
    }

    #[test]
    fn dropping_the_stack_abandons_the_script() {
        let world = world();
        let mut stack = ActionStack::new("actions", 1);
        let dialogs = Dialogs::new(stack.spawner(), MessageStyle::LIGHT, world.borrow().screen);
        let guide = GuideAction::spawn(DEFAULT_STACK_SIZE, world.clone(), dialogs, |script| {
            script.chest_opened();
            script.reward(100);
        })
        .unwrap();
        stack.add(Box::new(guide)).unwrap();

        stack.update(0);
        stack.update(0);
        drop(stack);
        assert_eq!(world.borrow().gold, 0);
    }

    #[test]
    fn full_stack_does_not_stall_the_script() {
        let world = world();
        // No room for the dialog next to the guide itself.
        let mut stack = ActionStack::new("actions", 1);
        let dialogs = Dialogs::new(stack.spawner(), MessageStyle::LIGHT, world.borrow().screen);
        let guide = GuideAction::spawn(DEFAULT_STACK_SIZE, world.clone(), dialogs, |script| {
            script.say(&["unseen"]);
            script.reward(1);
        })
        .unwrap();
        stack.add(Box::new(guide)).unwrap();

        // The script gives up on the dialog and runs to the end at once.
        assert!(stack.update(0));
        assert_eq!(world.borrow().gold, 1);
    }
}
