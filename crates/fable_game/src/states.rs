//! Title screens: a timed splash and the main menu.

use std::cell::Cell;
use std::rc::Rc;

use crossbeam_channel::{unbounded, Receiver};
use fable_core::action::ActionStack;
use fable_core::coro::Coroutine;
use fable_core::game::{Context, State};
use fable_core::input::Event;
use fable_core::maths::Rect;
use fable_core::message::{Message, MessageFlags};
use fable_core::painter::Painter;

use crate::config::GameConfig;
use crate::play::PlayState;

const MENU_PLAY: usize = 1;
const MENU_QUIT: usize = 2;

/// Shows the title for a while; any key skips it.
pub struct SplashState {
    config: GameConfig,
    elapsed: u32,
    skipped: Rc<Cell<bool>>,
    skipper: Option<Coroutine<Event>>,
}

impl SplashState {
    pub fn new(config: GameConfig) -> Self {
        Self {
            config,
            elapsed: 0,
            skipped: Rc::new(Cell::new(false)),
            skipper: None,
        }
    }
}

impl State for SplashState {
    fn start(&mut self, ctx: &mut Context) {
        let waiters = ctx.waiters.clone();
        let skipped = self.skipped.clone();
        let spawned = ctx.spawn("splash.skip", self.config.coroutine_stack_size, move |co| {
            let key = waiters.key_pressed(co);
            log::debug!("splash skipped with {:?}", key);
            skipped.set(true);
        });

        match spawned {
            Ok(skipper) => {
                // Run up to its first wait so it is registered before any input;
                // the driver resumes it once a key is posted.
                skipper.resume(None);
                self.skipper = Some(skipper);
            }
            Err(err) => log::error!("splash cannot be skipped: {err}"),
        }
    }

    fn update(&mut self, ctx: &mut Context, ticks: u32) {
        self.elapsed += ticks;
        if self.elapsed >= self.config.splash_ms || self.skipped.get() {
            ctx.switch(Box::new(MenuState::new(self.config.clone())));
        }
    }

    fn draw(&mut self, painter: &mut dyn Painter) {
        let screen = Rect::new(0, 0, self.config.window.width, self.config.window.height);
        painter.set_color(self.config.message.background);
        painter.clear();

        let (w, h) = painter.text_size("fable");
        let at = screen.center(w, h);
        painter.draw_text("fable", self.config.message.color, at.x, at.y);
    }

    fn finish(&mut self) {
        self.skipper = None;
    }
}

/// Main menu: one question box, play or quit.
pub struct MenuState {
    config: GameConfig,
    actions: ActionStack,
    choice: Option<Receiver<usize>>,
}

impl MenuState {
    pub fn new(config: GameConfig) -> Self {
        Self {
            actions: ActionStack::new("menu", 2),
            config,
            choice: None,
        }
    }
}

impl State for MenuState {
    fn start(&mut self, _ctx: &mut Context) {
        let screen = Rect::new(0, 0, self.config.window.width, self.config.window.height);
        let (tx, rx) = unbounded();
        let mut message = Message::new(
            screen.center(200, 110),
            ["fable", "Play", "Quit"],
            MessageFlags::QUESTION | MessageFlags::FADEIN | MessageFlags::FADEOUT,
        )
        .with_style(self.config.message)
        .with_selectable((1 << MENU_PLAY) | (1 << MENU_QUIT))
        .with_reply(tx);
        message.selected = MENU_PLAY;

        if let Err(err) = self.actions.add(Box::new(message)) {
            log::error!("menu cannot open: {err}");
        }
        self.actions.start();
        self.choice = Some(rx);
    }

    fn handle(&mut self, _ctx: &mut Context, event: &Event) {
        self.actions.handle(event);
    }

    fn update(&mut self, ctx: &mut Context, ticks: u32) {
        self.actions.update(ticks);

        let Some(choice) = self.choice.as_ref().and_then(|rx| rx.try_recv().ok()) else {
            return;
        };
        match choice {
            MENU_PLAY => {
                log::info!("starting a new game");
                ctx.switch(Box::new(PlayState::new(self.config.clone())));
            }
            MENU_QUIT => ctx.quit(),
            other => log::warn!("menu returned unexpected line {}", other),
        }
    }

    fn draw(&mut self, painter: &mut dyn Painter) {
        painter.set_color(0x000000ff);
        painter.clear();
        self.actions.draw(painter);
    }

    fn finish(&mut self) {
        self.actions.finish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fable_core::game::Game;
    use fable_core::input::Key;
    use fable_core::painter::RecordingPainter;

    fn config() -> GameConfig {
        GameConfig {
            splash_ms: 100,
            ..GameConfig::default()
        }
    }

    fn step(game: &mut Game, events: &[Event], ticks: u32) -> RecordingPainter {
        let mut painter = RecordingPainter::new();
        game.frame(events.iter().copied(), ticks, &mut painter).unwrap();
        painter
    }

    fn key(key: Key) -> Event {
        Event::KeyDown { key }
    }

    #[test]
    fn splash_times_out_into_menu() {
        let mut game = Game::new();
        game.push(Box::new(SplashState::new(config()))).unwrap();

        let painter = step(&mut game, &[], 60);
        assert_eq!(painter.texts(), vec!["fable"]);
        step(&mut game, &[], 60);

        let painter = step(&mut game, &[], 0);
        assert_eq!(painter.texts(), vec!["fable", "Play", "Quit"]);
    }

    #[test]
    fn any_key_skips_splash() {
        let mut game = Game::new();
        game.push(Box::new(SplashState::new(config()))).unwrap();

        step(&mut game, &[key(Key::Space)], 0);
        let painter = step(&mut game, &[], 0);
        assert_eq!(painter.texts(), vec!["fable", "Play", "Quit"]);
        assert!(game.context().scheduler.is_empty());
    }

    #[test]
    fn menu_cursor_stops_at_the_title() {
        let mut game = Game::new();
        game.push(Box::new(MenuState::new(config()))).unwrap();

        // Up from Play reaches the title and stays there; one Down is Play again.
        let delay = config().message.delay;
        step(&mut game, &[], delay);
        step(
            &mut game,
            &[key(Key::Up), key(Key::Up), key(Key::Down), key(Key::Enter)],
            0,
        );
        step(&mut game, &[], delay);

        let painter = step(&mut game, &[], 0);
        assert!(painter.texts().iter().any(|text| text.starts_with("gold")));
    }

    #[test]
    fn menu_quit_stops_the_game() {
        let mut game = Game::new();
        game.push(Box::new(MenuState::new(config()))).unwrap();

        let delay = config().message.delay;
        step(&mut game, &[], delay);
        step(&mut game, &[key(Key::Down), key(Key::Enter)], 0);
        step(&mut game, &[], delay);
        assert!(!game.is_running());
    }

    #[test]
    fn menu_play_starts_the_game() {
        let mut game = Game::new();
        game.push(Box::new(MenuState::new(config()))).unwrap();

        let delay = config().message.delay;
        step(&mut game, &[], delay);
        step(&mut game, &[key(Key::Enter)], 0);
        step(&mut game, &[], delay);
        assert!(game.is_running());

        let painter = step(&mut game, &[], 0);
        assert!(painter.texts().iter().any(|text| text.starts_with("gold")));
    }
}
