//! The play field: the player walks around a chest, a teleport pad and a guide
//! while random encounters count down.

use fable_core::action::{Action, ActionStack};
use fable_core::animation::{Animation, AnimationDrawable, Sprite};
use fable_core::drawable::DrawableStack;
use fable_core::game::{Context, Inhibit, State};
use fable_core::input::{Event, InputState, Key};
use fable_core::maths::Rect;
use fable_core::painter::{Painter, TextureId};
use glam::IVec2;

use crate::chest::Chest;
use crate::config::GameConfig;
use crate::dialog::Dialogs;
use crate::encounter::EncounterSpawner;
use crate::guide::{guide_script, GuideAction};
use crate::states::MenuState;
use crate::teleport::Teleport;
use crate::world::{Player, SharedWorld, World, PLAYER_SIZE};

const CHEST_TEXTURE: TextureId = TextureId(1);
const SPARKLE_TEXTURE: TextureId = TextureId(2);

/// Pixels per second.
const PLAYER_SPEED: i32 = 120;

const CHEST_SPRITE: Sprite = Sprite {
    texture: CHEST_TEXTURE,
    cell_w: 16,
    cell_h: 16,
    nrows: 1,
    ncols: 4,
};

const SPARKLE_SPRITE: Sprite = Sprite {
    texture: SPARKLE_TEXTURE,
    cell_w: 16,
    cell_h: 16,
    nrows: 2,
    ncols: 3,
};

pub struct PlayState {
    config: GameConfig,
    world: SharedWorld,
    actions: ActionStack,
    effects: DrawableStack,
    input: InputState,
    frozen: bool,
}

impl PlayState {
    pub fn new(config: GameConfig) -> Self {
        let screen = Rect::new(0, 0, config.window.width, config.window.height);
        let spawn = IVec2::new(screen.w as i32 / 2, screen.h as i32 / 2);
        let world = World::new(screen, Player::new(spawn, PLAYER_SPEED)).shared();

        Self {
            actions: ActionStack::new("actions", config.actions_max),
            effects: DrawableStack::new("effects", config.drawables_max),
            world,
            input: InputState::new(),
            frozen: false,
            config,
        }
    }

    pub fn world(&self) -> &SharedWorld {
        &self.world
    }

    pub fn chest_position(&self) -> IVec2 {
        let screen = self.world.borrow().screen;
        IVec2::new(screen.w as i32 * 3 / 4, screen.h as i32 / 2)
    }

    pub fn teleport_area(&self) -> Rect {
        let screen = self.world.borrow().screen;
        Rect::new(32, screen.h as i32 - 64, 32, 32)
    }

    fn add(&mut self, action: Box<dyn Action>) {
        if let Err(err) = self.actions.add(action) {
            log::error!("play field: {err}");
        }
    }

    fn populate(&mut self) {
        let screen = self.world.borrow().screen;
        let dialogs = Dialogs::new(self.actions.spawner(), self.config.message, screen);

        let chest_at = self.chest_position();
        let effects = self.effects.spawner();
        let notify = dialogs.clone();
        let chest = Chest::new(chest_at, Animation::new(CHEST_SPRITE, 80), self.world.clone())
            .on_open(move |world| {
                world.gold += 10;
                let sparkle = AnimationDrawable::new(
                    Animation::new(SPARKLE_SPRITE, 50),
                    chest_at - IVec2::new(0, 16),
                );
                if let Err(err) = effects.add(Box::new(sparkle)) {
                    log::warn!("chest sparkle skipped: {err}");
                }
                if let Err(err) = notify.notify("You found 10 gold!") {
                    log::warn!("chest message skipped: {err}");
                }
            });
        self.add(Box::new(chest));

        let home = IVec2::new(screen.w as i32 / 2, screen.h as i32 / 2);
        let teleport = Teleport::new(self.teleport_area(), home, self.world.clone());
        self.add(Box::new(teleport));

        let encounters =
            EncounterSpawner::new(self.world.clone(), dialogs.clone(), self.config.encounters);
        self.add(Box::new(encounters));

        match GuideAction::spawn(
            self.config.coroutine_stack_size,
            self.world.clone(),
            dialogs,
            guide_script,
        ) {
            Ok(guide) => self.add(Box::new(guide)),
            Err(err) => log::error!("guide unavailable: {err}"),
        }
    }
}

impl State for PlayState {
    fn start(&mut self, _ctx: &mut Context) {
        self.populate();
        self.actions.start();
        log::info!(
            "play field ready ({}/{} actions)",
            self.actions.len(),
            self.actions.capacity()
        );
    }

    fn handle(&mut self, ctx: &mut Context, event: &Event) {
        self.input.apply(event);

        if event.is_key_down(Key::Escape) {
            ctx.switch(Box::new(MenuState::new(self.config.clone())));
            return;
        }
        self.actions.handle(event);
    }

    fn update(&mut self, ctx: &mut Context, ticks: u32) {
        {
            let mut world = self.world.borrow_mut();
            if world.inhibit.contains(Inhibit::INPUT) {
                world.player.stop();
            } else {
                world.player.direction = self.input.direction();
            }
            world.player.step(ticks);
        }

        self.actions.update(ticks);
        self.effects.update(ticks);

        let inhibit = self.world.borrow().inhibit;
        let frozen = inhibit.contains(Inhibit::INPUT);
        if self.frozen && !frozen {
            // Releases that happened while frozen were never delivered.
            self.input = InputState::new();
        }
        self.frozen = frozen;
        ctx.inhibit = inhibit;
        self.input.end_frame();
    }

    fn draw(&mut self, painter: &mut dyn Painter) {
        painter.set_color(0x2d5a27ff);
        painter.clear();

        let (position, gold) = {
            let world = self.world.borrow();
            (world.player.position, world.gold)
        };
        painter.set_color(0xe0c050ff);
        painter.fill_rect(Rect::new(position.x, position.y, PLAYER_SIZE, PLAYER_SIZE));

        self.effects.draw(painter);
        self.actions.draw(painter);
        painter.draw_text(&format!("gold: {gold}"), 0xffffffff, 8, 8);
    }

    fn finish(&mut self) {
        self.actions.finish();
        self.effects.finish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fable_core::game::Game;
    use fable_core::painter::{DrawCommand, RecordingPainter};

    fn config() -> GameConfig {
        GameConfig {
            encounters: crate::config::EncounterConfig {
                low: 10_000,
                high: 10_000,
                seed: 1,
            },
            ..GameConfig::default()
        }
    }

    fn start() -> (Game, PlayState) {
        (Game::new(), PlayState::new(config()))
    }

    fn step(game: &mut Game, events: &[Event], ticks: u32) -> RecordingPainter {
        let mut painter = RecordingPainter::new();
        game.frame(events.iter().copied(), ticks, &mut painter).unwrap();
        painter
    }

    #[test]
    fn held_key_walks_the_player() {
        let (mut game, play) = start();
        let world = play.world().clone();
        let origin = world.borrow().player.position;
        game.push(Box::new(play)).unwrap();

        step(&mut game, &[Event::KeyDown { key: Key::Right }], 0);
        step(&mut game, &[], 1000);
        assert_eq!(world.borrow().player.position, origin + IVec2::new(120, 0));

        step(&mut game, &[Event::KeyUp { key: Key::Right }], 0);
        step(&mut game, &[], 1000);
        assert_eq!(world.borrow().player.position, origin + IVec2::new(120, 0));
    }

    #[test]
    fn enter_next_to_chest_pays_out() {
        let (mut game, play) = start();
        let world = play.world().clone();
        let chest_at = play.chest_position();
        game.push(Box::new(play)).unwrap();

        // The guide greets first; its box ignores input while opening.
        step(&mut game, &[], 0);
        world.borrow_mut().player.position = chest_at - IVec2::new(8, 0);
        step(&mut game, &[Event::KeyDown { key: Key::Enter }], 0);

        for _ in 0..5 {
            step(&mut game, &[], 100);
        }
        let world = world.borrow();
        assert_eq!(world.gold, 10);
        assert!(world.is_chest_opened());
    }

    #[test]
    fn teleport_freezes_input_until_arrival() {
        let (mut game, play) = start();
        let world = play.world().clone();
        let area = play.teleport_area();
        let home = world.borrow().player.position;
        game.push(Box::new(play)).unwrap();

        world.borrow_mut().player.position = area.origin() + IVec2::new(4, 4);
        step(&mut game, &[], 0);
        assert!(game.context().inhibit.contains(Inhibit::INPUT));

        let mut frames = 0;
        while game.context().inhibit.contains(Inhibit::INPUT) {
            let painter = step(&mut game, &[Event::KeyDown { key: Key::Left }], 10);
            let fading = painter
                .commands
                .iter()
                .any(|cmd| matches!(cmd, DrawCommand::SetAlpha { .. }));
            assert_eq!(fading, game.context().inhibit.contains(Inhibit::INPUT));
            frames += 1;
            assert!(frames < 100, "teleport never finished");
        }
        assert_eq!(world.borrow().player.position, home);
    }

    #[test]
    fn escape_goes_back_to_menu() {
        let (mut game, play) = start();
        game.push(Box::new(play)).unwrap();

        step(&mut game, &[Event::KeyDown { key: Key::Escape }], 0);
        let painter = step(&mut game, &[], 0);
        assert!(painter.texts().contains(&"Play"));
    }
}
