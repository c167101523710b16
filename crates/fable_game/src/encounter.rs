//! Random encounters: counts down the distance the player walks and starts a
//! fight once a randomly drawn number of pixels has been covered.

use fable_core::action::Action;
use fable_core::stack::Record;
use glam::IVec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::EncounterConfig;
use crate::dialog::Dialogs;
use crate::world::SharedWorld;

pub struct EncounterSpawner {
    world: SharedWorld,
    dialogs: Dialogs,
    low: u32,
    high: u32,
    rng: StdRng,
    last: IVec2,
    steps: u32,
}

impl EncounterSpawner {
    pub fn new(world: SharedWorld, dialogs: Dialogs, config: EncounterConfig) -> Self {
        let mut rng = StdRng::seed_from_u64(config.seed);
        let steps = rng.gen_range(config.low..=config.high);
        let last = world.borrow().player.position;
        Self {
            world,
            dialogs,
            low: config.low,
            high: config.high,
            rng,
            last,
            steps,
        }
    }

    /// Pixels left to walk before the next encounter.
    pub fn steps(&self) -> u32 {
        self.steps
    }

    fn fight(&mut self) {
        let count = {
            let mut world = self.world.borrow_mut();
            world.encounters += 1;
            world.encounters
        };
        self.steps = self.rng.gen_range(self.low..=self.high);
        log::info!("encounter #{} (next in {} px)", count, self.steps);

        if let Err(err) = self.dialogs.notify("A wild slime appears!") {
            log::warn!("encounter message not shown: {err}");
        }
    }
}

impl Record for EncounterSpawner {
    fn update(&mut self, _ticks: u32) -> bool {
        let (moving, position) = {
            let world = self.world.borrow();
            (world.player.is_moving(), world.player.position)
        };

        if moving {
            let gap = (position - self.last).abs();
            let distance = ((gap.x + gap.y) as u32).min(self.steps);
            self.steps -= distance;
            self.last = position;

            if self.steps == 0 {
                self.fight();
            }
        }
        false
    }
}

impl Action for EncounterSpawner {}
