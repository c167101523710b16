//! Game driver: a bounded stack of states and the main loop.
//!
//! Only the top state receives events, updates and draws. States never touch
//! the stack directly; they queue transitions on the [`Context`] they are
//! handed and the driver applies them once the callback returned.
//!
//! One frame runs in this order:
//!
//! 1. every pending event is posted to the coroutine waiting on its class,
//!    then handled by the top state;
//! 2. driver-owned coroutines that are new or have a queued payload are
//!    resumed, so they observe everything the events changed;
//! 3. the top state updates with the ticks of the previous frame;
//! 4. the top state draws and the frame is presented.

use bitflags::bitflags;
use thiserror::Error;

use crate::coro::{CoroResult, Coroutine, Scheduler, Suspend};
use crate::input::Event;
use crate::painter::Painter;
use crate::time::FrameClock;
use crate::waiters::EventWaiters;

pub const STATES_MAX: usize = 8;

/// Coroutines the driver resumes on its own during a frame.
pub const SCRIPTS_MAX: usize = 32;

bitflags! {
    /// Parts of the loop that are temporarily frozen.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Inhibit: u8 {
        const INPUT = 1 << 0;
        const UPDATE = 1 << 1;
        const DRAW = 1 << 2;
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GameError {
    #[error("no space in game states stack (capacity {capacity})")]
    StateStackFull { capacity: usize },
}

pub type GameResult<T> = Result<T, GameError>;

/// Hooks of one game screen. Everything is optional.
pub trait State {
    fn start(&mut self, _ctx: &mut Context) {}

    fn handle(&mut self, _ctx: &mut Context, _event: &Event) {}

    fn update(&mut self, _ctx: &mut Context, _ticks: u32) {}

    fn draw(&mut self, _painter: &mut dyn Painter) {}

    /// Another state was pushed on top of this one.
    fn suspend(&mut self, _ctx: &mut Context) {}

    /// The state above this one was popped.
    fn resume(&mut self, _ctx: &mut Context) {}

    /// Leaving the stack normally, before [`finish`](State::finish).
    fn end(&mut self, _ctx: &mut Context) {}

    /// Always called last, including on quit.
    fn finish(&mut self) {}
}

enum Request {
    Push(Box<dyn State>),
    Pop,
    Switch(Box<dyn State>),
    Quit,
}

/// Driver services reachable from state callbacks.
pub struct Context {
    pub inhibit: Inhibit,
    pub waiters: EventWaiters,
    pub scheduler: Scheduler,
    requests: Vec<Request>,
}

impl Context {
    fn new() -> Self {
        Self {
            inhibit: Inhibit::empty(),
            waiters: EventWaiters::new(),
            scheduler: Scheduler::new(SCRIPTS_MAX),
            requests: Vec::new(),
        }
    }

    /// Suspend the current state and start `state` above it.
    pub fn push(&mut self, state: Box<dyn State>) {
        self.requests.push(Request::Push(state));
    }

    /// End the current state and resume the one below.
    pub fn pop(&mut self) {
        self.requests.push(Request::Pop);
    }

    /// Spawn a coroutine the driver resumes on its own during its coroutine
    /// pass: first when it is new, then whenever a payload is posted to it.
    pub fn spawn<T, F>(
        &mut self,
        name: impl Into<String>,
        stack_size: usize,
        entry: F,
    ) -> CoroResult<Coroutine<T>>
    where
        T: 'static,
        F: FnOnce(&Suspend<'_, T>) + 'static,
    {
        let coroutine = Coroutine::spawn(name, stack_size, entry)?;
        self.scheduler.add(Box::new(coroutine.clone()))?;
        Ok(coroutine)
    }

    /// Replace the current state; waiting and driver-owned coroutines are
    /// detached.
    pub fn switch(&mut self, state: Box<dyn State>) {
        self.requests.push(Request::Switch(state));
    }

    pub fn quit(&mut self) {
        self.requests.push(Request::Quit);
    }
}

/// What the loop needs from the host: events, a painter and a clock.
pub trait Platform {
    fn poll_events(&mut self) -> Vec<Event>;

    fn painter(&mut self) -> &mut dyn Painter;

    /// Monotonic milliseconds.
    fn ticks(&self) -> u32;

    fn delay(&mut self, ms: u32);
}

pub struct Game {
    states: Vec<Box<dyn State>>,
    capacity: usize,
    ctx: Context,
}

impl Game {
    pub fn new() -> Self {
        Self::with_capacity(STATES_MAX)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            states: Vec::with_capacity(capacity),
            capacity,
            ctx: Context::new(),
        }
    }

    pub fn context(&mut self) -> &mut Context {
        &mut self.ctx
    }

    pub fn is_running(&self) -> bool {
        !self.states.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.states.len()
    }

    pub fn push(&mut self, mut state: Box<dyn State>) -> GameResult<()> {
        if self.states.len() >= self.capacity {
            return Err(GameError::StateStackFull {
                capacity: self.capacity,
            });
        }
        if let Some(top) = self.states.last_mut() {
            top.suspend(&mut self.ctx);
        }
        state.start(&mut self.ctx);
        self.states.push(state);
        log::debug!("state pushed (depth {})", self.states.len());
        self.apply_requests()
    }

    pub fn pop(&mut self) -> GameResult<()> {
        let Some(mut top) = self.states.pop() else {
            return Ok(());
        };
        top.end(&mut self.ctx);
        top.finish();
        if let Some(previous) = self.states.last_mut() {
            previous.resume(&mut self.ctx);
        }
        log::debug!("state popped (depth {})", self.states.len());
        self.apply_requests()
    }

    pub fn switch(&mut self, mut state: Box<dyn State>) -> GameResult<()> {
        self.ctx.waiters.detach_all();
        self.ctx.scheduler.clear();
        if let Some(mut top) = self.states.pop() {
            top.end(&mut self.ctx);
            top.finish();
        }
        state.start(&mut self.ctx);
        self.states.push(state);
        self.apply_requests()
    }

    /// Finish every state, top first, and abandon all scripts.
    pub fn quit(&mut self) {
        while let Some(mut state) = self.states.pop() {
            state.finish();
        }
        self.ctx.requests.clear();
        self.ctx.waiters.detach_all();
        self.ctx.scheduler.clear();
        log::info!("game stopped");
    }

    pub fn handle(&mut self, event: &Event) -> GameResult<()> {
        if *event == Event::Quit {
            self.quit();
            return Ok(());
        }
        if self.ctx.inhibit.contains(Inhibit::INPUT) {
            return Ok(());
        }

        self.ctx.waiters.dispatch(event);
        if let Some(top) = self.states.last_mut() {
            top.handle(&mut self.ctx, event);
        }
        self.apply_requests()
    }

    pub fn update(&mut self, ticks: u32) -> GameResult<()> {
        if self.ctx.inhibit.contains(Inhibit::UPDATE) {
            return Ok(());
        }
        if let Some(top) = self.states.last_mut() {
            top.update(&mut self.ctx, ticks);
        }
        self.apply_requests()
    }

    pub fn draw(&mut self, painter: &mut dyn Painter) {
        if self.ctx.inhibit.contains(Inhibit::DRAW) {
            return;
        }
        if let Some(top) = self.states.last_mut() {
            top.draw(painter);
            painter.present();
        }
    }

    /// Run one frame with the events collected since the previous one.
    pub fn frame<I>(&mut self, events: I, ticks: u32, painter: &mut dyn Painter) -> GameResult<()>
    where
        I: IntoIterator<Item = Event>,
    {
        for event in events {
            self.handle(&event)?;
            if !self.is_running() {
                return Ok(());
            }
        }

        let resumed = self.ctx.scheduler.run_pending();
        if resumed > 0 {
            log::trace!("resumed {} coroutine(s)", resumed);
        }

        self.update(ticks)?;
        self.draw(painter);
        Ok(())
    }

    /// Loop until no state remains, pacing frames with `clock`.
    pub fn run<P: Platform>(&mut self, platform: &mut P, clock: &mut FrameClock) -> GameResult<()> {
        let mut elapsed = 0;

        while self.is_running() {
            let start = platform.ticks();
            let events = platform.poll_events();
            self.frame(events, elapsed, platform.painter())?;

            if let Some(rest) = clock.remaining(platform.ticks().wrapping_sub(start)) {
                platform.delay(rest);
            }
            elapsed = clock.end_frame(platform.ticks().wrapping_sub(start));
        }

        log::info!(
            "loop ended after {} frames ({:.1} fps)",
            clock.frame_count,
            clock.smoothed_fps
        );
        Ok(())
    }

    fn apply_requests(&mut self) -> GameResult<()> {
        while !self.ctx.requests.is_empty() {
            let requests = std::mem::take(&mut self.ctx.requests);
            for request in requests {
                match request {
                    Request::Push(state) => self.push(state)?,
                    Request::Pop => self.pop()?,
                    Request::Switch(state) => self.switch(state)?,
                    Request::Quit => {
                        self.quit();
                        return Ok(());
                    }
                }
            }
        }
        Ok(())
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Game {
    fn drop(&mut self) {
        if self.is_running() {
            self.quit();
        }
    }
}
