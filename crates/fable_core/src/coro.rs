//! Stackful cooperative coroutines.
//!
//! Every coroutine owns a dedicated execution stack of a fixed size and runs on
//! the driver's thread: [`Coroutine::resume`] switches onto that stack and
//! returns once the body suspends or finishes, so exactly one side runs at any
//! instant and nothing needs to be `Send`.
//!
//! Because the whole call tree of the body lives on its own stack, suspension
//! works from any call depth: a helper three frames below the entry point may
//! loop on [`Suspend::yield_now`] without the entry point knowing about it.
//!
//! Payloads are typed. The body of a `Coroutine<T>` receives a [`Suspend<T>`]
//! and reads `T` values with [`Suspend::wait`]; they are delivered with
//! `resume(Some(..))` or [`Coroutine::post`]. A payload delivered while the body
//! is not waiting stays queued for its next `wait`.
//!
//! Lifecycle: `New -> Running <-> Suspended -> Done`. A coroutine that never
//! reaches `Done` is torn down by [`Coroutine::abandon`] or when its last handle
//! is dropped: its stack unwinds (destructors run) without executing the rest of
//! the body.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::rc::{Rc, Weak};

use corosensei::stack::DefaultStack;
use corosensei::{CoroutineResult, Yielder};
use thiserror::Error;

/// Stack size used by scripts that do not ask for a specific one.
pub const DEFAULT_STACK_SIZE: usize = 256 * 1024;

/// Smaller requests are raised to this; the body needs room for its own frames.
pub const MIN_STACK_SIZE: usize = 16 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoroState {
    /// Spawned, body not entered yet.
    New,
    /// Currently executing.
    Running,
    /// Parked in `yield_now` or `wait`.
    Suspended,
    /// Body returned, panicked or was abandoned.
    Done,
}

#[derive(Debug, Error)]
pub enum CoroError {
    #[error("unable to allocate {stack_size} bytes of stack for coroutine '{name}': {source}")]
    OutOfMemory {
        name: String,
        stack_size: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("max coroutines ({capacity}) exceeded")]
    TooManyCoroutines { capacity: usize },
}

pub type CoroResult<T> = Result<T, CoroError>;

type Fiber = corosensei::Coroutine<(), (), (), DefaultStack>;

struct Inner<T> {
    name: String,
    state: Cell<CoroState>,
    mailbox: RefCell<Option<T>>,
    fiber: RefCell<Option<Fiber>>,
}

impl<T> Inner<T> {
    /// Unwind a parked coroutine without running the rest of its body.
    fn teardown(&self) {
        let fiber = self.fiber.borrow_mut().take();
        self.state.set(CoroState::Done);
        self.mailbox.borrow_mut().take();
        // Dropping a started fiber unwinds its stack.
        drop(fiber);
        log::debug!("coroutine '{}' abandoned", self.name);
    }
}

impl<T> Drop for Inner<T> {
    fn drop(&mut self) {
        if self.state.get() == CoroState::Suspended {
            log::debug!("coroutine '{}' dropped while suspended", self.name);
        }
    }
}

/// Handle to a coroutine. Cloning shares the same coroutine.
pub struct Coroutine<T> {
    inner: Rc<Inner<T>>,
}

impl<T> Clone for Coroutine<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for Coroutine<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Coroutine")
            .field("name", &self.inner.name)
            .field("state", &self.inner.state.get())
            .finish()
    }
}

impl<T: 'static> Coroutine<T> {
    /// Allocate a stack and install `entry` as the body. The body does not run
    /// until the first [`resume`](Self::resume).
    pub fn spawn<F>(name: impl Into<String>, stack_size: usize, entry: F) -> CoroResult<Self>
    where
        F: FnOnce(&Suspend<'_, T>) + 'static,
    {
        let name = name.into();
        let stack_size = if stack_size < MIN_STACK_SIZE {
            log::debug!(
                "coroutine '{}': stack of {} bytes raised to {}",
                name,
                stack_size,
                MIN_STACK_SIZE
            );
            MIN_STACK_SIZE
        } else {
            stack_size
        };

        let stack = DefaultStack::new(stack_size).map_err(|source| CoroError::OutOfMemory {
            name: name.clone(),
            stack_size,
            source,
        })?;

        let inner = Rc::new(Inner {
            name,
            state: Cell::new(CoroState::New),
            mailbox: RefCell::new(None),
            fiber: RefCell::new(None),
        });

        // The body only holds a weak reference so dropping the last handle can
        // still tear the stack down.
        let weak = Rc::downgrade(&inner);
        let fiber = Fiber::with_stack(stack, move |yielder: &Yielder<(), ()>, ()| {
            let suspend = Suspend {
                yielder,
                inner: weak,
            };
            entry(&suspend);
        });
        *inner.fiber.borrow_mut() = Some(fiber);
        log::trace!("coroutine '{}' spawned ({} bytes of stack)", inner.name, stack_size);

        Ok(Self { inner })
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn state(&self) -> CoroState {
        self.inner.state.get()
    }

    pub fn is_done(&self) -> bool {
        self.state() == CoroState::Done
    }

    /// Whether the driver should resume it: it has not started yet, or it is
    /// parked and a payload is queued for it.
    pub fn resumable(&self) -> bool {
        match self.state() {
            CoroState::New => true,
            CoroState::Suspended => self.inner.mailbox.borrow().is_some(),
            CoroState::Running | CoroState::Done => false,
        }
    }

    /// Queue a payload without transferring control. The next `wait` in the
    /// body observes it.
    pub fn post(&self, data: T) {
        if self.is_done() {
            log::debug!("coroutine '{}': payload posted after completion dropped", self.inner.name);
            return;
        }
        if self.inner.mailbox.borrow_mut().replace(data).is_some() {
            log::debug!("coroutine '{}': pending payload overwritten", self.inner.name);
        }
    }

    /// Deliver `data` (if any) and run the coroutine until it next suspends or
    /// finishes. Returns the state it stopped in.
    ///
    /// # Panics
    ///
    /// Panics if the coroutine is running or done, and re-raises any panic that
    /// escaped the body.
    pub fn resume(&self, data: Option<T>) -> CoroState {
        let state = self.state();
        assert!(
            matches!(state, CoroState::New | CoroState::Suspended),
            "coroutine '{}' resumed while {:?}",
            self.inner.name,
            state
        );
        if let Some(data) = data {
            self.post(data);
        }
        self.inner.state.set(CoroState::Running);

        let result = {
            let mut fiber = self.inner.fiber.borrow_mut();
            let Some(fiber) = fiber.as_mut() else {
                self.inner.state.set(CoroState::Done);
                panic!("coroutine '{}' lost its stack", self.inner.name);
            };
            panic::catch_unwind(AssertUnwindSafe(|| fiber.resume(())))
        };

        match result {
            Ok(CoroutineResult::Yield(())) => {
                self.inner.state.set(CoroState::Suspended);
            }
            Ok(CoroutineResult::Return(())) => {
                self.inner.teardown_finished();
                log::trace!("coroutine '{}' finished", self.inner.name);
            }
            Err(payload) => {
                self.inner.teardown_finished();
                log::error!("coroutine '{}' panicked", self.inner.name);
                panic::resume_unwind(payload);
            }
        }

        self.state()
    }

    /// Tear the coroutine down without running the remainder of its body.
    ///
    /// # Panics
    ///
    /// Panics when called on a running coroutine (i.e. from its own body).
    pub fn abandon(self) {
        match self.state() {
            CoroState::Running => panic!("coroutine '{}' abandoned while running", self.inner.name),
            CoroState::Done => {}
            CoroState::New | CoroState::Suspended => self.inner.teardown(),
        }
    }
}

impl<T> Inner<T> {
    fn teardown_finished(&self) {
        self.state.set(CoroState::Done);
        let fiber = self.fiber.borrow_mut().take();
        self.mailbox.borrow_mut().take();
        drop(fiber);
    }
}

/// The body's side of a coroutine, handed to the entry closure.
pub struct Suspend<'a, T> {
    yielder: &'a Yielder<(), ()>,
    inner: Weak<Inner<T>>,
}

impl<T: 'static> Suspend<'_, T> {
    /// Hand control back to the resumer.
    pub fn yield_now(&self) {
        self.yielder.suspend(());
    }

    /// Suspend until a payload is delivered, then return it. Returns
    /// immediately if one is already queued.
    pub fn wait(&self) -> T {
        loop {
            let pending = self
                .inner
                .upgrade()
                .and_then(|inner| inner.mailbox.borrow_mut().take());
            if let Some(data) = pending {
                return data;
            }
            self.yielder.suspend(());
        }
    }

    /// Handle to this coroutine, for helpers that register it as the waiter
    /// of some event class.
    ///
    /// # Panics
    ///
    /// Panics if no handle to the coroutine is left, which cannot happen while
    /// a resumer is running it.
    pub fn current(&self) -> Coroutine<T> {
        let inner = self
            .inner
            .upgrade()
            .unwrap_or_else(|| panic!("coroutine resumed without a live handle"));
        Coroutine { inner }
    }

    pub fn name(&self) -> String {
        self.inner
            .upgrade()
            .map(|inner| inner.name.clone())
            .unwrap_or_default()
    }
}

/// Type-erased view of a coroutine, so coroutines of different payload types
/// can share one scheduler.
pub trait Task {
    fn name(&self) -> &str;
    fn resumable(&self) -> bool;
    fn is_done(&self) -> bool;
    fn resume_pending(&self) -> CoroState;
}

impl<T: 'static> Task for Coroutine<T> {
    fn name(&self) -> &str {
        Coroutine::name(self)
    }

    fn resumable(&self) -> bool {
        Coroutine::resumable(self)
    }

    fn is_done(&self) -> bool {
        Coroutine::is_done(self)
    }

    fn resume_pending(&self) -> CoroState {
        self.resume(None)
    }
}

/// Bounded set of coroutines the driver resumes once per frame when they are
/// resumable.
pub struct Scheduler {
    tasks: Vec<Box<dyn Task>>,
    capacity: usize,
}

impl Scheduler {
    pub fn new(capacity: usize) -> Self {
        Self {
            tasks: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn add(&mut self, task: Box<dyn Task>) -> CoroResult<()> {
        if self.tasks.len() >= self.capacity {
            return Err(CoroError::TooManyCoroutines {
                capacity: self.capacity,
            });
        }
        self.tasks.push(task);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Resume every resumable coroutine once, then forget finished ones.
    /// Returns how many were resumed.
    pub fn run_pending(&mut self) -> usize {
        let mut resumed = 0;
        for task in &self.tasks {
            if task.resumable() {
                task.resume_pending();
                resumed += 1;
            }
        }
        self.tasks.retain(|task| {
            let done = task.is_done();
            if done {
                log::trace!("scheduler: dropping finished coroutine '{}'", task.name());
            }
            !done
        });
        resumed
    }

    /// Abandon every coroutine that has no other handle.
    pub fn clear(&mut self) {
        self.tasks.clear();
    }
}
