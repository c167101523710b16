//! Fixed-capacity slot containers for per-frame records.
//!
//! A [`Stack`] hosts up to `capacity` boxed records in an array of slots. The
//! capacity is a resource budget chosen by the caller: adding to a full stack
//! fails with [`StackError::CapacityExceeded`] instead of growing.
//!
//! Lifecycle per record:
//!
//! 1. `update(ticks)` each frame; returning `true` signals completion.
//! 2. On completion, in the same pass: `end`, then `finish`, then the slot is
//!    cleared. This happens exactly once.
//! 3. When the stack itself is finished (or dropped) every remaining record
//!    gets `end` then `finish`.
//!
//! Records may add new records while one of their callbacks runs through a
//! [`Spawner`]. Such additions are capacity-checked immediately and land in
//! free slots once the running pass completes, so they are drawn in the same
//! frame and updated from the next one on.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use thiserror::Error;

use crate::painter::Painter;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StackError {
    #[error("no space in {name} stack (capacity {capacity})")]
    CapacityExceeded { name: &'static str, capacity: usize },

    #[error("{name} stack no longer exists")]
    Closed { name: &'static str },
}

pub type StackResult<T> = Result<T, StackError>;

/// Callbacks shared by every record kind. All of them default to no-ops; a
/// record without `update` never completes on its own.
pub trait Record {
    /// Advance by `ticks` milliseconds; `true` once the record is complete.
    fn update(&mut self, _ticks: u32) -> bool {
        false
    }

    fn draw(&self, _painter: &mut dyn Painter) {}

    /// Called once, only after `update` signalled completion or on teardown.
    fn end(&mut self) {}

    /// Called last, whichever way the record left the stack.
    fn finish(self: Box<Self>) {}
}

struct Ledger<R: ?Sized> {
    /// Live slots plus queued additions.
    occupied: usize,
    capacity: usize,
    queue: Vec<Box<R>>,
}

impl<R: ?Sized> Ledger<R> {
    fn reserve(&mut self, name: &'static str) -> StackResult<()> {
        if self.occupied >= self.capacity {
            return Err(StackError::CapacityExceeded {
                name,
                capacity: self.capacity,
            });
        }
        self.occupied += 1;
        if self.occupied == self.capacity {
            log::debug!("{} stack is now full ({} slots)", name, self.capacity);
        }
        Ok(())
    }
}

pub struct Stack<R: ?Sized + Record> {
    name: &'static str,
    slots: Box<[Option<Box<R>>]>,
    ledger: Rc<RefCell<Ledger<R>>>,
}

impl<R: ?Sized + Record> Stack<R> {
    /// A stack of `capacity` empty slots.
    pub fn new(name: &'static str, capacity: usize) -> Self {
        let slots = (0..capacity).map(|_| None).collect::<Vec<_>>();
        Self {
            name,
            slots: slots.into_boxed_slice(),
            ledger: Rc::new(RefCell::new(Ledger {
                occupied: 0,
                capacity,
                queue: Vec::new(),
            })),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Live records, including additions queued by a running pass.
    pub fn len(&self) -> usize {
        self.ledger.borrow().occupied
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether no record is left.
    pub fn completed(&self) -> bool {
        self.is_empty()
    }

    /// Store `record` in the first free slot.
    pub fn add(&mut self, record: Box<R>) -> StackResult<()> {
        self.ledger.borrow_mut().reserve(self.name)?;
        self.place(record);
        Ok(())
    }

    /// Handle for records that need to add siblings from inside a callback.
    pub fn spawner(&self) -> Spawner<R> {
        Spawner {
            name: self.name,
            ledger: Rc::downgrade(&self.ledger),
        }
    }

    /// Update every record; completed ones are ended, finished and removed in
    /// the same pass. Returns whether the stack is empty afterwards.
    pub fn update(&mut self, ticks: u32) -> bool {
        self.flush();

        for slot in self.slots.iter_mut() {
            let done = match slot {
                Some(record) => record.update(ticks),
                None => false,
            };
            if done {
                if let Some(mut record) = slot.take() {
                    record.end();
                    record.finish();
                    self.ledger.borrow_mut().occupied -= 1;
                }
            }
        }

        // Records may have queued siblings during their update.
        self.flush();
        self.completed()
    }

    /// Draw every record in slot order, which is the paint order.
    pub fn draw(&mut self, painter: &mut dyn Painter) {
        self.flush();
        for record in self.slots.iter().flatten() {
            record.draw(painter);
        }
    }

    /// End and finish every remaining record, then clear all slots. Calling
    /// this again is a no-op.
    pub fn finish(&mut self) {
        self.flush();
        let mut finished = 0usize;
        for slot in self.slots.iter_mut() {
            if let Some(mut record) = slot.take() {
                record.end();
                record.finish();
                finished += 1;
            }
        }
        // Siblings queued by the teardown callbacks never become live, and may
        // queue more of their own. The ledger is not released until the end,
        // so capacity bounds this loop.
        loop {
            let late = std::mem::take(&mut self.ledger.borrow_mut().queue);
            if late.is_empty() {
                break;
            }
            for mut record in late {
                record.end();
                record.finish();
                finished += 1;
            }
        }
        self.ledger.borrow_mut().occupied = 0;
        if finished > 0 {
            log::trace!("{} stack finished {} record(s)", self.name, finished);
        }
    }

    pub(crate) fn records_mut(&mut self) -> impl Iterator<Item = &mut Box<R>> {
        self.slots.iter_mut().flatten()
    }

    /// Move queued additions into free slots.
    pub(crate) fn flush(&mut self) {
        let queued = std::mem::take(&mut self.ledger.borrow_mut().queue);
        for record in queued {
            self.place(record);
        }
    }

    fn place(&mut self, record: Box<R>) {
        // The ledger reserved room for this record, so a free slot exists.
        if let Some(slot) = self.slots.iter_mut().find(|slot| slot.is_none()) {
            *slot = Some(record);
        } else {
            log::error!("{} stack lost a record: no free slot despite reservation", self.name);
        }
    }
}

impl<R: ?Sized + Record> Drop for Stack<R> {
    fn drop(&mut self) {
        self.finish();
    }
}

/// Adds records to a [`Stack`] from inside one of its callbacks.
pub struct Spawner<R: ?Sized> {
    name: &'static str,
    ledger: Weak<RefCell<Ledger<R>>>,
}

impl<R: ?Sized> Clone for Spawner<R> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            ledger: self.ledger.clone(),
        }
    }
}

impl<R: ?Sized> Spawner<R> {
    pub fn add(&self, record: Box<R>) -> StackResult<()> {
        let ledger = self
            .ledger
            .upgrade()
            .ok_or(StackError::Closed { name: self.name })?;
        let mut ledger = ledger.borrow_mut();
        ledger.reserve(self.name)?;
        ledger.queue.push(record);
        Ok(())
    }
}
