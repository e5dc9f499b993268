//! Time source used by validation.
//!
//! Store operations read `now` exactly once through a `Clock` and pass that
//! value down, so one operation never observes two different instants.

use crate::model::due::DueAt;
use chrono::{Duration, Utc};
use std::cell::Cell;

pub trait Clock {
    fn now(&self) -> DueAt;
}

/// Wall clock in UTC.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DueAt {
        Utc::now()
    }
}

/// Manually driven clock for deterministic tests.
#[derive(Debug, Clone)]
pub struct FixedClock {
    now: Cell<DueAt>,
}

impl FixedClock {
    pub fn new(now: DueAt) -> Self {
        Self {
            now: Cell::new(now),
        }
    }

    pub fn set(&self, now: DueAt) {
        self.now.set(now);
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DueAt {
        self.now.get()
    }
}

impl<T: Clock + ?Sized> Clock for &T {
    fn now(&self) -> DueAt {
        (**self).now()
    }
}
