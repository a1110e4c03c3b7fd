//! Time sources.
//!
//! The scheduler works on a monotonic [`Clock`]; the ring buffer compares
//! frame timestamps against a [`WallClock`] that shares the sender's
//! timebase. Both are injectable so timing logic can be driven by hand.

use core::cell::Cell;

use critical_section::Mutex;
use embassy_time::{Duration, Instant};

use crate::frame::Timestamp;

/// Monotonic time source.
pub trait Clock {
    fn now(&self) -> Instant;
}

/// Wall-clock time source, in the same timebase the frame sender stamps with.
pub trait WallClock {
    fn now(&self) -> Timestamp;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Instant {
        (**self).now()
    }
}

impl<C: WallClock + ?Sized> WallClock for &C {
    fn now(&self) -> Timestamp {
        (**self).now()
    }
}

/// Monotonic clock backed by the `embassy-time` driver.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbassyClock;

impl Clock for EmbassyClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Wall clock derived from a monotonic clock plus a fixed epoch offset.
///
/// The offset is typically learned once from SNTP or from the sender.
#[derive(Debug, Clone, Copy)]
pub struct OffsetWallClock<C: Clock> {
    clock: C,
    epoch_micros: u64,
}

impl<C: Clock> OffsetWallClock<C> {
    pub const fn new(clock: C, epoch: Timestamp) -> Self {
        Self {
            clock,
            epoch_micros: epoch.as_micros(),
        }
    }
}

impl<C: Clock> WallClock for OffsetWallClock<C> {
    fn now(&self) -> Timestamp {
        Timestamp::from_micros(self.epoch_micros + self.clock.now().as_micros())
    }
}

/// Manually advanced clock.
///
/// Implements both [`Clock`] and [`WallClock`]; the wall reading is the
/// monotonic reading offset by a configurable epoch.
pub struct ManualClock {
    micros: Mutex<Cell<u64>>,
    epoch_micros: u64,
}

impl ManualClock {
    pub const fn new() -> Self {
        Self::with_epoch(Timestamp::ZERO)
    }

    pub const fn with_epoch(epoch: Timestamp) -> Self {
        Self {
            micros: Mutex::new(Cell::new(0)),
            epoch_micros: epoch.as_micros(),
        }
    }

    /// Set the monotonic reading to an absolute millisecond value
    pub fn set_millis(&self, millis: u64) {
        critical_section::with(|cs| self.micros.borrow(cs).set(millis * 1000));
    }

    /// Move the clock forward
    pub fn advance(&self, by: Duration) {
        critical_section::with(|cs| {
            let cell = self.micros.borrow(cs);
            cell.set(cell.get() + by.as_micros());
        });
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        Instant::from_micros(critical_section::with(|cs| self.micros.borrow(cs).get()))
    }
}

impl WallClock for ManualClock {
    fn now(&self) -> Timestamp {
        let micros = critical_section::with(|cs| self.micros.borrow(cs).get());
        Timestamp::from_micros(self.epoch_micros + micros)
    }
}
