//! Time source for the polling loop.

use std::cell::{Cell, RefCell};
use std::time::{Duration, Instant};

/// Monotonic time plus the ability to wait. `now` is measured from an arbitrary fixed origin.
pub trait Clock {
  fn now(&self) -> Duration;
  fn sleep(&self, duration: Duration);
}

impl<T: Clock + ?Sized> Clock for &T {
  fn now(&self) -> Duration {
    (**self).now()
  }

  fn sleep(&self, duration: Duration) {
    (**self).sleep(duration)
  }
}

/// Wall clock backed by [`Instant`] and [`std::thread::sleep`].
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
  origin: Instant,
}

impl SystemClock {
  pub fn new() -> Self {
    Self {
      origin: Instant::now(),
    }
  }
}

impl Default for SystemClock {
  fn default() -> Self {
    Self::new()
  }
}

impl Clock for SystemClock {
  fn now(&self) -> Duration {
    self.origin.elapsed()
  }

  fn sleep(&self, duration: Duration) {
    std::thread::sleep(duration);
  }
}

/// Fake clock that only moves when slept on. Every sleep is recorded.
#[derive(Debug, Default)]
pub struct ManualClock {
  now: Cell<Duration>,
  sleeps: RefCell<Vec<Duration>>,
}

impl ManualClock {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn advance(&self, duration: Duration) {
    self.now.set(self.now.get() + duration);
  }

  pub fn sleeps(&self) -> Vec<Duration> {
    self.sleeps.borrow().clone()
  }
}

impl Clock for ManualClock {
  fn now(&self) -> Duration {
    self.now.get()
  }

  fn sleep(&self, duration: Duration) {
    self.sleeps.borrow_mut().push(duration);
    self.advance(duration);
  }
}
