//! Monotonic millisecond clocks consulted by the timer registry.

use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::time::Instant;

/// Source of monotonic time, in whole milliseconds.
pub trait Clock: Debug + Send + Sync + 'static {
  fn now_ms(&self) -> u64;
}

/// Milliseconds elapsed since the clock was created, measured with tokio's clock.
///
/// Because it reads `tokio::time::Instant`, a paused tokio runtime drives it too.
#[derive(Debug, Clone, Copy)]
pub struct TokioClock {
  origin: Instant,
}

impl TokioClock {
  pub fn new() -> Self {
    Self { origin: Instant::now() }
  }
}

impl Default for TokioClock {
  fn default() -> Self {
    Self::new()
  }
}

impl Clock for TokioClock {
  fn now_ms(&self) -> u64 {
    u64::try_from(self.origin.elapsed().as_millis()).unwrap_or(u64::MAX)
  }
}

/// A virtual clock moved by hand. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
  now_ms: Arc<AtomicU64>,
}

impl ManualClock {
  pub fn new(start_ms: u64) -> Self {
    Self {
      now_ms: Arc::new(AtomicU64::new(start_ms)),
    }
  }

  /// Moves the clock to `ms`. Earlier values are ignored; the clock never goes back.
  pub fn set(&self, ms: u64) {
    self.now_ms.fetch_max(ms, Ordering::AcqRel);
  }

  pub fn advance(&self, delta_ms: u64) -> u64 {
    self.now_ms.fetch_add(delta_ms, Ordering::AcqRel) + delta_ms
  }
}

impl Clock for ManualClock {
  fn now_ms(&self) -> u64 {
    self.now_ms.load(Ordering::Acquire)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::time::Duration;

  #[test]
  fn manual_clock_never_moves_backwards() {
    let clock = ManualClock::new(10);
    clock.set(5);
    assert_eq!(clock.now_ms(), 10);
    clock.set(25);
    assert_eq!(clock.advance(5), 30);
    assert_eq!(clock.clone().now_ms(), 30);
  }

  #[tokio::test(start_paused = true)]
  async fn tokio_clock_follows_paused_time() {
    let clock = TokioClock::new();
    assert_eq!(clock.now_ms(), 0);
    tokio::time::advance(Duration::from_millis(42)).await;
    assert_eq!(clock.now_ms(), 42);
  }
}
