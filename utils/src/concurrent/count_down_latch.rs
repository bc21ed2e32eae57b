use std::fmt::{Debug, Formatter};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

/// A latch that is counted down from synchronous code and awaited from async code.
///
/// Timer callbacks are plain closures, so `count_down` must not need an executor.
#[derive(Clone)]
pub struct CountDownLatch {
  count: Arc<AtomicUsize>,
  notify: Arc<Notify>,
}

impl Debug for CountDownLatch {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("CountDownLatch").field("count", &self.count()).finish()
  }
}

impl Eq for CountDownLatch {}

impl PartialEq for CountDownLatch {
  fn eq(&self, other: &Self) -> bool {
    Arc::ptr_eq(&self.count, &other.count)
  }
}

impl Default for CountDownLatch {
  fn default() -> Self {
    Self::new(0)
  }
}

impl CountDownLatch {
  pub fn new(count: usize) -> Self {
    Self {
      count: Arc::new(AtomicUsize::new(count)),
      notify: Arc::new(Notify::new()),
    }
  }

  pub fn count(&self) -> usize {
    self.count.load(Ordering::Acquire)
  }

  /// Decrements the count, saturating at zero, and wakes waiters when it reaches zero.
  pub fn count_down(&self) {
    let previous = self
      .count
      .fetch_update(Ordering::AcqRel, Ordering::Acquire, |count| count.checked_sub(1));
    if previous == Ok(1) {
      self.notify.notify_waiters();
    }
  }

  pub async fn wait(&self) {
    loop {
      let notified = self.notify.notified();
      tokio::pin!(notified);
      notified.as_mut().enable();
      if self.count() == 0 {
        return;
      }
      notified.await;
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::time::Duration;

  #[tokio::test]
  async fn wait_returns_immediately_when_count_is_zero() {
    let latch = CountDownLatch::new(0);
    tokio::time::timeout(Duration::from_millis(100), latch.wait())
      .await
      .expect("latch should be open");
  }

  #[tokio::test]
  async fn wait_completes_after_all_counts() {
    let latch = CountDownLatch::new(3);
    let waiter = {
      let latch = latch.clone();
      tokio::spawn(async move { latch.wait().await })
    };

    for _ in 0..3 {
      let latch = latch.clone();
      std::thread::spawn(move || latch.count_down()).join().unwrap();
    }

    tokio::time::timeout(Duration::from_secs(1), waiter)
      .await
      .expect("waiter timed out")
      .unwrap();
    assert_eq!(latch.count(), 0);
  }

  #[test]
  fn count_down_saturates_at_zero() {
    let latch = CountDownLatch::new(1);
    latch.count_down();
    latch.count_down();
    assert_eq!(latch.count(), 0);
  }
}
