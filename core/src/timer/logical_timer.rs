use std::fmt::{Debug, Formatter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use crate::timer::{TimerError, TimerId, TimerRegistry};

pub(crate) type FireCallback = Box<dyn Fn() + Send + Sync + 'static>;

/// Shared state of one logical timer. The registry refers to it only weakly.
pub(crate) struct TimerCell {
  pub(crate) id: TimerId,
  // Written only while the registry lock is held.
  pub(crate) scheduled: AtomicBool,
  pub(crate) callback: FireCallback,
}

impl TimerCell {
  pub(crate) fn new(id: TimerId, callback: FireCallback) -> Self {
    Self {
      id,
      scheduled: AtomicBool::new(false),
      callback,
    }
  }

  pub(crate) fn fire(&self) {
    (self.callback)()
  }
}

impl Debug for TimerCell {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("TimerCell")
      .field("id", &self.id)
      .field("scheduled", &self.scheduled.load(Ordering::Relaxed))
      .finish()
  }
}

/// A caller-owned timer multiplexed onto its registry's host bridge.
///
/// Clones share one timer. Once every clone is dropped the registry forgets the timer
/// at its next sweep without firing it.
#[derive(Debug, Clone)]
pub struct LogicalTimer {
  cell: Arc<TimerCell>,
  registry: Arc<TimerRegistry>,
}

impl LogicalTimer {
  pub(crate) fn new(cell: Arc<TimerCell>, registry: Arc<TimerRegistry>) -> Self {
    Self { cell, registry }
  }

  pub fn id(&self) -> TimerId {
    self.cell.id
  }

  /// Schedules the timer to fire `delay_ms` from now, replacing any earlier due time.
  pub fn arm(&self, delay_ms: u64) -> Result<(), TimerError> {
    self.registry.arm(self, delay_ms)
  }

  pub fn is_scheduled(&self) -> bool {
    self.cell.scheduled.load(Ordering::Acquire)
  }

  /// Absolute due time in registry clock milliseconds, while scheduled.
  pub fn due_time(&self) -> Option<u64> {
    self.registry.due_time(self)
  }

  pub fn registry(&self) -> &Arc<TimerRegistry> {
    &self.registry
  }

  /// A handle that does not keep the timer alive, for use inside its own fire callback.
  pub fn downgrade(&self) -> WeakLogicalTimer {
    WeakLogicalTimer {
      cell: Arc::downgrade(&self.cell),
      registry: Arc::downgrade(&self.registry),
    }
  }

  pub(crate) fn cell(&self) -> &Arc<TimerCell> {
    &self.cell
  }
}

impl PartialEq for LogicalTimer {
  fn eq(&self, other: &Self) -> bool {
    Arc::ptr_eq(&self.cell, &other.cell)
  }
}

impl Eq for LogicalTimer {}

#[derive(Debug, Clone)]
pub struct WeakLogicalTimer {
  cell: Weak<TimerCell>,
  registry: Weak<TimerRegistry>,
}

impl WeakLogicalTimer {
  pub fn upgrade(&self) -> Option<LogicalTimer> {
    let cell = self.cell.upgrade()?;
    let registry = self.registry.upgrade()?;
    Some(LogicalTimer::new(cell, registry))
  }
}
