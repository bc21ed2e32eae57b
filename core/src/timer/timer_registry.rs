use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::Ordering;
use std::sync::{Arc, Weak};

use nexus_timer_utils_rs::concurrent::{LowLevelLock, SequenceAllocator};
use static_assertions::assert_impl_all;

use crate::bridge::{BridgeHandle, HostTimeoutBridge};
use crate::clock::Clock;
use crate::timer::{LogicalTimer, SweepDispatcher, TimerCell, TimerConfig, TimerError, TimerId};


#[derive(Debug)]
struct PendingTimer {
  id: TimerId,
  due_time: u64,
  cell: Weak<TimerCell>,
}

#[derive(Debug)]
struct RegistryState {
  pending: Vec<PendingTimer>,
  // Scratch buffer for the sweep in progress; always empty between sweeps.
  ready: Vec<Arc<TimerCell>>,
}

/// Outcome of one [`TimerRegistry::sweep`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SweepReport {
  /// Fire callbacks invoked, panicking ones included.
  pub fired: usize,
  /// Entries dropped because every handle of their timer was gone.
  pub purged: usize,
  /// Delay of the follow-up bridge request, if any timer is still pending.
  pub next_wait_ms: Option<u64>,
}

/// The pending set shared by every logical timer of one runtime, plus the arm and
/// sweep algorithms that multiplex them onto a single [`HostTimeoutBridge`].
///
/// Create one per runtime with [`TimerRegistry::new`] and hand the `Arc` to whoever
/// needs timers. The lock only covers bookkeeping: fire callbacks and bridge calls
/// always run with it released, so a callback may re-arm any timer, itself included.
///
/// Every `arm` issues its own bridge request and nothing deduplicates them. A sweep
/// re-derives what is due from the pending set, so surplus wake-ups find nothing to do.
#[derive(Debug)]
pub struct TimerRegistry {
  config: TimerConfig,
  clock: Arc<dyn Clock>,
  bridge: BridgeHandle,
  ids: SequenceAllocator,
  state: LowLevelLock<RegistryState>,
  dispatcher: SweepDispatcher,
}

assert_impl_all!(TimerRegistry: Send, Sync);
assert_impl_all!(LogicalTimer: Send, Sync);

impl TimerRegistry {
  pub fn new(clock: Arc<dyn Clock>, bridge: BridgeHandle, config: TimerConfig) -> Arc<Self> {
    Arc::new_cyclic(|weak| Self {
      state: LowLevelLock::new(RegistryState {
        pending: Vec::with_capacity(config.initial_capacity),
        ready: Vec::with_capacity(config.initial_capacity),
      }),
      config,
      clock,
      bridge,
      ids: SequenceAllocator::new(),
      dispatcher: SweepDispatcher::new(weak.clone()),
    })
  }

  pub fn config(&self) -> &TimerConfig {
    &self.config
  }

  pub fn clock(&self) -> &Arc<dyn Clock> {
    &self.clock
  }

  /// The dispatcher this registry hands to the bridge, for callers driving sweeps by hand.
  ///
  /// A bridge callback that finds a hand-driven sweep running asks the bridge for
  /// another sweep [`SWEEP_RETRY_DELAY_MS`](crate::timer::SWEEP_RETRY_DELAY_MS) later,
  /// so no wake-up is lost.
  pub fn dispatcher(&self) -> SweepDispatcher {
    self.dispatcher.clone()
  }

  /// Creates an unscheduled timer that invokes `callback` each time it comes due.
  pub fn create_timer<F>(self: &Arc<Self>, callback: F) -> LogicalTimer
  where
    F: Fn() + Send + Sync + 'static, {
    let id = TimerId::from_raw(self.ids.allocate());
    LogicalTimer::new(Arc::new(TimerCell::new(id, Box::new(callback))), Arc::clone(self))
  }

  /// Schedules `timer` to fire `delay_ms` from now.
  ///
  /// An already scheduled timer keeps its single pending entry and only gets the new
  /// due time, earlier or later.
  ///
  /// A bridge failure is returned after the timer has been recorded as pending. The
  /// timer then stays scheduled with no host request of its own behind it: it fires
  /// only if some other request is already outstanding and its sweep runs after the
  /// due time, and otherwise waits until it is armed again.
  pub fn arm(&self, timer: &LogicalTimer, delay_ms: u64) -> Result<(), TimerError> {
    if !std::ptr::eq(Arc::as_ptr(timer.registry()), self) {
      return Err(TimerError::ForeignTimer(timer.id()));
    }
    if delay_ms > self.config.max_delay_ms {
      return Err(TimerError::DelayOutOfRange {
        delay_ms,
        max_delay_ms: self.config.max_delay_ms,
      });
    }

    let due_time = self.clock.now_ms().saturating_add(delay_ms);
    let cell = timer.cell();
    {
      let mut state = self.state.acquire();
      let position = if cell.scheduled.load(Ordering::Acquire) {
        state.pending.iter().position(|entry| entry.id == cell.id)
      } else {
        None
      };
      match position {
        Some(index) => state.pending[index].due_time = due_time,
        None => {
          state.pending.push(PendingTimer {
            id: cell.id,
            due_time,
            cell: Arc::downgrade(cell),
          });
          cell.scheduled.store(true, Ordering::Release);
        }
      }
    }

    tracing::debug!(registry = %self.config.name, timer = %cell.id, delay_ms, due_time, "timer armed");
    self.request_sweep(delay_ms)
  }

  /// Asks the bridge to run the dispatcher after `delay_ms`.
  pub(crate) fn request_sweep(&self, delay_ms: u64) -> Result<(), TimerError> {
    self.bridge.schedule(delay_ms, self.dispatcher.clone().into_callback())?;
    Ok(())
  }

  /// Due time of `timer` while it is pending.
  pub fn due_time(&self, timer: &LogicalTimer) -> Option<u64> {
    let id = timer.id();
    let state = self.state.acquire();
    state
      .pending
      .iter()
      .find(|entry| entry.id == id)
      .map(|entry| entry.due_time)
  }

  pub fn pending_len(&self) -> usize {
    self.state.acquire().pending.len()
  }

  pub fn is_idle(&self) -> bool {
    self.pending_len() == 0
  }

  /// Fires every pending timer due at `now` and re-arms the bridge for the nearest
  /// remaining due time.
  ///
  /// Meant to run only from the [`SweepDispatcher`], never concurrently with itself.
  /// Fire callbacks run without the lock held, in no particular order; a panicking
  /// callback is logged and the others still fire.
  pub fn sweep(&self, now: u64) -> Result<SweepReport, TimerError> {
    let mut report = SweepReport::default();

    let mut ready = {
      let mut state = self.state.acquire();
      let mut ready = std::mem::take(&mut state.ready);
      let pending = &mut state.pending;
      let mut index = pending.len();
      while index > 0 {
        index -= 1;
        let entry = &pending[index];
        if entry.cell.strong_count() == 0 {
          let entry = pending.swap_remove(index);
          tracing::warn!(registry = %self.config.name, timer = %entry.id, "timer dropped while scheduled");
          report.purged += 1;
          continue;
        }
        if entry.due_time <= now {
          let entry = pending.swap_remove(index);
          match entry.cell.upgrade() {
            Some(cell) => {
              cell.scheduled.store(false, Ordering::Release);
              ready.push(cell);
            }
            None => report.purged += 1,
          }
          continue;
        }
        let wait = entry.due_time - now;
        report.next_wait_ms = Some(report.next_wait_ms.map_or(wait, |shortest| shortest.min(wait)));
      }
      ready
    };

    for cell in ready.iter() {
      tracing::trace!(registry = %self.config.name, timer = %cell.id, now, "timer fired");
      if catch_unwind(AssertUnwindSafe(|| cell.fire())).is_err() {
        tracing::error!(registry = %self.config.name, timer = %cell.id, "timer callback panicked");
      }
      report.fired += 1;
    }
    ready.clear();
    self.state.acquire().ready = ready;

    tracing::debug!(
      registry = %self.config.name,
      now,
      fired = report.fired,
      purged = report.purged,
      next_wait_ms = ?report.next_wait_ms,
      "sweep finished"
    );
    if let Some(wait) = report.next_wait_ms {
      self.request_sweep(wait)?;
    }
    Ok(report)
  }
}
