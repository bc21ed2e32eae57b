use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use nexus_timer_utils_rs::concurrent::{LowLevelLock, SequenceAllocator};

use crate::bridge::{BridgeError, CorrelationId, HostTimeoutBridge, TimeoutCallback};
use crate::clock::{Clock, ManualClock};

/// A request observed by a [`ManualTimeoutBridge`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutRequest {
  pub id: CorrelationId,
  pub delay_ms: u64,
  pub requested_at_ms: u64,
}

impl TimeoutRequest {
  pub fn due_ms(&self) -> u64 {
    self.requested_at_ms.saturating_add(self.delay_ms)
  }
}

#[derive(Debug)]
struct ScheduledTimeout {
  request: TimeoutRequest,
  callback: TimeoutCallback,
}

#[derive(Debug, Default)]
struct ManualState {
  scheduled: Vec<ScheduledTimeout>,
  history: Vec<TimeoutRequest>,
}

/// A deterministic bridge driven by a [`ManualClock`].
///
/// Nothing fires until `advance` or `run_due` is called; both run due callbacks on
/// the calling thread in due order (ties in request order), moving the clock to each
/// callback's due instant first.
#[derive(Debug, Clone)]
pub struct ManualTimeoutBridge {
  clock: ManualClock,
  allocator: Arc<SequenceAllocator>,
  state: Arc<LowLevelLock<ManualState>>,
  available: Arc<AtomicBool>,
}

impl ManualTimeoutBridge {
  pub fn new(clock: ManualClock) -> Self {
    Self {
      clock,
      allocator: Arc::new(SequenceAllocator::new()),
      state: Arc::new(LowLevelLock::default()),
      available: Arc::new(AtomicBool::new(true)),
    }
  }

  pub fn clock(&self) -> &ManualClock {
    &self.clock
  }

  /// Makes `schedule` fail with [`BridgeError::Unavailable`] while `false`.
  pub fn set_available(&self, available: bool) {
    self.available.store(available, Ordering::Release);
  }

  /// Every request accepted so far, in request order.
  pub fn requests(&self) -> Vec<TimeoutRequest> {
    self.state.acquire().history.clone()
  }

  pub fn outstanding(&self) -> usize {
    self.state.acquire().scheduled.len()
  }

  /// Advances virtual time by `delta_ms`, running every callback that becomes due,
  /// including ones scheduled by callbacks during the advance. Returns how many ran.
  pub fn advance(&self, delta_ms: u64) -> usize {
    let target = self.clock.now_ms().saturating_add(delta_ms);
    let ran = self.run_until(target);
    self.clock.set(target);
    ran
  }

  /// Runs the callbacks already due at the current virtual time.
  pub fn run_due(&self) -> usize {
    self.run_until(self.clock.now_ms())
  }

  fn run_until(&self, target: u64) -> usize {
    let mut ran = 0;
    while let Some(next) = self.take_next_due(target) {
      self.clock.set(next.request.due_ms());
      next.callback.run();
      ran += 1;
    }
    ran
  }

  fn take_next_due(&self, target: u64) -> Option<ScheduledTimeout> {
    let mut state = self.state.acquire();
    let index = state
      .scheduled
      .iter()
      .enumerate()
      .filter(|(_, scheduled)| scheduled.request.due_ms() <= target)
      .min_by_key(|(_, scheduled)| (scheduled.request.due_ms(), scheduled.request.id))
      .map(|(index, _)| index)?;
    Some(state.scheduled.remove(index))
  }
}

impl HostTimeoutBridge for ManualTimeoutBridge {
  fn schedule(&self, delay_ms: u64, callback: TimeoutCallback) -> Result<CorrelationId, BridgeError> {
    if !self.available.load(Ordering::Acquire) {
      return Err(BridgeError::Unavailable);
    }
    let request = TimeoutRequest {
      id: CorrelationId::from_raw(self.allocator.allocate()),
      delay_ms,
      requested_at_ms: self.clock.now_ms(),
    };
    let mut state = self.state.acquire();
    state.history.push(request);
    state.scheduled.push(ScheduledTimeout { request, callback });
    Ok(request.id)
  }
}
