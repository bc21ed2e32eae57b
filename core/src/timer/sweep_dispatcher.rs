use std::sync::{Arc, Weak};

use nexus_timer_utils_rs::concurrent::LowLevelLock;

use crate::bridge::TimeoutCallback;
use crate::timer::{SweepReport, TimerError, TimerRegistry};


/// Delay before a bridge callback that lost the race for the gate tries again.
pub const SWEEP_RETRY_DELAY_MS: u64 = 1;

/// What the host bridge invokes: reads the clock and sweeps the registry.
///
/// All clones share one gate, so two sweeps of the same registry never overlap.
#[derive(Debug, Clone)]
pub struct SweepDispatcher {
  registry: Weak<TimerRegistry>,
  gate: Arc<LowLevelLock<()>>,
}

impl SweepDispatcher {
  pub(crate) fn new(registry: Weak<TimerRegistry>) -> Self {
    Self {
      registry,
      gate: Arc::new(LowLevelLock::new(())),
    }
  }

  /// Runs one sweep. Returns `Ok(None)` once the registry is gone.
  pub fn dispatch(&self) -> Result<Option<SweepReport>, TimerError> {
    let Some(registry) = self.registry.upgrade() else {
      tracing::debug!("registry dropped, skipping sweep");
      return Ok(None);
    };
    let Some(gate) = self.gate.try_acquire() else {
      tracing::warn!(registry = %registry.config().name, "sweep requested while another sweep is running");
      return Err(TimerError::SweepInProgress);
    };
    let now = registry.clock().now_ms();
    let report = registry.sweep(now);
    gate.release();
    report.map(Some)
  }

  /// Adapts the dispatcher into a bridge callback.
  ///
  /// Errors are logged since the bridge has no one to report them to. A callback
  /// rejected with [`TimerError::SweepInProgress`] requests a fresh sweep, because
  /// the running sweep may already have finished its bookkeeping.
  pub fn into_callback(self) -> TimeoutCallback {
    TimeoutCallback::new(move || match self.dispatch() {
      Ok(_) => {}
      Err(TimerError::SweepInProgress) => self.retry_later(),
      Err(error) => tracing::error!(%error, "timer sweep failed"),
    })
  }

  fn retry_later(&self) {
    let Some(registry) = self.registry.upgrade() else {
      return;
    };
    if let Err(error) = registry.request_sweep(SWEEP_RETRY_DELAY_MS) {
      tracing::error!(%error, "failed to request a retry sweep");
    }
  }
}
