use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use futures::StreamExt;
use nexus_timer_utils_rs::concurrent::SequenceAllocator;
use static_assertions::assert_impl_all;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio_util::time::DelayQueue;

use crate::bridge::{BridgeError, CorrelationId, HostTimeoutBridge, TimeoutCallback};

#[cfg(test)]
mod tests;

#[derive(Debug)]
enum BridgeCommand {
  Schedule(CorrelationId, Duration),
  Shutdown,
}

type CallbackTable = Arc<DashMap<CorrelationId, TimeoutCallback>>;

/// Longest delay the driver accepts. `DelayQueue` panics past 2^36 ms measured from its
/// start, so half of that range is kept free for the driver's own uptime.
pub const TOKIO_BRIDGE_MAX_DELAY_MS: u64 = (1 << 35) - 1;

#[derive(Debug)]
struct Inner {
  allocator: SequenceAllocator,
  callbacks: CallbackTable,
  commands: mpsc::UnboundedSender<BridgeCommand>,
  closed: AtomicBool,
}

/// A [`HostTimeoutBridge`] backed by a single tokio task.
///
/// Callbacks are parked in a correlation-id table and the driver task owns a
/// `DelayQueue` of ids. Expired callbacks run one after another on that task, which
/// makes it the single cooperative thread the timer registry relies on.
#[derive(Debug, Clone)]
pub struct TokioTimeoutBridge {
  inner: Arc<Inner>,
}

assert_impl_all!(TokioTimeoutBridge: Send, Sync);
assert_impl_all!(TimeoutCallback: Send, Sync);

impl TokioTimeoutBridge {
  /// Spawns the driver on the current tokio runtime. Panics outside a runtime, like `tokio::spawn`.
  pub fn spawn() -> Self {
    Self::spawn_on(&Handle::current())
  }

  pub fn spawn_on(handle: &Handle) -> Self {
    let (commands, receiver) = mpsc::unbounded_channel();
    let callbacks: CallbackTable = Arc::new(DashMap::new());
    handle.spawn(drive(receiver, Arc::clone(&callbacks)));
    Self {
      inner: Arc::new(Inner {
        allocator: SequenceAllocator::new(),
        callbacks,
        commands,
        closed: AtomicBool::new(false),
      }),
    }
  }

  /// Number of callbacks scheduled and not yet invoked.
  pub fn outstanding(&self) -> usize {
    self.inner.callbacks.len()
  }

  pub fn is_closed(&self) -> bool {
    self.inner.closed.load(Ordering::Acquire) || self.inner.commands.is_closed()
  }

  /// Stops the driver. Outstanding callbacks are dropped without running.
  pub fn shutdown(&self) {
    if !self.inner.closed.swap(true, Ordering::AcqRel) {
      let _ = self.inner.commands.send(BridgeCommand::Shutdown);
    }
  }
}

impl HostTimeoutBridge for TokioTimeoutBridge {
  fn schedule(&self, delay_ms: u64, callback: TimeoutCallback) -> Result<CorrelationId, BridgeError> {
    if self.is_closed() {
      return Err(BridgeError::Closed);
    }
    if delay_ms > TOKIO_BRIDGE_MAX_DELAY_MS {
      tracing::warn!(delay_ms, max_delay_ms = TOKIO_BRIDGE_MAX_DELAY_MS, "timeout rejected, delay too long");
      return Err(BridgeError::Unavailable);
    }
    let id = CorrelationId::from_raw(self.inner.allocator.allocate());
    self.inner.callbacks.insert(id, callback);
    if self
      .inner
      .commands
      .send(BridgeCommand::Schedule(id, Duration::from_millis(delay_ms)))
      .is_err()
    {
      self.inner.callbacks.remove(&id);
      return Err(BridgeError::Closed);
    }
    tracing::trace!(correlation_id = %id, delay_ms, "timeout scheduled");
    Ok(id)
  }
}

async fn drive(mut commands: mpsc::UnboundedReceiver<BridgeCommand>, callbacks: CallbackTable) {
  let mut queue = DelayQueue::new();
  loop {
    tokio::select! {
      command = commands.recv() => match command {
        Some(BridgeCommand::Schedule(id, delay)) => {
          queue.insert(id, delay);
        }
        Some(BridgeCommand::Shutdown) | None => break,
      },
      Some(expired) = queue.next(), if !queue.is_empty() => {
        let id = expired.into_inner();
        match callbacks.remove(&id) {
          Some((_, callback)) => callback.run(),
          None => tracing::warn!(correlation_id = %id, "no callback registered for expired timeout"),
        }
      }
    }
  }
  tracing::debug!(dropped = callbacks.len(), "timeout bridge driver stopped");
  callbacks.clear();
}
