use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;

use crate::bridge::BridgeError;

/// Identifies one request made to a [`HostTimeoutBridge`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct CorrelationId(u64);

impl CorrelationId {
  #[inline]
  pub const fn from_raw(raw: u64) -> Self {
    Self(raw)
  }

  #[inline]
  pub const fn into_raw(self) -> u64 {
    self.0
  }
}

impl Display for CorrelationId {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// A zero-argument procedure the bridge invokes exactly once.
pub struct TimeoutCallback(Box<dyn FnOnce() + Send + Sync + 'static>);

impl TimeoutCallback {
  pub fn new<F>(f: F) -> Self
  where
    F: FnOnce() + Send + Sync + 'static, {
    Self(Box::new(f))
  }

  pub fn run(self) {
    (self.0)()
  }
}

impl Debug for TimeoutCallback {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.write_str("TimeoutCallback")
  }
}

/// The host capability: arm one one-shot callback after a number of milliseconds.
///
/// Implementations must invoke each callback exactly once, no earlier than `delay_ms`
/// after the call, and never run two callbacks at the same time. Nothing can be
/// cancelled once scheduled.
pub trait HostTimeoutBridge: Debug + Send + Sync + 'static {
  fn schedule(&self, delay_ms: u64, callback: TimeoutCallback) -> Result<CorrelationId, BridgeError>;
}

#[derive(Debug, Clone)]
pub struct BridgeHandle(Arc<dyn HostTimeoutBridge>);

impl BridgeHandle {
  pub fn new_arc(bridge: Arc<dyn HostTimeoutBridge>) -> Self {
    Self(bridge)
  }

  pub fn new(bridge: impl HostTimeoutBridge) -> Self {
    Self(Arc::new(bridge))
  }
}

impl HostTimeoutBridge for BridgeHandle {
  fn schedule(&self, delay_ms: u64, callback: TimeoutCallback) -> Result<CorrelationId, BridgeError> {
    self.0.schedule(delay_ms, callback)
  }
}
