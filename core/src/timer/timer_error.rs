use thiserror::Error;

use crate::bridge::BridgeError;
use crate::timer::TimerId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimerError {
  #[error("delay of {delay_ms}ms exceeds the maximum of {max_delay_ms}ms")]
  DelayOutOfRange { delay_ms: u64, max_delay_ms: u64 },
  #[error("timer {0} belongs to a different registry")]
  ForeignTimer(TimerId),
  #[error("host timeout bridge unavailable: {0}")]
  BridgeUnavailable(#[from] BridgeError),
  #[error("a sweep is already in progress")]
  SweepInProgress,
}
