use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BridgeError {
  #[error("timeout bridge is closed")]
  Closed,
  #[error("timeout bridge cannot accept more requests")]
  Unavailable,
}
