//! Adapters for the host capability that arms one delayed callback per request.

mod bridge_error;
mod host_timeout_bridge;
mod manual_timeout_bridge;
mod tokio_timeout_bridge;

pub use self::{bridge_error::*, host_timeout_bridge::*, manual_timeout_bridge::*, tokio_timeout_bridge::*};
