//! Cooperative timer multiplexer.
//!
//! Any number of [`LogicalTimer`]s share one [`HostTimeoutBridge`] that can only arm
//! one-shot, millisecond callbacks. The [`TimerRegistry`] keeps the pending set and
//! the [`SweepDispatcher`] fires whatever is due each time the bridge calls back.

pub mod bridge;
pub mod clock;
pub mod timer;

pub use bridge::*;
pub use clock::*;
pub use timer::*;
