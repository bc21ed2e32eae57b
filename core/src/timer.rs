//! Logical timers multiplexed onto one host timeout bridge.

mod config;
mod config_option;
mod logical_timer;
mod sweep_dispatcher;
mod timer_error;
mod timer_id;
mod timer_registry;

pub use self::{
  config::*, config_option::*, logical_timer::*, sweep_dispatcher::*, timer_error::*, timer_id::*, timer_registry::*,
};
