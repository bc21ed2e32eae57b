use crate::timer::TimerConfigOption;

/// Largest delay the registry accepts, in milliseconds.
pub const DEFAULT_MAX_DELAY_MS: u64 = 0xFFFF_FFFE;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerConfig {
  /// Attached to every log event of the registry.
  pub name: String,
  /// Preallocated slots in the pending and ready buffers.
  pub initial_capacity: usize,
  pub max_delay_ms: u64,
}

impl Default for TimerConfig {
  fn default() -> Self {
    TimerConfig {
      name: "timer-registry".to_string(),
      initial_capacity: 16,
      max_delay_ms: DEFAULT_MAX_DELAY_MS,
    }
  }
}

impl TimerConfig {
  pub fn from(options: impl IntoIterator<Item = TimerConfigOption>) -> TimerConfig {
    let mut config = TimerConfig::default();
    for option in options {
      option.apply(&mut config);
    }
    config
  }
}
