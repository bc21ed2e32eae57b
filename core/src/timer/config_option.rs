use crate::timer::TimerConfig;

#[derive(Debug, Clone)]
pub enum TimerConfigOption {
  SetName(String),
  SetInitialCapacity(usize),
  SetMaxDelayMs(u64),
}

impl TimerConfigOption {
  pub fn apply(&self, config: &mut TimerConfig) {
    match self {
      TimerConfigOption::SetName(name) => {
        config.name = name.clone();
      }
      TimerConfigOption::SetInitialCapacity(capacity) => {
        config.initial_capacity = *capacity;
      }
      TimerConfigOption::SetMaxDelayMs(max_delay_ms) => {
        config.max_delay_ms = *max_delay_ms;
      }
    }
  }

  pub fn with_name(name: impl Into<String>) -> TimerConfigOption {
    TimerConfigOption::SetName(name.into())
  }

  pub fn with_initial_capacity(capacity: usize) -> TimerConfigOption {
    TimerConfigOption::SetInitialCapacity(capacity)
  }

  pub fn with_max_delay_ms(max_delay_ms: u64) -> TimerConfigOption {
    TimerConfigOption::SetMaxDelayMs(max_delay_ms)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::timer::DEFAULT_MAX_DELAY_MS;

  #[test]
  fn test_options_override_defaults() {
    let config = TimerConfig::from([
      TimerConfigOption::with_name("ui-timers"),
      TimerConfigOption::with_max_delay_ms(1_000),
    ]);
    assert_eq!(config.name, "ui-timers");
    assert_eq!(config.max_delay_ms, 1_000);
    assert_eq!(config.initial_capacity, TimerConfig::default().initial_capacity);
  }

  #[test]
  fn test_no_options_yield_defaults() {
    let config = TimerConfig::from(Vec::new());
    assert_eq!(config, TimerConfig::default());
    assert_eq!(config.max_delay_ms, DEFAULT_MAX_DELAY_MS);
  }
}
