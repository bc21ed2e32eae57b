use std::fmt::{Display, Formatter};

/// Stable identity of a [`LogicalTimer`](crate::timer::LogicalTimer). Only meaningful within one process.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct TimerId(u64);

impl TimerId {
  #[inline]
  pub const fn from_raw(raw: u64) -> Self {
    Self(raw)
  }

  #[inline]
  pub const fn into_raw(self) -> u64 {
    self.0
  }
}

impl Display for TimerId {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(f, "#{}", self.0)
  }
}
