use std::sync::atomic::{AtomicU64, Ordering};

/// Hands out process-unique, non-zero sequence numbers.
///
/// Zero is reserved so that it can stand for "no id" in raw representations.
#[derive(Debug)]
pub struct SequenceAllocator {
  counter: AtomicU64,
}

impl SequenceAllocator {
  #[inline]
  pub const fn new() -> Self {
    Self {
      counter: AtomicU64::new(1),
    }
  }

  #[inline]
  pub fn allocate(&self) -> u64 {
    let next = self.counter.fetch_add(1, Ordering::Relaxed);
    if next == 0 {
      self.counter.fetch_add(1, Ordering::Relaxed)
    } else {
      next
    }
  }

  /// The value the next call to `allocate` will most likely return (for tests).
  #[inline]
  pub fn peek(&self) -> u64 {
    self.counter.load(Ordering::Relaxed)
  }
}

impl Default for SequenceAllocator {
  fn default() -> Self {
    Self::new()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashSet;
  use std::sync::Arc;
  use std::thread;

  #[test]
  fn allocate_provides_unique_non_zero_values() {
    let allocator = SequenceAllocator::new();
    let mut seen = HashSet::new();

    for _ in 0..1024 {
      let value = allocator.allocate();
      assert_ne!(value, 0);
      assert!(seen.insert(value));
    }
    assert_eq!(allocator.peek(), 1025);
  }

  #[test]
  fn allocate_is_unique_across_threads() {
    let allocator = Arc::new(SequenceAllocator::new());
    let handles = (0..4)
      .map(|_| {
        let allocator = Arc::clone(&allocator);
        thread::spawn(move || (0..256).map(|_| allocator.allocate()).collect::<Vec<_>>())
      })
      .collect::<Vec<_>>();

    let mut seen = HashSet::new();
    for handle in handles {
      for value in handle.join().unwrap() {
        assert!(seen.insert(value));
      }
    }
    assert_eq!(seen.len(), 1024);
  }
}
