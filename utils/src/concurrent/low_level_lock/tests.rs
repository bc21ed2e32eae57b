use std::sync::Arc;
use std::thread;

use super::LowLevelLock;

#[test]
fn test_try_acquire_fails_while_held() {
  let lock = LowLevelLock::new(0usize);
  let guard = lock.acquire();
  assert!(lock.is_locked());
  assert!(lock.try_acquire().is_none());
  guard.release();
  assert!(!lock.is_locked());
  assert!(lock.try_acquire().is_some());
}

#[test]
fn test_guard_gives_mutable_access() {
  let lock = LowLevelLock::new(Vec::new());
  {
    let mut guard = lock.acquire();
    guard.push(1);
    guard.push(2);
  }
  assert_eq!(lock.into_inner(), vec![1, 2]);
}

#[test]
fn test_acquire_serializes_threads() {
  let lock = Arc::new(LowLevelLock::new(0usize));
  let handles = (0..8)
    .map(|_| {
      let lock = Arc::clone(&lock);
      thread::spawn(move || {
        for _ in 0..1000 {
          *lock.acquire() += 1;
        }
      })
    })
    .collect::<Vec<_>>();
  for handle in handles {
    handle.join().unwrap();
  }
  assert_eq!(*lock.acquire(), 8000);
}

#[test]
fn test_recovers_after_poisoning() {
  let lock = Arc::new(LowLevelLock::new(7usize));
  let cloned = Arc::clone(&lock);
  let result = thread::spawn(move || {
    let _guard = cloned.acquire();
    panic!("poison the lock");
  })
  .join();
  assert!(result.is_err());

  assert!(!lock.is_locked());
  assert_eq!(*lock.acquire(), 7);
  assert!(lock.try_acquire().is_some());
}
