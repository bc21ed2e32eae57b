use std::fmt::{Debug, Formatter};
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError, TryLockError};

#[cfg(test)]
mod tests;

/// A non-reentrant lock for short, synchronous critical sections.<br/>
/// 短い同期クリティカルセクション向けの再入不可ロック。
///
/// Acquiring the lock twice from the same thread deadlocks; callers must release
/// before calling out into code that may take it again.
pub struct LowLevelLock<T> {
  inner: Mutex<T>,
  locked: AtomicBool,
}

impl<T> LowLevelLock<T> {
  pub fn new(value: T) -> Self {
    Self {
      inner: Mutex::new(value),
      locked: AtomicBool::new(false),
    }
  }

  /// Acquires the lock without blocking.<br/>
  /// ブロックせずにロックの取得を試みます。
  ///
  /// # Return Value / 戻り値
  /// - `Some(guard)` - If the lock was free. / ロックが空いていた場合。
  /// - `None` - If another holder owns the lock. / 他の保持者がロックを所有している場合。
  pub fn try_acquire(&self) -> Option<LowLevelLockGuard<'_, T>> {
    match self.inner.try_lock() {
      Ok(guard) => Some(self.wrap(guard)),
      Err(TryLockError::Poisoned(poisoned)) => {
        tracing::warn!("LowLevelLock recovered from a poisoned state");
        Some(self.wrap(poisoned.into_inner()))
      }
      Err(TryLockError::WouldBlock) => None,
    }
  }

  /// Blocks until the lock is available.<br/>
  /// ロックが利用可能になるまでブロックします。
  pub fn acquire(&self) -> LowLevelLockGuard<'_, T> {
    let guard = self.inner.lock().unwrap_or_else(|poisoned| {
      tracing::warn!("LowLevelLock recovered from a poisoned state");
      poisoned.into_inner()
    });
    self.wrap(guard)
  }

  /// Returns whether some holder currently owns the lock. Diagnostic only.
  pub fn is_locked(&self) -> bool {
    self.locked.load(Ordering::Acquire)
  }

  pub fn into_inner(self) -> T {
    self.inner.into_inner().unwrap_or_else(PoisonError::into_inner)
  }

  fn wrap<'a>(&'a self, guard: MutexGuard<'a, T>) -> LowLevelLockGuard<'a, T> {
    self.locked.store(true, Ordering::Release);
    LowLevelLockGuard {
      guard,
      locked: &self.locked,
    }
  }
}

impl<T: Default> Default for LowLevelLock<T> {
  fn default() -> Self {
    Self::new(T::default())
  }
}

impl<T> Debug for LowLevelLock<T> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("LowLevelLock").field("locked", &self.is_locked()).finish()
  }
}

/// Access to the value protected by a [`LowLevelLock`]. Dropping it releases the lock.
pub struct LowLevelLockGuard<'a, T> {
  guard: MutexGuard<'a, T>,
  locked: &'a AtomicBool,
}

impl<T> LowLevelLockGuard<'_, T> {
  /// Releases the lock explicitly.<br/>
  /// ロックを明示的に解放します。
  pub fn release(self) {
    drop(self);
  }
}

impl<T> Deref for LowLevelLockGuard<'_, T> {
  type Target = T;

  fn deref(&self) -> &Self::Target {
    &self.guard
  }
}

impl<T> DerefMut for LowLevelLockGuard<'_, T> {
  fn deref_mut(&mut self) -> &mut Self::Target {
    &mut self.guard
  }
}

impl<T> Drop for LowLevelLockGuard<'_, T> {
  fn drop(&mut self) {
    self.locked.store(false, Ordering::Release);
  }
}
