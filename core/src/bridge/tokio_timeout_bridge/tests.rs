use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use nexus_timer_utils_rs::concurrent::CountDownLatch;
use tokio::time::Instant;

use super::TokioTimeoutBridge;
use crate::bridge::{BridgeError, HostTimeoutBridge, TimeoutCallback};

#[tokio::test(start_paused = true)]
async fn test_callback_runs_no_earlier_than_delay() {
  let bridge = TokioTimeoutBridge::spawn();
  let latch = CountDownLatch::new(1);
  let fired_at = Arc::new(Mutex::new(None));
  let started = Instant::now();

  {
    let latch = latch.clone();
    let fired_at = Arc::clone(&fired_at);
    bridge
      .schedule(
        50,
        TimeoutCallback::new(move || {
          *fired_at.lock().unwrap() = Some(Instant::now());
          latch.count_down();
        }),
      )
      .unwrap();
  }

  latch.wait().await;
  let fired_at = fired_at.lock().unwrap().expect("callback did not record its time");
  assert!(fired_at >= started + Duration::from_millis(50));
  assert_eq!(bridge.outstanding(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_each_request_runs_exactly_once() {
  let bridge = TokioTimeoutBridge::spawn();
  let counter = Arc::new(AtomicUsize::new(0));
  let latch = CountDownLatch::new(10);

  for delay in 0..10 {
    let counter = Arc::clone(&counter);
    let latch = latch.clone();
    bridge
      .schedule(
        delay,
        TimeoutCallback::new(move || {
          counter.fetch_add(1, Ordering::SeqCst);
          latch.count_down();
        }),
      )
      .unwrap();
  }

  latch.wait().await;
  tokio::time::sleep(Duration::from_millis(100)).await;
  assert_eq!(counter.load(Ordering::SeqCst), 10);
  assert_eq!(bridge.outstanding(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_callback_may_schedule_again() {
  let bridge = TokioTimeoutBridge::spawn();
  let latch = CountDownLatch::new(2);

  let inner_bridge = bridge.clone();
  let inner_latch = latch.clone();
  bridge
    .schedule(
      10,
      TimeoutCallback::new(move || {
        inner_latch.count_down();
        let latch = inner_latch.clone();
        inner_bridge
          .schedule(10, TimeoutCallback::new(move || latch.count_down()))
          .unwrap();
      }),
    )
    .unwrap();

  let started = Instant::now();
  latch.wait().await;
  assert!(Instant::now() >= started + Duration::from_millis(20));
}

#[tokio::test]
async fn test_schedule_after_shutdown_fails() {
  let bridge = TokioTimeoutBridge::spawn();
  bridge.shutdown();
  assert!(bridge.is_closed());

  let result = bridge.schedule(1, TimeoutCallback::new(|| {}));
  assert_eq!(result, Err(BridgeError::Closed));
  assert_eq!(bridge.outstanding(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_too_long_delay_is_rejected_and_bridge_keeps_running() {
  let bridge = TokioTimeoutBridge::spawn();

  let result = bridge.schedule(super::TOKIO_BRIDGE_MAX_DELAY_MS + 1, TimeoutCallback::new(|| {}));
  assert_eq!(result, Err(BridgeError::Unavailable));
  assert_eq!(bridge.outstanding(), 0);

  bridge
    .schedule(super::TOKIO_BRIDGE_MAX_DELAY_MS, TimeoutCallback::new(|| {}))
    .unwrap();
  let latch = CountDownLatch::new(1);
  {
    let latch = latch.clone();
    bridge
      .schedule(10, TimeoutCallback::new(move || latch.count_down()))
      .unwrap();
  }

  latch.wait().await;
  assert!(!bridge.is_closed());
  assert_eq!(bridge.outstanding(), 1);
}

#[tokio::test]
async fn test_schedule_from_plain_threads() {
  let bridge = TokioTimeoutBridge::spawn();
  let latch = CountDownLatch::new(4);

  let handles = (0..4)
    .map(|_| {
      let bridge = bridge.clone();
      let latch = latch.clone();
      std::thread::spawn(move || bridge.schedule(1, TimeoutCallback::new(move || latch.count_down())))
    })
    .collect::<Vec<_>>();
  for handle in handles {
    handle.join().unwrap().unwrap();
  }

  tokio::time::timeout(Duration::from_secs(5), latch.wait())
    .await
    .expect("callbacks scheduled from other threads did not run");
}
