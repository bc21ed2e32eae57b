use std::env;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use nexus_timer_core_rs::{
  BridgeHandle, TimerConfig, TimerConfigOption, TimerRegistry, TokioClock, TokioTimeoutBridge, WeakLogicalTimer,
};
use nexus_timer_utils_rs::concurrent::CountDownLatch;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
  env::set_var("RUST_LOG", "debug");
  let _ = tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .try_init();

  let bridge = TokioTimeoutBridge::spawn();
  let registry = TimerRegistry::new(
    Arc::new(TokioClock::new()),
    BridgeHandle::new(bridge.clone()),
    TimerConfig::from([TimerConfigOption::with_name("demo")]),
  );

  // Two one-shot timers and one that fires three times by re-arming itself.
  let latch = CountDownLatch::new(5);
  let mut one_shots = Vec::new();
  for (name, delay_ms) in [("slow", 300), ("fast", 100)] {
    let latch = latch.clone();
    let timer = registry.create_timer(move || {
      tracing::info!(timer = name, "one-shot timer fired");
      latch.count_down();
    });
    timer.arm(delay_ms).expect("arm one-shot timer");
    one_shots.push(timer);
  }

  let ticks = Arc::new(AtomicUsize::new(0));
  let ticker_slot: Arc<Mutex<Option<WeakLogicalTimer>>> = Arc::new(Mutex::new(None));
  let ticker = {
    let latch = latch.clone();
    let ticks = Arc::clone(&ticks);
    let slot = Arc::clone(&ticker_slot);
    registry.create_timer(move || {
      let tick = ticks.fetch_add(1, Ordering::SeqCst) + 1;
      tracing::info!(tick, "periodic timer fired");
      latch.count_down();
      if tick < 3 {
        let weak = slot.lock().unwrap().clone();
        if let Some(timer) = weak.and_then(|weak| weak.upgrade()) {
          if let Err(error) = timer.arm(150) {
            tracing::error!(%error, "failed to re-arm periodic timer");
          }
        }
      }
    })
  };
  *ticker_slot.lock().unwrap() = Some(ticker.downgrade());
  ticker.arm(150).expect("arm periodic timer");

  latch.wait().await;
  tracing::info!(
    ticks = ticks.load(Ordering::SeqCst),
    one_shots = one_shots.len(),
    idle = registry.is_idle(),
    "all timers fired"
  );
  bridge.shutdown();
}
