//! Per-origin submission quota.
//!
//! A sliding window: a key may be admitted at most `max_requests` times in any
//! `window_secs` span. The check and the recording of an admission happen under
//! one lock, so concurrent requests from the same origin cannot both take the
//! last slot.
//!
//! The number of distinct keys held at once is capped by `max_tracked_keys`.
//! When the map is full and a new key arrives, expired keys are swept first;
//! if none can be dropped the new key is refused for a full window.

use std::{
  collections::{HashMap, VecDeque},
  sync::{Mutex, PoisonError},
  time::{Duration, Instant},
};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
  /// When false every request is admitted. Development setups turn this off.
  pub enabled:          bool,
  pub max_requests:     u32,
  pub window_secs:      u64,
  /// Hard cap on distinct origins held in memory.
  pub max_tracked_keys: usize,
}

impl Default for RateLimitConfig {
  fn default() -> Self {
    Self { enabled: true, max_requests: 3, window_secs: 300, max_tracked_keys: 10_000 }
  }
}

impl RateLimitConfig {
  pub fn window(&self) -> Duration { Duration::from_secs(self.window_secs) }
}

/// Outcome of a quota check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
  Allowed,
  /// Rejected; the earliest slot frees up after `retry_after`.
  Limited { retry_after: Duration },
}

impl Admission {
  pub fn is_allowed(self) -> bool { matches!(self, Self::Allowed) }

  /// Whole seconds to wait, never less than one.
  pub fn retry_after_secs(self) -> Option<u64> {
    match self {
      Self::Allowed => None,
      Self::Limited { retry_after } => {
        let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
        Some(secs.max(1))
      }
    }
  }
}

/// Quota backend. The in-process [`SlidingWindowLimiter`] is the only
/// implementation today; a shared store would implement the same trait.
pub trait RateLimiter: Send + Sync {
  /// Check `key` and, if admitted, consume one slot.
  fn check_and_consume(&self, key: &str) -> Admission;
}

// ─── SlidingWindowLimiter ────────────────────────────────────────────────────

/// Keys with no admissions inside the window are dropped once the map holds
/// this many entries.
const CLEANUP_THRESHOLD: usize = 1024;

pub struct SlidingWindowLimiter {
  config: RateLimitConfig,
  state:  Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl SlidingWindowLimiter {
  pub fn new(config: RateLimitConfig) -> Self {
    Self { config, state: Mutex::new(HashMap::new()) }
  }

  pub fn config(&self) -> &RateLimitConfig { &self.config }

  /// [`RateLimiter::check_and_consume`] at an explicit instant.
  pub fn check_at(&self, key: &str, now: Instant) -> Admission {
    if !self.config.enabled {
      return Admission::Allowed;
    }
    let window = self.config.window();
    let max = self.config.max_requests as usize;
    let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

    if !state.contains_key(key) {
      let cap = self.config.max_tracked_keys;
      if state.len() >= CLEANUP_THRESHOLD.min(cap) {
        state.retain(|_, stamps| {
          expire(stamps, now, window);
          !stamps.is_empty()
        });
      }
      if state.len() >= cap {
        return Admission::Limited { retry_after: window };
      }
    }

    let stamps = state.entry(key.to_owned()).or_default();
    expire(stamps, now, window);

    if stamps.len() >= max {
      // With max == 0 nothing is ever recorded; wait a full window.
      let retry_after = stamps
        .front()
        .map(|oldest| (*oldest + window).saturating_duration_since(now))
        .unwrap_or(window);
      return Admission::Limited { retry_after };
    }

    stamps.push_back(now);
    Admission::Allowed
  }

  /// Number of keys currently tracked.
  pub fn tracked_keys(&self) -> usize {
    self.state.lock().unwrap_or_else(PoisonError::into_inner).len()
  }
}

impl RateLimiter for SlidingWindowLimiter {
  fn check_and_consume(&self, key: &str) -> Admission { self.check_at(key, Instant::now()) }
}

/// Drop stamps that fell out of the window ending at `now`.
fn expire(stamps: &mut VecDeque<Instant>, now: Instant, window: Duration) {
  while let Some(front) = stamps.front() {
    if now.saturating_duration_since(*front) >= window {
      stamps.pop_front();
    } else {
      break;
    }
  }
}

#[cfg(test)]
mod tests {
  use std::{sync::Arc, thread};

  use super::*;

  fn limiter() -> SlidingWindowLimiter { SlidingWindowLimiter::new(RateLimitConfig::default()) }

  #[test]
  fn fourth_request_in_window_is_limited() {
    let limiter = limiter();
    let t0 = Instant::now();
    for i in 0..3 {
      assert!(limiter.check_at("1.2.3.4", t0 + Duration::from_secs(i)).is_allowed());
    }
    let denied = limiter.check_at("1.2.3.4", t0 + Duration::from_secs(10));
    assert_eq!(denied, Admission::Limited { retry_after: Duration::from_secs(290) });
    assert_eq!(denied.retry_after_secs(), Some(290));
  }

  #[test]
  fn slot_frees_when_oldest_leaves_window() {
    let limiter = limiter();
    let t0 = Instant::now();
    for i in 0..3 {
      limiter.check_at("k", t0 + Duration::from_secs(i * 60));
    }
    assert!(!limiter.check_at("k", t0 + Duration::from_secs(299)).is_allowed());
    assert!(limiter.check_at("k", t0 + Duration::from_secs(300)).is_allowed());
    assert!(!limiter.check_at("k", t0 + Duration::from_secs(301)).is_allowed());
  }

  #[test]
  fn rejected_requests_do_not_consume() {
    let limiter = limiter();
    let t0 = Instant::now();
    for _ in 0..3 {
      limiter.check_at("k", t0);
    }
    for i in 1..50 {
      assert!(!limiter.check_at("k", t0 + Duration::from_secs(i)).is_allowed());
    }
    assert!(limiter.check_at("k", t0 + Duration::from_secs(300)).is_allowed());
  }

  #[test]
  fn keys_are_independent() {
    let limiter = limiter();
    let t0 = Instant::now();
    for _ in 0..3 {
      limiter.check_at("a", t0);
    }
    assert!(!limiter.check_at("a", t0).is_allowed());
    assert!(limiter.check_at("b", t0).is_allowed());
    assert_eq!(limiter.tracked_keys(), 2);
  }

  #[test]
  fn new_keys_are_refused_once_the_map_is_full() {
    let limiter =
      SlidingWindowLimiter::new(RateLimitConfig { max_tracked_keys: 4, ..Default::default() });
    let t0 = Instant::now();
    for i in 0..4 {
      assert!(limiter.check_at(&format!("10.0.0.{i}"), t0).is_allowed());
    }

    let spoofed = limiter.check_at("10.0.0.99", t0 + Duration::from_secs(1));
    assert_eq!(spoofed, Admission::Limited { retry_after: Duration::from_secs(300) });
    assert_eq!(limiter.tracked_keys(), 4);
    // Origins already tracked keep their own quota.
    assert!(limiter.check_at("10.0.0.0", t0 + Duration::from_secs(1)).is_allowed());

    // Once the window passes the stale keys are swept and room opens up.
    let later = t0 + Duration::from_secs(300);
    assert!(limiter.check_at("10.0.0.99", later).is_allowed());
    assert!(limiter.tracked_keys() <= 4);
  }

  #[test]
  fn disabled_limiter_admits_everything() {
    let limiter =
      SlidingWindowLimiter::new(RateLimitConfig { enabled: false, ..Default::default() });
    let t0 = Instant::now();
    assert!((0..100).all(|_| limiter.check_at("k", t0).is_allowed()));
  }

  #[test]
  fn sub_second_wait_rounds_up_to_one() {
    let admission = Admission::Limited { retry_after: Duration::from_millis(1) };
    assert_eq!(admission.retry_after_secs(), Some(1));
    let admission = Admission::Limited { retry_after: Duration::from_millis(1500) };
    assert_eq!(admission.retry_after_secs(), Some(2));
  }

  #[test]
  fn concurrent_callers_share_one_quota() {
    let limiter = Arc::new(limiter());
    let handles: Vec<_> = (0..16)
      .map(|_| {
        let limiter = Arc::clone(&limiter);
        thread::spawn(move || limiter.check_and_consume("shared").is_allowed())
      })
      .collect();
    let admitted = handles.into_iter().map(|h| h.join().unwrap()).filter(|ok| *ok).count();
    assert_eq!(admitted, 3);
  }
}
