//! Shared state threaded through all handlers.

use std::{
  future::Future,
  sync::Arc,
  time::{Duration, Instant},
};

use journey_core::{
  ratelimit::{RateLimitConfig, RateLimiter, SlidingWindowLimiter},
  store::JourneyStore,
  validate::BlessingRules,
};

use crate::{auth::AdminAuth, error::ApiError};

/// Default bound on a single persistence call.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);

pub struct AppState<S: JourneyStore> {
  pub store:           Arc<S>,
  pub limiter:         Arc<dyn RateLimiter>,
  pub rules:           Arc<BlessingRules>,
  pub admin:           Option<Arc<AdminAuth>>,
  pub store_timeout:   Duration,
  /// Use `X-Forwarded-For` as the rate-limit key.
  pub trust_forwarded: bool,
  pub started_at:      Instant,
}

impl<S: JourneyStore> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:           Arc::clone(&self.store),
      limiter:         Arc::clone(&self.limiter),
      rules:           Arc::clone(&self.rules),
      admin:           self.admin.clone(),
      store_timeout:   self.store_timeout,
      trust_forwarded: self.trust_forwarded,
      started_at:      self.started_at,
    }
  }
}

impl<S: JourneyStore> AppState<S> {
  /// State with default rules, the default quota and no admin.
  pub fn new(store: Arc<S>) -> Self {
    Self {
      store,
      limiter: Arc::new(SlidingWindowLimiter::new(RateLimitConfig::default())),
      rules: Arc::new(BlessingRules::default()),
      admin: None,
      store_timeout: DEFAULT_STORE_TIMEOUT,
      trust_forwarded: false,
      started_at: Instant::now(),
    }
  }

  pub fn with_limiter(mut self, limiter: Arc<dyn RateLimiter>) -> Self {
    self.limiter = limiter;
    self
  }

  pub fn with_rules(mut self, rules: BlessingRules) -> Self {
    self.rules = Arc::new(rules);
    self
  }

  pub fn with_admin(mut self, admin: Option<AdminAuth>) -> Self {
    self.admin = admin.map(Arc::new);
    self
  }

  pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
    self.store_timeout = timeout;
    self
  }

  pub fn with_trust_forwarded(mut self, trust: bool) -> Self {
    self.trust_forwarded = trust;
    self
  }

  /// Await a store call under the configured timeout. Failures are logged in
  /// full here and surface as `INTERNAL_ERROR`.
  pub(crate) async fn persist<T>(
    &self,
    op: &'static str,
    call: impl Future<Output = Result<T, S::Error>>,
  ) -> Result<T, ApiError> {
    match tokio::time::timeout(self.store_timeout, call).await {
      Ok(Ok(value)) => Ok(value),
      Ok(Err(e)) => {
        tracing::error!(op, error = %e, "store call failed");
        Err(ApiError::Store(Box::new(e)))
      }
      Err(_) => {
        tracing::error!(op, timeout_ms = self.store_timeout.as_millis() as u64, "store call timed out");
        Err(ApiError::Timeout(op))
      }
    }
  }
}
