//! The `JourneyStore` trait.
//!
//! Implemented by storage backends (`journey-store-sqlite`, and
//! [`crate::memory::MemoryStore`] for tests and ephemeral servers). The HTTP
//! layer depends on this abstraction only.

use std::future::Future;

use crate::{
  blessing::{Blessing, BlessingQuery, NewBlessing, NewReport, Report},
  event::{HistoryEvent, JourneyLog},
  keychain::KeychainId,
  reaction::Reaction,
};

/// Abstraction over a journey store backend.
///
/// Events and reports are append-only. The only in-place mutation is the
/// `is_hidden` flag on a blessing.
///
/// All methods return `Send` futures so the trait can be used from axum
/// handlers on a multi-threaded runtime.
pub trait JourneyStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Hand-off events ───────────────────────────────────────────────────

  /// One keychain's chain in timestamp order.
  fn list_events(
    &self,
    keychain_id: KeychainId,
  ) -> impl Future<Output = Result<Vec<HistoryEvent>, Self::Error>> + Send + '_;

  /// Every chain.
  fn journey_log(&self) -> impl Future<Output = Result<JourneyLog, Self::Error>> + Send + '_;

  /// Persist a hand-off. Fails if an event with the same id exists.
  fn append_event(
    &self,
    event: HistoryEvent,
  ) -> impl Future<Output = Result<HistoryEvent, Self::Error>> + Send + '_;

  // ── Blessings ─────────────────────────────────────────────────────────

  /// Blessings matching `query`, newest first.
  fn list_blessings<'a>(
    &'a self,
    query: &'a BlessingQuery,
  ) -> impl Future<Output = Result<Vec<Blessing>, Self::Error>> + Send + 'a;

  fn get_blessing(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<Blessing>, Self::Error>> + Send + '_;

  /// Persist a validated blessing. The store assigns `id` and `created_at`.
  fn insert_blessing(
    &self,
    input: NewBlessing,
  ) -> impl Future<Output = Result<Blessing, Self::Error>> + Send + '_;

  /// Set the hidden flag. Returns `None` if the blessing does not exist.
  fn set_blessing_hidden(
    &self,
    id: i64,
    hidden: bool,
  ) -> impl Future<Output = Result<Option<Blessing>, Self::Error>> + Send + '_;

  // ── Reports ───────────────────────────────────────────────────────────

  /// Persist a report with status `pending`. Callers check that the
  /// blessing exists first.
  fn insert_report(
    &self,
    input: NewReport,
  ) -> impl Future<Output = Result<Report, Self::Error>> + Send + '_;

  // ── Reactions ─────────────────────────────────────────────────────────

  /// Active reactions ordered by ascending id.
  fn active_reactions(&self)
  -> impl Future<Output = Result<Vec<Reaction>, Self::Error>> + Send + '_;
}
