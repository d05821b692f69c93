//! An in-process [`JourneyStore`].
//!
//! Backs the server's `store = "memory"` mode and the HTTP tests. Nothing
//! survives a restart.

use std::sync::{PoisonError, RwLock};

use chrono::Utc;
use thiserror::Error;
use uuid::Uuid;

use crate::{
  blessing::{Blessing, BlessingQuery, NewBlessing, NewReport, Report, ReportStatus},
  event::{HistoryEvent, JourneyLog},
  keychain::KeychainId,
  reaction::{Reaction, default_reactions},
  store::JourneyStore,
};

#[derive(Debug, Error)]
pub enum MemoryError {
  #[error("event already recorded: {0}")]
  DuplicateEvent(Uuid),

  #[error("blessing not found: {0}")]
  UnknownBlessing(i64),
}

#[derive(Default)]
struct Inner {
  log:       JourneyLog,
  blessings: Vec<Blessing>,
  reports:   Vec<Report>,
  reactions: Vec<Reaction>,
}

impl Inner {
  fn with_report_count(&self, mut b: Blessing) -> Blessing {
    b.reported_count = self.reports.iter().filter(|r| r.blessing_id == b.id).count() as u32;
    b
  }
}

pub struct MemoryStore {
  inner: RwLock<Inner>,
}

impl Default for MemoryStore {
  fn default() -> Self { Self::new() }
}

impl MemoryStore {
  /// An empty store seeded with the default reaction pool.
  pub fn new() -> Self { Self::with_reactions(default_reactions()) }

  pub fn with_reactions(reactions: Vec<Reaction>) -> Self {
    Self { inner: RwLock::new(Inner { reactions, ..Default::default() }) }
  }

  fn read(&self) -> std::sync::RwLockReadGuard<'_, Inner> {
    self.inner.read().unwrap_or_else(PoisonError::into_inner)
  }

  fn write(&self) -> std::sync::RwLockWriteGuard<'_, Inner> {
    self.inner.write().unwrap_or_else(PoisonError::into_inner)
  }
}

impl JourneyStore for MemoryStore {
  type Error = MemoryError;

  async fn list_events(&self, keychain_id: KeychainId) -> Result<Vec<HistoryEvent>, MemoryError> {
    Ok(self.read().log.chain(keychain_id).to_vec())
  }

  async fn journey_log(&self) -> Result<JourneyLog, MemoryError> { Ok(self.read().log.clone()) }

  async fn append_event(&self, event: HistoryEvent) -> Result<HistoryEvent, MemoryError> {
    let mut inner = self.write();
    if inner.log.events().any(|e| e.id == event.id) {
      return Err(MemoryError::DuplicateEvent(event.id));
    }
    let mut chain = inner.log.chain(event.keychain_id).to_vec();
    chain.push(event.clone());
    inner.log.replace_chain(event.keychain_id, chain);
    Ok(event)
  }

  async fn list_blessings<'a>(
    &'a self,
    query: &'a BlessingQuery,
  ) -> Result<Vec<Blessing>, MemoryError> {
    let inner = self.read();
    let mut out: Vec<Blessing> = inner
      .blessings
      .iter()
      .filter(|b| query.matches(b))
      .map(|b| inner.with_report_count(b.clone()))
      .collect();
    out.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    Ok(out)
  }

  async fn get_blessing(&self, id: i64) -> Result<Option<Blessing>, MemoryError> {
    let inner = self.read();
    Ok(inner.blessings.iter().find(|b| b.id == id).map(|b| inner.with_report_count(b.clone())))
  }

  async fn insert_blessing(&self, input: NewBlessing) -> Result<Blessing, MemoryError> {
    let mut inner = self.write();
    let id = inner.blessings.last().map_or(1, |b| b.id + 1);
    let blessing = Blessing {
      id,
      keychain_id: input.keychain_id,
      station_number: input.station_number,
      quest_tag: input.quest_tag,
      blessing_text: input.blessing_text,
      code_phrase: input.code_phrase,
      optional_note: input.optional_note,
      visibility: input.visibility,
      created_at: Utc::now(),
      is_hidden: false,
      reported_count: 0,
    };
    inner.blessings.push(blessing.clone());
    Ok(blessing)
  }

  async fn set_blessing_hidden(
    &self,
    id: i64,
    hidden: bool,
  ) -> Result<Option<Blessing>, MemoryError> {
    let mut inner = self.write();
    let Some(b) = inner.blessings.iter_mut().find(|b| b.id == id) else {
      return Ok(None);
    };
    b.is_hidden = hidden;
    let b = b.clone();
    Ok(Some(inner.with_report_count(b)))
  }

  async fn insert_report(&self, input: NewReport) -> Result<Report, MemoryError> {
    let mut inner = self.write();
    if !inner.blessings.iter().any(|b| b.id == input.blessing_id) {
      return Err(MemoryError::UnknownBlessing(input.blessing_id));
    }
    let report = Report {
      id:          inner.reports.last().map_or(1, |r| r.id + 1),
      blessing_id: input.blessing_id,
      reason:      input.reason,
      description: input.description,
      status:      ReportStatus::Pending,
      created_at:  Utc::now(),
    };
    inner.reports.push(report.clone());
    Ok(report)
  }

  async fn active_reactions(&self) -> Result<Vec<Reaction>, MemoryError> {
    let mut pool: Vec<Reaction> =
      self.read().reactions.iter().filter(|r| r.is_active()).cloned().collect();
    pool.sort_by_key(|r| r.id);
    Ok(pool)
  }
}

#[cfg(test)]
mod tests {
  use chrono::Duration;

  use super::*;
  use crate::blessing::{ReportReason, Visibility};

  fn kc(id: u8) -> KeychainId { KeychainId::new(id).unwrap() }

  fn new_blessing(keychain: u8, station: u32) -> NewBlessing {
    NewBlessing {
      keychain_id:    kc(keychain),
      station_number: station,
      quest_tag:      None,
      blessing_text:  "平安".into(),
      code_phrase:    "象".into(),
      optional_note:  None,
      visibility:     Visibility::Public,
    }
  }

  fn event(keychain: u8, to: &str, offset_ms: i64) -> HistoryEvent {
    HistoryEvent {
      id:               Uuid::new_v4(),
      keychain_id:      kc(keychain),
      timestamp:        Utc::now() + Duration::milliseconds(offset_ms),
      from_name:        "A".into(),
      to_name:          to.into(),
      prompt_key:       "START".into(),
      prompt_text:      "start".into(),
      next_prompt_key:  None,
      next_prompt_text: None,
    }
  }

  #[tokio::test]
  async fn events_come_back_in_timestamp_order() {
    let store = MemoryStore::new();
    store.append_event(event(3, "second", 10)).await.unwrap();
    store.append_event(event(3, "first", 0)).await.unwrap();
    let chain = store.list_events(kc(3)).await.unwrap();
    let names: Vec<_> = chain.iter().map(|e| e.to_name.as_str()).collect();
    assert_eq!(names, ["first", "second"]);
    assert!(store.list_events(kc(4)).await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn duplicate_event_ids_are_rejected() {
    let store = MemoryStore::new();
    let e = event(1, "B", 0);
    store.append_event(e.clone()).await.unwrap();
    assert!(matches!(store.append_event(e).await, Err(MemoryError::DuplicateEvent(_))));
  }

  #[tokio::test]
  async fn blessings_list_newest_first_and_respect_hidden() {
    let store = MemoryStore::new();
    let first = store.insert_blessing(new_blessing(7, 1)).await.unwrap();
    let second = store.insert_blessing(new_blessing(7, 2)).await.unwrap();
    store.insert_blessing(new_blessing(8, 1)).await.unwrap();

    let query = BlessingQuery::for_keychain(kc(7));
    let ids: Vec<_> = store.list_blessings(&query).await.unwrap().iter().map(|b| b.id).collect();
    assert_eq!(ids, [second.id, first.id]);

    store.set_blessing_hidden(second.id, true).await.unwrap();
    let ids: Vec<_> = store.list_blessings(&query).await.unwrap().iter().map(|b| b.id).collect();
    assert_eq!(ids, [first.id]);

    assert!(store.set_blessing_hidden(999, true).await.unwrap().is_none());
  }

  #[tokio::test]
  async fn reports_raise_the_derived_count() {
    let store = MemoryStore::new();
    let b = store.insert_blessing(new_blessing(1, 1)).await.unwrap();
    let report = store
      .insert_report(NewReport { blessing_id: b.id, reason: ReportReason::Spam, description: None })
      .await
      .unwrap();
    assert_eq!(report.status, ReportStatus::Pending);
    assert_eq!(store.get_blessing(b.id).await.unwrap().unwrap().reported_count, 1);

    let missing = NewReport { blessing_id: 42, reason: ReportReason::Other, description: None };
    assert!(matches!(store.insert_report(missing).await, Err(MemoryError::UnknownBlessing(42))));
  }

  #[tokio::test]
  async fn only_active_reactions_are_listed() {
    let mut reactions = default_reactions();
    reactions[0].status = crate::reaction::ReactionStatus::Inactive;
    let store = MemoryStore::with_reactions(reactions);
    let pool = store.active_reactions().await.unwrap();
    assert_eq!(pool.len(), 9);
    assert!(pool.windows(2).all(|w| w[0].id < w[1].id));
  }
}
