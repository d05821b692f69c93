//! Hand-off events and the per-keychain journey log.
//!
//! Events are immutable. A keychain's chain only ever grows by appending; the
//! `to_name` of the tail event is the current holder.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::keychain::KeychainId;

// ─── HistoryEvent ────────────────────────────────────────────────────────────

/// One hand-off record in a keychain's chain of custody.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEvent {
  pub id:               Uuid,
  pub keychain_id:      KeychainId,
  /// Milliseconds since the Unix epoch on the wire.
  #[serde(with = "chrono::serde::ts_milliseconds")]
  pub timestamp:        DateTime<Utc>,
  pub from_name:        String,
  pub to_name:          String,
  /// The quest the giver was following; explains why `to_name` received it.
  pub prompt_key:       String,
  pub prompt_text:      String,
  /// The quest assigned to `to_name` for choosing the next holder.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub next_prompt_key:  Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub next_prompt_text: Option<String>,
}

// ─── JourneyLog ──────────────────────────────────────────────────────────────

/// Every keychain's ordered chain, keyed by keychain id.
///
/// Serialises as `{ "<id>": [event, ...] }`. Chains are kept in timestamp
/// order; events with equal timestamps keep their arrival order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JourneyLog {
  chains: BTreeMap<KeychainId, Vec<HistoryEvent>>,
}

/// Aggregate counts across all keychains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JourneySummary {
  /// Keychains with at least one hand-off.
  pub active_keychains: usize,
  pub total_handoffs:   usize,
}

/// One cell of the overview grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeychainStatus {
  pub keychain_id: KeychainId,
  pub handoffs:    usize,
  /// `None` while the keychain has never been passed on.
  pub holder:      Option<String>,
}

impl JourneyLog {
  pub fn new() -> Self { Self::default() }

  /// Rebuild the log from persisted rows in any order.
  pub fn from_events(events: impl IntoIterator<Item = HistoryEvent>) -> Self {
    let mut chains: BTreeMap<KeychainId, Vec<HistoryEvent>> = BTreeMap::new();
    for event in events {
      chains.entry(event.keychain_id).or_default().push(event);
    }
    for chain in chains.values_mut() {
      chain.sort_by_key(|e| e.timestamp);
    }
    Self { chains }
  }

  /// The ordered chain for `id`; empty if the keychain was never passed.
  pub fn chain(&self, id: KeychainId) -> &[HistoryEvent] {
    self.chains.get(&id).map(Vec::as_slice).unwrap_or_default()
  }

  pub fn tail(&self, id: KeychainId) -> Option<&HistoryEvent> {
    self.chain(id).last()
  }

  pub fn current_holder(&self, id: KeychainId) -> Option<&str> {
    self.tail(id).map(|e| e.to_name.as_str())
  }

  /// Append `event` to its keychain's chain.
  pub fn append(&mut self, event: HistoryEvent) {
    self.chains.entry(event.keychain_id).or_default().push(event);
  }

  /// Remove an event that was appended optimistically but never persisted.
  pub fn remove(&mut self, id: KeychainId, event_id: Uuid) -> Option<HistoryEvent> {
    let chain = self.chains.get_mut(&id)?;
    let pos = chain.iter().position(|e| e.id == event_id)?;
    let removed = chain.remove(pos);
    if chain.is_empty() {
      self.chains.remove(&id);
    }
    Some(removed)
  }

  /// Replace one keychain's chain with freshly loaded rows.
  pub fn replace_chain(&mut self, id: KeychainId, mut events: Vec<HistoryEvent>) {
    events.retain(|e| e.keychain_id == id);
    events.sort_by_key(|e| e.timestamp);
    if events.is_empty() {
      self.chains.remove(&id);
    } else {
      self.chains.insert(id, events);
    }
  }

  pub fn summary(&self) -> JourneySummary {
    JourneySummary {
      active_keychains: self.chains.values().filter(|c| !c.is_empty()).count(),
      total_handoffs:   self.chains.values().map(Vec::len).sum(),
    }
  }

  /// Status for every keychain id `0..=99`, in order.
  pub fn overview(&self) -> Vec<KeychainStatus> {
    KeychainId::all()
      .map(|id| KeychainStatus {
        keychain_id: id,
        handoffs:    self.chain(id).len(),
        holder:      self.current_holder(id).map(str::to_owned),
      })
      .collect()
  }

  /// All events across all keychains, chain by chain.
  pub fn events(&self) -> impl Iterator<Item = &HistoryEvent> {
    self.chains.values().flatten()
  }
}
