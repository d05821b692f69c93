//! Blessings left at stations, and reports raised against them.
//!
//! A blessing is never deleted; the only mutation is an admin toggling
//! `is_hidden`. Reports are append-only.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ValidationError, keychain::KeychainId};

/// Station used when a submission does not name one.
pub const DEFAULT_STATION: u32 = 1;

// ─── Visibility ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
  Private,
  #[default]
  Public,
}

impl Visibility {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Private => "private",
      Self::Public => "public",
    }
  }
}

impl FromStr for Visibility {
  type Err = ValidationError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "private" => Ok(Self::Private),
      "public" => Ok(Self::Public),
      other => Err(ValidationError::Invalid {
        field:  "visibility",
        reason: format!("{other:?} is not one of private, public"),
      }),
    }
  }
}

impl fmt::Display for Visibility {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

// ─── Blessing ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blessing {
  pub id:             i64,
  pub keychain_id:    KeychainId,
  pub station_number: u32,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub quest_tag:      Option<String>,
  pub blessing_text:  String,
  pub code_phrase:    String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub optional_note:  Option<String>,
  pub visibility:     Visibility,
  pub created_at:     DateTime<Utc>,
  pub is_hidden:      bool,
  /// Number of reports filed against this blessing; derived on read.
  #[serde(default)]
  pub reported_count: u32,
}

/// A validated blessing submission. `created_at` and `id` are assigned by the
/// store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBlessing {
  pub keychain_id:    KeychainId,
  pub station_number: u32,
  pub quest_tag:      Option<String>,
  pub blessing_text:  String,
  pub code_phrase:    String,
  pub optional_note:  Option<String>,
  pub visibility:     Visibility,
}

/// Filter for [`crate::store::JourneyStore::list_blessings`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlessingQuery {
  pub keychain_id:    KeychainId,
  pub station_number: Option<u32>,
  /// `None` returns both visibilities.
  pub visibility:     Option<Visibility>,
  /// Admin context only.
  pub include_hidden: bool,
}

impl BlessingQuery {
  pub fn for_keychain(keychain_id: KeychainId) -> Self {
    Self {
      keychain_id,
      station_number: None,
      visibility: None,
      include_hidden: false,
    }
  }

  pub fn matches(&self, b: &Blessing) -> bool {
    b.keychain_id == self.keychain_id
      && self.station_number.is_none_or(|s| s == b.station_number)
      && self.visibility.is_none_or(|v| v == b.visibility)
      && (self.include_hidden || !b.is_hidden)
  }
}

// ─── Reports ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportReason {
  PiiExposed,
  Inappropriate,
  Spam,
  Other,
}

impl ReportReason {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::PiiExposed => "PII_EXPOSED",
      Self::Inappropriate => "INAPPROPRIATE",
      Self::Spam => "SPAM",
      Self::Other => "OTHER",
    }
  }
}

impl FromStr for ReportReason {
  type Err = ValidationError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "PII_EXPOSED" => Ok(Self::PiiExposed),
      "INAPPROPRIATE" => Ok(Self::Inappropriate),
      "SPAM" => Ok(Self::Spam),
      "OTHER" => Ok(Self::Other),
      other => Err(ValidationError::Invalid {
        field:  "reason",
        reason: format!("{other:?} is not one of PII_EXPOSED, INAPPROPRIATE, SPAM, OTHER"),
      }),
    }
  }
}

/// Review state of a report. Transitions are admin-only and not exposed yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
  #[default]
  Pending,
  Reviewed,
  Dismissed,
}

impl ReportStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Pending => "pending",
      Self::Reviewed => "reviewed",
      Self::Dismissed => "dismissed",
    }
  }
}

impl FromStr for ReportStatus {
  type Err = ValidationError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "pending" => Ok(Self::Pending),
      "reviewed" => Ok(Self::Reviewed),
      "dismissed" => Ok(Self::Dismissed),
      other => Err(ValidationError::Invalid {
        field:  "status",
        reason: format!("unknown report status {other:?}"),
      }),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
  pub id:          i64,
  pub blessing_id: i64,
  pub reason:      ReportReason,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  pub status:      ReportStatus,
  pub created_at:  DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReport {
  pub blessing_id: i64,
  pub reason:      ReportReason,
  pub description: Option<String>,
}

#[cfg(test)]
mod tests {
  use super::*;

  fn blessing(station: u32, visibility: Visibility, hidden: bool) -> Blessing {
    Blessing {
      id: 1,
      keychain_id: KeychainId::new(5).unwrap(),
      station_number: station,
      quest_tag: None,
      blessing_text: "一切順利".into(),
      code_phrase: "象".into(),
      optional_note: None,
      visibility,
      created_at: Utc::now(),
      is_hidden: hidden,
      reported_count: 0,
    }
  }

  #[test]
  fn query_hides_hidden_unless_admin() {
    let hidden = blessing(1, Visibility::Public, true);
    let mut query = BlessingQuery::for_keychain(KeychainId::new(5).unwrap());
    assert!(!query.matches(&hidden));
    query.include_hidden = true;
    assert!(query.matches(&hidden));
  }

  #[test]
  fn query_filters_station_and_visibility() {
    let b = blessing(2, Visibility::Private, false);
    let mut query = BlessingQuery::for_keychain(KeychainId::new(5).unwrap());
    assert!(query.matches(&b));
    query.station_number = Some(1);
    assert!(!query.matches(&b));
    query.station_number = Some(2);
    query.visibility = Some(Visibility::Public);
    assert!(!query.matches(&b));
    query.visibility = Some(Visibility::Private);
    assert!(query.matches(&b));
    query.keychain_id = KeychainId::new(6).unwrap();
    assert!(!query.matches(&b));
  }

  #[test]
  fn reasons_roundtrip_through_wire_names() {
    for reason in [
      ReportReason::PiiExposed,
      ReportReason::Inappropriate,
      ReportReason::Spam,
      ReportReason::Other,
    ] {
      let json = serde_json::to_string(&reason).unwrap();
      assert_eq!(json, format!("\"{}\"", reason.as_str()));
      assert_eq!(reason.as_str().parse::<ReportReason>().unwrap(), reason);
    }
    assert!("RUDE".parse::<ReportReason>().is_err());
  }
}
