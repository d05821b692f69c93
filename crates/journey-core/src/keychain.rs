//! Keychain identity and URL routing.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Identifier of a physical keychain: an integer in `0..=99`, carried on the
/// wire as its decimal string form (`"7"`).
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct KeychainId(u8);

impl KeychainId {
  pub const MAX: u8 = 99;

  pub fn new(value: u8) -> Result<Self, ValidationError> {
    if value > Self::MAX {
      return Err(ValidationError::Invalid {
        field:  "keychain_id",
        reason: format!("{value} is outside 0-{}", Self::MAX),
      });
    }
    Ok(Self(value))
  }

  pub fn get(self) -> u8 { self.0 }

  /// Every valid keychain id in ascending order.
  pub fn all() -> impl Iterator<Item = Self> { (0..=Self::MAX).map(Self) }
}

impl fmt::Display for KeychainId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

impl FromStr for KeychainId {
  type Err = ValidationError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
      return Err(ValidationError::Missing("keychain_id"));
    }
    let value: u8 = trimmed.parse().map_err(|_| ValidationError::Invalid {
      field:  "keychain_id",
      reason: format!("{trimmed:?} is not an integer in 0-{}", Self::MAX),
    })?;
    Self::new(value)
  }
}

impl TryFrom<String> for KeychainId {
  type Error = ValidationError;

  fn try_from(value: String) -> Result<Self, Self::Error> { value.parse() }
}

impl From<KeychainId> for String {
  fn from(id: KeychainId) -> Self { id.to_string() }
}

// ─── Routing ─────────────────────────────────────────────────────────────────

/// Where a client lands, decided by the `?id=N` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
  /// No id, or an id that is not a valid keychain: the all-keychains view.
  Overview,
  Keychain(KeychainId),
}

impl Route {
  pub fn from_query(id: Option<&str>) -> Self {
    id.and_then(|raw| raw.parse().ok())
      .map_or(Self::Overview, Self::Keychain)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_in_range_ids() {
    assert_eq!("0".parse::<KeychainId>().unwrap().get(), 0);
    assert_eq!(" 99 ".parse::<KeychainId>().unwrap().get(), 99);
  }

  #[test]
  fn rejects_out_of_range_and_garbage() {
    assert!("100".parse::<KeychainId>().is_err());
    assert!("-1".parse::<KeychainId>().is_err());
    assert!("seven".parse::<KeychainId>().is_err());
    assert_eq!(
      "".parse::<KeychainId>().unwrap_err(),
      ValidationError::Missing("keychain_id")
    );
  }

  #[test]
  fn serialises_as_string() {
    let id = KeychainId::new(7).unwrap();
    assert_eq!(serde_json::to_string(&id).unwrap(), "\"7\"");
    let back: KeychainId = serde_json::from_str("\"7\"").unwrap();
    assert_eq!(back, id);
  }

  #[test]
  fn route_falls_back_to_overview() {
    assert_eq!(Route::from_query(None), Route::Overview);
    assert_eq!(Route::from_query(Some("150")), Route::Overview);
    assert_eq!(Route::from_query(Some("abc")), Route::Overview);
    assert_eq!(
      Route::from_query(Some("42")),
      Route::Keychain(KeychainId::new(42).unwrap())
    );
  }

  #[test]
  fn all_covers_the_full_range() {
    let ids: Vec<_> = KeychainId::all().collect();
    assert_eq!(ids.len(), 100);
    assert_eq!(ids.last().unwrap().get(), 99);
  }
}
