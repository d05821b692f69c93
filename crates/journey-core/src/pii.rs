//! Heuristic detection of personally identifying information.
//!
//! Deliberately over-inclusive: any standalone run of eight digits reads as a
//! Hong Kong phone number. The same scanner backs the advisory check in the
//! terminal client and the authoritative check in the API.

use std::{fmt, sync::LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Place names whose mere presence rejects a submission.
pub const PLACE_NAMES: &[&str] = &[
  "香港", "灣仔", "中環", "銅鑼灣", "旺角", "尖沙咀", "佐敦", "油麻地", "油塘", "觀塘",
  "荃灣", "屯門", "大埔", "沙田", "元朗",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PiiCategory {
  PhoneHk,
  PhoneCn,
  Email,
  Url,
  AddressHk,
}

impl PiiCategory {
  pub const ALL: [Self; 5] = [
    Self::PhoneHk,
    Self::PhoneCn,
    Self::Email,
    Self::Url,
    Self::AddressHk,
  ];

  pub fn as_str(self) -> &'static str {
    match self {
      Self::PhoneHk => "phone_hk",
      Self::PhoneCn => "phone_cn",
      Self::Email => "email",
      Self::Url => "url",
      Self::AddressHk => "address_hk",
    }
  }

  pub fn join(categories: &[Self]) -> String {
    categories.iter().map(|c| c.as_str()).collect::<Vec<_>>().join(", ")
  }

  fn pattern(self) -> &'static Regex {
    match self {
      Self::PhoneHk => &PHONE_HK,
      Self::PhoneCn => &PHONE_CN,
      Self::Email => &EMAIL,
      Self::Url => &URL,
      Self::AddressHk => &ADDRESS_HK,
    }
  }
}

impl fmt::Display for PiiCategory {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

// Word boundaries are ASCII-only so that digits sitting next to CJK text
// still count as standalone.
static PHONE_HK: LazyLock<Regex> = LazyLock::new(|| {
  compile(r"(?-u:\b)[0-9]{8}(?-u:\b)|\+852[0-9 \-]{7,}")
});
static PHONE_CN: LazyLock<Regex> = LazyLock::new(|| compile(r"(?-u:\b)1[3-9][0-9]{9}(?-u:\b)"));
static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
  compile(r"(?i)(?-u:\b)[a-z0-9._%+\-]+@[a-z0-9.\-]+\.[a-z]{2,}(?-u:\b)")
});
static URL: LazyLock<Regex> = LazyLock::new(|| compile(r"(?i)https?://\S+"));
static ADDRESS_HK: LazyLock<Regex> = LazyLock::new(|| compile(&PLACE_NAMES.join("|")));

fn compile(pattern: &str) -> Regex {
  Regex::new(pattern).expect("PII patterns are static and valid")
}

/// Which categories matched a piece of text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PiiReport {
  pub categories: Vec<PiiCategory>,
}

impl PiiReport {
  pub fn is_pii(&self) -> bool { !self.categories.is_empty() }
}

/// Scan `text` against every category, in [`PiiCategory::ALL`] order.
pub fn scan(text: &str) -> PiiReport {
  PiiReport {
    categories: PiiCategory::ALL
      .into_iter()
      .filter(|c| c.pattern().is_match(text))
      .collect(),
  }
}

/// Scan several fields as one text, the way a submission is judged.
pub fn scan_fields<'a>(fields: impl IntoIterator<Item = &'a str>) -> PiiReport {
  let combined = fields.into_iter().collect::<Vec<_>>().join(" ");
  scan(&combined)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn bare_eight_digits_is_a_phone() {
    assert_eq!(scan("call 12345678").categories, [PiiCategory::PhoneHk]);
    assert_eq!(scan("打俾我91234567啦").categories, [PiiCategory::PhoneHk]);
  }

  #[test]
  fn longer_digit_runs_are_not_hk_phones() {
    assert!(!scan("123456789").categories.contains(&PiiCategory::PhoneHk));
  }

  #[test]
  fn international_hk_format() {
    assert!(scan("+852 9123 4567").categories.contains(&PiiCategory::PhoneHk));
  }

  #[test]
  fn mainland_mobile() {
    assert!(scan("13812345678").categories.contains(&PiiCategory::PhoneCn));
    assert!(!scan("12812345678").categories.contains(&PiiCategory::PhoneCn));
  }

  #[test]
  fn email_is_case_insensitive() {
    assert_eq!(scan("Mail ME@Example.COM").categories, [PiiCategory::Email]);
  }

  #[test]
  fn urls() {
    assert_eq!(scan("see HTTPS://example.com/x").categories, [PiiCategory::Url]);
    assert!(!scan("example dot com").is_pii());
  }

  #[test]
  fn place_names_match_inside_text() {
    assert_eq!(scan("我住喺旺角附近").categories, [PiiCategory::AddressHk]);
  }

  #[test]
  fn clean_text_passes() {
    for text in ["一切順利", "good luck!", "加油 2024", "小將"] {
      assert!(!scan(text).is_pii(), "{text} should be clean");
    }
  }

  #[test]
  fn scan_fields_combines_inputs() {
    let report = scan_fields(["hello", "a@b.co", "沙田"]);
    assert_eq!(report.categories, [PiiCategory::Email, PiiCategory::AddressHk]);
  }

  #[test]
  fn categories_serialise_snake_case() {
    assert_eq!(serde_json::to_string(&PiiCategory::AddressHk).unwrap(), "\"address_hk\"");
  }
}
