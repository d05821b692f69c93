//! Input rules shared by the advisory client check and the authoritative
//! server check.
//!
//! [`BlessingRules`] holds every length limit; the server deserialises it from
//! config and the terminal client uses [`BlessingRules::default`]. Both run the
//! same [`crate::pii`] scanner.

use serde::{Deserialize, Serialize};

use crate::{
  Error, Result, ValidationError,
  blessing::{DEFAULT_STATION, NewBlessing, NewReport, ReportReason, Visibility},
  keychain::KeychainId,
  pii::{self, PiiReport},
};

/// Length limits, in characters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlessingRules {
  pub blessing_text_max:      usize,
  pub code_phrase_max:        usize,
  pub optional_note_max:      usize,
  pub quest_tag_max:          usize,
  pub holder_name_max:        usize,
  pub report_description_max: usize,
}

impl Default for BlessingRules {
  fn default() -> Self {
    Self {
      blessing_text_max:      15,
      code_phrase_max:        10,
      optional_note_max:      120,
      quest_tag_max:          30,
      holder_name_max:        20,
      report_description_max: 500,
    }
  }
}

/// A free-text field subject to a length limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
  BlessingText,
  CodePhrase,
  OptionalNote,
  QuestTag,
  HolderName,
  ReportDescription,
}

impl Field {
  pub fn name(self) -> &'static str {
    match self {
      Self::BlessingText => "blessing_text",
      Self::CodePhrase => "code_phrase",
      Self::OptionalNote => "optional_note",
      Self::QuestTag => "quest_tag",
      Self::HolderName => "to_name",
      Self::ReportDescription => "description",
    }
  }
}

/// Live feedback for one field while it is being typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldStatus {
  pub chars: usize,
  pub max:   usize,
  pub pii:   PiiReport,
}

impl FieldStatus {
  pub fn over_limit(&self) -> bool { self.chars > self.max }

  pub fn is_acceptable(&self) -> bool { !self.over_limit() && !self.pii.is_pii() }
}

// ─── Raw submissions ─────────────────────────────────────────────────────────

/// A blessing as submitted, before validation. This is also the JSON body of
/// `POST /api/blessings`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlessingDraft {
  pub keychain_id:    Option<String>,
  pub station_number: Option<u32>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub quest_tag:      Option<String>,
  pub blessing_text:  Option<String>,
  pub code_phrase:    Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub optional_note:  Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub visibility:     Option<Visibility>,
}

/// A report as submitted. Also the JSON body of `POST /api/reports`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportDraft {
  pub blessing_id: Option<i64>,
  pub reason:      Option<ReportReason>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
}

// ─── Checks ─────────────────────────────────────────────────────────────────

impl BlessingRules {
  pub fn max_for(&self, field: Field) -> usize {
    match field {
      Field::BlessingText => self.blessing_text_max,
      Field::CodePhrase => self.code_phrase_max,
      Field::OptionalNote => self.optional_note_max,
      Field::QuestTag => self.quest_tag_max,
      Field::HolderName => self.holder_name_max,
      Field::ReportDescription => self.report_description_max,
    }
  }

  pub fn field_status(&self, field: Field, text: &str) -> FieldStatus {
    FieldStatus {
      chars: text.chars().count(),
      max:   self.max_for(field),
      pii:   pii::scan(text),
    }
  }

  fn check_len(&self, field: Field, text: &str) -> Result<(), ValidationError> {
    let provided = text.chars().count();
    let max = self.max_for(field);
    if provided > max {
      return Err(ValidationError::TooLong { field: field.name(), max, provided });
    }
    Ok(())
  }

  /// Validate a blessing submission: presence, lengths, then PII across all
  /// free-text fields.
  pub fn validate_blessing(&self, draft: BlessingDraft) -> Result<NewBlessing> {
    let keychain_raw = present(draft.keychain_id, "keychain_id")?;
    let blessing_text = present(draft.blessing_text, "blessing_text")?;
    let code_phrase = present(draft.code_phrase, "code_phrase")?;
    let keychain_id: KeychainId = keychain_raw.parse()?;
    let optional_note = draft.optional_note.filter(|s| !s.is_empty());
    let quest_tag = draft.quest_tag.filter(|s| !s.is_empty());

    self.check_len(Field::BlessingText, &blessing_text)?;
    self.check_len(Field::CodePhrase, &code_phrase)?;
    if let Some(note) = &optional_note {
      self.check_len(Field::OptionalNote, note)?;
    }
    if let Some(tag) = &quest_tag {
      self.check_len(Field::QuestTag, tag)?;
    }

    let report = pii::scan_fields(
      [blessing_text.as_str(), code_phrase.as_str()]
        .into_iter()
        .chain(optional_note.as_deref())
        .chain(quest_tag.as_deref()),
    );
    if report.is_pii() {
      return Err(Error::PiiDetected(report.categories));
    }

    Ok(NewBlessing {
      keychain_id,
      station_number: draft.station_number.unwrap_or(DEFAULT_STATION),
      quest_tag,
      blessing_text,
      code_phrase,
      optional_note,
      visibility: draft.visibility.unwrap_or_default(),
    })
  }

  pub fn validate_report(&self, draft: ReportDraft) -> Result<NewReport> {
    let blessing_id = draft.blessing_id.ok_or(ValidationError::Missing("blessing_id"))?;
    let reason = draft.reason.ok_or(ValidationError::Missing("reason"))?;
    let description = draft.description.filter(|s| !s.trim().is_empty());
    if let Some(d) = &description {
      self.check_len(Field::ReportDescription, d)?;
    }
    Ok(NewReport { blessing_id, reason, description })
  }

  /// Trim and check a new holder's name. Names are published in the
  /// overview and the story, so they go through the PII scan too.
  pub fn validate_holder_name(&self, name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
      return Err(ValidationError::Missing(Field::HolderName.name()).into());
    }
    self.check_len(Field::HolderName, trimmed)?;
    let report = pii::scan(trimmed);
    if report.is_pii() {
      return Err(Error::PiiDetected(report.categories));
    }
    Ok(trimmed.to_owned())
  }
}

/// Treat absent and empty strings alike.
fn present(value: Option<String>, field: &'static str) -> Result<String, ValidationError> {
  value.filter(|s| !s.is_empty()).ok_or(ValidationError::Missing(field))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::pii::PiiCategory;

  fn draft() -> BlessingDraft {
    BlessingDraft {
      keychain_id: Some("7".into()),
      blessing_text: Some("一切順利".into()),
      code_phrase: Some("小將".into()),
      ..Default::default()
    }
  }

  #[test]
  fn minimal_draft_gets_defaults() {
    let b = BlessingRules::default().validate_blessing(draft()).unwrap();
    assert_eq!(b.station_number, DEFAULT_STATION);
    assert_eq!(b.visibility, Visibility::Public);
    assert_eq!(b.keychain_id.get(), 7);
  }

  #[test]
  fn missing_and_empty_fields_are_rejected() {
    let rules = BlessingRules::default();
    let mut d = draft();
    d.code_phrase = Some(String::new());
    assert!(matches!(
      rules.validate_blessing(d),
      Err(Error::Validation(ValidationError::Missing("code_phrase")))
    ));
    let mut d = draft();
    d.keychain_id = None;
    assert!(matches!(
      rules.validate_blessing(d),
      Err(Error::Validation(ValidationError::Missing("keychain_id")))
    ));
  }

  #[test]
  fn blessing_text_boundary_is_fifteen() {
    let rules = BlessingRules::default();
    let mut d = draft();
    d.blessing_text = Some("福".repeat(15));
    assert!(rules.validate_blessing(d).is_ok());

    let mut d = draft();
    d.blessing_text = Some("福".repeat(16));
    let err = rules.validate_blessing(d).unwrap_err();
    assert!(matches!(
      err,
      Error::Validation(ValidationError::TooLong { field: "blessing_text", max: 15, provided: 16 })
    ));
  }

  #[test]
  fn code_phrase_boundary_is_ten() {
    let rules = BlessingRules::default();
    let mut d = draft();
    d.code_phrase = Some("a".repeat(10));
    assert!(rules.validate_blessing(d).is_ok());
    let mut d = draft();
    d.code_phrase = Some("a".repeat(11));
    assert!(matches!(
      rules.validate_blessing(d),
      Err(Error::Validation(ValidationError::TooLong { field: "code_phrase", .. }))
    ));
  }

  #[test]
  fn optional_note_boundary_is_one_twenty() {
    let rules = BlessingRules::default();
    let mut d = draft();
    d.optional_note = Some("好".repeat(120));
    assert!(rules.validate_blessing(d).is_ok());
    let mut d = draft();
    d.optional_note = Some("好".repeat(121));
    assert!(matches!(
      rules.validate_blessing(d),
      Err(Error::Validation(ValidationError::TooLong { field: "optional_note", .. }))
    ));
  }

  #[test]
  fn pii_anywhere_in_the_submission_is_rejected() {
    let mut d = draft();
    d.optional_note = Some("call 98765432".into());
    match BlessingRules::default().validate_blessing(d) {
      Err(Error::PiiDetected(categories)) => assert_eq!(categories, [PiiCategory::PhoneHk]),
      other => panic!("expected PII rejection, got {other:?}"),
    }
  }

  #[test]
  fn quest_tag_is_scanned_with_the_rest() {
    let mut d = draft();
    d.quest_tag = Some("call 98765432".into());
    assert_eq!(
      BlessingRules::default().validate_blessing(d),
      Err(Error::PiiDetected(vec![PiiCategory::PhoneHk]))
    );
  }

  #[test]
  fn out_of_range_keychain_is_invalid() {
    let mut d = draft();
    d.keychain_id = Some("100".into());
    assert!(matches!(
      BlessingRules::default().validate_blessing(d),
      Err(Error::Validation(ValidationError::Invalid { field: "keychain_id", .. }))
    ));
  }

  #[test]
  fn report_requires_id_and_reason() {
    let rules = BlessingRules::default();
    assert!(rules.validate_report(ReportDraft::default()).is_err());
    let ok = rules
      .validate_report(ReportDraft {
        blessing_id: Some(3),
        reason:      Some(ReportReason::Spam),
        description: Some("  ".into()),
      })
      .unwrap();
    assert_eq!(ok.description, None);
  }

  #[test]
  fn holder_names_are_trimmed_and_bounded() {
    let rules = BlessingRules::default();
    assert_eq!(rules.validate_holder_name("  阿明 ").unwrap(), "阿明");
    assert!(rules.validate_holder_name("   ").is_err());
    assert!(rules.validate_holder_name(&"x".repeat(21)).is_err());
  }

  #[test]
  fn holder_names_are_scanned_for_pii() {
    let rules = BlessingRules::default();
    assert_eq!(
      rules.validate_holder_name(" 98765432 "),
      Err(Error::PiiDetected(vec![PiiCategory::PhoneHk]))
    );
    assert_eq!(
      rules.validate_holder_name("旺角阿明"),
      Err(Error::PiiDetected(vec![PiiCategory::AddressHk]))
    );
  }

  #[test]
  fn field_status_reports_limits_and_pii() {
    let status = BlessingRules::default().field_status(Field::CodePhrase, "a@b.com");
    assert_eq!(status.chars, 7);
    assert!(!status.over_limit());
    assert!(!status.is_acceptable());
  }

  #[test]
  fn rules_deserialise_with_partial_overrides() {
    let rules: BlessingRules = serde_json::from_str(r#"{"blessing_text_max": 20}"#).unwrap();
    assert_eq!(rules.blessing_text_max, 20);
    assert_eq!(rules.code_phrase_max, 10);
  }
}
