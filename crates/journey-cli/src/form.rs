//! The blessing form: three text fields with live advisory feedback.
//!
//! Feedback comes from the same [`BlessingRules`] the server enforces, so a
//! draft the form calls acceptable is one the server should accept.

use journey_core::{
  blessing::Visibility,
  keychain::KeychainId,
  validate::{BlessingDraft, BlessingRules, Field, FieldStatus},
};

/// Fields in tab order.
pub const FIELDS: [Field; 3] = [Field::BlessingText, Field::CodePhrase, Field::OptionalNote];

#[derive(Debug, Clone)]
pub struct BlessingForm {
  pub keychain:      KeychainId,
  pub station:       u32,
  pub focus:         usize,
  pub blessing_text: String,
  pub code_phrase:   String,
  pub optional_note: String,
  pub visibility:    Visibility,
}

impl BlessingForm {
  pub fn new(keychain: KeychainId, station: u32) -> Self {
    Self {
      keychain,
      station: station.max(1),
      focus: 0,
      blessing_text: String::new(),
      code_phrase: String::new(),
      optional_note: String::new(),
      visibility: Visibility::default(),
    }
  }

  pub fn focused(&self) -> Field { FIELDS[self.focus] }

  pub fn value(&self, field: Field) -> &str {
    match field {
      Field::CodePhrase => &self.code_phrase,
      Field::OptionalNote => &self.optional_note,
      _ => &self.blessing_text,
    }
  }

  fn focused_mut(&mut self) -> &mut String {
    match self.focused() {
      Field::CodePhrase => &mut self.code_phrase,
      Field::OptionalNote => &mut self.optional_note,
      _ => &mut self.blessing_text,
    }
  }

  pub fn next_field(&mut self) { self.focus = (self.focus + 1) % FIELDS.len(); }

  pub fn prev_field(&mut self) { self.focus = (self.focus + FIELDS.len() - 1) % FIELDS.len(); }

  pub fn push(&mut self, c: char) { self.focused_mut().push(c); }

  pub fn backspace(&mut self) { self.focused_mut().pop(); }

  pub fn toggle_visibility(&mut self) {
    self.visibility = match self.visibility {
      Visibility::Public => Visibility::Private,
      Visibility::Private => Visibility::Public,
    };
  }

  pub fn status(&self, rules: &BlessingRules, field: Field) -> FieldStatus {
    rules.field_status(field, self.value(field))
  }

  /// Whether every field is within limits and free of PII, and the required
  /// ones are filled in.
  pub fn is_submittable(&self, rules: &BlessingRules) -> bool {
    !self.blessing_text.trim().is_empty()
      && !self.code_phrase.trim().is_empty()
      && FIELDS.iter().all(|&f| self.status(rules, f).is_acceptable())
  }

  pub fn draft(&self) -> BlessingDraft {
    let note = self.optional_note.trim();
    BlessingDraft {
      keychain_id: Some(self.keychain.to_string()),
      station_number: Some(self.station),
      quest_tag: None,
      blessing_text: Some(self.blessing_text.trim().to_owned()),
      code_phrase: Some(self.code_phrase.trim().to_owned()),
      optional_note: (!note.is_empty()).then(|| note.to_owned()),
      visibility: Some(self.visibility),
    }
  }
}

#[cfg(test)]
mod tests {
  use journey_core::pii::PiiCategory;

  use super::*;

  fn form() -> BlessingForm { BlessingForm::new(KeychainId::new(7).unwrap(), 0) }

  fn type_str(form: &mut BlessingForm, s: &str) { s.chars().for_each(|c| form.push(c)); }

  #[test]
  fn station_is_at_least_one() {
    assert_eq!(form().station, 1);
    assert_eq!(BlessingForm::new(KeychainId::new(7).unwrap(), 4).station, 4);
  }

  #[test]
  fn tab_cycles_through_fields() {
    let mut f = form();
    assert_eq!(f.focused(), Field::BlessingText);
    f.next_field();
    f.next_field();
    assert_eq!(f.focused(), Field::OptionalNote);
    f.next_field();
    assert_eq!(f.focused(), Field::BlessingText);
    f.prev_field();
    assert_eq!(f.focused(), Field::OptionalNote);
  }

  #[test]
  fn typing_goes_to_the_focused_field() {
    let mut f = form();
    type_str(&mut f, "一路順風");
    f.next_field();
    type_str(&mut f, "象象");
    f.backspace();
    assert_eq!(f.blessing_text, "一路順風");
    assert_eq!(f.code_phrase, "象");
  }

  #[test]
  fn feedback_flags_length_and_pii() {
    let rules = BlessingRules::default();
    let mut f = form();
    type_str(&mut f, &"福".repeat(16));
    let status = f.status(&rules, Field::BlessingText);
    assert_eq!((status.chars, status.max), (16, 15));
    assert!(status.over_limit());

    f.next_field();
    f.next_field();
    type_str(&mut f, "call 91234567");
    let status = f.status(&rules, Field::OptionalNote);
    assert!(!status.over_limit());
    assert_eq!(status.pii.categories, [PiiCategory::PhoneHk]);
    assert!(!f.is_submittable(&rules));
  }

  #[test]
  fn draft_trims_and_drops_an_empty_note() {
    let rules = BlessingRules::default();
    let mut f = form();
    assert!(!f.is_submittable(&rules));
    type_str(&mut f, " 平安 ");
    f.next_field();
    type_str(&mut f, "象");
    f.next_field();
    type_str(&mut f, "   ");
    f.toggle_visibility();
    assert!(f.is_submittable(&rules));

    let draft = f.draft();
    assert_eq!(draft.keychain_id.as_deref(), Some("7"));
    assert_eq!(draft.blessing_text.as_deref(), Some("平安"));
    assert_eq!(draft.optional_note, None);
    assert_eq!(draft.visibility, Some(Visibility::Private));
    assert!(rules.validate_blessing(draft).is_ok());
  }
}
