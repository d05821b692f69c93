//! The screen state machine the terminal client drives.
//!
//! [`Flow`] holds no I/O. Writes are optimistic: [`Flow::submit_new_holder`]
//! appends locally and hands the event back for the caller to persist, then
//! [`Flow::reconcile`] or [`Flow::adopt`] settles the outcome.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  Error,
  chain::{Explanation, Handoff, build_handoff},
  event::{HistoryEvent, JourneyLog},
  keychain::{KeychainId, Route},
  prompt::Prompt,
  validate::BlessingRules,
};

/// Shown in place of a holder's name while a keychain has never been passed.
pub const NOBODY_YET: &str = "沒有人";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
  /// The 0–99 grid.
  Overview,
  /// "Did you receive this keychain just now, or are you coming back?"
  Landing,
  Returning,
  NewInput,
  Explanation,
  History,
}

/// Something the user should be told; the screen has not advanced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowNotice {
  /// Nobody has held this keychain yet, so nobody can be returning.
  FirstHolderCannotReturn,
  /// Blank, too long, or carrying personal information.
  InvalidName(Error),
  /// The store rejected the hand-off; it has been rolled back.
  SaveFailed,
  NoKeychainSelected,
}

impl std::fmt::Display for FlowNotice {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::FirstHolderCannotReturn => f.write_str("你是第一位持有人，請登記你的名字。"),
      Self::InvalidName(err) => write!(f, "名字無效：{err}"),
      Self::SaveFailed => f.write_str("儲存失敗，請再試一次。"),
      Self::NoKeychainSelected => f.write_str("請先選擇一個鎖匙扣。"),
    }
  }
}

#[derive(Debug, Clone)]
pub struct Flow {
  screen:      Screen,
  keychain:    Option<KeychainId>,
  log:         JourneyLog,
  explanation: Option<Explanation>,
  rules:       BlessingRules,
}

impl Flow {
  pub fn new(route: Route, log: JourneyLog) -> Self {
    let (screen, keychain) = match route {
      Route::Overview => (Screen::Overview, None),
      Route::Keychain(id) => (Screen::Landing, Some(id)),
    };
    Self { screen, keychain, log, explanation: None, rules: BlessingRules::default() }
  }

  pub fn with_rules(mut self, rules: BlessingRules) -> Self {
    self.rules = rules;
    self
  }

  pub fn screen(&self) -> Screen { self.screen }

  pub fn keychain(&self) -> Option<KeychainId> { self.keychain }

  pub fn log(&self) -> &JourneyLog { &self.log }

  pub fn rules(&self) -> &BlessingRules { &self.rules }

  /// The explanation for the most recent hand-off, while on that screen.
  pub fn explanation(&self) -> Option<&Explanation> { self.explanation.as_ref() }

  /// Chain of the active keychain; empty on the overview.
  pub fn chain(&self) -> &[HistoryEvent] {
    self.keychain.map(|id| self.log.chain(id)).unwrap_or_default()
  }

  pub fn last_holder_name(&self) -> &str {
    self.keychain.and_then(|id| self.log.current_holder(id)).unwrap_or(NOBODY_YET)
  }

  /// Swap in a freshly loaded log, e.g. after a refresh.
  pub fn replace_log(&mut self, log: JourneyLog) { self.log = log; }

  /// Swap in freshly loaded rows for a single keychain.
  pub fn refresh_chain(&mut self, id: KeychainId, events: Vec<HistoryEvent>) {
    self.log.replace_chain(id, events);
  }

  // ── Navigation ────────────────────────────────────────────────────────

  pub fn select_keychain(&mut self, id: KeychainId) {
    self.keychain = Some(id);
    self.explanation = None;
    self.screen = Screen::Landing;
  }

  pub fn go_home(&mut self) {
    self.keychain = None;
    self.explanation = None;
    self.screen = Screen::Overview;
  }

  pub fn answer_landing(&mut self, returning: bool) -> Result<(), FlowNotice> {
    if !returning {
      self.screen = Screen::NewInput;
      return Ok(());
    }
    if self.chain().is_empty() {
      return Err(FlowNotice::FirstHolderCannotReturn);
    }
    self.screen = Screen::Returning;
    Ok(())
  }

  pub fn view_history(&mut self) -> Result<(), FlowNotice> {
    if self.keychain.is_none() {
      return Err(FlowNotice::NoKeychainSelected);
    }
    self.screen = Screen::History;
    Ok(())
  }

  // ── Hand-off ──────────────────────────────────────────────────────────

  /// Record `name` as the new holder. The event is appended locally and
  /// returned so the caller can persist it.
  pub fn submit_new_holder(
    &mut self,
    name: &str,
    quest: &Prompt,
    now: DateTime<Utc>,
  ) -> Result<HistoryEvent, FlowNotice> {
    let id = self.keychain.ok_or(FlowNotice::NoKeychainSelected)?;
    let name = self.rules.validate_holder_name(name).map_err(FlowNotice::InvalidName)?;
    let Handoff { event, explanation } = build_handoff(id, self.log.chain(id), &name, quest, now);
    self.log.append(event.clone());
    self.explanation = Some(explanation);
    self.screen = Screen::Explanation;
    Ok(event)
  }

  /// Settle an optimistic append. On failure the event is removed and the
  /// user is sent back to the name form.
  pub fn reconcile(&mut self, event_id: Uuid, persisted: bool) -> Option<FlowNotice> {
    if persisted {
      return None;
    }
    let id = self.keychain?;
    self.log.remove(id, event_id);
    self.explanation = None;
    self.screen = Screen::NewInput;
    Some(FlowNotice::SaveFailed)
  }

  /// Replace the optimistic event with the one the server actually stored.
  pub fn adopt(&mut self, event_id: Uuid, stored: Handoff) {
    let id = stored.event.keychain_id;
    self.log.remove(id, event_id);
    self.log.append(stored.event);
    if self.screen == Screen::Explanation && self.keychain == Some(id) {
      self.explanation = Some(stored.explanation);
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    ValidationError,
    chain::ORIGIN_GIVER,
    prompt::{PROMPT_POOL, START_KEY},
  };

  fn kc() -> KeychainId { KeychainId::new(12).unwrap() }

  fn flow_at_landing() -> Flow { Flow::new(Route::Keychain(kc()), JourneyLog::new()) }

  #[test]
  fn route_decides_the_first_screen() {
    assert_eq!(Flow::new(Route::Overview, JourneyLog::new()).screen(), Screen::Overview);
    let flow = flow_at_landing();
    assert_eq!(flow.screen(), Screen::Landing);
    assert_eq!(flow.keychain(), Some(kc()));
  }

  #[test]
  fn first_holder_cannot_claim_to_return() {
    let mut flow = flow_at_landing();
    assert_eq!(flow.answer_landing(true), Err(FlowNotice::FirstHolderCannotReturn));
    assert_eq!(flow.screen(), Screen::Landing);
    assert_eq!(flow.answer_landing(false), Ok(()));
    assert_eq!(flow.screen(), Screen::NewInput);
  }

  #[test]
  fn submitting_a_holder_appends_and_explains() {
    let mut flow = flow_at_landing();
    flow.answer_landing(false).unwrap();
    let event = flow.submit_new_holder("  阿明 ", &PROMPT_POOL[2], Utc::now()).unwrap();
    assert_eq!(event.to_name, "阿明");
    assert_eq!(event.from_name, ORIGIN_GIVER);
    assert_eq!(event.prompt_key, START_KEY);
    assert_eq!(flow.screen(), Screen::Explanation);
    assert_eq!(flow.last_holder_name(), "阿明");
    assert_eq!(flow.explanation().unwrap().next_prompt_text, PROMPT_POOL[2].text);

    flow.select_keychain(kc());
    assert_eq!(flow.answer_landing(true), Ok(()));
    assert_eq!(flow.screen(), Screen::Returning);
  }

  #[test]
  fn blank_name_is_refused_without_moving() {
    let mut flow = flow_at_landing();
    flow.answer_landing(false).unwrap();
    let notice = flow.submit_new_holder("   ", &PROMPT_POOL[0], Utc::now()).unwrap_err();
    assert!(matches!(notice, FlowNotice::InvalidName(Error::Validation(ValidationError::Missing(_)))));
    assert_eq!(flow.screen(), Screen::NewInput);
    assert!(flow.chain().is_empty());
  }

  #[test]
  fn phone_number_as_name_is_refused() {
    let mut flow = flow_at_landing();
    flow.answer_landing(false).unwrap();
    let notice = flow.submit_new_holder("98765432", &PROMPT_POOL[0], Utc::now()).unwrap_err();
    assert!(matches!(notice, FlowNotice::InvalidName(Error::PiiDetected(_))));
    assert_eq!(flow.screen(), Screen::NewInput);
    assert!(flow.chain().is_empty());
  }

  #[test]
  fn failed_save_rolls_back() {
    let mut flow = flow_at_landing();
    flow.answer_landing(false).unwrap();
    let event = flow.submit_new_holder("阿明", &PROMPT_POOL[0], Utc::now()).unwrap();
    assert_eq!(flow.reconcile(event.id, false), Some(FlowNotice::SaveFailed));
    assert!(flow.chain().is_empty());
    assert_eq!(flow.screen(), Screen::NewInput);
    assert_eq!(flow.last_holder_name(), NOBODY_YET);
  }

  #[test]
  fn successful_save_keeps_the_event() {
    let mut flow = flow_at_landing();
    flow.answer_landing(false).unwrap();
    let event = flow.submit_new_holder("阿明", &PROMPT_POOL[0], Utc::now()).unwrap();
    assert_eq!(flow.reconcile(event.id, true), None);
    assert_eq!(flow.chain().len(), 1);
  }

  #[test]
  fn adopt_swaps_in_the_stored_event() {
    let mut flow = flow_at_landing();
    flow.answer_landing(false).unwrap();
    let local = flow.submit_new_holder("阿明", &PROMPT_POOL[0], Utc::now()).unwrap();
    let stored = build_handoff(kc(), &[], "阿明", &PROMPT_POOL[5], Utc::now());
    flow.adopt(local.id, stored.clone());
    assert_eq!(flow.chain(), [stored.event]);
    assert_eq!(flow.explanation(), Some(&stored.explanation));
  }

  #[test]
  fn history_needs_a_keychain() {
    let mut flow = Flow::new(Route::Overview, JourneyLog::new());
    assert_eq!(flow.view_history(), Err(FlowNotice::NoKeychainSelected));
    flow.select_keychain(kc());
    flow.view_history().unwrap();
    assert_eq!(flow.screen(), Screen::History);
    flow.go_home();
    assert_eq!(flow.screen(), Screen::Overview);
    assert_eq!(flow.keychain(), None);
  }

  #[test]
  fn refreshing_a_chain_leaves_others_alone() {
    let other = KeychainId::new(3).unwrap();
    let seeded = build_handoff(other, &[], "阿芳", &PROMPT_POOL[1], Utc::now()).event;
    let mut flow = Flow::new(Route::Keychain(kc()), JourneyLog::from_events([seeded.clone()]));
    let fresh = build_handoff(kc(), &[], "阿明", &PROMPT_POOL[0], Utc::now()).event;
    flow.refresh_chain(kc(), vec![fresh.clone()]);
    assert_eq!(flow.chain(), [fresh]);
    assert_eq!(flow.log().chain(other), [seeded]);
  }
}
