//! Application state and key dispatch around the core [`Flow`].

use std::sync::Arc;

use chrono::Utc;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use journey_core::{
  blessing::{Blessing, Visibility},
  event::{JourneySummary, KeychainStatus},
  flow::{Flow, Screen},
  keychain::{KeychainId, Route},
  prompt::assign_quest,
};
use rand_core::OsRng;

use crate::{client::ApiClient, form::BlessingForm};

/// Keychains per row on the overview grid.
pub const GRID_COLUMNS: usize = 10;

// ─── App ──────────────────────────────────────────────────────────────────────

/// Top-level application state.
pub struct App {
  pub flow: Flow,

  /// Per-keychain status for the overview grid, as last fetched.
  pub overview: Vec<KeychainStatus>,
  pub summary:  Option<JourneySummary>,

  /// Index into the overview grid.
  pub grid_cursor: usize,

  /// The name being typed on the new-holder screen.
  pub name_input: String,

  /// Open while the user is writing a blessing.
  pub form: Option<BlessingForm>,

  /// The elephant's reply to the last accepted blessing, until dismissed.
  pub reaction: Option<String>,

  /// Public blessings left on the active keychain.
  pub blessings: Vec<Blessing>,

  pub history_scroll: usize,

  /// One-line status message shown in the status bar.
  pub status_msg: String,

  pub client: Arc<ApiClient>,
}

impl App {
  pub fn new(client: ApiClient, route: Route) -> Self {
    let grid_cursor = match route {
      Route::Keychain(id) => usize::from(id.get()),
      Route::Overview => 0,
    };
    Self {
      flow: Flow::new(route, Default::default()),
      overview: Vec::new(),
      summary: None,
      grid_cursor,
      name_input: String::new(),
      form: None,
      reaction: None,
      blessings: Vec::new(),
      history_scroll: 0,
      status_msg: String::new(),
      client: Arc::new(client),
    }
  }

  // ── Data loading ──────────────────────────────────────────────────────────

  /// Fetch the overview, and the active keychain's chain if the route named
  /// one.
  pub async fn load_initial(&mut self) -> anyhow::Result<()> {
    self.status_msg = "載入中…".into();
    self.load_overview().await?;
    if let Some(id) = self.flow.keychain() {
      self.load_keychain(id).await?;
    }
    self.status_msg.clear();
    Ok(())
  }

  async fn load_overview(&mut self) -> anyhow::Result<()> {
    let overview = self.client.overview().await?;
    self.summary = Some(overview.summary);
    self.overview = overview.keychains;
    Ok(())
  }

  async fn load_keychain(&mut self, id: KeychainId) -> anyhow::Result<()> {
    let events = self.client.list_events(id).await?;
    self.flow.refresh_chain(id, events);
    // Blessings are decoration; a failure here should not block the journey.
    self.blessings = match self.client.public_blessings(id).await {
      Ok(b) => b,
      Err(e) => {
        tracing::warn!(keychain_id = %id, "loading blessings failed: {e:#}");
        Vec::new()
      }
    };
    Ok(())
  }

  /// Station the current holder is at: one per recorded hand-off.
  pub fn station(&self) -> u32 { u32::try_from(self.flow.chain().len()).unwrap_or(u32::MAX).max(1) }

  pub fn cursor_keychain(&self) -> Option<KeychainId> {
    u8::try_from(self.grid_cursor).ok().and_then(|n| KeychainId::new(n).ok())
  }

  // ── Key handling ──────────────────────────────────────────────────────────

  /// Process a key event. Returns `true` to continue, `false` to quit.
  pub async fn handle_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
      return Ok(false);
    }

    // The reaction card swallows the first key.
    if self.reaction.take().is_some() {
      return Ok(true);
    }

    if self.form.is_some() {
      self.handle_form_key(key).await;
      return Ok(true);
    }

    match self.flow.screen() {
      Screen::Overview => self.handle_overview_key(key).await,
      Screen::Landing => self.handle_landing_key(key).await,
      Screen::NewInput => {
        self.handle_name_key(key).await;
        Ok(true)
      }
      Screen::Returning | Screen::Explanation => self.handle_holder_key(key).await,
      Screen::History => Ok(self.handle_history_key(key)),
    }
  }

  async fn handle_overview_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
    let last = usize::from(KeychainId::MAX);
    match key.code {
      KeyCode::Char('q') => return Ok(false),
      KeyCode::Right | KeyCode::Char('l') => self.grid_cursor = (self.grid_cursor + 1).min(last),
      KeyCode::Left | KeyCode::Char('h') => self.grid_cursor = self.grid_cursor.saturating_sub(1),
      KeyCode::Down | KeyCode::Char('j') => {
        self.grid_cursor = (self.grid_cursor + GRID_COLUMNS).min(last);
      }
      KeyCode::Up | KeyCode::Char('k') => {
        self.grid_cursor = self.grid_cursor.saturating_sub(GRID_COLUMNS);
      }
      KeyCode::Char('r') => self.refresh_overview().await,
      KeyCode::Enter => {
        if let Some(id) = self.cursor_keychain() {
          self.open_keychain(id).await;
        }
      }
      _ => {}
    }
    Ok(true)
  }

  async fn handle_landing_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
    match key.code {
      KeyCode::Char('q') => return Ok(false),
      KeyCode::Char('1') | KeyCode::Char('n') => {
        self.name_input.clear();
        let answer = self.flow.answer_landing(false);
        self.notice(answer);
      }
      KeyCode::Char('2') | KeyCode::Char('r') => {
        let answer = self.flow.answer_landing(true);
        self.notice(answer);
      }
      KeyCode::Char('h') => self.open_history(),
      KeyCode::Esc => self.go_home().await,
      _ => {}
    }
    Ok(true)
  }

  async fn handle_name_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Esc => {
        if let Some(id) = self.flow.keychain() {
          self.flow.select_keychain(id);
        }
      }
      KeyCode::Enter => self.submit_name().await,
      KeyCode::Backspace => {
        self.name_input.pop();
      }
      KeyCode::Char(c) => self.name_input.push(c),
      _ => {}
    }
  }

  async fn handle_holder_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
    match key.code {
      KeyCode::Char('q') => return Ok(false),
      KeyCode::Char('b') => {
        if let Some(id) = self.flow.keychain() {
          self.form = Some(BlessingForm::new(id, self.station()));
          self.status_msg.clear();
        }
      }
      KeyCode::Char('h') => self.open_history(),
      KeyCode::Esc => self.go_home().await,
      _ => {}
    }
    Ok(true)
  }

  fn handle_history_key(&mut self, key: KeyEvent) -> bool {
    match key.code {
      KeyCode::Char('q') => return false,
      KeyCode::Down | KeyCode::Char('j') => self.history_scroll += 1,
      KeyCode::Up | KeyCode::Char('k') => {
        self.history_scroll = self.history_scroll.saturating_sub(1);
      }
      KeyCode::Esc | KeyCode::Left => {
        if let Some(id) = self.flow.keychain() {
          self.flow.select_keychain(id);
        }
      }
      _ => {}
    }
    true
  }

  async fn handle_form_key(&mut self, key: KeyEvent) {
    let Some(form) = self.form.as_mut() else { return };
    match key.code {
      KeyCode::Esc => self.form = None,
      KeyCode::Tab | KeyCode::Down => form.next_field(),
      KeyCode::BackTab | KeyCode::Up => form.prev_field(),
      KeyCode::Backspace => form.backspace(),
      KeyCode::F(2) => form.toggle_visibility(),
      KeyCode::Enter => self.submit_blessing().await,
      KeyCode::Char(c) => form.push(c),
      _ => {}
    }
  }

  // ── Actions ───────────────────────────────────────────────────────────────

  fn notice<E: std::fmt::Display>(&mut self, result: Result<(), E>) {
    match result {
      Ok(()) => self.status_msg.clear(),
      Err(e) => self.status_msg = e.to_string(),
    }
  }

  async fn open_keychain(&mut self, id: KeychainId) {
    self.flow.select_keychain(id);
    self.history_scroll = 0;
    self.status_msg = "載入中…".into();
    match self.load_keychain(id).await {
      Ok(()) => self.status_msg.clear(),
      Err(e) => self.status_msg = format!("錯誤：{e}"),
    }
  }

  fn open_history(&mut self) {
    self.history_scroll = 0;
    let result = self.flow.view_history();
    self.notice(result);
  }

  async fn go_home(&mut self) {
    if let Some(id) = self.flow.keychain() {
      self.grid_cursor = usize::from(id.get());
    }
    self.flow.go_home();
    self.blessings.clear();
    self.refresh_overview().await;
  }

  async fn refresh_overview(&mut self) {
    match self.load_overview().await {
      Ok(()) => self.status_msg.clear(),
      Err(e) => self.status_msg = format!("錯誤：{e}"),
    }
  }

  /// Record the typed name locally, then persist it. The server's copy of
  /// the hand-off replaces the local one; a failure rolls it back.
  async fn submit_name(&mut self) {
    let quest = assign_quest(&mut OsRng);
    let event = match self.flow.submit_new_holder(&self.name_input, quest, Utc::now()) {
      Ok(event) => event,
      Err(notice) => {
        self.status_msg = notice.to_string();
        return;
      }
    };

    match self.client.append_event(event.keychain_id, &event.to_name).await {
      Ok(stored) => {
        tracing::info!(keychain_id = %event.keychain_id, event_id = %stored.event.id, "hand-off saved");
        self.flow.adopt(event.id, stored);
        self.name_input.clear();
        self.status_msg.clear();
      }
      Err(e) => {
        tracing::warn!(keychain_id = %event.keychain_id, "saving hand-off failed: {e:#}");
        if let Some(notice) = self.flow.reconcile(event.id, false) {
          self.status_msg = format!("{notice} ({e})");
        }
      }
    }
  }

  async fn submit_blessing(&mut self) {
    let Some(form) = self.form.as_ref() else { return };
    let draft = form.draft();
    if let Err(e) = self.flow.rules().validate_blessing(draft.clone()) {
      self.status_msg = e.to_string();
      return;
    }

    match self.client.create_blessing(&draft).await {
      Ok(created) => {
        tracing::info!(blessing_id = created.blessing.id, "blessing accepted");
        self.form = None;
        self.reaction = created.reaction.map(|r| r.reaction_text);
        self.status_msg = "祝福已送出".into();
        if created.blessing.visibility == Visibility::Public {
          self.blessings.insert(0, created.blessing);
        }
      }
      Err(e) => self.status_msg = format!("錯誤：{e}"),
    }
  }
}

#[cfg(test)]
mod tests {
  use std::time::Duration;

  use super::*;
  use crate::client::ApiConfig;

  fn app(route: Route) -> App {
    let client = ApiClient::new(ApiConfig {
      base_url: "http://127.0.0.1:9".into(),
      timeout:  Duration::from_millis(200),
    })
    .unwrap();
    App::new(client, route)
  }

  fn key(code: KeyCode) -> KeyEvent { KeyEvent::new(code, KeyModifiers::NONE) }

  #[test]
  fn route_positions_the_grid_cursor() {
    let id = KeychainId::new(42).unwrap();
    let app = app(Route::Keychain(id));
    assert_eq!(app.cursor_keychain(), Some(id));
    assert_eq!(app.flow.screen(), Screen::Landing);
    assert_eq!(app.station(), 1);
  }

  #[tokio::test]
  async fn grid_navigation_stays_in_range() {
    let mut app = app(Route::Overview);
    app.handle_key(key(KeyCode::Up)).await.unwrap();
    assert_eq!(app.grid_cursor, 0);
    for _ in 0..20 {
      app.handle_key(key(KeyCode::Down)).await.unwrap();
    }
    assert_eq!(app.grid_cursor, 90);
    for _ in 0..20 {
      app.handle_key(key(KeyCode::Right)).await.unwrap();
    }
    assert_eq!(app.grid_cursor, 99);
    assert!(!app.handle_key(key(KeyCode::Char('q'))).await.unwrap());
  }

  #[tokio::test]
  async fn first_holder_is_told_to_register() {
    let mut app = app(Route::Keychain(KeychainId::new(3).unwrap()));
    app.handle_key(key(KeyCode::Char('2'))).await.unwrap();
    assert_eq!(app.flow.screen(), Screen::Landing);
    assert!(!app.status_msg.is_empty());

    app.handle_key(key(KeyCode::Char('1'))).await.unwrap();
    assert_eq!(app.flow.screen(), Screen::NewInput);
    for c in "阿明".chars() {
      app.handle_key(key(KeyCode::Char(c))).await.unwrap();
    }
    assert_eq!(app.name_input, "阿明");
  }

  #[tokio::test]
  async fn unreachable_server_rolls_back_the_hand_off() {
    let mut app = app(Route::Keychain(KeychainId::new(3).unwrap()));
    app.handle_key(key(KeyCode::Char('1'))).await.unwrap();
    app.name_input = "阿明".into();
    app.handle_key(key(KeyCode::Enter)).await.unwrap();
    assert_eq!(app.flow.screen(), Screen::NewInput);
    assert!(app.flow.chain().is_empty());
    assert_eq!(app.name_input, "阿明");
    assert!(!app.status_msg.is_empty());
  }

  #[tokio::test]
  async fn reaction_card_swallows_one_key() {
    let mut app = app(Route::Overview);
    app.reaction = Some("加油！".into());
    app.handle_key(key(KeyCode::Char('q'))).await.unwrap();
    assert!(app.reaction.is_none());
    assert!(!app.handle_key(key(KeyCode::Char('q'))).await.unwrap());
  }
}
