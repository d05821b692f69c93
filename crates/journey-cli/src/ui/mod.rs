//! TUI rendering: one module per screen, plus the blessing overlays.

pub mod blessing;
pub mod history;
pub mod journey;
pub mod overview;

use chrono::Local;
use journey_core::flow::Screen;
use ratatui::{
  Frame,
  layout::{Constraint, Direction, Flex, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Paragraph},
};

use crate::app::App;

// ─── Root draw ────────────────────────────────────────────────────────────────

/// Main draw function called each frame.
pub fn draw(f: &mut Frame, app: &App) {
  let area = f.area();

  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // header
      Constraint::Min(0),    // body
      Constraint::Length(1), // status bar
    ])
    .split(area);

  draw_header(f, rows[0], app);

  match app.flow.screen() {
    Screen::Overview => overview::draw(f, rows[1], app),
    Screen::History => history::draw(f, rows[1], app),
    _ => journey::draw(f, rows[1], app),
  }

  draw_status(f, rows[2], app);

  if let Some(form) = &app.form {
    blessing::draw_form(f, centered(area, 60, 16), form, app.flow.rules());
  }
  if let Some(text) = &app.reaction {
    blessing::draw_reaction(f, centered(area, 44, 7), text);
  }
}

/// A `width` × `height` rectangle centred in `area`, clamped to fit.
pub fn centered(area: Rect, width: u16, height: u16) -> Rect {
  let [row] = Layout::vertical([Constraint::Length(height.min(area.height))])
    .flex(Flex::Center)
    .areas(area);
  let [cell] = Layout::horizontal([Constraint::Length(width.min(area.width))])
    .flex(Flex::Center)
    .areas(row);
  cell
}

// ─── Header ───────────────────────────────────────────────────────────────────

fn draw_header(f: &mut Frame, area: Rect, app: &App) {
  let date = Local::now().format("%Y-%m-%d").to_string();

  let title = match app.flow.keychain() {
    Some(id) => format!(" 小象旅程  #{id}"),
    None => " 小象旅程".to_string(),
  };
  let summary = app
    .summary
    .map(|s| format!("  {} 個鎖匙扣上路 · {} 次交接", s.active_keychains, s.total_handoffs))
    .unwrap_or_default();

  let left = Span::styled(
    format!("{title}{summary}"),
    Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
  );
  let right = Span::styled(format!("{date} "), Style::default().fg(Color::DarkGray));

  let left_width = left.width() as u16;
  let right_width = right.width() as u16;
  let pad = area.width.saturating_sub(left_width).saturating_sub(right_width);

  let line = Line::from(vec![left, Span::raw(" ".repeat(pad as usize)), right]);

  let block = Block::default().style(Style::default().bg(Color::DarkGray));
  let inner = block.inner(area);
  f.render_widget(block, area);
  f.render_widget(Paragraph::new(line), inner);
}

// ─── Status bar ───────────────────────────────────────────────────────────────

fn draw_status(f: &mut Frame, area: Rect, app: &App) {
  let (mode_label, hints) = if app.reaction.is_some() {
    ("REACTION", "any key to continue")
  } else if app.form.is_some() {
    ("BLESSING", "Tab next field  F2 public/private  Enter send  Esc cancel")
  } else {
    match app.flow.screen() {
      Screen::Overview => ("OVERVIEW", "←↑↓→/hjkl move  Enter open  r refresh  q quit"),
      Screen::Landing => ("LANDING", "1 just received  2 returning  h history  Esc home  q quit"),
      Screen::NewInput => ("NAME", "type your name  Enter save  Esc back"),
      Screen::Returning | Screen::Explanation => {
        ("HOLDER", "b leave a blessing  h history  Esc home  q quit")
      }
      Screen::History => ("HISTORY", "↑↓/jk scroll  Esc back  q quit"),
    }
  };

  let status = if app.status_msg.is_empty() {
    hints.to_string()
  } else {
    app.status_msg.clone()
  };

  let mode_span = Span::styled(
    format!(" {mode_label} "),
    Style::default()
      .fg(Color::Black)
      .bg(Color::Cyan)
      .add_modifier(Modifier::BOLD),
  );
  let hint_span = Span::styled(format!("  {status}"), Style::default().fg(Color::DarkGray));

  let line = Line::from(vec![mode_span, hint_span]);
  f.render_widget(Paragraph::new(line).style(Style::default().bg(Color::Black)), area);
}
