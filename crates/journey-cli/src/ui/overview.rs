//! The 0–99 grid of keychains.

use journey_core::flow::NOBODY_YET;
use ratatui::{
  Frame,
  layout::{Constraint, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Paragraph},
};

use crate::app::{App, GRID_COLUMNS};

pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  let block = Block::default()
    .title(" 鎖匙扣 ")
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));
  let inner = block.inner(area);
  f.render_widget(block, area);

  let [grid_area, detail_area] =
    Layout::vertical([Constraint::Min(0), Constraint::Length(2)]).areas(inner);

  if app.overview.is_empty() {
    f.render_widget(
      Paragraph::new("No keychains loaded. Press r to retry.")
        .style(Style::default().fg(Color::DarkGray)),
      grid_area,
    );
    return;
  }

  let lines: Vec<Line> = app
    .overview
    .chunks(GRID_COLUMNS)
    .enumerate()
    .map(|(row, statuses)| {
      let spans = statuses.iter().enumerate().map(|(col, status)| {
        let index = row * GRID_COLUMNS + col;
        let mut style = if status.handoffs > 0 {
          Style::default().fg(Color::Green)
        } else {
          Style::default().fg(Color::DarkGray)
        };
        if index == app.grid_cursor {
          style = style.bg(Color::Blue).fg(Color::White).add_modifier(Modifier::BOLD);
        }
        Span::styled(format!(" {:>2}·{:<3}", status.keychain_id.get(), status.handoffs), style)
      });
      Line::from(spans.collect::<Vec<_>>())
    })
    .collect();
  f.render_widget(Paragraph::new(lines), grid_area);

  if let Some(status) = app.overview.get(app.grid_cursor) {
    let holder = status.holder.as_deref().unwrap_or(NOBODY_YET);
    let line = Line::from(vec![
      Span::styled(
        format!("#{} ", status.keychain_id),
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
      ),
      Span::raw(format!("現時在 {holder} 手上，經過 {} 次交接", status.handoffs)),
    ]);
    f.render_widget(Paragraph::new(line), detail_area);
  }
}
