//! The journey so far: the shareable story plus public blessings.

use journey_core::chain::render_story;
use ratatui::{
  Frame,
  layout::{Constraint, Layout, Rect},
  style::{Color, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Paragraph, Wrap},
};

use crate::app::App;

pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  let [story_area, blessing_area] =
    Layout::horizontal([Constraint::Percentage(65), Constraint::Percentage(35)]).areas(area);

  let story = app
    .flow
    .keychain()
    .map(|id| render_story(id, app.flow.chain()))
    .unwrap_or_default();

  let block = Block::default()
    .title(" 旅程 ")
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));
  f.render_widget(
    Paragraph::new(story)
      .block(block)
      .wrap(Wrap { trim: false })
      .scroll((app.history_scroll.min(u16::MAX as usize) as u16, 0)),
    story_area,
  );

  let lines: Vec<Line> = if app.blessings.is_empty() {
    vec![Line::from(Span::styled("暫時未有祝福", Style::default().fg(Color::DarkGray)))]
  } else {
    app
      .blessings
      .iter()
      .map(|b| {
        Line::from(vec![
          Span::styled(format!("站{:<3}", b.station_number), Style::default().fg(Color::Cyan)),
          Span::raw(b.blessing_text.clone()),
          Span::styled(format!("  · {}", b.code_phrase), Style::default().fg(Color::DarkGray)),
        ])
      })
      .collect()
  };
  let block = Block::default()
    .title(" 祝福 ")
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));
  f.render_widget(Paragraph::new(lines).block(block), blessing_area);
}
