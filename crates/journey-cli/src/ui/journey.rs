//! The holder-facing screens: landing, returning, name entry and the
//! explanation shown after a hand-off.

use std::borrow::Cow;

use journey_core::flow::Screen;
use ratatui::{
  Frame,
  layout::Rect,
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Paragraph, Wrap},
};

use crate::app::App;

pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  let title = app.flow.keychain().map(|id| format!(" 鎖匙扣 #{id} ")).unwrap_or_default();
  let block = Block::default()
    .title(title)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));
  let inner = block.inner(area);
  f.render_widget(block, area);

  let lines = match app.flow.screen() {
    Screen::Landing => landing(app),
    Screen::Returning => returning(app),
    Screen::NewInput => new_input(app),
    Screen::Explanation => explanation(app),
    Screen::Overview | Screen::History => Vec::new(),
  };
  f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}

fn heading(text: String) -> Line<'static> {
  Line::from(Span::styled(text, Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)))
}

fn dim<'a>(text: impl Into<Cow<'a, str>>) -> Line<'a> {
  Line::from(Span::styled(text, Style::default().fg(Color::DarkGray)))
}

fn landing(app: &App) -> Vec<Line<'_>> {
  vec![
    heading(format!("上一位持有人：{}", app.flow.last_holder_name())),
    Line::from(""),
    Line::from("你是剛剛收到這個鎖匙扣，還是回來看看？"),
    Line::from(""),
    Line::from("  [1] 我剛收到"),
    Line::from("  [2] 我回來了"),
    Line::from(""),
    dim(format!("已經過 {} 次交接", app.flow.chain().len())),
  ]
}

fn returning(app: &App) -> Vec<Line<'_>> {
  let quest = app
    .flow
    .chain()
    .last()
    .and_then(|tail| tail.next_prompt_text.as_deref())
    .unwrap_or_default();
  let mut lines = vec![
    heading(format!("歡迎回來，{}！", app.flow.last_holder_name())),
    Line::from(""),
  ];
  if !quest.is_empty() {
    lines.push(Line::from(format!("你的任務：{quest}")));
    lines.push(Line::from(""));
  }
  lines.push(dim(format!("這個鎖匙扣收到了 {} 份公開祝福", app.blessings.len())));
  lines
}

fn new_input(app: &App) -> Vec<Line<'_>> {
  let max = app.flow.rules().holder_name_max;
  let count = app.name_input.trim().chars().count();
  let counter_style = if count > max {
    Style::default().fg(Color::Red)
  } else {
    Style::default().fg(Color::DarkGray)
  };
  vec![
    heading(format!("{} 把鎖匙扣交給了你", app.flow.last_holder_name())),
    Line::from(""),
    Line::from("請輸入你的名字："),
    Line::from(vec![
      Span::styled(format!("> {}_", app.name_input), Style::default().fg(Color::Yellow)),
      Span::styled(format!("  {count}/{max}"), counter_style),
    ]),
  ]
}

fn explanation(app: &App) -> Vec<Line<'_>> {
  let Some(ex) = app.flow.explanation() else {
    return vec![dim("…")];
  };
  vec![
    heading(format!("{} 把鎖匙扣交給了你", ex.giver_name)),
    Line::from(""),
    Line::from(format!("原因：{}", ex.previous_prompt_text)),
    Line::from(""),
    Line::from(Span::styled(
      format!("下一步：{}", ex.next_prompt_text),
      Style::default().fg(Color::Yellow),
    )),
    Line::from(""),
    dim("按 b 留下一句祝福"),
  ]
}
