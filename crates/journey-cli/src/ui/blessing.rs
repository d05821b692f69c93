//! Blessing form and reaction card overlays.

use journey_core::{
  blessing::Visibility,
  pii::PiiCategory,
  validate::{BlessingRules, Field},
};
use ratatui::{
  Frame,
  layout::Rect,
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

use crate::form::{BlessingForm, FIELDS};

fn label(field: Field) -> &'static str {
  match field {
    Field::BlessingText => "祝福",
    Field::CodePhrase => "暗號",
    Field::OptionalNote => "備註",
    _ => "",
  }
}

pub fn draw_form(f: &mut Frame, area: Rect, form: &BlessingForm, rules: &BlessingRules) {
  let block = Block::default()
    .title(format!(" 留下祝福 · 第 {} 站 ", form.station))
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Yellow));

  let mut lines = Vec::new();
  for (i, &field) in FIELDS.iter().enumerate() {
    let status = form.status(rules, field);
    let focused = i == form.focus;
    let label_style = if focused {
      Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else {
      Style::default().fg(Color::Cyan)
    };
    let counter_style = if status.over_limit() {
      Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
    } else {
      Style::default().fg(Color::DarkGray)
    };
    let cursor = if focused { "_" } else { "" };

    lines.push(Line::from(vec![
      Span::styled(format!("{} ", label(field)), label_style),
      Span::raw(format!("{}{cursor}", form.value(field))),
      Span::styled(format!("  {}/{}", status.chars, status.max), counter_style),
    ]));
    if status.pii.is_pii() {
      lines.push(Line::from(Span::styled(
        format!("     似乎包含個人資料：{}", PiiCategory::join(&status.pii.categories)),
        Style::default().fg(Color::Red),
      )));
    }
    lines.push(Line::from(""));
  }

  let visibility = match form.visibility {
    Visibility::Public => "公開",
    Visibility::Private => "私人",
  };
  lines.push(Line::from(vec![
    Span::styled("可見度 ", Style::default().fg(Color::Cyan)),
    Span::raw(visibility),
  ]));
  lines.push(Line::from(""));
  lines.push(if form.is_submittable(rules) {
    Line::from(Span::styled("Enter 送出", Style::default().fg(Color::Green)))
  } else {
    Line::from(Span::styled("請填寫祝福及暗號", Style::default().fg(Color::DarkGray)))
  });

  f.render_widget(Clear, area);
  f.render_widget(Paragraph::new(lines).block(block).wrap(Wrap { trim: false }), area);
}

pub fn draw_reaction(f: &mut Frame, area: Rect, text: &str) {
  let block = Block::default()
    .title(" 小將話你知 ")
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Magenta));
  f.render_widget(Clear, area);
  f.render_widget(
    Paragraph::new(vec![
      Line::from(""),
      Line::from(Span::styled(
        text.to_owned(),
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
      )),
    ])
    .block(block)
    .centered()
    .wrap(Wrap { trim: true }),
    area,
  );
}
