//! Encoding and decoding helpers between domain types and the plain values
//! stored in SQLite columns.
//!
//! Event timestamps are integer milliseconds; blessing and report timestamps
//! are fixed-width RFC 3339 strings so they sort lexically. Enums are stored as
//! their wire names.

use chrono::{DateTime, SecondsFormat, TimeZone as _, Utc};
use journey_core::{
  blessing::{Blessing, Report, ReportReason, ReportStatus, Visibility},
  event::HistoryEvent,
  keychain::KeychainId,
  reaction::{EmotionType, Reaction, ReactionCategory, ReactionStatus},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339_opts(SecondsFormat::Micros, true) }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn decode_ms(ms: i64) -> Result<DateTime<Utc>> {
  Utc
    .timestamp_millis_opt(ms)
    .single()
    .ok_or_else(|| Error::DateParse(format!("timestamp out of range: {ms}")))
}

pub fn decode_keychain(raw: i64) -> Result<KeychainId> {
  u8::try_from(raw)
    .ok()
    .and_then(|id| KeychainId::new(id).ok())
    .ok_or(Error::Corrupt { column: "keychain_id", value: raw.to_string() })
}

fn corrupt(column: &'static str) -> impl FnOnce(String) -> Error {
  move |value| Error::Corrupt { column, value }
}

// ─── Reaction enums ──────────────────────────────────────────────────────────

pub fn encode_category(c: ReactionCategory) -> &'static str {
  match c {
    ReactionCategory::Blessing => "Blessing",
    ReactionCategory::Encouragement => "Encouragement",
    ReactionCategory::Resonance => "Resonance",
    ReactionCategory::Ritual => "Ritual",
  }
}

pub fn decode_category(s: String) -> Result<ReactionCategory> {
  match s.as_str() {
    "Blessing" => Ok(ReactionCategory::Blessing),
    "Encouragement" => Ok(ReactionCategory::Encouragement),
    "Resonance" => Ok(ReactionCategory::Resonance),
    "Ritual" => Ok(ReactionCategory::Ritual),
    _ => Err(corrupt("category")(s)),
  }
}

pub fn encode_emotion(e: EmotionType) -> &'static str {
  match e {
    EmotionType::Emotion => "Emotion",
    EmotionType::Ritual => "Ritual",
    EmotionType::Gratitude => "Gratitude",
  }
}

pub fn decode_emotion(s: String) -> Result<EmotionType> {
  match s.as_str() {
    "Emotion" => Ok(EmotionType::Emotion),
    "Ritual" => Ok(EmotionType::Ritual),
    "Gratitude" => Ok(EmotionType::Gratitude),
    _ => Err(corrupt("emotion_type")(s)),
  }
}

pub fn encode_reaction_status(s: ReactionStatus) -> &'static str {
  match s {
    ReactionStatus::Active => "active",
    ReactionStatus::Inactive => "inactive",
  }
}

pub fn decode_reaction_status(s: String) -> Result<ReactionStatus> {
  match s.as_str() {
    "active" => Ok(ReactionStatus::Active),
    "inactive" => Ok(ReactionStatus::Inactive),
    _ => Err(corrupt("status")(s)),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from an `events` row.
pub struct RawEvent {
  pub event_id:         String,
  pub keychain_id:      i64,
  pub timestamp_ms:     i64,
  pub from_name:        String,
  pub to_name:          String,
  pub prompt_key:       String,
  pub prompt_text:      String,
  pub next_prompt_key:  Option<String>,
  pub next_prompt_text: Option<String>,
}

impl RawEvent {
  pub const COLUMNS: &'static str = "event_id, keychain_id, timestamp_ms, from_name, to_name, \
                                     prompt_key, prompt_text, next_prompt_key, next_prompt_text";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      event_id:         row.get(0)?,
      keychain_id:      row.get(1)?,
      timestamp_ms:     row.get(2)?,
      from_name:        row.get(3)?,
      to_name:          row.get(4)?,
      prompt_key:       row.get(5)?,
      prompt_text:      row.get(6)?,
      next_prompt_key:  row.get(7)?,
      next_prompt_text: row.get(8)?,
    })
  }

  pub fn into_event(self) -> Result<HistoryEvent> {
    Ok(HistoryEvent {
      id:               decode_uuid(&self.event_id)?,
      keychain_id:      decode_keychain(self.keychain_id)?,
      timestamp:        decode_ms(self.timestamp_ms)?,
      from_name:        self.from_name,
      to_name:          self.to_name,
      prompt_key:       self.prompt_key,
      prompt_text:      self.prompt_text,
      next_prompt_key:  self.next_prompt_key,
      next_prompt_text: self.next_prompt_text,
    })
  }
}

/// A `blessings` row plus its derived report count.
pub struct RawBlessing {
  pub id:             i64,
  pub keychain_id:    i64,
  pub station_number: i64,
  pub quest_tag:      Option<String>,
  pub blessing_text:  String,
  pub code_phrase:    String,
  pub optional_note:  Option<String>,
  pub visibility:     String,
  pub created_at:     String,
  pub is_hidden:      bool,
  pub reported_count: i64,
}

impl RawBlessing {
  pub const SELECT: &'static str = "SELECT b.id, b.keychain_id, b.station_number, b.quest_tag, \
                                    b.blessing_text, b.code_phrase, b.optional_note, \
                                    b.visibility, b.created_at, b.is_hidden, \
                                    (SELECT COUNT(*) FROM reports r WHERE r.blessing_id = b.id) \
                                    FROM blessings b";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:             row.get(0)?,
      keychain_id:    row.get(1)?,
      station_number: row.get(2)?,
      quest_tag:      row.get(3)?,
      blessing_text:  row.get(4)?,
      code_phrase:    row.get(5)?,
      optional_note:  row.get(6)?,
      visibility:     row.get(7)?,
      created_at:     row.get(8)?,
      is_hidden:      row.get(9)?,
      reported_count: row.get(10)?,
    })
  }

  pub fn into_blessing(self) -> Result<Blessing> {
    let visibility: Visibility =
      self.visibility.parse().map_err(|_| corrupt("visibility")(self.visibility.clone()))?;
    Ok(Blessing {
      id: self.id,
      keychain_id: decode_keychain(self.keychain_id)?,
      station_number: u32::try_from(self.station_number)
        .map_err(|_| corrupt("station_number")(self.station_number.to_string()))?,
      quest_tag: self.quest_tag,
      blessing_text: self.blessing_text,
      code_phrase: self.code_phrase,
      optional_note: self.optional_note,
      visibility,
      created_at: decode_dt(&self.created_at)?,
      is_hidden: self.is_hidden,
      reported_count: u32::try_from(self.reported_count).unwrap_or(u32::MAX),
    })
  }
}

pub struct RawReport {
  pub id:          i64,
  pub blessing_id: i64,
  pub reason:      String,
  pub description: Option<String>,
  pub status:      String,
  pub created_at:  String,
}

impl RawReport {
  pub fn into_report(self) -> Result<Report> {
    let reason: ReportReason =
      self.reason.parse().map_err(|_| corrupt("reason")(self.reason.clone()))?;
    let status: ReportStatus =
      self.status.parse().map_err(|_| corrupt("status")(self.status.clone()))?;
    Ok(Report {
      id: self.id,
      blessing_id: self.blessing_id,
      reason,
      description: self.description,
      status,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

pub struct RawReaction {
  pub id:            i64,
  pub reaction_text: String,
  pub category:      String,
  pub emotion_type:  String,
  pub status:        String,
}

impl RawReaction {
  pub fn into_reaction(self) -> Result<Reaction> {
    Ok(Reaction {
      id:            self.id,
      reaction_text: self.reaction_text,
      category:      decode_category(self.category)?,
      emotion_type:  decode_emotion(self.emotion_type)?,
      status:        decode_reaction_status(self.status)?,
    })
  }
}
