//! [`SqliteStore`], the SQLite implementation of [`JourneyStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;

use journey_core::{
  blessing::{Blessing, BlessingQuery, NewBlessing, NewReport, Report, ReportStatus},
  event::{HistoryEvent, JourneyLog},
  keychain::KeychainId,
  reaction::{Reaction, default_reactions},
  store::JourneyStore,
};

use crate::{
  Error, Result,
  encode::{
    RawBlessing, RawEvent, RawReaction, RawReport, encode_category, encode_dt, encode_emotion,
    encode_reaction_status, encode_uuid,
  },
  schema::{SCHEMA, SEED_REACTION},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A journey store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path`, run schema initialisation and seed
  /// the reaction pool.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store; useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Create any missing tables and seed reactions that are not present yet.
  /// Safe to run against an initialised store; existing rows are untouched.
  pub(crate) async fn init_schema(&self) -> Result<()> {
    let seed = default_reactions()
      .into_iter()
      .map(|r| {
        checked_reaction(&r)?;
        Ok((
          r.id,
          r.reaction_text,
          encode_category(r.category),
          encode_emotion(r.emotion_type),
          encode_reaction_status(r.status),
        ))
      })
      .collect::<Result<Vec<_>>>()?;

    let seeded = self
      .conn
      .call(move |conn| {
        conn.execute_batch(SCHEMA)?;
        let tx = conn.transaction()?;
        let mut seeded = 0;
        {
          let mut stmt = tx.prepare(SEED_REACTION)?;
          for (id, text, category, emotion, status) in &seed {
            seeded += stmt.execute(rusqlite::params![id, text, category, emotion, status])?;
          }
        }
        tx.commit()?;
        Ok(seeded)
      })
      .await?;

    if seeded > 0 {
      tracing::debug!(seeded, "seeded reaction pool");
    }
    Ok(())
  }

  /// Replace a reaction row.
  #[cfg(test)]
  pub(crate) async fn put_reaction(&self, reaction: Reaction) -> Result<()> {
    checked_reaction(&reaction)?;
    let category = encode_category(reaction.category);
    let emotion = encode_emotion(reaction.emotion_type);
    let status = encode_reaction_status(reaction.status);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT OR REPLACE INTO reactions (id, reaction_text, category, emotion_type, status)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![reaction.id, reaction.reaction_text, category, emotion, status],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn query_events(&self, keychain_id: Option<KeychainId>) -> Result<Vec<HistoryEvent>> {
    let keychain = keychain_id.map(|id| i64::from(id.get()));

    let raws: Vec<RawEvent> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {} FROM events
           WHERE (?1 IS NULL OR keychain_id = ?1)
           ORDER BY keychain_id, timestamp_ms, rowid",
          RawEvent::COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![keychain], RawEvent::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawEvent::into_event).collect()
  }

  async fn query_blessing(&self, id: i64) -> Result<Option<Blessing>> {
    let raw: Option<RawBlessing> = self
      .conn
      .call(move |conn| {
        let sql = format!("{} WHERE b.id = ?1", RawBlessing::SELECT);
        Ok(conn.query_row(&sql, rusqlite::params![id], RawBlessing::from_row).optional()?)
      })
      .await?;

    raw.map(RawBlessing::into_blessing).transpose()
  }
}

fn checked_reaction(reaction: &Reaction) -> Result<()> {
  reaction
    .validate()
    .map_err(|source| Error::InvalidReaction { id: reaction.id, source })
}

// ─── JourneyStore impl ───────────────────────────────────────────────────────

impl JourneyStore for SqliteStore {
  type Error = Error;

  // ── Hand-off events ───────────────────────────────────────────────────────

  async fn list_events(&self, keychain_id: KeychainId) -> Result<Vec<HistoryEvent>> {
    self.query_events(Some(keychain_id)).await
  }

  async fn journey_log(&self) -> Result<JourneyLog> {
    Ok(JourneyLog::from_events(self.query_events(None).await?))
  }

  async fn append_event(&self, event: HistoryEvent) -> Result<HistoryEvent> {
    let id_str = encode_uuid(event.id);
    let keychain = i64::from(event.keychain_id.get());
    let ts = event.timestamp.timestamp_millis();
    let row = event.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO events (
             event_id, keychain_id, timestamp_ms, from_name, to_name,
             prompt_key, prompt_text, next_prompt_key, next_prompt_text
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
          rusqlite::params![
            id_str,
            keychain,
            ts,
            row.from_name,
            row.to_name,
            row.prompt_key,
            row.prompt_text,
            row.next_prompt_key,
            row.next_prompt_text,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(event)
  }

  // ── Blessings ─────────────────────────────────────────────────────────────

  async fn list_blessings(&self, query: &BlessingQuery) -> Result<Vec<Blessing>> {
    let keychain = i64::from(query.keychain_id.get());
    let station = query.station_number.map(i64::from);
    let visibility = query.visibility.map(|v| v.as_str());
    let include_hidden = query.include_hidden;

    let raws: Vec<RawBlessing> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "{} WHERE b.keychain_id = ?1
             AND (?2 IS NULL OR b.station_number = ?2)
             AND (?3 IS NULL OR b.visibility = ?3)
             AND (?4 OR b.is_hidden = 0)
           ORDER BY b.created_at DESC, b.id DESC",
          RawBlessing::SELECT
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(
            rusqlite::params![keychain, station, visibility, include_hidden],
            RawBlessing::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawBlessing::into_blessing).collect()
  }

  async fn get_blessing(&self, id: i64) -> Result<Option<Blessing>> {
    self.query_blessing(id).await
  }

  async fn insert_blessing(&self, input: NewBlessing) -> Result<Blessing> {
    let created_at = Utc::now();
    let created_str = encode_dt(created_at);
    let keychain = i64::from(input.keychain_id.get());
    let visibility = input.visibility.as_str();
    let row = input.clone();

    let id: i64 = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO blessings (
             keychain_id, station_number, quest_tag, blessing_text, code_phrase,
             optional_note, visibility, created_at, is_hidden
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 0)",
          rusqlite::params![
            keychain,
            row.station_number,
            row.quest_tag,
            row.blessing_text,
            row.code_phrase,
            row.optional_note,
            visibility,
            created_str,
          ],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(Blessing {
      id,
      keychain_id: input.keychain_id,
      station_number: input.station_number,
      quest_tag: input.quest_tag,
      blessing_text: input.blessing_text,
      code_phrase: input.code_phrase,
      optional_note: input.optional_note,
      visibility: input.visibility,
      created_at,
      is_hidden: false,
      reported_count: 0,
    })
  }

  async fn set_blessing_hidden(&self, id: i64, hidden: bool) -> Result<Option<Blessing>> {
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE blessings SET is_hidden = ?2 WHERE id = ?1",
          rusqlite::params![id, hidden],
        )?)
      })
      .await?;

    if changed == 0 {
      return Ok(None);
    }
    self.query_blessing(id).await
  }

  // ── Reports ───────────────────────────────────────────────────────────────

  async fn insert_report(&self, input: NewReport) -> Result<Report> {
    let created_str = encode_dt(Utc::now());
    let status = ReportStatus::Pending.as_str();
    let reason = input.reason.as_str();
    let blessing_id = input.blessing_id;
    let description = input.description;

    let raw: Option<RawReport> = self
      .conn
      .call(move |conn| {
        let exists = conn
          .query_row("SELECT 1 FROM blessings WHERE id = ?1", rusqlite::params![blessing_id], |_| {
            Ok(())
          })
          .optional()?
          .is_some();
        if !exists {
          return Ok(None);
        }

        conn.execute(
          "INSERT INTO reports (blessing_id, reason, description, status, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![blessing_id, reason, description, status, created_str],
        )?;
        Ok(Some(RawReport {
          id: conn.last_insert_rowid(),
          blessing_id,
          reason: reason.to_owned(),
          description,
          status: status.to_owned(),
          created_at: created_str,
        }))
      })
      .await?;

    raw.ok_or(Error::BlessingNotFound(blessing_id))?.into_report()
  }

  // ── Reactions ─────────────────────────────────────────────────────────────

  async fn active_reactions(&self) -> Result<Vec<Reaction>> {
    let raws: Vec<RawReaction> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT id, reaction_text, category, emotion_type, status
           FROM reactions WHERE status = 'active' ORDER BY id ASC",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawReaction {
              id:            row.get(0)?,
              reaction_text: row.get(1)?,
              category:      row.get(2)?,
              emotion_type:  row.get(3)?,
              status:        row.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawReaction::into_reaction).collect()
  }
}
