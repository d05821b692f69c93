//! SQL schema for the journey SQLite store.
//!
//! Executed once at connection startup. `PRAGMA user_version` records the
//! layout so later migrations can be gated on it.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Hand-off events are strictly append-only.
-- Chains are read back ordered by (timestamp_ms, rowid).
CREATE TABLE IF NOT EXISTS events (
    event_id         TEXT PRIMARY KEY,
    keychain_id      INTEGER NOT NULL CHECK (keychain_id BETWEEN 0 AND 99),
    timestamp_ms     INTEGER NOT NULL,
    from_name        TEXT NOT NULL,
    to_name          TEXT NOT NULL,
    prompt_key       TEXT NOT NULL,
    prompt_text      TEXT NOT NULL,
    next_prompt_key  TEXT,
    next_prompt_text TEXT
);

-- Blessings are never deleted; only is_hidden changes.
CREATE TABLE IF NOT EXISTS blessings (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    keychain_id    INTEGER NOT NULL CHECK (keychain_id BETWEEN 0 AND 99),
    station_number INTEGER NOT NULL DEFAULT 1,
    quest_tag      TEXT,
    blessing_text  TEXT NOT NULL,
    code_phrase    TEXT NOT NULL,
    optional_note  TEXT,
    visibility     TEXT NOT NULL DEFAULT 'public'
                   CHECK (visibility IN ('public', 'private')),
    created_at     TEXT NOT NULL,   -- RFC 3339 UTC, fixed width
    is_hidden      INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS reports (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    blessing_id INTEGER NOT NULL REFERENCES blessings(id),
    reason      TEXT NOT NULL,   -- 'PII_EXPOSED' | 'INAPPROPRIATE' | 'SPAM' | 'OTHER'
    description TEXT,
    status      TEXT NOT NULL DEFAULT 'pending',
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS reactions (
    id            INTEGER PRIMARY KEY,
    reaction_text TEXT NOT NULL,
    category      TEXT NOT NULL,
    emotion_type  TEXT NOT NULL,
    status        TEXT NOT NULL DEFAULT 'active'
);

CREATE INDEX IF NOT EXISTS events_keychain_idx    ON events(keychain_id, timestamp_ms);
CREATE INDEX IF NOT EXISTS blessings_keychain_idx ON blessings(keychain_id, station_number);
CREATE INDEX IF NOT EXISTS reports_blessing_idx   ON reports(blessing_id);

PRAGMA user_version = 1;
";

/// Seeds the curated reactions. Existing rows keep their edits.
pub const SEED_REACTION: &str = "
INSERT OR IGNORE INTO reactions (id, reaction_text, category, emotion_type, status)
VALUES (?1, ?2, ?3, ?4, ?5)
";
