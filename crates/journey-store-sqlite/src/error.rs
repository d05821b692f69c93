//! Error type for `journey-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A column held a value outside its domain.
  #[error("corrupt {column} value: {value:?}")]
  Corrupt { column: &'static str, value: String },

  #[error("blessing not found: {0}")]
  BlessingNotFound(i64),

  /// A reaction failed validation before it reached the table.
  #[error("invalid reaction {id}: {source}")]
  InvalidReaction {
    id:     i64,
    #[source]
    source: journey_core::ValidationError,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
