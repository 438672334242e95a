//! Error type for `lembrete-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("decimal parse error: {0}")]
  Decimal(#[from] rust_decimal::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A row holds a value no domain type accepts.
  #[error("invalid {column} value: {value:?}")]
  InvalidColumn { column: &'static str, value: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
