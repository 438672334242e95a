//! Error types for `lembrete-core`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("payment plan not found: {0}")]
  PlanNotFound(Uuid),

  #[error("appointment not found: {0}")]
  AppointmentNotFound(Uuid),

  #[error("payment series not found: {0}")]
  SeriesNotFound(Uuid),

  #[error("unknown weekday: {0:?}")]
  InvalidWeekday(String),

  #[error("period count must be between 1 and {max}", max = crate::schedule::MAX_PERIODS)]
  InvalidPeriodCount,

  #[error("amount must not be negative")]
  NegativeAmount,

  #[error("client name must not be empty")]
  EmptyClientName,

  #[error("plan {0} is weekly; only monthly plans can be postponed")]
  PostponeUnsupported(Uuid),

  #[error("plan {0} is already paid")]
  AlreadyPaid(Uuid),

  #[error("postpone days must be positive")]
  InvalidPostponeDays,

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Coarse classification surfaced to callers. Every kind is recoverable: the
/// failed operation leaves the stored collection untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  NotFound,
  InvalidArgument,
  SerializationFailure,
}

impl Error {
  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::PlanNotFound(_)
      | Self::AppointmentNotFound(_)
      | Self::SeriesNotFound(_) => ErrorKind::NotFound,
      Self::InvalidWeekday(_)
      | Self::InvalidPeriodCount
      | Self::NegativeAmount
      | Self::EmptyClientName
      | Self::PostponeUnsupported(_)
      | Self::AlreadyPaid(_)
      | Self::InvalidPostponeDays => ErrorKind::InvalidArgument,
      Self::Serialization(_) | Self::Store(_) => ErrorKind::SerializationFailure,
    }
  }

  /// Wrap a backend error from a [`crate::store::PlanStore`] implementation.
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
