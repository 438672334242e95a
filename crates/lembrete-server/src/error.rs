//! Error types and axum `IntoResponse` implementation.

use axum::{
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unauthorized: {0}")]
  Unauthorized(Rejection),
}

/// Why a request failed authentication. Logged, never sent to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejection {
  #[error("no Basic credentials")]
  MissingCredentials,
  #[error("malformed Basic credentials")]
  Malformed,
  #[error("unknown user")]
  UnknownUser,
  #[error("wrong password")]
  WrongPassword,
  #[error("auth_password_hash is not a valid PHC string")]
  InvalidHash,
}

impl From<Rejection> for Error {
  fn from(reason: Rejection) -> Self { Error::Unauthorized(reason) }
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    match self {
      Error::Unauthorized(_) => {
        let mut res = (StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
        res.headers_mut().insert(
          header::WWW_AUTHENTICATE,
          HeaderValue::from_static("Basic realm=\"lembrete\""),
        );
        res
      }
    }
  }
}
