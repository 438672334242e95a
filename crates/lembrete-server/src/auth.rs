//! HTTP Basic-auth middleware and standalone verifier.

use std::sync::Arc;

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::{
  extract::{Request, State},
  http::{HeaderMap, header},
  middleware::Next,
  response::{IntoResponse, Response},
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;

use crate::error::{Error, Rejection};

/// Credentials accepted as valid for this server instance.
#[derive(Clone)]
pub struct AuthConfig {
  /// Empty disables authentication.
  pub username:      String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
}

impl AuthConfig {
  pub fn is_enabled(&self) -> bool { !self.username.is_empty() }
}

/// Username and password from an `Authorization: Basic` header.
fn basic_credentials(headers: &HeaderMap) -> Result<(String, String), Rejection> {
  let value = headers
    .get(header::AUTHORIZATION)
    .ok_or(Rejection::MissingCredentials)?
    .to_str()
    .map_err(|_| Rejection::Malformed)?;
  let encoded = value.strip_prefix("Basic ").ok_or(Rejection::MissingCredentials)?;

  let decoded = B64.decode(encoded.trim()).map_err(|_| Rejection::Malformed)?;
  let pair = String::from_utf8(decoded).map_err(|_| Rejection::Malformed)?;
  let (username, password) = pair.split_once(':').ok_or(Rejection::Malformed)?;
  Ok((username.to_owned(), password.to_owned()))
}

/// Check the request's Basic credentials against the configured user.
pub fn verify_auth(headers: &HeaderMap, config: &AuthConfig) -> Result<(), Rejection> {
  let (username, password) = basic_credentials(headers)?;
  if username != config.username {
    return Err(Rejection::UnknownUser);
  }

  let expected = PasswordHash::new(&config.password_hash).map_err(|_| Rejection::InvalidHash)?;
  Argon2::default()
    .verify_password(password.as_bytes(), &expected)
    .map_err(|_| Rejection::WrongPassword)
}

/// Reject requests without valid credentials when auth is enabled.
pub async fn require_auth(
  State(config): State<Arc<AuthConfig>>,
  req: Request,
  next: Next,
) -> Response {
  if config.is_enabled()
    && let Err(reason) = verify_auth(req.headers(), &config)
  {
    if reason == Rejection::InvalidHash {
      tracing::warn!("{reason}; every request will be rejected");
    } else {
      tracing::debug!(path = %req.uri().path(), %reason, "rejected request");
    }
    return Error::from(reason).into_response();
  }
  next.run(req).await
}
