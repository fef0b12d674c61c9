//! Platform authentication helpers.
//!
//! Requests authenticate with an HS256 bearer token whose subject is the
//! acting user's id and whose `roles` claim lists [`Role`] names. Verifying a
//! token yields the [`Viewer`] that downstream authorization works with.

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use platform_authz::{Role, Viewer};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum AuthnError {
    #[error("missing bearer token")]
    MissingToken,
    #[error("invalid token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),
    #[error("token carries no recognised role")]
    NoRoles,
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_minutes: i64,
}

impl AuthConfig {
    pub fn encoding_key(&self) -> EncodingKey {
        EncodingKey::from_secret(self.jwt_secret.as_bytes())
    }

    pub fn decoding_key(&self) -> DecodingKey {
        DecodingKey::from_secret(self.jwt_secret.as_bytes())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: Uuid,
    pub roles: Vec<String>,
    pub exp: usize,
    pub iat: usize,
}

pub fn issue_token(
    user_id: Uuid,
    roles: &[Role],
    config: &AuthConfig,
) -> Result<String, AuthnError> {
    let now = Utc::now();
    let exp = now
        .checked_add_signed(Duration::minutes(config.token_ttl_minutes))
        .unwrap_or(now)
        .timestamp() as usize;
    let claims = TokenClaims {
        sub: user_id,
        roles: roles.iter().map(|r| r.as_str().to_string()).collect(),
        exp,
        iat: now.timestamp() as usize,
    };
    Ok(jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &config.encoding_key(),
    )?)
}

pub fn decode_token(token: &str, config: &AuthConfig) -> Result<TokenClaims, AuthnError> {
    let data = jsonwebtoken::decode::<TokenClaims>(
        token,
        &config.decoding_key(),
        &Validation::default(),
    )?;
    Ok(data.claims)
}

/// Verify `token` and resolve the viewer it represents. Unknown role names
/// are skipped; a token left with no roles is rejected.
pub fn authenticate(token: &str, config: &AuthConfig) -> Result<Viewer, AuthnError> {
    let claims = decode_token(token, config)?;
    let roles: Vec<Role> = claims
        .roles
        .iter()
        .filter_map(|name| name.parse().ok())
        .collect();
    if roles.is_empty() {
        return Err(AuthnError::NoRoles);
    }
    Ok(Viewer::new(claims.sub, roles))
}

/// Extract the token from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, rest) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = rest.trim();
    (!token.is_empty()).then_some(token)
}
