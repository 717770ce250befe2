//! JWT payload decoding.
//!
//! The client never verifies signatures (the server does); it only reads
//! the payload to learn who is signed in and when the token expires.
//!
//! ```text
//! header.PAYLOAD.signature
//!        │
//!        ├── '-' → '+', '_' → '/'      (URL-safe → standard alphabet)
//!        ├── base64 decode             (padding optional)
//!        └── UTF-8 JSON → TokenClaims
//! ```
//!
//! Any failure along the way is `ClientError::InvalidToken`.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

use crate::error::{ClientError, ClientResult};

/// Standard alphabet; JWTs drop the `=` padding, so accept either.
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// The claims this client cares about.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TokenClaims {
    #[serde(default)]
    pub sub: Option<String>,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "roles")]
    pub roles: Vec<String>,

    /// Seconds since the epoch.
    #[serde(default)]
    pub exp: Option<f64>,

    #[serde(default, alias = "userId")]
    pub user_id: Option<i64>,
}

impl TokenClaims {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp
            .filter(|exp| exp.is_finite())
            .and_then(|exp| DateTime::from_timestamp(exp.floor() as i64, 0))
    }
}

/// `roles` may be a list or a single string.
fn roles<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Roles {
        Many(Vec<String>),
        One(String),
    }

    Ok(match Option::<Roles>::deserialize(deserializer)? {
        Some(Roles::Many(roles)) => roles,
        Some(Roles::One(role)) => vec![role],
        None => Vec::new(),
    })
}

/// Decodes the payload segment of `token`.
pub fn decode_claims(token: &str) -> ClientResult<TokenClaims> {
    let segment = token
        .split('.')
        .nth(1)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ClientError::InvalidToken("token has no payload segment".into()))?;

    let standard: String = segment
        .chars()
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();

    let bytes = PAYLOAD_ENGINE
        .decode(standard)
        .map_err(|e| ClientError::InvalidToken(format!("payload is not base64: {}", e)))?;

    serde_json::from_slice(&bytes)
        .map_err(|e| ClientError::InvalidToken(format!("payload is not JSON: {}", e)))
}
