use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::AuthError;

/// Claims carried in the payload segment of a bearer token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (the account email for this backend)
    #[serde(default)]
    pub sub: String,
    /// Expiry, seconds since epoch
    pub exp: i64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Claims {
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.exp < now
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}

/// A raw bearer token together with its decoded claims.
#[derive(Debug, Clone, PartialEq)]
pub struct Credential {
    pub token: String,
    pub claims: Claims,
}

impl Credential {
    /// Decode the payload of `token` without verifying its signature.
    ///
    /// The signing key lives on the backend; the client only needs the
    /// expiry and subject to drive the session.
    pub fn decode(token: &str) -> Result<Self, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        let data = decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)?;

        Ok(Self {
            token: token.to_string(),
            claims: data.claims,
        })
    }

    pub fn is_expired_at(&self, now: i64) -> bool {
        self.claims.is_expired_at(now)
    }
}

/// Mint a signed HS256 token for tests.
#[cfg(test)]
pub(crate) fn test_token(sub: &str, exp: i64) -> String {
    use jsonwebtoken::{encode, EncodingKey, Header};

    let claims = serde_json::json!({ "sub": sub, "exp": exp });
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(b"backend-secret"),
    )
    .expect("Failed to encode test token")
}
