use anyhow::Result;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::error::AppError;

type HmacSha256 = Hmac<Sha256>;

/// The signed-in user. Passed explicitly to every action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Session {
    pub(crate) user_id: i64,
    pub(crate) email: String,
    pub(crate) name: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    uid: i64,
    email: String,
    name: String,
    /// Expiry, unix seconds.
    exp: i64,
}

/// Issues and checks `payload.signature` tokens, both parts base64url.
pub(crate) struct SessionSigner {
    secret: Vec<u8>,
    ttl: Duration,
}

impl SessionSigner {
    pub(crate) fn new(secret: impl Into<Vec<u8>>, ttl: Duration) -> Self {
        Self {
            secret: secret.into(),
            ttl,
        }
    }

    fn mac(&self) -> Result<HmacSha256> {
        HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| anyhow::anyhow!("Invalid session secret: {e}"))
    }

    pub(crate) fn sign(&self, session: &Session, now: DateTime<Utc>) -> Result<String> {
        let claims = Claims {
            uid: session.user_id,
            email: session.email.clone(),
            name: session.name.clone(),
            exp: (now + self.ttl).timestamp(),
        };
        let payload_part = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims)?);
        let mut mac = self.mac()?;
        mac.update(payload_part.as_bytes());
        let sig_part = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
        Ok(format!("{payload_part}.{sig_part}"))
    }

    pub(crate) fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<Session, AppError> {
        let invalid = |msg: &str| AppError::InvalidSession(msg.to_string());

        let (payload_part, sig_part) = token
            .trim()
            .split_once('.')
            .ok_or_else(|| invalid("malformed token"))?;

        let mut mac = self.mac().map_err(|_| invalid("server secret unusable"))?;
        mac.update(payload_part.as_bytes());
        let expected = URL_SAFE_NO_PAD
            .decode(sig_part)
            .map_err(|_| invalid("malformed signature"))?;
        mac.verify_slice(&expected)
            .map_err(|_| invalid("signature mismatch"))?;

        let payload = URL_SAFE_NO_PAD
            .decode(payload_part)
            .map_err(|_| invalid("malformed payload"))?;
        let claims: Claims =
            serde_json::from_slice(&payload).map_err(|_| invalid("malformed payload"))?;

        if claims.exp <= now.timestamp() {
            return Err(invalid("session expired, log in again"));
        }

        Ok(Session {
            user_id: claims.uid,
            email: claims.email,
            name: claims.name,
        })
    }
}
