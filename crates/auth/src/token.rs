//! HS256 compact token mint and verify.
//!
//! The token is JWT-shaped: `base64url(header).base64url(payload).base64url(sig)`
//! with an HMAC-SHA256 signature. Payload fields match the account
//! service's wire contract: `{userId, username, role, familyId, exp}`.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use laxbot_core::{AuthError, Principal, UserRole};

type HmacSha256 = Hmac<Sha256>;

const HEADER_B64: &str = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9"; // {"alg":"HS256","typ":"JWT"}

/// The signed token payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub username: String,
    pub role: UserRole,
    #[serde(rename = "familyId")]
    pub family_id: String,
    /// Expiry, seconds since the Unix epoch.
    pub exp: i64,
}

impl TokenClaims {
    pub fn into_principal(self) -> Principal {
        Principal {
            user_id: self.user_id,
            username: self.username,
            role: self.role,
            family_id: self.family_id,
        }
    }
}

fn mac(secret: &[u8]) -> HmacSha256 {
    // HMAC accepts keys of any length
    HmacSha256::new_from_slice(secret).expect("HMAC key of any length")
}

/// Mint a token for the given claims.
pub fn sign_token(claims: &TokenClaims, secret: &[u8]) -> String {
    let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims).expect("claims serialize"));
    let signing_input = format!("{HEADER_B64}.{payload}");

    let mut m = mac(secret);
    m.update(signing_input.as_bytes());
    let signature = URL_SAFE_NO_PAD.encode(m.finalize().into_bytes());

    format!("{signing_input}.{signature}")
}

/// Verify a token's signature and expiry, returning its claims.
///
/// Rejections are deliberately coarse: any structural or signature problem
/// is `InvalidToken`, an out-of-date token is `Expired`. Nothing leaks
/// which part of the check failed beyond that.
pub fn verify_token(token: &str, secret: &[u8], now: DateTime<Utc>) -> Result<TokenClaims, AuthError> {
    let mut parts = token.split('.');
    let (Some(header), Some(payload), Some(signature), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(AuthError::InvalidToken);
    };

    // Constant-time signature check before anything is parsed.
    let signing_input = format!("{header}.{payload}");
    let sig_bytes = URL_SAFE_NO_PAD
        .decode(signature)
        .map_err(|_| AuthError::InvalidToken)?;
    let mut m = mac(secret);
    m.update(signing_input.as_bytes());
    m.verify_slice(&sig_bytes).map_err(|_| AuthError::InvalidToken)?;

    let header_json: serde_json::Value = URL_SAFE_NO_PAD
        .decode(header)
        .ok()
        .and_then(|b| serde_json::from_slice(&b).ok())
        .ok_or(AuthError::InvalidToken)?;
    if header_json["alg"] != "HS256" {
        return Err(AuthError::InvalidToken);
    }

    let claims: TokenClaims = URL_SAFE_NO_PAD
        .decode(payload)
        .ok()
        .and_then(|b| serde_json::from_slice(&b).ok())
        .ok_or(AuthError::InvalidToken)?;

    if claims.exp <= now.timestamp() {
        return Err(AuthError::Expired);
    }

    Ok(claims)
}
