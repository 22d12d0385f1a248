//! Session token codec. Sessions are never stored server-side; the signed
//! token is the whole session, and expiry is the only termination mechanism.

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use vent_types::api::Claims;

/// Token (and cookie) lifetime.
pub const TOKEN_TTL_DAYS: i64 = 7;

pub fn issue(secret: &str, user_id: Uuid, email: &str) -> anyhow::Result<String> {
    let now = chrono::Utc::now();
    let claims = Claims {
        sub: user_id,
        email: email.to_string(),
        iat: now.timestamp() as usize,
        exp: (now + chrono::Duration::days(TOKEN_TTL_DAYS)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

/// `None` for malformed encoding, signature mismatch, or elapsed expiry —
/// an invalid token is indistinguishable from no token.
pub fn verify(secret: &str, token: &str) -> Option<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .ok()
}
