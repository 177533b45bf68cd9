//! Access-token inspection, sign-up validation and session persistence.

use std::path::Path;

use chrono::Utc;
use jsonwebtoken::{DecodingKey, Validation, decode};

use cleanify_types::api::{Claims, Session};

use crate::error::{ClientError, ClientResult};

pub const MIN_PASSWORD_LEN: usize = 6;

/// Seconds of clock skew tolerated before a token is treated as expired.
const EXPIRY_LEEWAY_SECS: i64 = 10;

/// Read the claims of an access token without checking its signature. The
/// client never holds the signing secret; the service verifies every call.
pub fn peek_claims(token: &str) -> ClientResult<Claims> {
    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;

    decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map(|data| data.claims)
        .map_err(|_| ClientError::Unauthenticated)
}

pub fn is_expired(claims: &Claims) -> bool {
    (claims.exp as i64) <= Utc::now().timestamp() + EXPIRY_LEEWAY_SECS
}

pub fn validate_signup(email: &str, password: &str, full_name: &str) -> ClientResult<()> {
    if full_name.trim().is_empty() {
        return Err(ClientError::validation("Full name is required"));
    }
    if !email.contains('@') {
        return Err(ClientError::validation("Enter a valid email address"));
    }
    if password.len() < MIN_PASSWORD_LEN {
        return Err(ClientError::validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

/// Load a persisted session. A missing file means "signed out".
pub async fn load_session(path: &Path) -> ClientResult<Option<Session>> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub async fn save_session(path: &Path, session: &Session) -> ClientResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, serde_json::to_vec_pretty(session)?).await?;
    Ok(())
}

pub async fn clear_session(path: &Path) -> ClientResult<()> {
    match tokio::fs::remove_file(path).await {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
        _ => Ok(()),
    }
}
