//! Credential primitives: password hashing and bearer tokens
//!
//! # Passwords
//!
//! Stored as bcrypt strings (`$2b$<cost>$<salt+digest>`), cost [`PASSWORD_HASH_COST`].
//!
//! # Bearer tokens
//!
//! `base64url(claims_json) "." hex(HMAC-SHA256(secret, base64url(claims_json)))`
//!
//! Claims carry the user id, role and expiry (Unix seconds). The signing
//! secret lives in bootstrap config or in the `settings` table under
//! [`TOKEN_SECRET_KEY`].
//!
//! This module contains ONLY pure functions and database operations;
//! HTTP extraction lives in the server crate.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use sqlx::SqlitePool;
use thiserror::Error;

use crate::db::models::Role;

type HmacSha256 = Hmac<Sha256>;

/// Settings key holding the token signing secret
pub const TOKEN_SECRET_KEY: &str = "token_secret";

/// bcrypt work factor for stored passwords
pub const PASSWORD_HASH_COST: u32 = 10;

// ========================================
// Error Types
// ========================================

/// Bearer token validation failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    /// Not of the form `payload.signature`, or payload is not valid claims JSON
    #[error("Malformed token")]
    Malformed,

    /// Signature does not match the payload
    #[error("Invalid token signature")]
    InvalidSignature,

    /// Token lifetime has elapsed
    #[error("Token expired at {expired_at}")]
    Expired { expired_at: i64 },
}

// ========================================
// Password Hashing
// ========================================

/// Hash a password into a self-describing bcrypt string (cost and salt included)
pub fn hash_password(password: &str) -> crate::Result<String> {
    Ok(bcrypt::hash(password, PASSWORD_HASH_COST)?)
}

/// Check a password attempt against a stored bcrypt hash
///
/// A stored value that is not a valid bcrypt hash never matches.
///
/// # Examples
///
/// ```
/// use relato_common::auth::{hash_password, verify_password};
///
/// let stored = hash_password("staff123").unwrap();
/// assert!(verify_password("staff123", &stored));
/// assert!(!verify_password("wrong", &stored));
/// ```
pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}

// ========================================
// Bearer Tokens
// ========================================

/// Claims carried by a bearer token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// User id
    pub sub: i64,
    /// Role at issue time
    pub role: Role,
    /// Expiry, Unix seconds
    pub exp: i64,
}

impl TokenClaims {
    /// Claims for `user_id` expiring `ttl_seconds` after `now`
    pub fn new(user_id: i64, role: Role, now: i64, ttl_seconds: i64) -> Self {
        Self {
            sub: user_id,
            role,
            exp: now + ttl_seconds,
        }
    }
}

/// Sign claims into a bearer token string
pub fn issue_token(claims: &TokenClaims, secret: &[u8]) -> String {
    // Serializing a struct of plain fields cannot fail
    let json = serde_json::to_vec(claims).unwrap_or_default();
    let payload = URL_SAFE_NO_PAD.encode(json);
    let signature = hex::encode(sign(secret, payload.as_bytes()));
    format!("{}.{}", payload, signature)
}

/// Verify signature and expiry, returning the claims
///
/// # Examples
///
/// ```
/// use relato_common::auth::{issue_token, verify_token, TokenClaims, TokenError};
/// use relato_common::db::models::Role;
///
/// let claims = TokenClaims::new(7, Role::Staff, 1_000, 60);
/// let token = issue_token(&claims, b"secret");
///
/// assert_eq!(verify_token(&token, b"secret", 1_030), Ok(claims));
/// assert_eq!(
///     verify_token(&token, b"secret", 2_000),
///     Err(TokenError::Expired { expired_at: 1_060 })
/// );
/// ```
pub fn verify_token(token: &str, secret: &[u8], now: i64) -> Result<TokenClaims, TokenError> {
    let (payload, signature_hex) = token.split_once('.').ok_or(TokenError::Malformed)?;
    let signature = hex::decode(signature_hex).map_err(|_| TokenError::InvalidSignature)?;

    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(payload.as_bytes());
    mac.verify_slice(&signature)
        .map_err(|_| TokenError::InvalidSignature)?;

    let json = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|_| TokenError::Malformed)?;
    let claims: TokenClaims = serde_json::from_slice(&json).map_err(|_| TokenError::Malformed)?;

    if claims.exp <= now {
        return Err(TokenError::Expired {
            expired_at: claims.exp,
        });
    }

    Ok(claims)
}

fn sign(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

// ========================================
// Signing Secret Management
// ========================================

/// Load the token signing secret from the settings table
///
/// Generates and stores a new one if none exists yet.
pub async fn load_token_secret(db: &SqlitePool) -> crate::Result<String> {
    let result: Option<(Option<String>,)> =
        sqlx::query_as("SELECT value FROM settings WHERE key = ?")
            .bind(TOKEN_SECRET_KEY)
            .fetch_optional(db)
            .await?;

    match result {
        Some((Some(value),)) if !value.trim().is_empty() => Ok(value),
        _ => initialize_token_secret(db).await,
    }
}

/// Generate a random 32-byte secret and store it (hex) in the settings table
pub async fn initialize_token_secret(db: &SqlitePool) -> crate::Result<String> {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    let secret = hex::encode(bytes);

    sqlx::query("INSERT OR REPLACE INTO settings (key, value) VALUES (?, ?)")
        .bind(TOKEN_SECRET_KEY)
        .bind(&secret)
        .execute(db)
        .await?;

    Ok(secret)
}

/// Pick the configured secret if present, else the stored one
pub async fn resolve_token_secret(
    db: &SqlitePool,
    configured: Option<&str>,
) -> crate::Result<Vec<u8>> {
    match configured {
        Some(secret) => Ok(secret.as_bytes().to_vec()),
        None => Ok(load_token_secret(db).await?.into_bytes()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_password_salts_each_hash() {
        let a = hash_password("admin123").unwrap();
        let b = hash_password("admin123").unwrap();
        assert_ne!(a, b);
        assert!(a.starts_with("$2b$10$"));
        assert!(verify_password("admin123", &a));
        assert!(verify_password("admin123", &b));
    }

    #[test]
    fn test_verify_password_rejects_garbage_hash() {
        assert!(!verify_password("admin123", ""));
        assert!(!verify_password("admin123", "not-a-bcrypt-hash"));
    }

    #[test]
    fn test_token_tampered_payload_rejected() {
        let claims = TokenClaims::new(1, Role::Staff, 0, 3600);
        let token = issue_token(&claims, b"k");

        let forged_claims = TokenClaims::new(1, Role::Admin, 0, 3600);
        let forged_payload = issue_token(&forged_claims, b"other");
        let (forged, _) = forged_payload.split_once('.').unwrap();
        let (_, signature) = token.split_once('.').unwrap();

        let result = verify_token(&format!("{}.{}", forged, signature), b"k", 10);
        assert_eq!(result, Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_token_wrong_secret_rejected() {
        let token = issue_token(&TokenClaims::new(1, Role::Admin, 0, 3600), b"a");
        assert_eq!(
            verify_token(&token, b"b", 10),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn test_token_without_separator_is_malformed() {
        assert_eq!(verify_token("abc", b"k", 0), Err(TokenError::Malformed));
    }

    #[test]
    fn test_token_expiry_boundary() {
        let claims = TokenClaims::new(3, Role::Staff, 100, 50);
        let token = issue_token(&claims, b"k");
        assert!(verify_token(&token, b"k", 149).is_ok());
        assert_eq!(
            verify_token(&token, b"k", 150),
            Err(TokenError::Expired { expired_at: 150 })
        );
    }

    #[tokio::test]
    async fn test_load_token_secret_initializes_once() {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        crate::db::init::create_settings_table(&pool).await.unwrap();

        let first = load_token_secret(&pool).await.unwrap();
        let second = load_token_secret(&pool).await.unwrap();

        assert_eq!(first.len(), 64);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_resolve_token_secret_prefers_configured() {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        crate::db::init::create_settings_table(&pool).await.unwrap();

        let secret = resolve_token_secret(&pool, Some("from-config")).await.unwrap();
        assert_eq!(secret, b"from-config".to_vec());
    }
}
