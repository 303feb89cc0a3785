//! # cb-auth-jwt
//!
//! Argon2 + JWT implementation of `AuthProvider`.
//! Passwords are stored as Argon2id PHC strings; sessions are HS256 access
//! tokens carrying the user id as `sub`. Argon2 work runs on tokio's blocking
//! pool, off the runtime workers.

use anyhow::{anyhow, Context};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use cb_core::traits::AuthProvider;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    iat: i64,
    exp: i64,
}

pub struct JwtAuthProvider {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    /// Lifetime of issued tokens; matches the session cookie's Max-Age.
    token_ttl: Duration,
}

impl JwtAuthProvider {
    /// Accepts the signing secret (e.g., from settings) and the token lifetime.
    pub fn new(secret: &str, token_ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::default(),
            token_ttl,
        }
    }
}

#[async_trait]
impl AuthProvider for JwtAuthProvider {
    async fn hash_password(&self, password: &str) -> anyhow::Result<String> {
        let password = password.to_owned();
        tokio::task::spawn_blocking(move || {
            let salt = SaltString::generate(&mut OsRng);
            Argon2::default()
                .hash_password(password.as_bytes(), &salt)
                .map(|hash| hash.to_string())
                .map_err(|e| anyhow!("password hashing failed: {e}"))
        })
        .await
        .context("password hashing task failed")?
    }

    /// Verifies if a provided password matches a stored Argon2 hash.
    async fn verify_password(&self, password: &str, hash: &str) -> bool {
        let (password, hash) = (password.to_owned(), hash.to_owned());
        let verified = tokio::task::spawn_blocking(move || {
            PasswordHash::new(&hash).is_ok_and(|parsed| {
                Argon2::default()
                    .verify_password(password.as_bytes(), &parsed)
                    .is_ok()
            })
        })
        .await;

        match verified {
            Ok(verified) => verified,
            Err(err) => {
                warn!(error = %err, "password verification task failed");
                false
            }
        }
    }

    fn issue_token(&self, user_id: Uuid) -> anyhow::Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + self.token_ttl).timestamp(),
        };
        Ok(encode(&Header::default(), &claims, &self.encoding)?)
    }

    fn verify_token(&self, token: &str) -> Option<Uuid> {
        match decode::<Claims>(token, &self.decoding, &self.validation) {
            Ok(data) => Uuid::parse_str(&data.claims.sub).ok(),
            Err(err) => {
                debug!(error = %err, "rejected access token");
                None
            }
        }
    }
}
