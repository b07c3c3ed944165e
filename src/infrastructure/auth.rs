use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::{distributions::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::env;

use crate::domain::{DomainError, Permission, Role};
use crate::infrastructure::AppState;

const GENERATED_PASSWORD_LEN: usize = 12;
const DEFAULT_TOKEN_TTL_HOURS: i64 = 24;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // username
    pub uid: i32,
    pub role: Role,
    pub exp: usize,
}

/// The authenticated caller, decoded once per request from the bearer token.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: i32,
    pub username: String,
    pub role: Role,
}

impl CurrentUser {
    pub fn require(&self, permission: Permission) -> Result<(), DomainError> {
        if self.role.allows(permission) {
            Ok(())
        } else {
            tracing::warn!(
                "User {} ({}) denied {}",
                self.username,
                self.role,
                permission
            );
            Err(DomainError::Forbidden(permission.to_string()))
        }
    }
}

impl From<Claims> for CurrentUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.uid,
            username: claims.sub,
            role: claims.role,
        }
    }
}

/// Resolves the bearer token against the users table, so a disabled or deleted
/// account loses access immediately and role changes apply to the next request.
#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = DomainError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| DomainError::Unauthorized("Missing Authorization header".into()))?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            DomainError::Unauthorized("Invalid Authorization header format".into())
        })?;

        let claims = decode_jwt(token)?;
        let state = AppState::from_ref(state);
        let account = state
            .user_repo
            .find_by_id(claims.uid)
            .await?
            .ok_or_else(|| DomainError::Unauthorized("Account no longer exists".into()))?;
        if !account.is_active {
            return Err(DomainError::Unauthorized("Account is disabled".into()));
        }

        Ok(CurrentUser {
            id: account.id,
            role: account.role.parse()?,
            username: account.username,
        })
    }
}

pub fn hash_password(password: &str) -> Result<String, DomainError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| DomainError::Internal(e.to_string()))?
        .to_string();
    Ok(password_hash)
}

/// Unsalted hex SHA-256, the format of rows written before Argon2 was adopted.
pub fn legacy_digest(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

pub fn is_legacy_digest(hash: &str) -> bool {
    hash.len() == 64 && hash.bytes().all(|b| b.is_ascii_hexdigit())
}

pub fn verify_password(password: &str, password_hash: &str) -> Result<bool, DomainError> {
    if is_legacy_digest(password_hash) {
        return Ok(legacy_digest(password).eq_ignore_ascii_case(password_hash));
    }

    let parsed_hash =
        PasswordHash::new(password_hash).map_err(|e| DomainError::Internal(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Random alphanumeric password for admin-created accounts and resets
pub fn generate_password() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_PASSWORD_LEN)
        .map(char::from)
        .collect()
}

fn get_jwt_secret() -> String {
    env::var("JWT_SECRET").unwrap_or_else(|_| {
        if cfg!(debug_assertions) {
            "secret".to_string()
        } else {
            panic!("JWT_SECRET environment variable must be set in production");
        }
    })
}

fn token_ttl() -> Duration {
    let hours = env::var("TOKEN_TTL_HOURS")
        .ok()
        .and_then(|v| v.parse().ok())
        .filter(|h: &i64| *h > 0)
        .unwrap_or(DEFAULT_TOKEN_TTL_HOURS);
    Duration::hours(hours)
}

pub fn create_jwt(user_id: i32, username: &str, role: Role) -> Result<String, DomainError> {
    let secret = get_jwt_secret();
    let expiration = Utc::now()
        .checked_add_signed(token_ttl())
        .ok_or_else(|| DomainError::Internal("token expiry overflow".into()))?
        .timestamp();

    let claims = Claims {
        sub: username.to_owned(),
        uid: user_id,
        role,
        exp: expiration as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| DomainError::Internal(e.to_string()))
}

pub fn decode_jwt(token: &str) -> Result<Claims, DomainError> {
    let secret = get_jwt_secret();
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| DomainError::Unauthorized("Invalid or expired token".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argon_hash_round_trips() {
        let hash = hash_password("s3cret").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("s3cret", &hash).unwrap());
        assert!(!verify_password("nope", &hash).unwrap());
    }

    #[test]
    fn legacy_sha256_rows_still_verify() {
        let stored = legacy_digest("admin");
        assert_eq!(stored.len(), 64);
        assert!(verify_password("admin", &stored).unwrap());
        assert!(!verify_password("Admin", &stored).unwrap());
    }

    #[test]
    fn generated_passwords_are_alphanumeric() {
        let pw = generate_password();
        assert_eq!(pw.len(), GENERATED_PASSWORD_LEN);
        assert!(pw.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(pw, generate_password());
    }

    #[test]
    fn token_carries_identity_and_role() {
        let token = create_jwt(7, "ana", Role::Editor).unwrap();
        let user = CurrentUser::from(decode_jwt(&token).unwrap());
        assert_eq!(user.id, 7);
        assert_eq!(user.username, "ana");
        assert_eq!(user.role, Role::Editor);
        assert!(user.require(Permission::EditInventory).is_ok());
        assert!(matches!(
            user.require(Permission::ManageUsers),
            Err(DomainError::Forbidden(_))
        ));
    }

    #[test]
    fn garbage_token_is_unauthorized() {
        assert!(matches!(
            decode_jwt("not.a.token"),
            Err(DomainError::Unauthorized(_))
        ));
    }
}
