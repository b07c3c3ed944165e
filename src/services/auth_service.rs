//! Auth Service - login, self-registration and password-reset requests

use serde::{Deserialize, Serialize};

use crate::domain::{AuditAction, DomainError, NewUser, Role, UpsertedUser};
use crate::infrastructure::auth::{create_jwt, hash_password, is_legacy_digest, verify_password};
use crate::infrastructure::login_guard::CAPTCHA_THRESHOLD;
use crate::infrastructure::AppState;
use crate::models::user::{self, UserDto};
use crate::services::audit_service::{self, AuditEvent, ClientInfo};

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    /// Username or email
    pub username: String,
    pub password: String,
    pub captcha_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    #[serde(default)]
    pub accept_terms: bool,
    pub captcha_token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginSuccess {
    pub token: String,
    pub user: UserDto,
}

#[derive(Debug)]
pub enum LoginOutcome {
    Success(LoginSuccess),
    /// Wrong credentials or unknown user
    Rejected {
        failed_attempts: u32,
        captcha_required: bool,
    },
}

fn required(value: &str, field: &str) -> Result<(), DomainError> {
    if value.trim().is_empty() {
        return Err(DomainError::validation(format!("{} is required", field)));
    }
    Ok(())
}

pub async fn login(
    state: &AppState,
    req: LoginRequest,
    client: &ClientInfo,
) -> Result<LoginOutcome, DomainError> {
    required(&req.username, "Username")?;
    required(&req.password, "Password")?;
    let identifier = req.username.trim();

    if state.login_guard.captcha_required(identifier)
        && !state.verifier.verify(req.captcha_token.as_deref()).await
    {
        return Err(DomainError::BotCheckRequired);
    }

    let user = state.user_repo.find_by_login(identifier).await?;
    let verified = match &user {
        Some(u) => verify_password(&req.password, &u.password_hash)?,
        None => false,
    };

    match user {
        Some(user) if verified => {
            if !user.is_active {
                tracing::warn!("Login refused for disabled account {}", user.username);
                return Err(DomainError::Unauthorized("Account is disabled".into()));
            }
            complete_login(state, user, &req.password, identifier, client).await
        }
        user => {
            let failed_attempts = state.login_guard.record_failure(identifier);
            tracing::warn!(
                "Failed login for '{}' (attempt {})",
                identifier,
                failed_attempts
            );
            audit_service::record(
                state.audit_repo.as_ref(),
                client,
                AuditEvent::new(AuditAction::LoginFailed, "users")
                    .by(user.map(|u| u.id))
                    .details(format!("identifier={}", identifier)),
            )
            .await;

            Ok(LoginOutcome::Rejected {
                failed_attempts,
                captcha_required: failed_attempts >= CAPTCHA_THRESHOLD,
            })
        }
    }
}

async fn complete_login(
    state: &AppState,
    user: user::Model,
    password: &str,
    identifier: &str,
    client: &ClientInfo,
) -> Result<LoginOutcome, DomainError> {
    let role: Role = user.role.parse()?;

    // Move legacy digests onto Argon2 now that we hold the plaintext
    if is_legacy_digest(&user.password_hash) {
        let upgraded = hash_password(password)?;
        state.user_repo.set_password_hash(user.id, upgraded).await?;
        tracing::info!("Upgraded password hash for {}", user.username);
    }

    state.user_repo.touch_last_login(user.id).await?;
    state.login_guard.reset(identifier);

    let token = create_jwt(user.id, &user.username, role)?;
    audit_service::record(
        state.audit_repo.as_ref(),
        client,
        AuditEvent::new(AuditAction::Login, "users")
            .by(user.id)
            .record(user.id),
    )
    .await;

    // Re-read so the response carries the fresh last_login
    let user = state
        .user_repo
        .find_by_id(user.id)
        .await?
        .ok_or_else(|| DomainError::not_found("User"))?;

    Ok(LoginOutcome::Success(LoginSuccess {
        token,
        user: user.into(),
    }))
}

/// Insert a Vizualizator, or refresh the username and password of the row
/// that already holds this email.
pub async fn register(
    state: &AppState,
    req: RegisterRequest,
    client: &ClientInfo,
) -> Result<UpsertedUser, DomainError> {
    required(&req.username, "Username")?;
    required(&req.email, "Email")?;
    required(&req.password, "Password")?;
    required(&req.confirm_password, "Password confirmation")?;
    if !req.email.contains('@') {
        return Err(DomainError::validation("Email address is invalid"));
    }
    if req.password != req.confirm_password {
        return Err(DomainError::validation("Passwords do not match"));
    }
    if !req.accept_terms {
        return Err(DomainError::validation("Terms must be accepted"));
    }
    if !state.verifier.verify(req.captcha_token.as_deref()).await {
        return Err(DomainError::BotCheckRequired);
    }

    let outcome = state
        .user_repo
        .upsert_by_email(NewUser {
            username: req.username.trim().to_string(),
            email: req.email.trim().to_lowercase(),
            password_hash: hash_password(&req.password)?,
            role: Role::Viewer,
        })
        .await?;

    tracing::info!(
        "Registration for {} ({})",
        outcome.user.email,
        if outcome.created { "new" } else { "updated" }
    );
    audit_service::record(
        state.audit_repo.as_ref(),
        client,
        AuditEvent::new(AuditAction::Register, "users")
            .by(outcome.user.id)
            .record(outcome.user.id)
            .details(if outcome.created { "created" } else { "updated" }),
    )
    .await;

    Ok(outcome)
}

/// Nothing is sent; the request is only acknowledged and logged.
pub async fn forgot_password(
    state: &AppState,
    email: &str,
    client: &ClientInfo,
) -> Result<(), DomainError> {
    required(email, "Email")?;
    let email = email.trim().to_lowercase();

    let user = state
        .user_repo
        .find_by_email(&email)
        .await?
        .ok_or_else(|| DomainError::not_found("User with this email"))?;

    tracing::info!("Password reset requested for {}", user.email);
    audit_service::record(
        state.audit_repo.as_ref(),
        client,
        AuditEvent::new(AuditAction::PasswordResetRequest, "users")
            .by(user.id)
            .record(user.id),
    )
    .await;
    Ok(())
}
