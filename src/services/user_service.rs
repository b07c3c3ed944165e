//! User Service - account administration for Admins

use serde::{Deserialize, Serialize};

use crate::domain::{AuditAction, DomainError, NewUser, Role, UserFilter};
use crate::infrastructure::auth::{generate_password, hash_password, CurrentUser};
use crate::infrastructure::AppState;
use crate::models::user::UserDto;
use crate::services::audit_service::{self, AuditEvent, ClientInfo};

#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub role: Role,
    /// Generated when omitted
    pub password: Option<String>,
}

/// A user plus the plaintext password when the server generated one.
/// The password is returned exactly once.
#[derive(Debug, Serialize)]
pub struct IssuedCredentials {
    pub user: UserDto,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_password: Option<String>,
}

fn refuse_self(actor: &CurrentUser, target: i32, what: &str) -> Result<(), DomainError> {
    if actor.id == target {
        return Err(DomainError::validation(format!(
            "You cannot {} your own account",
            what
        )));
    }
    Ok(())
}

pub async fn list_users(state: &AppState, filter: UserFilter) -> Result<Vec<UserDto>, DomainError> {
    let users = state.user_repo.find_all(filter).await?;
    Ok(users.into_iter().map(UserDto::from).collect())
}

pub async fn create_user(
    state: &AppState,
    actor: &CurrentUser,
    req: CreateUserRequest,
    client: &ClientInfo,
) -> Result<IssuedCredentials, DomainError> {
    let username = req.username.trim().to_string();
    let email = req.email.trim().to_lowercase();
    if username.is_empty() || email.is_empty() {
        return Err(DomainError::validation("Username and email are required"));
    }
    if !email.contains('@') {
        return Err(DomainError::validation("Email address is invalid"));
    }
    if state.user_repo.find_by_username(&username).await?.is_some() {
        return Err(DomainError::Conflict(format!("Username {} is already taken", username)));
    }
    if state.user_repo.find_by_email(&email).await?.is_some() {
        return Err(DomainError::Conflict(format!("Email {} is already registered", email)));
    }

    let (password, generated) = match req.password.filter(|p| !p.is_empty()) {
        Some(p) => (p, false),
        None => (generate_password(), true),
    };

    let user = state
        .user_repo
        .create(NewUser {
            username,
            email,
            password_hash: hash_password(&password)?,
            role: req.role,
        })
        .await?;

    audit_service::record(
        state.audit_repo.as_ref(),
        client,
        AuditEvent::new(AuditAction::Create, "users")
            .by(actor.id)
            .record(user.id)
            .details(format!("role={}", req.role)),
    )
    .await;

    Ok(IssuedCredentials {
        user: user.into(),
        generated_password: generated.then_some(password),
    })
}

pub async fn change_role(
    state: &AppState,
    actor: &CurrentUser,
    id: i32,
    role: Role,
    client: &ClientInfo,
) -> Result<UserDto, DomainError> {
    if role != Role::Admin {
        refuse_self(actor, id, "demote")?;
    }
    let user = state.user_repo.set_role(id, role).await?;

    audit_service::record(
        state.audit_repo.as_ref(),
        client,
        AuditEvent::new(AuditAction::Update, "users")
            .by(actor.id)
            .record(id)
            .details(format!("role={}", role)),
    )
    .await;
    Ok(user.into())
}

pub async fn set_status(
    state: &AppState,
    actor: &CurrentUser,
    id: i32,
    is_active: bool,
    client: &ClientInfo,
) -> Result<UserDto, DomainError> {
    if !is_active {
        refuse_self(actor, id, "deactivate")?;
    }
    let user = state.user_repo.set_active(id, is_active).await?;

    audit_service::record(
        state.audit_repo.as_ref(),
        client,
        AuditEvent::new(AuditAction::Update, "users")
            .by(actor.id)
            .record(id)
            .details(format!("is_active={}", is_active)),
    )
    .await;
    Ok(user.into())
}

pub async fn reset_password(
    state: &AppState,
    actor: &CurrentUser,
    id: i32,
    client: &ClientInfo,
) -> Result<IssuedCredentials, DomainError> {
    let password = generate_password();
    state
        .user_repo
        .set_password_hash(id, hash_password(&password)?)
        .await?;
    let user = state
        .user_repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| DomainError::not_found("User"))?;

    audit_service::record(
        state.audit_repo.as_ref(),
        client,
        AuditEvent::new(AuditAction::Update, "users")
            .by(actor.id)
            .record(id)
            .details("password reset"),
    )
    .await;

    Ok(IssuedCredentials {
        user: user.into(),
        generated_password: Some(password),
    })
}

pub async fn delete_user(
    state: &AppState,
    actor: &CurrentUser,
    id: i32,
    client: &ClientInfo,
) -> Result<(), DomainError> {
    refuse_self(actor, id, "delete")?;
    state.user_repo.delete(id).await?;

    audit_service::record(
        state.audit_repo.as_ref(),
        client,
        AuditEvent::new(AuditAction::Delete, "users")
            .by(actor.id)
            .record(id),
    )
    .await;
    Ok(())
}
