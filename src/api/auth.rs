use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Deserialize;
use serde_json::json;

use crate::domain::DomainError;
use crate::infrastructure::auth::CurrentUser;
use crate::infrastructure::AppState;
use crate::models::user::UserDto;
use crate::services::auth_service::{self, LoginOutcome, LoginRequest, RegisterRequest};
use crate::services::ClientInfo;

#[utoipa::path(
    post,
    path = "/api/auth/login",
    responses(
        (status = 200, description = "Token issued"),
        (status = 400, description = "Username or password missing"),
        (status = 401, description = "Invalid credentials; body carries failed_attempts and captcha_required"),
        (status = 428, description = "Bot check required before another attempt")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    client: ClientInfo,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, DomainError> {
    tracing::info!("Login attempt for: {}", payload.username);

    match auth_service::login(&state, payload, &client).await? {
        LoginOutcome::Success(success) => Ok((StatusCode::OK, Json(json!(success)))),
        LoginOutcome::Rejected {
            failed_attempts,
            captcha_required,
        } => Ok((
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "error": "Invalid credentials",
                "failed_attempts": failed_attempts,
                "captcha_required": captcha_required
            })),
        )),
    }
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    responses(
        (status = 201, description = "Account created"),
        (status = 200, description = "Existing account for this email updated"),
        (status = 400, description = "Missing field, password mismatch or terms not accepted"),
        (status = 409, description = "Username held by another email")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    client: ClientInfo,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, DomainError> {
    let outcome = auth_service::register(&state, payload, &client).await?;
    let status = if outcome.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((
        status,
        Json(json!({
            "user": UserDto::from(outcome.user),
            "created": outcome.created
        })),
    ))
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[utoipa::path(
    post,
    path = "/api/auth/forgot-password",
    responses(
        (status = 200, description = "Reset request acknowledged"),
        (status = 404, description = "No account with this email")
    )
)]
pub async fn forgot_password(
    State(state): State<AppState>,
    client: ClientInfo,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<impl IntoResponse, DomainError> {
    auth_service::forgot_password(&state, &payload.email, &client).await?;
    Ok(Json(json!({
        "message": "Password reset instructions have been sent to your email"
    })))
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current user with role, permissions and visible pages"),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn me(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<impl IntoResponse, DomainError> {
    let account = state
        .user_repo
        .find_by_id(user.id)
        .await?
        .ok_or_else(|| DomainError::not_found("User"))?;

    Ok(Json(json!({
        "user": UserDto::from(account),
        "role": user.role,
        "permissions": user.role.permissions(),
        "pages": user.role.pages()
    })))
}
