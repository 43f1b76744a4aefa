// src/handlers/account.rs
//
// Redefinição de senha e verificação de e-mail (abertas, o token é a
// credencial) e histórico de login do próprio usuário.

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    common::{
        error::{ApiError, AppError},
        extract::JsonBody,
        i18n::Msg,
        pagination::ListQuery,
        response::{ok, paginated},
    },
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::{
        account::{EmailPayload, LoginHistoryEntry, ResetPasswordPayload, ResetTokenOwner, VerifyEmailPayload},
        auth::User,
    },
};

// =============================================================================
//  REDEFINIÇÃO DE SENHA
// =============================================================================

#[utoipa::path(
    post,
    path = "/api/auth/password-reset/request",
    tag = "Account",
    request_body = EmailPayload,
    responses(
        (status = 200, description = "Mesma resposta exista ou não a conta"),
        (status = 400, description = "E-mail inválido")
    )
)]
pub async fn request_password_reset(
    State(app_state): State<AppState>,
    locale: Locale,
    JsonBody(payload): JsonBody<EmailPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    app_state
        .account_service
        .request_password_reset(&payload.email)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(ok(&locale, Msg::PasswordResetRequested, ()))
}

#[utoipa::path(
    get,
    path = "/api/auth/password-reset/verify/{token}",
    tag = "Account",
    params(("token" = String, Path, description = "Token recebido por e-mail")),
    responses(
        (status = 200, description = "Token válido", body = ResetTokenOwner),
        (status = 400, description = "Token inválido, vencido ou já usado")
    )
)]
pub async fn verify_reset_token(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(token): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let owner = app_state
        .account_service
        .verify_reset_token(&token)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(ok(&locale, Msg::ResetTokenValid, owner))
}

#[utoipa::path(
    post,
    path = "/api/auth/password-reset/reset",
    tag = "Account",
    request_body = ResetPasswordPayload,
    responses(
        (status = 200, description = "Senha alterada"),
        (status = 400, description = "Token inválido, vencido ou já usado")
    )
)]
pub async fn reset_password(
    State(app_state): State<AppState>,
    locale: Locale,
    JsonBody(payload): JsonBody<ResetPasswordPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    app_state
        .account_service
        .reset_password(payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(ok(&locale, Msg::PasswordChanged, ()))
}

// =============================================================================
//  VERIFICAÇÃO DE E-MAIL
// =============================================================================

#[utoipa::path(
    post,
    path = "/api/auth/email-verification/send",
    tag = "Account",
    responses(
        (status = 200, description = "Link enviado"),
        (status = 400, description = "E-mail já verificado"),
        (status = 401, description = "Token ausente ou inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn send_verification(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .account_service
        .send_verification(&user)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(ok(&locale, Msg::VerificationSent, ()))
}

#[utoipa::path(
    post,
    path = "/api/auth/email-verification/verify",
    tag = "Account",
    request_body = VerifyEmailPayload,
    responses(
        (status = 200, description = "E-mail verificado", body = User),
        (status = 400, description = "Token inválido ou vencido, ou e-mail já verificado")
    )
)]
pub async fn verify_email(
    State(app_state): State<AppState>,
    locale: Locale,
    JsonBody(payload): JsonBody<VerifyEmailPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let user = app_state
        .account_service
        .verify_email(&payload.token)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(ok(&locale, Msg::EmailVerified, user))
}

#[utoipa::path(
    post,
    path = "/api/auth/email-verification/resend",
    tag = "Account",
    request_body = EmailPayload,
    responses(
        (status = 200, description = "Mesma resposta exista ou não a conta"),
        (status = 400, description = "E-mail inválido")
    )
)]
pub async fn resend_verification(
    State(app_state): State<AppState>,
    locale: Locale,
    JsonBody(payload): JsonBody<EmailPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    app_state
        .account_service
        .resend_verification(&payload.email)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(ok(&locale, Msg::VerificationSent, ()))
}

// =============================================================================
//  HISTÓRICO DE LOGIN
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/auth/login-history",
    tag = "Account",
    params(ListQuery),
    responses(
        (status = 200, description = "Logins do usuário, mais recente primeiro", body = [LoginHistoryEntry]),
        (status = 401, description = "Token ausente ou inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn login_history(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = app_state
        .account_service
        .login_history(user.id, query.page_request())
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(paginated(&locale, page))
}

#[utoipa::path(
    get,
    path = "/api/auth/login-history/failed",
    tag = "Account",
    responses(
        (status = 200, description = "Últimas 10 tentativas com senha errada", body = [LoginHistoryEntry]),
        (status = 401, description = "Token ausente ou inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn failed_logins(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let entries = app_state
        .account_service
        .recent_failed_logins(user.id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(ok(&locale, Msg::Fetched, entries))
}
