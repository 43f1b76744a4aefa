// src/models/account.rs
//
// Segurança da conta: redefinição de senha, verificação de e-mail e
// histórico de login.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// =============================================================================
//  TOKENS
// =============================================================================

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PasswordResetToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EmailVerificationToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct EmailPayload {
    #[validate(email(message = "email is invalid"))]
    #[schema(example = "owner@example.com")]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordPayload {
    #[validate(length(min = 1, message = "token is required"))]
    pub token: String,
    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    pub new_password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct VerifyEmailPayload {
    #[validate(length(min = 1, message = "token is required"))]
    pub token: String,
}

/// Dono do token de redefinição, mostrado antes de trocar a senha.
#[derive(Debug, Serialize, ToSchema)]
pub struct ResetTokenOwner {
    pub email: String,
    pub name: String,
}

// =============================================================================
//  HISTÓRICO DE LOGIN
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "login_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LoginStatus {
    Success,
    Failed,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginHistoryEntry {
    pub id: Uuid,
    #[serde(skip_serializing)]
    #[schema(ignore)]
    pub user_id: Uuid,
    pub ip_address: String,
    pub user_agent: String,
    pub browser: String,
    pub os: String,
    pub device: String,
    pub status: LoginStatus,
    pub failure_reason: Option<String>,
    pub is_new_device: bool,
    pub created_at: DateTime<Utc>,
}

