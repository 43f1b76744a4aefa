// src/models/signature_template.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignatureTemplate {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub signature_data: String,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTemplatePayload {
    #[validate(length(min = 1, max = 100, message = "template name must be 1-100 characters"))]
    pub name: String,

    #[validate(length(min = 1, message = "signature data is required"))]
    pub signature_data: String,

    #[serde(default)]
    pub is_default: bool,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTemplatePayload {
    #[validate(length(min = 1, max = 100, message = "template name must be 1-100 characters"))]
    pub name: Option<String>,

    #[validate(length(min = 1, message = "signature data cannot be empty"))]
    pub signature_data: Option<String>,

    pub is_default: Option<bool>,
}
