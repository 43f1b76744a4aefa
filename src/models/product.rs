// src/models/product.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::document::validate_money;

pub const DEFAULT_UNIT: &str = "ชิ้น";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    #[schema(value_type = String, example = "1500.00")]
    pub price: Decimal,
    pub unit: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn validate_price(price: &Decimal) -> Result<(), ValidationError> {
    if *price < Decimal::ZERO {
        let mut err = ValidationError::new("min");
        err.message = Some("price cannot be negative".into());
        return Err(err);
    }
    validate_money(price)
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductPayload {
    #[validate(length(min = 1, message = "product name is required"))]
    #[schema(example = "กล้องวงจรปิด 4MP")]
    pub name: String,

    pub description: Option<String>,

    #[validate(custom(function = "validate_price"))]
    #[schema(value_type = String, example = "1500.00")]
    pub price: Decimal,

    #[schema(example = "ชิ้น")]
    pub unit: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductPayload {
    #[validate(length(min = 1, message = "product name cannot be empty"))]
    pub name: Option<String>,

    pub description: Option<String>,

    #[validate(custom(function = "validate_price"))]
    #[schema(value_type = Option<String>)]
    pub price: Option<Decimal>,

    pub unit: Option<String>,
    pub is_active: Option<bool>,
}
