// src/models/receipt.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::document::DocumentSignature;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub id: Uuid,
    pub receipt_no: String,
    pub invoice_id: Uuid,
    pub payment_id: Uuid,
    pub user_id: Uuid,
    #[schema(value_type = String, example = "1000.00")]
    pub amount: Decimal,
    pub payment_method: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Recibo com os dados da fatura e de quem emitiu (JOIN).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptView {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub receipt: Receipt,
    pub invoice_no: String,
    pub customer_name: String,
    pub customer_phone: Option<String>,
    pub customer_address: Option<String>,
    pub customer_email: Option<String>,
    #[schema(value_type = String)]
    pub invoice_total: Decimal,
    #[schema(value_type = String)]
    pub invoice_remaining: Decimal,
    pub issued_by_name: String,
    pub issued_by_email: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptDetail {
    #[serde(flatten)]
    pub view: ReceiptView,
    pub signatures: Vec<DocumentSignature>,
}
