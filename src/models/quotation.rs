// src/models/quotation.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::document::{validate_money, DocumentImage, DocumentItem, DocumentSignature, LineItemPayload};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "quotation_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum QuotationStatus {
    Pending,
    Accepted,
    Rejected,
    Converted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "approval_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Quotation {
    pub id: Uuid,
    pub quotation_no: String,
    pub customer_id: Option<Uuid>,
    pub customer_name: String,
    pub customer_phone: Option<String>,
    pub customer_address: Option<String>,
    pub customer_email: Option<String>,
    #[schema(value_type = String, example = "2500.00")]
    pub subtotal: Decimal,
    #[schema(value_type = String, example = "0.00")]
    pub discount: Decimal,
    #[schema(value_type = String, example = "7.00")]
    pub vat: Decimal,
    #[schema(value_type = String, example = "175.00")]
    pub vat_amount: Decimal,
    #[schema(value_type = String, example = "2675.00")]
    pub total: Decimal,
    pub status: QuotationStatus,
    pub approval_token: String,
    pub approval_status: ApprovalStatus,
    pub approval_notes: Option<String>,
    pub decided_at: Option<DateTime<Utc>>,
    pub valid_until: Option<NaiveDate>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Referência curta à fatura gerada a partir do orçamento.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceRef {
    pub id: Uuid,
    pub invoice_no: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuotationDetail {
    #[serde(flatten)]
    pub header: Quotation,
    pub approval_url: String,
    pub items: Vec<DocumentItem>,
    pub images: Vec<DocumentImage>,
    pub signatures: Vec<DocumentSignature>,
    pub invoice: Option<InvoiceRef>,
}

// =============================================================================
//  PAYLOADS
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuotationPayload {
    pub customer_id: Option<Uuid>,

    #[schema(example = "บริษัท ตัวอย่าง จำกัด")]
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_address: Option<String>,

    #[validate(email(message = "customer email is invalid"))]
    pub customer_email: Option<String>,

    #[validate(nested)]
    #[serde(default)]
    pub items: Vec<LineItemPayload>,

    #[validate(custom(function = "validate_money"))]
    #[schema(value_type = Option<String>, example = "0")]
    pub discount: Option<Decimal>,

    #[schema(value_type = Option<String>, example = "7")]
    pub vat: Option<Decimal>,

    pub valid_until: Option<NaiveDate>,
    pub notes: Option<String>,
}

/// Edição parcial. Itens, quando enviados, substituem todos os anteriores.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuotationPayload {
    pub customer_id: Option<Uuid>,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_address: Option<String>,

    #[validate(email(message = "customer email is invalid"))]
    pub customer_email: Option<String>,

    #[validate(nested)]
    pub items: Option<Vec<LineItemPayload>>,

    #[validate(custom(function = "validate_money"))]
    #[schema(value_type = Option<String>)]
    pub discount: Option<Decimal>,

    #[schema(value_type = Option<String>)]
    pub vat: Option<Decimal>,

    pub status: Option<QuotationStatus>,
    pub valid_until: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DecisionPayload {
    pub notes: Option<String>,
    /// Aceito na rejeição quando `notes` não vem.
    pub reason: Option<String>,
}
