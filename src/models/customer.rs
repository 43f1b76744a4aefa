// src/models/customer.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::invoice::InvoiceStatus;
use super::quotation::QuotationStatus;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub tax_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Linha da listagem, com contagem de documentos.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerSummary {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub customer: Customer,
    pub quotation_count: i64,
    pub invoice_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecentQuotation {
    pub id: Uuid,
    pub quotation_no: String,
    #[schema(value_type = String)]
    pub total: Decimal,
    pub status: QuotationStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecentInvoice {
    pub id: Uuid,
    pub invoice_no: String,
    #[schema(value_type = String)]
    pub total: Decimal,
    #[schema(value_type = String)]
    pub remaining_amount: Decimal,
    pub status: InvoiceStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDetail {
    #[serde(flatten)]
    pub customer: Customer,
    pub recent_quotations: Vec<RecentQuotation>,
    pub recent_invoices: Vec<RecentInvoice>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomerPayload {
    #[validate(length(min = 1, message = "customer name is required"))]
    #[schema(example = "บริษัท ตัวอย่าง จำกัด")]
    pub name: String,

    #[validate(email(message = "email is invalid"))]
    pub email: Option<String>,

    pub phone: Option<String>,
    pub address: Option<String>,
    pub tax_id: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCustomerPayload {
    #[validate(length(min = 1, message = "customer name cannot be empty"))]
    pub name: Option<String>,

    #[validate(email(message = "email is invalid"))]
    pub email: Option<String>,

    pub phone: Option<String>,
    pub address: Option<String>,
    pub tax_id: Option<String>,
}
