// src/models/invoice.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::document::{validate_money, DocumentImage, DocumentItem, DocumentSignature, LineItemPayload};
use super::receipt::Receipt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "invoice_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Unpaid,
    Partial,
    Paid,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: Uuid,
    pub invoice_no: String,
    pub quotation_id: Option<Uuid>,
    pub customer_id: Option<Uuid>,
    pub customer_name: String,
    pub customer_phone: Option<String>,
    pub customer_address: Option<String>,
    pub customer_email: Option<String>,
    #[schema(value_type = String)]
    pub subtotal: Decimal,
    #[schema(value_type = String)]
    pub discount: Decimal,
    #[schema(value_type = String)]
    pub vat: Decimal,
    #[schema(value_type = String)]
    pub vat_amount: Decimal,
    #[schema(value_type = String, example = "2675.00")]
    pub total: Decimal,
    #[schema(value_type = String, example = "1000.00")]
    pub paid_amount: Decimal,
    #[schema(value_type = String, example = "1675.00")]
    pub remaining_amount: Decimal,
    pub status: InvoiceStatus,
    pub paid_date: Option<DateTime<Utc>>,
    pub due_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: Uuid,
    pub invoice_id: Uuid,
    #[schema(value_type = String, example = "1000.00")]
    pub amount: Decimal,
    pub payment_method: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Referência curta ao orçamento de origem.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuotationRef {
    pub id: Uuid,
    pub quotation_no: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceDetail {
    #[serde(flatten)]
    pub header: Invoice,
    pub quotation: Option<QuotationRef>,
    pub items: Vec<DocumentItem>,
    pub images: Vec<DocumentImage>,
    pub signatures: Vec<DocumentSignature>,
    /// Mais recente primeiro.
    pub payments: Vec<Payment>,
}

/// Resultado de `POST /invoices/{id}/payments`.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResult {
    pub invoice: InvoiceDetail,
    pub receipt: Receipt,
}

// =============================================================================
//  PAYLOADS
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvoicePayload {
    pub customer_id: Option<Uuid>,
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

    pub due_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInvoicePayload {
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

    pub due_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateInvoiceStatusPayload {
    pub status: InvoiceStatus,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordPaymentPayload {
    #[validate(custom(function = "validate_money"))]
    #[schema(value_type = Option<String>, example = "1000.00")]
    pub amount: Option<Decimal>,

    #[validate(length(min = 1, max = 50, message = "payment method must be 1-50 characters"))]
    #[schema(example = "transfer")]
    pub payment_method: Option<String>,

    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payment(amount: &str) -> RecordPaymentPayload {
        RecordPaymentPayload {
            amount: Some(amount.parse().unwrap()),
            payment_method: None,
            notes: None,
        }
    }

    #[test]
    fn payment_amount_must_fit_the_money_column() {
        assert!(payment("1675.00").validate().is_ok());
        assert!(payment("10000000000000").validate().is_err());
        assert!(payment("10.001").validate().is_err());
    }

    #[test]
    fn discount_is_checked_like_any_amount() {
        let payload = UpdateInvoicePayload {
            discount: Some("0.005".parse().unwrap()),
            ..Default::default()
        };
        let errors = payload.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("discount"));
    }
}
