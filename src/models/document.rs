// src/models/document.rs
//
// Partes compartilhadas entre orçamentos, faturas e recibos:
// itens, imagens anexadas, assinaturas e o snapshot do cliente.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::ledger::{
    totals::{check_money, LineItemDraft},
    LedgerError,
};

/// Tabelas de itens e imagens (recibos não têm).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineOwner {
    Quotation,
    Invoice,
}

impl LineOwner {
    pub fn items_table(self) -> &'static str {
        match self {
            LineOwner::Quotation => "quotation_items",
            LineOwner::Invoice => "invoice_items",
        }
    }

    pub fn images_table(self) -> &'static str {
        match self {
            LineOwner::Quotation => "quotation_images",
            LineOwner::Invoice => "invoice_images",
        }
    }

    pub fn foreign_key(self) -> &'static str {
        match self {
            LineOwner::Quotation => "quotation_id",
            LineOwner::Invoice => "invoice_id",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureOwner {
    Quotation,
    Invoice,
    Receipt,
}

impl SignatureOwner {
    pub fn table(self) -> &'static str {
        match self {
            SignatureOwner::Quotation => "quotation_signatures",
            SignatureOwner::Invoice => "invoice_signatures",
            SignatureOwner::Receipt => "receipt_signatures",
        }
    }

    pub fn foreign_key(self) -> &'static str {
        match self {
            SignatureOwner::Quotation => "quotation_id",
            SignatureOwner::Invoice => "invoice_id",
            SignatureOwner::Receipt => "receipt_id",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DocumentItem {
    pub id: Uuid,
    #[serde(skip_serializing)]
    #[schema(ignore)]
    pub document_id: Uuid,
    pub product_id: Option<Uuid>,
    pub product_name: String,
    pub description: Option<String>,
    pub quantity: i32,
    #[schema(value_type = String, example = "1000.00")]
    pub price: Decimal,
    #[schema(value_type = String, example = "2000.00")]
    pub total: Decimal,
    pub position: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DocumentImage {
    pub id: Uuid,
    #[serde(skip_serializing)]
    #[schema(ignore)]
    pub document_id: Uuid,
    pub url: String,
    pub caption: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSignature {
    pub id: Uuid,
    #[serde(skip_serializing)]
    #[schema(ignore)]
    pub document_id: Uuid,
    pub signature_data: String,
    pub signed_by: Option<String>,
    pub signed_at: DateTime<Utc>,
}

/// Dados do cliente copiados para dentro do documento.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CustomerSnapshot {
    pub name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub email: Option<String>,
}

// =============================================================================
//  PAYLOADS COMPARTILHADOS
// =============================================================================

/// Valor monetário precisa caber em NUMERIC(14,2) sem arredondamento.
pub fn validate_money(value: &Decimal) -> Result<(), ValidationError> {
    match check_money(*value) {
        Ok(_) => Ok(()),
        Err(LedgerError::TooManyDecimals) => {
            let mut err = ValidationError::new("scale");
            err.message = Some("at most 2 decimal places".into());
            Err(err)
        }
        Err(_) => {
            let mut err = ValidationError::new("range");
            err.add_param("max".into(), &"999999999999.99");
            err.message = Some("amount must be below 1000000000000".into());
            Err(err)
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LineItemPayload {
    pub product_id: Option<Uuid>,

    #[validate(length(min = 1, message = "item name is required"))]
    #[schema(example = "ติดตั้งกล้องวงจรปิด")]
    pub product_name: String,

    pub description: Option<String>,

    #[schema(example = 2)]
    pub quantity: i32,

    #[validate(custom(function = "validate_money"))]
    #[schema(value_type = String, example = "1000.00")]
    pub price: Decimal,
}

/// Item já gravado, de volta a rascunho (recalcular após editar desconto/IVA).
impl From<DocumentItem> for LineItemDraft {
    fn from(item: DocumentItem) -> Self {
        LineItemDraft {
            product_id: item.product_id,
            name: item.product_name,
            description: item.description,
            quantity: item.quantity,
            unit_price: item.price,
        }
    }
}

impl From<LineItemPayload> for LineItemDraft {
    fn from(p: LineItemPayload) -> Self {
        LineItemDraft {
            product_id: p.product_id,
            name: p.product_name,
            description: p.description,
            quantity: p.quantity,
            unit_price: p.price,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignaturePayload {
    #[validate(length(min = 1, message = "signature data is required"))]
    #[schema(example = "data:image/png;base64,iVBORw0KGgo...")]
    pub signature_data: String,
    pub signed_by: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImagePayload {
    #[validate(length(min = 1, message = "image url is required"))]
    #[schema(example = "/uploads/site-photo-1735689600000-a1b2c3d4.jpg")]
    pub url: String,
    pub caption: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(price: &str) -> LineItemPayload {
        LineItemPayload {
            product_id: None,
            product_name: "Instalação".into(),
            description: None,
            quantity: 1,
            price: price.parse().unwrap(),
        }
    }

    #[test]
    fn price_must_fit_the_money_column() {
        assert!(line("999999999999.99").validate().is_ok());
        assert!(line("12.50").validate().is_ok());

        let errors = line("10000000000000").validate().unwrap_err();
        assert_eq!(errors.field_errors()["price"][0].code, "range");

        let errors = line("0.333").validate().unwrap_err();
        assert_eq!(errors.field_errors()["price"][0].code, "scale");
    }
}
