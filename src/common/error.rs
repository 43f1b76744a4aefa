// src/common/error.rs

use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use validator::{ValidationErrors, ValidationErrorsKind};

use crate::{
    common::i18n::Msg,
    ledger::LedgerError,
    middleware::i18n::Locale,
    services::{document_service::RenderError, upload_service::UploadError},
};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Requisição inválida: {0:?}")]
    BadRequest(Msg),

    #[error("Regra do livro violada: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Recurso não encontrado: {0:?}")]
    NotFound(Msg),

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Acesso negado")]
    Forbidden,

    #[error("Falha no upload: {0}")]
    Upload(#[from] UploadError),

    #[error("Falha ao gerar PDF: {0}")]
    Render(#[from] RenderError),

    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Qualquer outro erro inesperado
    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

/// Erro já traduzido para o idioma da requisição, pronto para virar resposta.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub details: Option<BTreeMap<String, Vec<String>>>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            details: None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = json!({
            "success": false,
            "message": self.message,
            "data": null,
        });
        if let Some(details) = self.details {
            body["details"] = json!(details);
        }
        (self.status, Json(body)).into_response()
    }
}

fn ledger_message(err: &LedgerError) -> Msg {
    match err {
        LedgerError::EmptyItems => Msg::ItemsRequired,
        LedgerError::InvalidQuantity { .. } => Msg::InvalidQuantity,
        LedgerError::NegativeUnitPrice { .. } => Msg::NegativeUnitPrice,
        LedgerError::NegativeDiscount => Msg::NegativeDiscount,
        LedgerError::VatOutOfRange => Msg::VatOutOfRange,
        LedgerError::DiscountExceedsSubtotal => Msg::DiscountExceedsSubtotal,
        LedgerError::AmountOutOfRange => Msg::AmountOutOfRange,
        LedgerError::TooManyDecimals => Msg::TooManyDecimals,
        LedgerError::NonPositivePayment => Msg::PaymentAmountRequired,
        LedgerError::PaymentExceedsBalance => Msg::PaymentExceedsBalance,
        LedgerError::ConvertedWithoutInvoice => Msg::ConvertedWithoutInvoice,
        LedgerError::AlreadyDecided => Msg::AlreadyDecided,
        LedgerError::CannotSetConverted => Msg::CannotSetConverted,
        LedgerError::QuotationAlreadyConverted => Msg::QuotationAlreadyConverted,
    }
}

fn upload_message(err: &UploadError) -> Option<Msg> {
    match err {
        UploadError::InvalidType(_) => Some(Msg::InvalidFileType),
        UploadError::TooLarge => Some(Msg::FileTooLarge),
        UploadError::TooManyFiles => Some(Msg::TooManyFiles),
        UploadError::NoFile => Some(Msg::NoFileUploaded),
        UploadError::InvalidFilename => Some(Msg::InvalidFilename),
        UploadError::NotFound => Some(Msg::FileNotFound),
        UploadError::Multipart(_) => Some(Msg::InvalidInput),
        UploadError::Io(_) => None,
    }
}

/// Achata os erros do `validator` (inclusive aninhados, ex. `items[0].quantity`).
fn collect_details(errors: &ValidationErrors, prefix: &str, out: &mut BTreeMap<String, Vec<String>>) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };
        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                let messages = field_errors
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| e.code.to_string())
                    })
                    .collect();
                out.insert(path, messages);
            }
            ValidationErrorsKind::Struct(inner) => collect_details(inner, &path, out),
            ValidationErrorsKind::List(entries) => {
                for (index, inner) in entries {
                    collect_details(inner, &format!("{path}[{index}]"), out);
                }
            }
        }
    }
}

impl AppError {
    pub fn to_api_error(&self, locale: &Locale) -> ApiError {
        match self {
            AppError::ValidationError(errors) => {
                let mut details = BTreeMap::new();
                collect_details(errors, "", &mut details);
                let first = details.values().flatten().next().cloned();
                let message = match first {
                    Some(first) => format!("{}: {}", Msg::InvalidInput.text(locale), first),
                    None => Msg::InvalidInput.text(locale).to_string(),
                };
                ApiError {
                    status: StatusCode::BAD_REQUEST,
                    message,
                    details: Some(details),
                }
            }
            AppError::BadRequest(msg) => ApiError::new(StatusCode::BAD_REQUEST, msg.text(locale)),
            // Conflitos de estado também são 400
            AppError::Ledger(err) => ApiError::new(StatusCode::BAD_REQUEST, ledger_message(err).text(locale)),
            AppError::NotFound(msg) => ApiError::new(StatusCode::NOT_FOUND, msg.text(locale)),
            AppError::EmailAlreadyExists => {
                ApiError::new(StatusCode::BAD_REQUEST, Msg::EmailAlreadyExists.text(locale))
            }
            AppError::InvalidCredentials => {
                ApiError::new(StatusCode::UNAUTHORIZED, Msg::InvalidCredentials.text(locale))
            }
            AppError::InvalidToken => ApiError::new(StatusCode::UNAUTHORIZED, Msg::InvalidToken.text(locale)),
            AppError::Forbidden => ApiError::new(StatusCode::FORBIDDEN, Msg::Forbidden.text(locale)),
            AppError::Upload(UploadError::NotFound) => {
                ApiError::new(StatusCode::NOT_FOUND, Msg::FileNotFound.text(locale))
            }
            AppError::Upload(err) => match upload_message(err) {
                Some(msg) => ApiError::new(StatusCode::BAD_REQUEST, msg.text(locale)),
                None => self.internal(locale),
            },
            AppError::Render(_) => {
                tracing::error!("Falha ao gerar PDF: {:?}", self);
                ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, Msg::PdfUnavailable.text(locale))
            }
            // Todo o resto (banco, bcrypt, jwt, anyhow) vira 500.
            _ => self.internal(locale),
        }
    }

    fn internal(&self, locale: &Locale) -> ApiError {
        tracing::error!("Erro Interno do Servidor: {:?}", self);
        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, Msg::Unexpected.text(locale))
    }
}

// Rejeições de middleware/extratores, sem acesso ao idioma da requisição.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.to_api_error(&Locale::default()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::Value;
    use validator::Validate;

    #[derive(Validate)]
    struct Line {
        #[validate(range(min = 1, message = "quantity must be at least 1"))]
        quantity: i32,
    }

    #[derive(Validate)]
    struct Doc {
        #[validate(length(min = 1, message = "name is required"))]
        name: String,
        #[validate(nested)]
        items: Vec<Line>,
    }

    async fn body_json(api: ApiError) -> (StatusCode, Value) {
        let response = api.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn not_found_uses_envelope_and_locale() {
        let err = AppError::NotFound(Msg::InvoiceNotFound);
        let (status, body) = body_json(err.to_api_error(&Locale("th".into()))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "ไม่พบใบแจ้งหนี้");
        assert!(body["data"].is_null());
        assert!(body.get("details").is_none());
    }

    #[tokio::test]
    async fn validation_errors_carry_nested_details() {
        let doc = Doc {
            name: String::new(),
            items: vec![Line { quantity: 1 }, Line { quantity: 0 }],
        };
        let err = AppError::from(doc.validate().unwrap_err());
        let (status, body) = body_json(err.to_api_error(&Locale::default())).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["details"]["name"][0], "name is required");
        assert_eq!(body["details"]["items[1].quantity"][0], "quantity must be at least 1");
        assert!(body["message"].as_str().unwrap().starts_with("Invalid input: "));
    }

    #[tokio::test]
    async fn state_conflicts_are_bad_requests() {
        let err = AppError::from(LedgerError::AlreadyDecided);
        let (status, body) = body_json(err.to_api_error(&Locale::default())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "This quotation has already been approved or rejected");
    }

    #[tokio::test]
    async fn out_of_range_amounts_are_validation_errors() {
        let err = AppError::from(LedgerError::AmountOutOfRange);
        let (status, body) = body_json(err.to_api_error(&Locale::default())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], Msg::AmountOutOfRange.text(&Locale::default()));
    }

    #[tokio::test]
    async fn auth_errors_map_to_401_and_403() {
        let locale = Locale::default();
        assert_eq!(AppError::InvalidToken.to_api_error(&locale).status, StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::InvalidCredentials.to_api_error(&locale).status, StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::Forbidden.to_api_error(&locale).status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn unexpected_errors_hide_internals() {
        let err = AppError::from(anyhow::anyhow!("connection reset by peer"));
        let (status, body) = body_json(err.to_api_error(&Locale::default())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "An unexpected error occurred");
    }
}
