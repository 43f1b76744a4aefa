// src/handlers/receipts.rs

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::{ApiError, AppError},
        extract::JsonBody,
        i18n::Msg,
        pagination::ListQuery,
        response::{self, created, ok, paginated},
    },
    config::AppState,
    middleware::i18n::Locale,
    models::{
        document::{DocumentSignature, SignaturePayload},
        receipt::{ReceiptDetail, ReceiptView},
    },
};

#[utoipa::path(
    get,
    path = "/api/receipts",
    tag = "Receipts",
    params(ListQuery),
    responses((status = 200, description = "Recibos paginados, mais recentes primeiro", body = [ReceiptView])),
    security(("api_jwt" = []))
)]
pub async fn list_receipts(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = app_state
        .receipt_service
        .list(query.page_request())
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(paginated(&locale, page))
}

#[utoipa::path(
    get,
    path = "/api/receipts/{id}",
    tag = "Receipts",
    params(("id" = Uuid, Path, description = "ID do recibo")),
    responses(
        (status = 200, description = "Recibo com dados da fatura e assinaturas", body = ReceiptDetail),
        (status = 404, description = "Recibo não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_receipt(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let receipt = app_state
        .receipt_service
        .get(id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(ok(&locale, Msg::Fetched, receipt))
}

#[utoipa::path(
    get,
    path = "/api/receipts/invoice/{invoice_id}",
    tag = "Receipts",
    params(("invoice_id" = Uuid, Path, description = "ID da fatura")),
    responses(
        (status = 200, description = "Recibos emitidos para a fatura", body = [ReceiptView]),
        (status = 404, description = "Fatura não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_by_invoice(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(invoice_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let receipts = app_state
        .receipt_service
        .list_by_invoice(invoice_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(ok(&locale, Msg::Fetched, receipts))
}

#[utoipa::path(
    post,
    path = "/api/receipts/{id}/signature",
    tag = "Receipts",
    params(("id" = Uuid, Path, description = "ID do recibo")),
    request_body = SignaturePayload,
    responses(
        (status = 201, description = "Assinatura adicionada", body = DocumentSignature),
        (status = 404, description = "Recibo não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn add_signature(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
    JsonBody(payload): JsonBody<SignaturePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let signature = app_state
        .receipt_service
        .add_signature(id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(created(&locale, Msg::SignatureAdded, signature))
}

#[utoipa::path(
    get,
    path = "/api/receipts/{id}/pdf",
    tag = "Receipts",
    params(("id" = Uuid, Path, description = "ID do recibo")),
    responses(
        (status = 200, description = "PDF do recibo", content_type = "application/pdf"),
        (status = 404, description = "Recibo não encontrado"),
        (status = 500, description = "Gerador de PDF indisponível")
    ),
    security(("api_jwt" = []))
)]
pub async fn receipt_pdf(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let (filename, bytes) = app_state
        .receipt_service
        .pdf(id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(response::pdf(&filename, bytes))
}
