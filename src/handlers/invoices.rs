// src/handlers/invoices.rs

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
        response::{self, created, done, ok, paginated},
    },
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::{
        document::{DocumentImage, DocumentSignature, ImagePayload, SignaturePayload},
        invoice::{
            CreateInvoicePayload, Invoice, InvoiceDetail, InvoiceStatus, PaymentResult, RecordPaymentPayload,
            UpdateInvoicePayload, UpdateInvoiceStatusPayload,
        },
    },
};

#[utoipa::path(
    post,
    path = "/api/invoices",
    tag = "Invoices",
    request_body = CreateInvoicePayload,
    responses(
        (status = 201, description = "Fatura criada com número INV{ano BE}{mês}{seq}", body = InvoiceDetail),
        (status = 400, description = "Itens, desconto ou IVA inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_invoice(
    State(app_state): State<AppState>,
    locale: Locale,
    JsonBody(payload): JsonBody<CreateInvoicePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let detail = app_state
        .invoice_service
        .create(payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(created(&locale, Msg::InvoiceCreated, detail))
}

#[utoipa::path(
    get,
    path = "/api/invoices",
    tag = "Invoices",
    params(ListQuery),
    responses(
        (status = 200, description = "Faturas paginadas", body = [Invoice]),
        (status = 400, description = "Status desconhecido")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_invoices(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let status = query
        .status_filter::<InvoiceStatus>()
        .map_err(|e| e.to_api_error(&locale))?;

    let page = app_state
        .invoice_service
        .list(status, query.page_request())
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(paginated(&locale, page))
}

#[utoipa::path(
    get,
    path = "/api/invoices/{id}",
    tag = "Invoices",
    params(("id" = Uuid, Path, description = "ID da fatura")),
    responses(
        (status = 200, description = "Fatura com itens, pagamentos e assinaturas", body = InvoiceDetail),
        (status = 404, description = "Fatura não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_invoice(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let detail = app_state
        .invoice_service
        .get(id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(ok(&locale, Msg::Fetched, detail))
}

#[utoipa::path(
    put,
    path = "/api/invoices/{id}",
    tag = "Invoices",
    params(("id" = Uuid, Path, description = "ID da fatura")),
    request_body = UpdateInvoicePayload,
    responses(
        (status = 200, description = "Fatura atualizada e saldo recalculado", body = InvoiceDetail),
        (status = 404, description = "Fatura não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_invoice(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
    JsonBody(payload): JsonBody<UpdateInvoicePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let detail = app_state
        .invoice_service
        .update(id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(ok(&locale, Msg::InvoiceUpdated, detail))
}

#[utoipa::path(
    delete,
    path = "/api/invoices/{id}",
    tag = "Invoices",
    params(("id" = Uuid, Path, description = "ID da fatura")),
    responses(
        (status = 200, description = "Fatura excluída com pagamentos e recibos"),
        (status = 404, description = "Fatura não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_invoice(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .invoice_service
        .delete(id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(done(&locale, Msg::InvoiceDeleted))
}

#[utoipa::path(
    patch,
    path = "/api/invoices/{id}/status",
    tag = "Invoices",
    params(("id" = Uuid, Path, description = "ID da fatura")),
    request_body = UpdateInvoiceStatusPayload,
    responses(
        (status = 200, description = "Status alterado manualmente", body = InvoiceDetail),
        (status = 404, description = "Fatura não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_invoice_status(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
    JsonBody(payload): JsonBody<UpdateInvoiceStatusPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let detail = app_state
        .invoice_service
        .set_status(id, payload.status)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(ok(&locale, Msg::InvoiceStatusUpdated, detail))
}

#[utoipa::path(
    post,
    path = "/api/invoices/{id}/payments",
    tag = "Invoices",
    params(("id" = Uuid, Path, description = "ID da fatura")),
    request_body = RecordPaymentPayload,
    responses(
        (status = 201, description = "Pagamento registrado e recibo emitido", body = PaymentResult),
        (status = 400, description = "Valor ausente, não positivo ou acima do saldo"),
        (status = 401, description = "Usuário não autenticado"),
        (status = 404, description = "Fatura não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn record_payment(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    JsonBody(payload): JsonBody<RecordPaymentPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let result = app_state
        .invoice_service
        .record_payment(id, payload, &user)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(created(&locale, Msg::PaymentRecorded, result))
}

#[utoipa::path(
    post,
    path = "/api/invoices/{id}/signature",
    tag = "Invoices",
    params(("id" = Uuid, Path, description = "ID da fatura")),
    request_body = SignaturePayload,
    responses(
        (status = 201, description = "Assinatura adicionada", body = DocumentSignature),
        (status = 404, description = "Fatura não encontrada")
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
        .invoice_service
        .add_signature(id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(created(&locale, Msg::SignatureAdded, signature))
}

#[utoipa::path(
    post,
    path = "/api/invoices/{id}/images",
    tag = "Invoices",
    params(("id" = Uuid, Path, description = "ID da fatura")),
    request_body = ImagePayload,
    responses(
        (status = 201, description = "Imagem anexada", body = DocumentImage),
        (status = 404, description = "Fatura não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn add_image(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
    JsonBody(payload): JsonBody<ImagePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let image = app_state
        .invoice_service
        .add_image(id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(created(&locale, Msg::ImageAdded, image))
}

#[utoipa::path(
    get,
    path = "/api/invoices/{id}/pdf",
    tag = "Invoices",
    params(("id" = Uuid, Path, description = "ID da fatura")),
    responses(
        (status = 200, description = "PDF da fatura", content_type = "application/pdf"),
        (status = 404, description = "Fatura não encontrada"),
        (status = 500, description = "Gerador de PDF indisponível")
    ),
    security(("api_jwt" = []))
)]
pub async fn invoice_pdf(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let (filename, bytes) = app_state
        .invoice_service
        .pdf(id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(response::pdf(&filename, bytes))
}
