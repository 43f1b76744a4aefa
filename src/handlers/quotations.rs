// src/handlers/quotations.rs

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
    middleware::i18n::Locale,
    models::{
        document::{DocumentImage, DocumentSignature, ImagePayload, SignaturePayload},
        invoice::InvoiceDetail,
        quotation::{CreateQuotationPayload, Quotation, QuotationDetail, QuotationStatus, UpdateQuotationPayload},
    },
};

#[utoipa::path(
    post,
    path = "/api/quotations",
    tag = "Quotations",
    request_body = CreateQuotationPayload,
    responses(
        (status = 201, description = "Orçamento criado com número QT{ano BE}{mês}{seq}", body = QuotationDetail),
        (status = 400, description = "Itens, desconto ou IVA inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_quotation(
    State(app_state): State<AppState>,
    locale: Locale,
    JsonBody(payload): JsonBody<CreateQuotationPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let detail = app_state
        .quotation_service
        .create(payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(created(&locale, Msg::QuotationCreated, detail))
}

#[utoipa::path(
    get,
    path = "/api/quotations",
    tag = "Quotations",
    params(ListQuery),
    responses(
        (status = 200, description = "Orçamentos paginados", body = [Quotation]),
        (status = 400, description = "Status desconhecido")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_quotations(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let status = query
        .status_filter::<QuotationStatus>()
        .map_err(|e| e.to_api_error(&locale))?;

    let page = app_state
        .quotation_service
        .list(status, query.page_request())
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(paginated(&locale, page))
}

#[utoipa::path(
    get,
    path = "/api/quotations/{id}",
    tag = "Quotations",
    params(("id" = Uuid, Path, description = "ID do orçamento")),
    responses(
        (status = 200, description = "Orçamento com itens, imagens e assinaturas", body = QuotationDetail),
        (status = 404, description = "Orçamento não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_quotation(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let detail = app_state
        .quotation_service
        .get(id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(ok(&locale, Msg::Fetched, detail))
}

#[utoipa::path(
    put,
    path = "/api/quotations/{id}",
    tag = "Quotations",
    params(("id" = Uuid, Path, description = "ID do orçamento")),
    request_body = UpdateQuotationPayload,
    responses(
        (status = 200, description = "Orçamento atualizado (totais recalculados se necessário)", body = QuotationDetail),
        (status = 400, description = "Dados inválidos ou status 'converted'"),
        (status = 404, description = "Orçamento não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_quotation(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
    JsonBody(payload): JsonBody<UpdateQuotationPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let detail = app_state
        .quotation_service
        .update(id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(ok(&locale, Msg::QuotationUpdated, detail))
}

#[utoipa::path(
    delete,
    path = "/api/quotations/{id}",
    tag = "Quotations",
    params(("id" = Uuid, Path, description = "ID do orçamento")),
    responses(
        (status = 200, description = "Orçamento excluído"),
        (status = 404, description = "Orçamento não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_quotation(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .quotation_service
        .delete(id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(done(&locale, Msg::QuotationDeleted))
}

// 201 quando cria a fatura, 200 quando ela já existia
#[utoipa::path(
    post,
    path = "/api/quotations/{id}/convert-to-invoice",
    tag = "Quotations",
    params(("id" = Uuid, Path, description = "ID do orçamento")),
    responses(
        (status = 201, description = "Fatura criada a partir do orçamento", body = InvoiceDetail),
        (status = 200, description = "Fatura já existente devolvida", body = InvoiceDetail),
        (status = 400, description = "Orçamento convertido sem fatura (inconsistência)"),
        (status = 404, description = "Orçamento não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn convert_to_invoice(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let (invoice, was_created) = app_state
        .quotation_service
        .convert_to_invoice(id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    if was_created {
        Ok(created(&locale, Msg::QuotationConverted, invoice))
    } else {
        Ok(ok(&locale, Msg::InvoiceAlreadyExists, invoice))
    }
}

#[utoipa::path(
    post,
    path = "/api/quotations/{id}/signature",
    tag = "Quotations",
    params(("id" = Uuid, Path, description = "ID do orçamento")),
    request_body = SignaturePayload,
    responses(
        (status = 201, description = "Assinatura adicionada", body = DocumentSignature),
        (status = 404, description = "Orçamento não encontrado")
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
        .quotation_service
        .add_signature(id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(created(&locale, Msg::SignatureAdded, signature))
}

#[utoipa::path(
    post,
    path = "/api/quotations/{id}/images",
    tag = "Quotations",
    params(("id" = Uuid, Path, description = "ID do orçamento")),
    request_body = ImagePayload,
    responses(
        (status = 201, description = "Imagem anexada", body = DocumentImage),
        (status = 404, description = "Orçamento não encontrado")
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
        .quotation_service
        .add_image(id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(created(&locale, Msg::ImageAdded, image))
}

#[utoipa::path(
    get,
    path = "/api/quotations/{id}/pdf",
    tag = "Quotations",
    params(("id" = Uuid, Path, description = "ID do orçamento")),
    responses(
        (status = 200, description = "PDF do orçamento (com QR code do link de aprovação)", content_type = "application/pdf"),
        (status = 404, description = "Orçamento não encontrado"),
        (status = 500, description = "Gerador de PDF indisponível")
    ),
    security(("api_jwt" = []))
)]
pub async fn quotation_pdf(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let (filename, bytes) = app_state
        .quotation_service
        .pdf(id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(response::pdf(&filename, bytes))
}
