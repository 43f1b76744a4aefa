// src/handlers/customers.rs

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
        response::{created, done, ok, paginated},
    },
    config::AppState,
    middleware::i18n::Locale,
    models::customer::{Customer, CustomerDetail, CustomerSummary, CreateCustomerPayload, UpdateCustomerPayload},
};

#[utoipa::path(
    get,
    path = "/api/customers",
    tag = "Customers",
    params(ListQuery),
    responses(
        (status = 200, description = "Clientes paginados (com contagem de documentos)", body = [CustomerSummary])
    ),
    security(("api_jwt" = []))
)]
pub async fn list_customers(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = app_state
        .customer_service
        .list(query.search_term(), query.page_request())
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(paginated(&locale, page))
}

#[utoipa::path(
    get,
    path = "/api/customers/{id}",
    tag = "Customers",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    responses(
        (status = 200, description = "Cliente com orçamentos e faturas recentes", body = CustomerDetail),
        (status = 404, description = "Cliente não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_customer(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let customer = app_state
        .customer_service
        .get(id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(ok(&locale, Msg::Fetched, customer))
}

#[utoipa::path(
    post,
    path = "/api/customers",
    tag = "Customers",
    request_body = CreateCustomerPayload,
    responses(
        (status = 201, description = "Cliente criado", body = Customer),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_customer(
    State(app_state): State<AppState>,
    locale: Locale,
    JsonBody(payload): JsonBody<CreateCustomerPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let customer = app_state
        .customer_service
        .create(&payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(created(&locale, Msg::CustomerCreated, customer))
}

#[utoipa::path(
    put,
    path = "/api/customers/{id}",
    tag = "Customers",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    request_body = UpdateCustomerPayload,
    responses(
        (status = 200, description = "Cliente atualizado", body = Customer),
        (status = 404, description = "Cliente não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_customer(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
    JsonBody(payload): JsonBody<UpdateCustomerPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let customer = app_state
        .customer_service
        .update(id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(ok(&locale, Msg::CustomerUpdated, customer))
}

#[utoipa::path(
    delete,
    path = "/api/customers/{id}",
    tag = "Customers",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    responses(
        (status = 200, description = "Cliente removido (documentos mantêm o snapshot)"),
        (status = 404, description = "Cliente não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_customer(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .customer_service
        .delete(id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(done(&locale, Msg::CustomerDeleted))
}
