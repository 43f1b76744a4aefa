// src/handlers/public.rs
//
// Link de aprovação enviado ao cliente. Sem autenticação: o token é a credencial.

use axum::{
    extract::{Path, State},
    response::IntoResponse,
};

use crate::{
    common::{error::ApiError, extract::JsonBody, i18n::Msg, response::ok},
    config::AppState,
    ledger::approval::Decision,
    middleware::i18n::Locale,
    models::quotation::{DecisionPayload, QuotationDetail},
};

#[utoipa::path(
    get,
    path = "/api/public/quotations/{token}",
    tag = "Public",
    params(("token" = String, Path, description = "Token de aprovação")),
    responses(
        (status = 200, description = "Orçamento para o cliente", body = QuotationDetail),
        (status = 404, description = "Token desconhecido")
    )
)]
pub async fn get_public_quotation(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(token): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let detail = app_state
        .quotation_service
        .get_by_token(&token)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(ok(&locale, Msg::Fetched, detail))
}

async fn decide(
    app_state: AppState,
    locale: Locale,
    token: String,
    decision: Decision,
    payload: DecisionPayload,
) -> Result<impl IntoResponse, ApiError> {
    let detail = app_state
        .quotation_service
        .decide(&token, decision, payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let msg = match decision {
        Decision::Approve => Msg::QuotationApproved,
        Decision::Reject => Msg::QuotationRejected,
    };
    Ok(ok(&locale, msg, detail))
}

#[utoipa::path(
    post,
    path = "/api/public/quotations/{token}/approve",
    tag = "Public",
    params(("token" = String, Path, description = "Token de aprovação")),
    request_body = DecisionPayload,
    responses(
        (status = 200, description = "Orçamento aprovado", body = QuotationDetail),
        (status = 400, description = "Orçamento já decidido"),
        (status = 404, description = "Token desconhecido")
    )
)]
pub async fn approve_quotation(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(token): Path<String>,
    payload: Option<JsonBody<DecisionPayload>>,
) -> Result<impl IntoResponse, ApiError> {
    let payload = payload.map(|JsonBody(p)| p).unwrap_or_default();
    decide(app_state, locale, token, Decision::Approve, payload).await
}

#[utoipa::path(
    post,
    path = "/api/public/quotations/{token}/reject",
    tag = "Public",
    params(("token" = String, Path, description = "Token de aprovação")),
    request_body = DecisionPayload,
    responses(
        (status = 200, description = "Orçamento rejeitado", body = QuotationDetail),
        (status = 400, description = "Orçamento já decidido"),
        (status = 404, description = "Token desconhecido")
    )
)]
pub async fn reject_quotation(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(token): Path<String>,
    payload: Option<JsonBody<DecisionPayload>>,
) -> Result<impl IntoResponse, ApiError> {
    let payload = payload.map(|JsonBody(p)| p).unwrap_or_default();
    decide(app_state, locale, token, Decision::Reject, payload).await
}
