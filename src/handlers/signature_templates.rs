// src/handlers/signature_templates.rs
//
// Sempre escopado ao usuário do token: templates de outros usuários são 404.

use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::{ApiError, AppError},
        extract::JsonBody,
        i18n::Msg,
        response::{created, done, ok},
    },
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::signature_template::{CreateTemplatePayload, SignatureTemplate, UpdateTemplatePayload},
};

#[utoipa::path(
    get,
    path = "/api/signature-templates",
    tag = "Signature Templates",
    responses((status = 200, description = "Templates do usuário (padrão primeiro)", body = [SignatureTemplate])),
    security(("api_jwt" = []))
)]
pub async fn list_templates(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let templates = app_state
        .signature_template_service
        .list(user.id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(ok(&locale, Msg::Fetched, templates))
}

#[utoipa::path(
    get,
    path = "/api/signature-templates/default",
    tag = "Signature Templates",
    responses(
        (status = 200, description = "Template padrão", body = SignatureTemplate),
        (status = 404, description = "Usuário sem template padrão")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_default_template(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let template = app_state
        .signature_template_service
        .default_for(user.id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(ok(&locale, Msg::Fetched, template))
}

#[utoipa::path(
    post,
    path = "/api/signature-templates",
    tag = "Signature Templates",
    request_body = CreateTemplatePayload,
    responses(
        (status = 201, description = "Template criado", body = SignatureTemplate),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_template(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    JsonBody(payload): JsonBody<CreateTemplatePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let template = app_state
        .signature_template_service
        .create(user.id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(created(&locale, Msg::TemplateCreated, template))
}

#[utoipa::path(
    put,
    path = "/api/signature-templates/{id}",
    tag = "Signature Templates",
    params(("id" = Uuid, Path, description = "ID do template")),
    request_body = UpdateTemplatePayload,
    responses(
        (status = 200, description = "Template atualizado", body = SignatureTemplate),
        (status = 404, description = "Template não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_template(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    JsonBody(payload): JsonBody<UpdateTemplatePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let template = app_state
        .signature_template_service
        .update(id, user.id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(ok(&locale, Msg::TemplateUpdated, template))
}

#[utoipa::path(
    put,
    path = "/api/signature-templates/{id}/set-default",
    tag = "Signature Templates",
    params(("id" = Uuid, Path, description = "ID do template")),
    responses(
        (status = 200, description = "Template marcado como padrão", body = SignatureTemplate),
        (status = 404, description = "Template não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn set_default_template(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let template = app_state
        .signature_template_service
        .set_default(id, user.id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(ok(&locale, Msg::DefaultTemplateSet, template))
}

#[utoipa::path(
    delete,
    path = "/api/signature-templates/{id}",
    tag = "Signature Templates",
    params(("id" = Uuid, Path, description = "ID do template")),
    responses(
        (status = 200, description = "Template removido"),
        (status = 404, description = "Template não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_template(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .signature_template_service
        .delete(id, user.id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(done(&locale, Msg::TemplateDeleted))
}
