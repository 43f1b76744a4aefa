// src/handlers/admin.rs

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use uuid::Uuid;

use crate::{
    common::{
        error::ApiError,
        extract::JsonBody,
        i18n::Msg,
        pagination::ListQuery,
        response::{ok, paginated},
    },
    config::AppState,
    middleware::{auth::AdminUser, i18n::Locale},
    models::{
        auth::{UpdateRolePayload, User},
        dashboard::Statistics,
    },
};

#[utoipa::path(
    get,
    path = "/api/admin/statistics",
    tag = "Admin",
    responses(
        (status = 200, description = "Contagens de usuários e documentos, valores a receber", body = Statistics),
        (status = 403, description = "Apenas administradores")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_statistics(
    State(app_state): State<AppState>,
    locale: Locale,
    _admin: AdminUser,
) -> Result<impl IntoResponse, ApiError> {
    let stats = app_state
        .dashboard_service
        .statistics()
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(ok(&locale, Msg::Fetched, stats))
}

#[utoipa::path(
    get,
    path = "/api/admin/users",
    tag = "Admin",
    params(ListQuery),
    responses(
        (status = 200, description = "Usuários paginados", body = [User]),
        (status = 403, description = "Apenas administradores")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_users(
    State(app_state): State<AppState>,
    locale: Locale,
    _admin: AdminUser,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = app_state
        .dashboard_service
        .list_users(query.page_request())
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(paginated(&locale, page))
}

#[utoipa::path(
    patch,
    path = "/api/admin/users/{id}/role",
    tag = "Admin",
    params(("id" = Uuid, Path, description = "ID do usuário")),
    request_body = UpdateRolePayload,
    responses(
        (status = 200, description = "Papel alterado", body = User),
        (status = 403, description = "Apenas administradores"),
        (status = 404, description = "Usuário não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_user_role(
    State(app_state): State<AppState>,
    locale: Locale,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
    JsonBody(payload): JsonBody<UpdateRolePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let user = app_state
        .dashboard_service
        .update_role(&admin, id, payload.role)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(ok(&locale, Msg::RoleUpdated, user))
}
