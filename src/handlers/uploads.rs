// src/handlers/uploads.rs

use axum::{
    extract::{Multipart, Path, State},
    response::IntoResponse,
};
use utoipa::ToSchema;

use crate::{
    common::{
        error::{ApiError, AppError},
        i18n::Msg,
        response::{created, done},
    },
    config::AppState,
    middleware::i18n::Locale,
    models::upload::UploadedFile,
    services::upload_service::{IncomingFile, UploadError, MAX_FILES},
};

const SINGLE_FIELD: &str = "image";
const MULTIPLE_FIELD: &str = "images";

/// Formulário multipart aceito em `/upload/single` (campo `image`).
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct SingleUploadForm {
    #[schema(value_type = String, format = Binary)]
    image: Vec<u8>,
}

/// Formulário multipart aceito em `/upload/multiple` (campo `images`, até 10).
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct MultipleUploadForm {
    #[schema(value_type = Vec<String>)]
    images: Vec<Vec<u8>>,
}

// Lê só os campos com o nome esperado; os demais são ignorados
async fn collect_files(multipart: &mut Multipart, field_name: &str, limit: usize) -> Result<Vec<IncomingFile>, UploadError> {
    let mut files = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| UploadError::Multipart(e.body_text()))?
    {
        if field.name() != Some(field_name) {
            continue;
        }
        if files.len() == limit {
            return Err(UploadError::TooManyFiles);
        }
        let original_name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field.content_type().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| UploadError::Multipart(e.body_text()))?;
        files.push(IncomingFile {
            original_name,
            content_type,
            bytes: bytes.to_vec(),
        });
    }
    Ok(files)
}

#[utoipa::path(
    post,
    path = "/api/upload/single",
    tag = "Uploads",
    request_body(content = SingleUploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Imagem gravada", body = UploadedFile),
        (status = 400, description = "Tipo não permitido, arquivo grande demais ou ausente")
    ),
    security(("api_jwt" = []))
)]
pub async fn upload_single(
    State(app_state): State<AppState>,
    locale: Locale,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let file = collect_files(&mut multipart, SINGLE_FIELD, 1)
        .await
        .and_then(|files| files.into_iter().next().ok_or(UploadError::NoFile))
        .map_err(|e| AppError::Upload(e).to_api_error(&locale))?;

    let saved = app_state
        .upload_service
        .save(file)
        .await
        .map_err(|e| AppError::Upload(e).to_api_error(&locale))?;

    Ok(created(&locale, Msg::FileUploaded, saved))
}

#[utoipa::path(
    post,
    path = "/api/upload/multiple",
    tag = "Uploads",
    request_body(content = MultipleUploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Imagens gravadas", body = [UploadedFile]),
        (status = 400, description = "Algum arquivo inválido (nada é gravado)")
    ),
    security(("api_jwt" = []))
)]
pub async fn upload_multiple(
    State(app_state): State<AppState>,
    locale: Locale,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let files = collect_files(&mut multipart, MULTIPLE_FIELD, MAX_FILES)
        .await
        .map_err(|e| AppError::Upload(e).to_api_error(&locale))?;

    let saved = app_state
        .upload_service
        .save_many(files)
        .await
        .map_err(|e| AppError::Upload(e).to_api_error(&locale))?;

    Ok(created(&locale, Msg::FilesUploaded, saved))
}

#[utoipa::path(
    delete,
    path = "/api/upload/{filename}",
    tag = "Uploads",
    params(("filename" = String, Path, description = "Nome gerado no upload")),
    responses(
        (status = 200, description = "Arquivo removido"),
        (status = 400, description = "Nome de arquivo inválido"),
        (status = 404, description = "Arquivo não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_upload(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(filename): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .upload_service
        .delete(&filename)
        .await
        .map_err(|e| AppError::Upload(e).to_api_error(&locale))?;

    Ok(done(&locale, Msg::FileDeleted))
}
