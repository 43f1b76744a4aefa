// src/models/upload.rs

use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    pub filename: String,
    pub original_name: String,
    #[schema(example = "/uploads/photo-1735689600000-a1b2c3d4.jpg")]
    pub url: String,
    pub size: usize,
    pub mimetype: String,
}
