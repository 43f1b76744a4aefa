// src/common/response.rs
//
// Envelope de sucesso: { success, message, data, pagination? }

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use super::{
    i18n::Msg,
    pagination::{Page, PaginationMeta},
};
use crate::middleware::i18n::Locale;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PaginationMeta>,
}

pub type Envelope<T> = (StatusCode, Json<ApiResponse<T>>);

fn envelope<T>(status: StatusCode, locale: &Locale, msg: Msg, data: T) -> Envelope<T> {
    (
        status,
        Json(ApiResponse {
            success: true,
            message: msg.text(locale).to_string(),
            data,
            pagination: None,
        }),
    )
}

pub fn ok<T: Serialize>(locale: &Locale, msg: Msg, data: T) -> Envelope<T> {
    envelope(StatusCode::OK, locale, msg, data)
}

pub fn created<T: Serialize>(locale: &Locale, msg: Msg, data: T) -> Envelope<T> {
    envelope(StatusCode::CREATED, locale, msg, data)
}

/// Resposta sem payload (`data: null`).
pub fn done(locale: &Locale, msg: Msg) -> Envelope<Option<()>> {
    envelope(StatusCode::OK, locale, msg, None)
}

pub fn paginated<T: Serialize>(locale: &Locale, page: Page<T>) -> Envelope<Vec<T>> {
    let (status, Json(mut body)) = envelope(StatusCode::OK, locale, Msg::Fetched, page.items);
    body.pagination = Some(page.meta);
    (status, Json(body))
}

/// Download de PDF, fora do envelope JSON.
pub fn pdf(filename: &str, bytes: Vec<u8>) -> Response {
    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{}\"", filename)),
    ];
    (headers, bytes).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::pagination::PageRequest;

    #[test]
    fn paginated_envelope_shape() {
        let page = Page::new(vec![1, 2], 12, PageRequest { page: 1, limit: 2 });
        let (status, Json(body)) = paginated(&Locale::default(), page);
        let value = serde_json::to_value(&body).unwrap();

        assert_eq!(status, StatusCode::OK);
        assert_eq!(value["success"], true);
        assert_eq!(value["data"], serde_json::json!([1, 2]));
        assert_eq!(value["pagination"]["totalPages"], 6);
        assert_eq!(value["pagination"]["hasNext"], true);
        assert_eq!(value["pagination"]["hasPrev"], false);
    }

    #[test]
    fn done_has_null_data_and_no_pagination() {
        let (_, Json(body)) = done(&Locale("th".into()), Msg::InvoiceDeleted);
        let value = serde_json::to_value(&body).unwrap();
        assert!(value["data"].is_null());
        assert!(value.get("pagination").is_none());
        assert_eq!(value["message"], "ลบใบแจ้งหนี้สำเร็จ");
    }

    #[test]
    fn pdf_download_headers() {
        let response = pdf("INV2569010001.pdf", b"%PDF-1.4".to_vec());
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"INV2569010001.pdf\""
        );
    }
}
