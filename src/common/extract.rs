// src/common/extract.rs

use axum::{
    extract::{FromRequest, OptionalFromRequest, Request},
    http::StatusCode,
    Json,
};
use serde::de::DeserializeOwned;

use super::{error::ApiError, i18n::Msg};
use crate::middleware::i18n::Locale;

/// `Json<T>` cuja rejeição (corpo malformado, content-type ausente) sai no
/// envelope padrão com status 400.
pub struct JsonBody<T>(pub T);

fn rejection(locale: &Locale, detail: String) -> ApiError {
    ApiError::new(
        StatusCode::BAD_REQUEST,
        format!("{}: {}", Msg::InvalidInput.text(locale), detail),
    )
}

impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let locale = Locale::from_headers(req.headers());
        match <Json<T> as FromRequest<S>>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(err) => Err(rejection(&locale, err.body_text())),
        }
    }
}

// Corpo opcional: sem Content-Type = None
impl<S, T> OptionalFromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Option<Self>, Self::Rejection> {
        let locale = Locale::from_headers(req.headers());
        match <Json<T> as OptionalFromRequest<S>>::from_request(req, state).await {
            Ok(value) => Ok(value.map(|Json(v)| JsonBody(v))),
            Err(err) => Err(rejection(&locale, err.body_text())),
        }
    }
}
