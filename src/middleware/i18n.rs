// src/middleware/i18n.rs

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts, HeaderMap};

const DEFAULT_LANG: &str = "en";

// Extrator de idioma (primeira tag do Accept-Language, sem a região)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locale(pub String);

impl Default for Locale {
    fn default() -> Self {
        Locale(DEFAULT_LANG.to_string())
    }
}

impl Locale {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let lang = headers
            .get(header::ACCEPT_LANGUAGE)
            .and_then(|header_value| header_value.to_str().ok())
            .and_then(|header_str| {
                accept_language::parse(header_str)
                    .first()
                    // "th-TH" -> "th"
                    .map(|tag| tag.split('-').next().unwrap_or(tag).to_ascii_lowercase())
            })
            .unwrap_or_else(|| DEFAULT_LANG.to_string());

        Locale(lang)
    }

    pub fn is_thai(&self) -> bool {
        self.0 == "th"
    }
}

impl<S> FromRequestParts<S> for Locale
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Locale::from_headers(&parts.headers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut map = HeaderMap::new();
        map.insert(header::ACCEPT_LANGUAGE, HeaderValue::from_str(value).unwrap());
        map
    }

    #[test]
    fn picks_primary_language_without_region() {
        assert_eq!(Locale::from_headers(&headers("th-TH,th;q=0.9,en;q=0.8")), Locale("th".into()));
        assert!(Locale::from_headers(&headers("th")).is_thai());
    }

    #[test]
    fn highest_quality_tag_wins() {
        assert_eq!(Locale::from_headers(&headers("en;q=0.5, th;q=0.9")).0, "th");
    }

    #[test]
    fn falls_back_to_english() {
        assert_eq!(Locale::from_headers(&HeaderMap::new()), Locale::default());
        assert!(!Locale::from_headers(&headers("pt-BR")).is_thai());
    }
}
