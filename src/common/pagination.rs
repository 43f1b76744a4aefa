// src/common/pagination.rs

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::{error::AppError, i18n::Msg};

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Query string comum das listagens. Os números chegam como texto e valores
/// inválidos caem no padrão em vez de rejeitar a requisição.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// Página (começa em 1)
    pub page: Option<String>,
    /// Itens por página (máx. 100)
    pub limit: Option<String>,
    /// Filtro de status (orçamentos e faturas)
    pub status: Option<String>,
    /// Busca textual (clientes e produtos)
    pub search: Option<String>,
    /// Só produtos ativos
    pub active_only: Option<String>,
}

impl ListQuery {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::from_raw(self.page.as_deref(), self.limit.as_deref())
    }

    pub fn search_term(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn active_only(&self) -> bool {
        matches!(self.active_only.as_deref(), Some("true") | Some("1"))
    }

    /// Status vazio ou ausente = sem filtro; valor desconhecido = 400.
    pub fn status_filter<T: DeserializeOwned>(&self) -> Result<Option<T>, AppError> {
        match self.status.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            None => Ok(None),
            Some(raw) => serde_json::from_value(serde_json::Value::String(raw.to_ascii_lowercase()))
                .map(Some)
                .map_err(|_| AppError::BadRequest(Msg::InvalidStatus)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl PageRequest {
    pub fn from_raw(page: Option<&str>, limit: Option<&str>) -> Self {
        let page = page
            .and_then(|p| p.trim().parse::<i64>().ok())
            .filter(|p| *p >= 1)
            .unwrap_or(1);
        let limit = limit
            .and_then(|l| l.trim().parse::<i64>().ok())
            .filter(|l| *l >= 1)
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .min(MAX_PAGE_SIZE);
        Self { page, limit }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }
}

#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl PaginationMeta {
    pub fn new(total: i64, request: PageRequest) -> Self {
        let total_pages = (total + request.limit - 1) / request.limit;
        Self {
            total,
            page: request.page,
            limit: request.limit,
            total_pages,
            has_next: request.page < total_pages,
            has_prev: request.page > 1,
        }
    }
}

#[derive(Debug)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub meta: PaginationMeta,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: i64, request: PageRequest) -> Self {
        Self {
            items,
            meta: PaginationMeta::new(total, request),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_missing_or_garbage() {
        assert_eq!(PageRequest::from_raw(None, None), PageRequest { page: 1, limit: 10 });
        assert_eq!(
            PageRequest::from_raw(Some("abc"), Some("-3")),
            PageRequest { page: 1, limit: 10 }
        );
    }

    #[test]
    fn limit_is_capped() {
        assert_eq!(PageRequest::from_raw(Some("2"), Some("500")).limit, MAX_PAGE_SIZE);
    }

    #[test]
    fn offset_follows_page() {
        assert_eq!(PageRequest::from_raw(Some("3"), Some("20")).offset(), 40);
    }

    #[test]
    fn meta_computes_navigation() {
        let meta = PaginationMeta::new(25, PageRequest { page: 2, limit: 10 });
        assert_eq!(meta.total_pages, 3);
        assert!(meta.has_next);
        assert!(meta.has_prev);

        let last = PaginationMeta::new(25, PageRequest { page: 3, limit: 10 });
        assert!(!last.has_next);

        let empty = PaginationMeta::new(0, PageRequest::from_raw(None, None));
        assert_eq!(empty.total_pages, 0);
        assert!(!empty.has_next);
        assert!(!empty.has_prev);
    }

    #[test]
    fn search_and_flags() {
        let q = ListQuery {
            search: Some("  acme ".into()),
            active_only: Some("true".into()),
            ..Default::default()
        };
        assert_eq!(q.search_term(), Some("acme"));
        assert!(q.active_only());
        assert_eq!(ListQuery::default().search_term(), None);
    }

    #[test]
    fn status_filter_parses_known_values() {
        use crate::models::invoice::InvoiceStatus;

        let q = ListQuery {
            status: Some("Partial".into()),
            ..Default::default()
        };
        assert_eq!(q.status_filter::<InvoiceStatus>().unwrap(), Some(InvoiceStatus::Partial));
        assert_eq!(ListQuery::default().status_filter::<InvoiceStatus>().unwrap(), None);

        let bad = ListQuery {
            status: Some("overdue".into()),
            ..Default::default()
        };
        assert!(matches!(
            bad.status_filter::<InvoiceStatus>(),
            Err(AppError::BadRequest(Msg::InvalidStatus))
        ));
    }
}
