// src/common/db_utils.rs

use std::future::Future;

use crate::common::error::AppError;

/// Constraints UNIQUE das colunas de número de documento.
pub const DOCUMENT_NUMBER_CONSTRAINTS: [&str; 3] = [
    "quotations_quotation_no_key",
    "invoices_invoice_no_key",
    "receipts_receipt_no_key",
];

/// Tentativas totais de uma operação que emite número (a original + 1).
pub const NUMBERING_ATTEMPTS: usize = 2;

pub fn unique_violation(err: &sqlx::Error) -> Option<&str> {
    match err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => db_err.constraint(),
        _ => None,
    }
}

pub fn is_document_number_conflict(err: &AppError) -> bool {
    match err {
        AppError::DatabaseError(db_err) => unique_violation(db_err)
            .is_some_and(|constraint| DOCUMENT_NUMBER_CONSTRAINTS.contains(&constraint)),
        _ => false,
    }
}

/// Roda uma operação transacional que emite número de documento,
/// repetindo uma vez se o número colidir com a constraint UNIQUE.
pub async fn retry_on_number_conflict<T, F, Fut>(operation: &'static str, mut attempt: F) -> Result<T, AppError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    let mut tries = 0;
    loop {
        tries += 1;
        match attempt().await {
            Err(err) if tries < NUMBERING_ATTEMPTS && is_document_number_conflict(&err) => {
                tracing::warn!(operation, tries, "número de documento colidiu, repetindo");
            }
            result => return result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::LedgerError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn non_database_errors_are_not_number_conflicts() {
        assert!(!is_document_number_conflict(&AppError::InvalidToken));
        assert!(!is_document_number_conflict(&AppError::DatabaseError(sqlx::Error::RowNotFound)));
    }

    #[tokio::test]
    async fn other_errors_are_not_retried() {
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let result: Result<(), AppError> = retry_on_number_conflict("test", move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(AppError::from(LedgerError::EmptyItems))
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn success_passes_through() {
        let value = retry_on_number_conflict("test", || async { Ok::<_, AppError>(42) })
            .await
            .unwrap();
        assert_eq!(value, 42);
    }
}
