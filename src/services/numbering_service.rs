// src/services/numbering_service.rs

use chrono::NaiveDate;
use sqlx::PgConnection;

use crate::{
    common::error::AppError,
    db::SequenceRepository,
    ledger::numbering::{format_number, next_sequence, parse_sequence, period_prefix, DocumentKind},
};

#[derive(Clone, Default)]
pub struct NumberingService {
    sequence_repo: SequenceRepository,
}

impl NumberingService {
    pub fn new(sequence_repo: SequenceRepository) -> Self {
        Self { sequence_repo }
    }

    /// Emite o próximo número do período. Precisa rodar na mesma transação
    /// do INSERT do documento: a linha do contador fica travada até o commit.
    pub async fn allocate(
        &self,
        conn: &mut PgConnection,
        kind: DocumentKind,
        reference_date: NaiveDate,
    ) -> Result<String, AppError> {
        let prefix = period_prefix(kind, reference_date);

        // 1. Trava o contador do prefixo
        let counter = self.sequence_repo.lock_counter(&mut *conn, &prefix).await?;

        // 2. Maior número já gravado (cobre dados anteriores ao contador)
        let latest = self
            .sequence_repo
            .latest_number(&mut *conn, kind, &prefix)
            .await?
            .and_then(|number| parse_sequence(&prefix, &number));

        // 3. Avança e persiste
        let sequence = next_sequence(counter, latest);
        self.sequence_repo.store_counter(&mut *conn, &prefix, sequence).await?;

        let number = format_number(&prefix, sequence);
        tracing::debug!(prefix = %prefix, number = %number, "número de documento emitido");
        Ok(number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::PgPool;

    fn march_2026() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 15).unwrap()
    }

    async fn allocate_and_commit(pool: &PgPool, numbering: &NumberingService, kind: DocumentKind) -> String {
        let mut tx = pool.begin().await.unwrap();
        let number = numbering.allocate(&mut *tx, kind, march_2026()).await.unwrap();
        tx.commit().await.unwrap();
        number
    }

    #[sqlx::test]
    #[ignore = "requer Postgres (DATABASE_URL)"]
    async fn numbers_increase_within_a_prefix(pool: PgPool) {
        let numbering = NumberingService::default();

        let first = allocate_and_commit(&pool, &numbering, DocumentKind::Invoice).await;
        let second = allocate_and_commit(&pool, &numbering, DocumentKind::Invoice).await;
        let receipt = allocate_and_commit(&pool, &numbering, DocumentKind::Receipt).await;

        assert_eq!(first, "INV2569030001");
        assert_eq!(second, "INV2569030002");
        // outro prefixo, outro contador
        assert_eq!(receipt, "REC2569030001");
    }

    #[sqlx::test]
    #[ignore = "requer Postgres (DATABASE_URL)"]
    async fn concurrent_allocations_never_share_a_number(pool: PgPool) {
        let numbering = NumberingService::default();

        let (a, b) = tokio::join!(
            allocate_and_commit(&pool, &numbering, DocumentKind::Quotation),
            allocate_and_commit(&pool, &numbering, DocumentKind::Quotation),
        );

        let mut numbers = vec![a, b];
        numbers.sort();
        assert_eq!(numbers, vec!["QT2569030001".to_string(), "QT2569030002".to_string()]);
    }

    #[sqlx::test]
    #[ignore = "requer Postgres (DATABASE_URL)"]
    async fn rolled_back_allocation_does_not_burn_a_number(pool: PgPool) {
        let numbering = NumberingService::default();

        let mut tx = pool.begin().await.unwrap();
        let discarded = numbering.allocate(&mut *tx, DocumentKind::Invoice, march_2026()).await.unwrap();
        tx.rollback().await.unwrap();

        let kept = allocate_and_commit(&pool, &numbering, DocumentKind::Invoice).await;
        assert_eq!(discarded, kept);
    }
}
