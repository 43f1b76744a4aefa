// src/db/dashboard_repo.rs

use sqlx::PgPool;

use crate::{
    common::error::AppError,
    models::dashboard::{DocumentCounts, Receivables},
};

#[derive(Clone)]
pub struct DashboardRepository {
    pool: PgPool,
}

impl DashboardRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // 1. Contagem de documentos por status
    pub async fn document_counts(&self) -> Result<DocumentCounts, AppError> {
        let counts = sqlx::query_as::<_, DocumentCounts>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM quotations) AS quotations,
                (SELECT COUNT(*) FROM quotations WHERE status = 'pending') AS pending_quotations,
                (SELECT COUNT(*) FROM quotations WHERE status = 'converted') AS converted_quotations,
                (SELECT COUNT(*) FROM invoices) AS invoices,
                (SELECT COUNT(*) FROM invoices WHERE status = 'unpaid') AS unpaid_invoices,
                (SELECT COUNT(*) FROM invoices WHERE status = 'partial') AS partial_invoices,
                (SELECT COUNT(*) FROM invoices WHERE status = 'paid') AS paid_invoices,
                (SELECT COUNT(*) FROM receipts) AS receipts,
                (SELECT COUNT(*) FROM customers) AS customers,
                (SELECT COUNT(*) FROM products WHERE is_active) AS active_products
            "#,
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(counts)
    }

    // 2. Saldo em aberto (faturas não quitadas) e total recebido
    pub async fn receivables(&self) -> Result<Receivables, AppError> {
        let receivables = sqlx::query_as::<_, Receivables>(
            r#"
            SELECT
                COALESCE((SELECT SUM(remaining_amount) FROM invoices WHERE status <> 'paid'), 0) AS outstanding,
                COALESCE((SELECT SUM(amount) FROM payments), 0) AS collected
            "#,
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(receivables)
    }
}
