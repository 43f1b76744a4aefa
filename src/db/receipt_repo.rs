// src/db/receipt_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{error::AppError, pagination::PageRequest},
    models::receipt::{Receipt, ReceiptView},
};

const VIEW_SELECT: &str = r#"
    SELECT
        r.*,
        i.invoice_no,
        i.customer_name, i.customer_phone, i.customer_address, i.customer_email,
        i.total AS invoice_total,
        i.remaining_amount AS invoice_remaining,
        u.name AS issued_by_name,
        u.email AS issued_by_email
    FROM receipts r
    JOIN invoices i ON i.id = r.invoice_id
    JOIN users u ON u.id = r.user_id
"#;

pub struct NewReceipt<'a> {
    pub invoice_id: Uuid,
    pub payment_id: Uuid,
    pub user_id: Uuid,
    pub amount: Decimal,
    pub payment_method: &'a str,
    pub notes: Option<&'a str>,
}

#[derive(Clone)]
pub struct ReceiptRepository {
    pool: PgPool,
}

impl ReceiptRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert<'e, E>(&self, executor: E, receipt_no: &str, data: &NewReceipt<'_>) -> Result<Receipt, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let receipt = sqlx::query_as::<_, Receipt>(
            r#"
            INSERT INTO receipts (receipt_no, invoice_id, payment_id, user_id, amount, payment_method, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(receipt_no)
        .bind(data.invoice_id)
        .bind(data.payment_id)
        .bind(data.user_id)
        .bind(data.amount)
        .bind(data.payment_method)
        .bind(data.notes)
        .fetch_one(executor)
        .await?;
        Ok(receipt)
    }

    pub async fn find_view(&self, id: Uuid) -> Result<Option<ReceiptView>, AppError> {
        let sql = format!("{VIEW_SELECT} WHERE r.id = $1");
        let receipt = sqlx::query_as::<_, ReceiptView>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(receipt)
    }

    pub async fn list(&self, page: PageRequest) -> Result<Vec<ReceiptView>, AppError> {
        let sql = format!("{VIEW_SELECT} ORDER BY r.created_at DESC LIMIT $1 OFFSET $2");
        let receipts = sqlx::query_as::<_, ReceiptView>(&sql)
            .bind(page.limit)
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;
        Ok(receipts)
    }

    pub async fn count(&self) -> Result<i64, AppError> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM receipts")
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }

    pub async fn list_by_invoice(&self, invoice_id: Uuid) -> Result<Vec<ReceiptView>, AppError> {
        let sql = format!("{VIEW_SELECT} WHERE r.invoice_id = $1 ORDER BY r.created_at DESC");
        let receipts = sqlx::query_as::<_, ReceiptView>(&sql)
            .bind(invoice_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(receipts)
    }

    pub async fn exists(&self, id: Uuid) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM receipts WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }
}
