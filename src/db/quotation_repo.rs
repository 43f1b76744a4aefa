// src/db/quotation_repo.rs

use chrono::NaiveDate;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{error::AppError, pagination::PageRequest},
    ledger::totals::Totals,
    models::{
        document::CustomerSnapshot,
        quotation::{ApprovalStatus, InvoiceRef, Quotation, QuotationStatus},
    },
};

/// Cabeçalho completo gravado em INSERT e UPDATE.
#[derive(Debug, Clone)]
pub struct QuotationWrite<'a> {
    pub customer_id: Option<Uuid>,
    pub customer: &'a CustomerSnapshot,
    pub totals: &'a Totals,
    pub status: QuotationStatus,
    pub approval_status: ApprovalStatus,
    pub valid_until: Option<NaiveDate>,
    pub notes: Option<&'a str>,
}

#[derive(Clone)]
pub struct QuotationRepository {
    pool: PgPool,
}

impl QuotationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert<'e, E>(
        &self,
        executor: E,
        quotation_no: &str,
        approval_token: &str,
        data: &QuotationWrite<'_>,
    ) -> Result<Quotation, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let quotation = sqlx::query_as::<_, Quotation>(
            r#"
            INSERT INTO quotations (
                quotation_no, approval_token, customer_id,
                customer_name, customer_phone, customer_address, customer_email,
                subtotal, discount, vat, vat_amount, total,
                status, valid_until, notes, approval_status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            RETURNING *
            "#,
        )
        .bind(quotation_no)
        .bind(approval_token)
        .bind(data.customer_id)
        .bind(&data.customer.name)
        .bind(&data.customer.phone)
        .bind(&data.customer.address)
        .bind(&data.customer.email)
        .bind(data.totals.subtotal)
        .bind(data.totals.discount_amount)
        .bind(data.totals.vat_percent)
        .bind(data.totals.vat_amount)
        .bind(data.totals.total)
        .bind(data.status)
        .bind(data.valid_until)
        .bind(data.notes)
        .bind(data.approval_status)
        .fetch_one(executor)
        .await?;
        Ok(quotation)
    }

    pub async fn update<'e, E>(&self, executor: E, id: Uuid, data: &QuotationWrite<'_>) -> Result<Quotation, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let quotation = sqlx::query_as::<_, Quotation>(
            r#"
            UPDATE quotations SET
                customer_id = $2,
                customer_name = $3, customer_phone = $4, customer_address = $5, customer_email = $6,
                subtotal = $7, discount = $8, vat = $9, vat_amount = $10, total = $11,
                status = $12, valid_until = $13, notes = $14,
                approval_status = $15,
                decided_at = CASE
                    WHEN $15 = 'pending'::approval_status THEN NULL
                    WHEN approval_status = $15 THEN decided_at
                    ELSE NOW()
                END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(data.customer_id)
        .bind(&data.customer.name)
        .bind(&data.customer.phone)
        .bind(&data.customer.address)
        .bind(&data.customer.email)
        .bind(data.totals.subtotal)
        .bind(data.totals.discount_amount)
        .bind(data.totals.vat_percent)
        .bind(data.totals.vat_amount)
        .bind(data.totals.total)
        .bind(data.status)
        .bind(data.valid_until)
        .bind(data.notes)
        .bind(data.approval_status)
        .fetch_one(executor)
        .await?;
        Ok(quotation)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Quotation>, AppError> {
        let quotation = sqlx::query_as::<_, Quotation>("SELECT * FROM quotations WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(quotation)
    }

    // Trava a linha até o fim da transação
    pub async fn lock_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Quotation>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let quotation = sqlx::query_as::<_, Quotation>("SELECT * FROM quotations WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(quotation)
    }

    pub async fn find_by_token(&self, token: &str) -> Result<Option<Quotation>, AppError> {
        let quotation = sqlx::query_as::<_, Quotation>("SELECT * FROM quotations WHERE approval_token = $1")
            .bind(token)
            .fetch_optional(&self.pool)
            .await?;
        Ok(quotation)
    }

    pub async fn lock_by_token<'e, E>(&self, executor: E, token: &str) -> Result<Option<Quotation>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let quotation =
            sqlx::query_as::<_, Quotation>("SELECT * FROM quotations WHERE approval_token = $1 FOR UPDATE")
                .bind(token)
                .fetch_optional(executor)
                .await?;
        Ok(quotation)
    }

    pub async fn list(&self, status: Option<QuotationStatus>, page: PageRequest) -> Result<Vec<Quotation>, AppError> {
        let quotations = sqlx::query_as::<_, Quotation>(
            r#"
            SELECT * FROM quotations
            WHERE ($1::quotation_status IS NULL OR status = $1)
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(status)
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;
        Ok(quotations)
    }

    pub async fn count(&self, status: Option<QuotationStatus>) -> Result<i64, AppError> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM quotations WHERE ($1::quotation_status IS NULL OR status = $1)",
        )
        .bind(status)
        .fetch_one(&self.pool)
        .await?;
        Ok(total)
    }

    pub async fn set_status<'e, E>(&self, executor: E, id: Uuid, status: QuotationStatus) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE quotations SET status = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(status)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn record_decision<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        approval_status: ApprovalStatus,
        status: QuotationStatus,
        notes: Option<&str>,
    ) -> Result<Quotation, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let quotation = sqlx::query_as::<_, Quotation>(
            r#"
            UPDATE quotations SET
                approval_status = $2,
                status = $3,
                approval_notes = $4,
                decided_at = NOW(),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(approval_status)
        .bind(status)
        .bind(notes)
        .fetch_one(executor)
        .await?;
        Ok(quotation)
    }

    pub async fn delete<'e, E>(&self, executor: E, id: Uuid) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM quotations WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn invoice_ref<'e, E>(&self, executor: E, quotation_id: Uuid) -> Result<Option<InvoiceRef>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let invoice = sqlx::query_as::<_, InvoiceRef>("SELECT id, invoice_no FROM invoices WHERE quotation_id = $1")
            .bind(quotation_id)
            .fetch_optional(executor)
            .await?;
        Ok(invoice)
    }
}
