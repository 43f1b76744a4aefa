// src/db/invoice_repo.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{error::AppError, pagination::PageRequest},
    ledger::totals::Totals,
    models::{
        document::CustomerSnapshot,
        invoice::{Invoice, InvoiceStatus, Payment, QuotationRef},
    },
};

/// Cabeçalho completo gravado em INSERT e UPDATE.
#[derive(Debug, Clone)]
pub struct InvoiceWrite<'a> {
    pub customer_id: Option<Uuid>,
    pub customer: &'a CustomerSnapshot,
    pub totals: &'a Totals,
    pub paid_amount: Decimal,
    pub remaining_amount: Decimal,
    pub status: InvoiceStatus,
    pub paid_date: Option<DateTime<Utc>>,
    pub due_date: Option<NaiveDate>,
    pub notes: Option<&'a str>,
}

#[derive(Clone)]
pub struct InvoiceRepository {
    pool: PgPool,
}

impl InvoiceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert<'e, E>(
        &self,
        executor: E,
        invoice_no: &str,
        quotation_id: Option<Uuid>,
        data: &InvoiceWrite<'_>,
    ) -> Result<Invoice, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let invoice = sqlx::query_as::<_, Invoice>(
            r#"
            INSERT INTO invoices (
                invoice_no, quotation_id, customer_id,
                customer_name, customer_phone, customer_address, customer_email,
                subtotal, discount, vat, vat_amount, total,
                paid_amount, remaining_amount, status, paid_date, due_date, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            RETURNING *
            "#,
        )
        .bind(invoice_no)
        .bind(quotation_id)
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
        .bind(data.paid_amount)
        .bind(data.remaining_amount)
        .bind(data.status)
        .bind(data.paid_date)
        .bind(data.due_date)
        .bind(data.notes)
        .fetch_one(executor)
        .await?;
        Ok(invoice)
    }

    pub async fn update<'e, E>(&self, executor: E, id: Uuid, data: &InvoiceWrite<'_>) -> Result<Invoice, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let invoice = sqlx::query_as::<_, Invoice>(
            r#"
            UPDATE invoices SET
                customer_id = $2,
                customer_name = $3, customer_phone = $4, customer_address = $5, customer_email = $6,
                subtotal = $7, discount = $8, vat = $9, vat_amount = $10, total = $11,
                paid_amount = $12, remaining_amount = $13, status = $14, paid_date = $15,
                due_date = $16, notes = $17,
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
        .bind(data.paid_amount)
        .bind(data.remaining_amount)
        .bind(data.status)
        .bind(data.paid_date)
        .bind(data.due_date)
        .bind(data.notes)
        .fetch_one(executor)
        .await?;
        Ok(invoice)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Invoice>, AppError> {
        let invoice = sqlx::query_as::<_, Invoice>("SELECT * FROM invoices WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(invoice)
    }

    // Trava a linha até o fim da transação
    pub async fn lock_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Invoice>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let invoice = sqlx::query_as::<_, Invoice>("SELECT * FROM invoices WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(invoice)
    }

    pub async fn find_by_quotation<'e, E>(&self, executor: E, quotation_id: Uuid) -> Result<Option<Invoice>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let invoice = sqlx::query_as::<_, Invoice>("SELECT * FROM invoices WHERE quotation_id = $1")
            .bind(quotation_id)
            .fetch_optional(executor)
            .await?;
        Ok(invoice)
    }

    pub async fn list(&self, status: Option<InvoiceStatus>, page: PageRequest) -> Result<Vec<Invoice>, AppError> {
        let invoices = sqlx::query_as::<_, Invoice>(
            r#"
            SELECT * FROM invoices
            WHERE ($1::invoice_status IS NULL OR status = $1)
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(status)
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;
        Ok(invoices)
    }

    pub async fn count(&self, status: Option<InvoiceStatus>) -> Result<i64, AppError> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM invoices WHERE ($1::invoice_status IS NULL OR status = $1)",
        )
        .bind(status)
        .fetch_one(&self.pool)
        .await?;
        Ok(total)
    }

    pub async fn apply_balance<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        paid_amount: Decimal,
        remaining_amount: Decimal,
        status: InvoiceStatus,
        paid_date: Option<DateTime<Utc>>,
    ) -> Result<Invoice, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let invoice = sqlx::query_as::<_, Invoice>(
            r#"
            UPDATE invoices SET
                paid_amount = $2,
                remaining_amount = $3,
                status = $4,
                paid_date = $5,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(paid_amount)
        .bind(remaining_amount)
        .bind(status)
        .bind(paid_date)
        .fetch_one(executor)
        .await?;
        Ok(invoice)
    }

    pub async fn set_status<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        status: InvoiceStatus,
        paid_date: Option<DateTime<Utc>>,
    ) -> Result<Option<Invoice>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let invoice = sqlx::query_as::<_, Invoice>(
            "UPDATE invoices SET status = $2, paid_date = $3, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status)
        .bind(paid_date)
        .fetch_optional(executor)
        .await?;
        Ok(invoice)
    }

    pub async fn delete<'e, E>(&self, executor: E, id: Uuid) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM invoices WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn quotation_ref<'e, E>(&self, executor: E, quotation_id: Uuid) -> Result<Option<QuotationRef>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let quotation = sqlx::query_as::<_, QuotationRef>("SELECT id, quotation_no FROM quotations WHERE id = $1")
            .bind(quotation_id)
            .fetch_optional(executor)
            .await?;
        Ok(quotation)
    }

    // =========================================================================
    //  PAGAMENTOS (somente inclusão)
    // =========================================================================

    pub async fn insert_payment<'e, E>(
        &self,
        executor: E,
        invoice_id: Uuid,
        amount: Decimal,
        payment_method: &str,
        notes: Option<&str>,
    ) -> Result<Payment, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let payment = sqlx::query_as::<_, Payment>(
            r#"
            INSERT INTO payments (invoice_id, amount, payment_method, notes)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(invoice_id)
        .bind(amount)
        .bind(payment_method)
        .bind(notes)
        .fetch_one(executor)
        .await?;
        Ok(payment)
    }

    // Mais recente primeiro
    pub async fn list_payments<'e, E>(&self, executor: E, invoice_id: Uuid) -> Result<Vec<Payment>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let payments = sqlx::query_as::<_, Payment>(
            "SELECT * FROM payments WHERE invoice_id = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(invoice_id)
        .fetch_all(executor)
        .await?;
        Ok(payments)
    }
}
