// src/db/customer_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{error::AppError, pagination::PageRequest},
    models::customer::{
        CreateCustomerPayload, Customer, CustomerSummary, RecentInvoice, RecentQuotation,
        UpdateCustomerPayload,
    },
};

#[derive(Clone)]
pub struct CustomerRepository {
    pool: PgPool,
}

impl CustomerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, search: Option<&str>, page: PageRequest) -> Result<Vec<CustomerSummary>, AppError> {
        let customers = sqlx::query_as::<_, CustomerSummary>(
            r#"
            SELECT
                c.*,
                (SELECT COUNT(*) FROM quotations q WHERE q.customer_id = c.id) AS quotation_count,
                (SELECT COUNT(*) FROM invoices i WHERE i.customer_id = c.id) AS invoice_count
            FROM customers c
            WHERE $1::text IS NULL
               OR c.name ILIKE '%' || $1 || '%'
               OR c.email ILIKE '%' || $1 || '%'
               OR c.phone ILIKE '%' || $1 || '%'
            ORDER BY c.created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(search)
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;
        Ok(customers)
    }

    pub async fn count(&self, search: Option<&str>) -> Result<i64, AppError> {
        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM customers c
            WHERE $1::text IS NULL
               OR c.name ILIKE '%' || $1 || '%'
               OR c.email ILIKE '%' || $1 || '%'
               OR c.phone ILIKE '%' || $1 || '%'
            "#,
        )
        .bind(search)
        .fetch_one(&self.pool)
        .await?;
        Ok(total)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customer = sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(customer)
    }

    pub async fn recent_quotations(&self, customer_id: Uuid, limit: i64) -> Result<Vec<RecentQuotation>, AppError> {
        let rows = sqlx::query_as::<_, RecentQuotation>(
            r#"
            SELECT id, quotation_no, total, status, created_at
            FROM quotations WHERE customer_id = $1
            ORDER BY created_at DESC LIMIT $2
            "#,
        )
        .bind(customer_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn recent_invoices(&self, customer_id: Uuid, limit: i64) -> Result<Vec<RecentInvoice>, AppError> {
        let rows = sqlx::query_as::<_, RecentInvoice>(
            r#"
            SELECT id, invoice_no, total, remaining_amount, status, created_at
            FROM invoices WHERE customer_id = $1
            ORDER BY created_at DESC LIMIT $2
            "#,
        )
        .bind(customer_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn create<'e, E>(&self, executor: E, payload: &CreateCustomerPayload) -> Result<Customer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            INSERT INTO customers (name, email, phone, address, tax_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(payload.name.trim())
        .bind(&payload.email)
        .bind(&payload.phone)
        .bind(&payload.address)
        .bind(&payload.tax_id)
        .fetch_one(executor)
        .await?;
        Ok(customer)
    }

    // Campos ausentes mantêm o valor atual
    pub async fn update<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        payload: &UpdateCustomerPayload,
    ) -> Result<Option<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            UPDATE customers SET
                name = COALESCE($2, name),
                email = COALESCE($3, email),
                phone = COALESCE($4, phone),
                address = COALESCE($5, address),
                tax_id = COALESCE($6, tax_id),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(payload.name.as_deref().map(str::trim))
        .bind(&payload.email)
        .bind(&payload.phone)
        .bind(&payload.address)
        .bind(&payload.tax_id)
        .fetch_optional(executor)
        .await?;
        Ok(customer)
    }

    pub async fn delete<'e, E>(&self, executor: E, id: Uuid) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM customers WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}
