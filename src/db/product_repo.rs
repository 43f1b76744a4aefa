// src/db/product_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{error::AppError, pagination::PageRequest},
    models::product::{CreateProductPayload, Product, UpdateProductPayload, DEFAULT_UNIT},
};

#[derive(Clone)]
pub struct ProductRepository {
    pool: PgPool,
}

impl ProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(
        &self,
        search: Option<&str>,
        active_only: bool,
        page: PageRequest,
    ) -> Result<Vec<Product>, AppError> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT * FROM products
            WHERE ($1::text IS NULL OR name ILIKE '%' || $1 || '%' OR description ILIKE '%' || $1 || '%')
              AND (NOT $2 OR is_active)
            ORDER BY name ASC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(search)
        .bind(active_only)
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;
        Ok(products)
    }

    pub async fn count(&self, search: Option<&str>, active_only: bool) -> Result<i64, AppError> {
        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM products
            WHERE ($1::text IS NULL OR name ILIKE '%' || $1 || '%' OR description ILIKE '%' || $1 || '%')
              AND (NOT $2 OR is_active)
            "#,
        )
        .bind(search)
        .bind(active_only)
        .fetch_one(&self.pool)
        .await?;
        Ok(total)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Product>, AppError> {
        let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(product)
    }

    pub async fn create<'e, E>(&self, executor: E, payload: &CreateProductPayload) -> Result<Product, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let unit = payload
            .unit
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .unwrap_or(DEFAULT_UNIT);

        let product = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (name, description, price, unit)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(payload.name.trim())
        .bind(&payload.description)
        .bind(payload.price)
        .bind(unit)
        .fetch_one(executor)
        .await?;
        Ok(product)
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        payload: &UpdateProductPayload,
    ) -> Result<Option<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let product = sqlx::query_as::<_, Product>(
            r#"
            UPDATE products SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                price = COALESCE($4, price),
                unit = COALESCE($5, unit),
                is_active = COALESCE($6, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(payload.name.as_deref().map(str::trim))
        .bind(&payload.description)
        .bind(payload.price)
        .bind(&payload.unit)
        .bind(payload.is_active)
        .fetch_optional(executor)
        .await?;
        Ok(product)
    }

    // Exclusão lógica: documentos antigos continuam apontando para o produto
    pub async fn deactivate<'e, E>(&self, executor: E, id: Uuid) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("UPDATE products SET is_active = FALSE, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}
