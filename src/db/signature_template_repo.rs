// src/db/signature_template_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{common::error::AppError, models::signature_template::SignatureTemplate};

#[derive(Clone)]
pub struct SignatureTemplateRepository {
    pool: PgPool,
}

impl SignatureTemplateRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Padrão primeiro, depois os mais recentes
    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<SignatureTemplate>, AppError> {
        let templates = sqlx::query_as::<_, SignatureTemplate>(
            "SELECT * FROM signature_templates WHERE user_id = $1 ORDER BY is_default DESC, created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(templates)
    }

    pub async fn find_default(&self, user_id: Uuid) -> Result<Option<SignatureTemplate>, AppError> {
        let template = sqlx::query_as::<_, SignatureTemplate>(
            "SELECT * FROM signature_templates WHERE user_id = $1 AND is_default",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(template)
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        user_id: Uuid,
        name: &str,
        signature_data: &str,
        is_default: bool,
    ) -> Result<SignatureTemplate, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let template = sqlx::query_as::<_, SignatureTemplate>(
            r#"
            INSERT INTO signature_templates (user_id, name, signature_data, is_default)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(name)
        .bind(signature_data)
        .bind(is_default)
        .fetch_one(executor)
        .await?;
        Ok(template)
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        user_id: Uuid,
        name: Option<&str>,
        signature_data: Option<&str>,
        is_default: Option<bool>,
    ) -> Result<Option<SignatureTemplate>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let template = sqlx::query_as::<_, SignatureTemplate>(
            r#"
            UPDATE signature_templates SET
                name = COALESCE($3, name),
                signature_data = COALESCE($4, signature_data),
                is_default = COALESCE($5, is_default),
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(name)
        .bind(signature_data)
        .bind(is_default)
        .fetch_optional(executor)
        .await?;
        Ok(template)
    }

    /// Tira o padrão de todos os templates do usuário (exceto `keep`).
    pub async fn clear_default<'e, E>(&self, executor: E, user_id: Uuid, keep: Option<Uuid>) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            UPDATE signature_templates SET is_default = FALSE, updated_at = NOW()
            WHERE user_id = $1 AND is_default AND ($2::uuid IS NULL OR id <> $2)
            "#,
        )
        .bind(user_id)
        .bind(keep)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn delete<'e, E>(&self, executor: E, id: Uuid, user_id: Uuid) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM signature_templates WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}
