// src/db/account_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{Executor, PgConnection, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{error::AppError, pagination::PageRequest},
    models::account::{EmailVerificationToken, LoginHistoryEntry, LoginStatus, PasswordResetToken},
};

/// Linha nova do histórico de login.
#[derive(Debug)]
pub struct NewLogin<'a> {
    pub user_id: Uuid,
    pub ip_address: &'a str,
    pub user_agent: &'a str,
    pub browser: &'a str,
    pub os: &'a str,
    pub device: &'a str,
    pub status: LoginStatus,
    pub failure_reason: Option<&'a str>,
    pub is_new_device: bool,
}

// Tokens de redefinição/verificação e histórico de login
#[derive(Clone)]
pub struct AccountRepository {
    pool: PgPool,
}

impl AccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  REDEFINIÇÃO DE SENHA
    // =========================================================================

    /// Apaga os tokens anteriores do usuário e grava o novo.
    pub async fn replace_reset_token(
        &self,
        conn: &mut PgConnection,
        user_id: Uuid,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<PasswordResetToken, AppError> {
        sqlx::query("DELETE FROM password_reset_tokens WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *conn)
            .await?;

        let row = sqlx::query_as::<_, PasswordResetToken>(
            r#"
            INSERT INTO password_reset_tokens (user_id, token, expires_at)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(token)
        .bind(expires_at)
        .fetch_one(&mut *conn)
        .await?;
        Ok(row)
    }

    pub async fn find_reset_token<'e, E>(&self, executor: E, token: &str) -> Result<Option<PasswordResetToken>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, PasswordResetToken>("SELECT * FROM password_reset_tokens WHERE token = $1")
            .bind(token)
            .fetch_optional(executor)
            .await?;
        Ok(row)
    }

    /// Trava o token até o fim da transação: duas redefinições com o mesmo
    /// token ficam em fila e só a primeira encontra `used_at` vazio.
    pub async fn lock_reset_token<'e, E>(&self, executor: E, token: &str) -> Result<Option<PasswordResetToken>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, PasswordResetToken>(
            "SELECT * FROM password_reset_tokens WHERE token = $1 FOR UPDATE",
        )
        .bind(token)
        .fetch_optional(executor)
        .await?;
        Ok(row)
    }

    pub async fn mark_reset_used<'e, E>(&self, executor: E, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE password_reset_tokens SET used_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn delete_reset_token<'e, E>(&self, executor: E, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("DELETE FROM password_reset_tokens WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(())
    }

    // =========================================================================
    //  VERIFICAÇÃO DE E-MAIL
    // =========================================================================

    pub async fn replace_verification_token(
        &self,
        conn: &mut PgConnection,
        user_id: Uuid,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<EmailVerificationToken, AppError> {
        self.delete_verification_tokens(&mut *conn, user_id).await?;

        let row = sqlx::query_as::<_, EmailVerificationToken>(
            r#"
            INSERT INTO email_verification_tokens (user_id, token, expires_at)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(token)
        .bind(expires_at)
        .fetch_one(&mut *conn)
        .await?;
        Ok(row)
    }

    pub async fn lock_verification_token<'e, E>(
        &self,
        executor: E,
        token: &str,
    ) -> Result<Option<EmailVerificationToken>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, EmailVerificationToken>(
            "SELECT * FROM email_verification_tokens WHERE token = $1 FOR UPDATE",
        )
        .bind(token)
        .fetch_optional(executor)
        .await?;
        Ok(row)
    }

    pub async fn delete_verification_tokens<'e, E>(&self, executor: E, user_id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("DELETE FROM email_verification_tokens WHERE user_id = $1")
            .bind(user_id)
            .execute(executor)
            .await?;
        Ok(())
    }

    // =========================================================================
    //  HISTÓRICO DE LOGIN
    // =========================================================================

    /// Já houve login bem-sucedido com este navegador/sistema/dispositivo?
    pub async fn known_device(&self, user_id: Uuid, browser: &str, os: &str, device: &str) -> Result<bool, AppError> {
        let known = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM login_history
                WHERE user_id = $1 AND browser = $2 AND os = $3 AND device = $4
                  AND status = 'success'
            )
            "#,
        )
        .bind(user_id)
        .bind(browser)
        .bind(os)
        .bind(device)
        .fetch_one(&self.pool)
        .await?;
        Ok(known)
    }

    pub async fn insert_login(&self, login: &NewLogin<'_>) -> Result<LoginHistoryEntry, AppError> {
        let row = sqlx::query_as::<_, LoginHistoryEntry>(
            r#"
            INSERT INTO login_history
                (user_id, ip_address, user_agent, browser, os, device, status, failure_reason, is_new_device)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(login.user_id)
        .bind(login.ip_address)
        .bind(login.user_agent)
        .bind(login.browser)
        .bind(login.os)
        .bind(login.device)
        .bind(login.status)
        .bind(login.failure_reason)
        .bind(login.is_new_device)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn list_logins(&self, user_id: Uuid, page: PageRequest) -> Result<Vec<LoginHistoryEntry>, AppError> {
        let rows = sqlx::query_as::<_, LoginHistoryEntry>(
            r#"
            SELECT * FROM login_history
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn count_logins(&self, user_id: Uuid) -> Result<i64, AppError> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM login_history WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }

    pub async fn recent_failed(&self, user_id: Uuid, limit: i64) -> Result<Vec<LoginHistoryEntry>, AppError> {
        let rows = sqlx::query_as::<_, LoginHistoryEntry>(
            r#"
            SELECT * FROM login_history
            WHERE user_id = $1 AND status = 'failed'
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
