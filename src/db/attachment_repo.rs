// src/db/attachment_repo.rs
//
// Itens, imagens e assinaturas dos documentos. As tabelas são paralelas
// (quotation_items / invoice_items, ...), então o dono decide o nome.

use sqlx::{Executor, PgConnection, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    ledger::totals::PricedLine,
    models::document::{DocumentImage, DocumentItem, DocumentSignature, LineOwner, SignatureOwner},
};

#[derive(Clone, Default)]
pub struct AttachmentRepository;

impl AttachmentRepository {
    pub fn new() -> Self {
        Self
    }

    // =========================================================================
    //  ITENS
    // =========================================================================

    pub async fn insert_items(
        &self,
        conn: &mut PgConnection,
        owner: LineOwner,
        document_id: Uuid,
        lines: &[PricedLine],
    ) -> Result<(), AppError> {
        let sql = format!(
            "INSERT INTO {} ({}, product_id, product_name, description, quantity, price, total, position) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
            owner.items_table(),
            owner.foreign_key()
        );
        for (position, line) in lines.iter().enumerate() {
            sqlx::query(&sql)
                .bind(document_id)
                .bind(line.draft.product_id)
                .bind(line.draft.name.trim())
                .bind(&line.draft.description)
                .bind(line.draft.quantity)
                .bind(line.draft.unit_price)
                .bind(line.line_total)
                .bind(position as i32)
                .execute(&mut *conn)
                .await?;
        }
        Ok(())
    }

    pub async fn delete_items<'e, E>(&self, executor: E, owner: LineOwner, document_id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("DELETE FROM {} WHERE {} = $1", owner.items_table(), owner.foreign_key());
        sqlx::query(&sql).bind(document_id).execute(executor).await?;
        Ok(())
    }

    /// Copia os itens do orçamento para a fatura, sem recalcular nada.
    pub async fn copy_quotation_items<'e, E>(
        &self,
        executor: E,
        quotation_id: Uuid,
        invoice_id: Uuid,
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            INSERT INTO invoice_items (invoice_id, product_id, product_name, description, quantity, price, total, position)
            SELECT $2, product_id, product_name, description, quantity, price, total, position
            FROM quotation_items
            WHERE quotation_id = $1
            "#,
        )
        .bind(quotation_id)
        .bind(invoice_id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn list_items<'e, E>(
        &self,
        executor: E,
        owner: LineOwner,
        document_id: Uuid,
    ) -> Result<Vec<DocumentItem>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "SELECT id, {fk} AS document_id, product_id, product_name, description, quantity, price, total, position \
             FROM {table} WHERE {fk} = $1 ORDER BY position ASC",
            fk = owner.foreign_key(),
            table = owner.items_table()
        );
        let items = sqlx::query_as::<_, DocumentItem>(&sql)
            .bind(document_id)
            .fetch_all(executor)
            .await?;
        Ok(items)
    }

    // =========================================================================
    //  IMAGENS
    // =========================================================================

    pub async fn add_image<'e, E>(
        &self,
        executor: E,
        owner: LineOwner,
        document_id: Uuid,
        url: &str,
        caption: Option<&str>,
    ) -> Result<DocumentImage, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "INSERT INTO {table} ({fk}, url, caption) VALUES ($1, $2, $3) \
             RETURNING id, {fk} AS document_id, url, caption, created_at",
            fk = owner.foreign_key(),
            table = owner.images_table()
        );
        let image = sqlx::query_as::<_, DocumentImage>(&sql)
            .bind(document_id)
            .bind(url)
            .bind(caption)
            .fetch_one(executor)
            .await?;
        Ok(image)
    }

    pub async fn list_images<'e, E>(
        &self,
        executor: E,
        owner: LineOwner,
        document_id: Uuid,
    ) -> Result<Vec<DocumentImage>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "SELECT id, {fk} AS document_id, url, caption, created_at FROM {table} \
             WHERE {fk} = $1 ORDER BY created_at ASC",
            fk = owner.foreign_key(),
            table = owner.images_table()
        );
        let images = sqlx::query_as::<_, DocumentImage>(&sql)
            .bind(document_id)
            .fetch_all(executor)
            .await?;
        Ok(images)
    }

    // =========================================================================
    //  ASSINATURAS
    // =========================================================================

    pub async fn add_signature<'e, E>(
        &self,
        executor: E,
        owner: SignatureOwner,
        document_id: Uuid,
        signature_data: &str,
        signed_by: Option<&str>,
    ) -> Result<DocumentSignature, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "INSERT INTO {table} ({fk}, signature_data, signed_by) VALUES ($1, $2, $3) \
             RETURNING id, {fk} AS document_id, signature_data, signed_by, signed_at",
            fk = owner.foreign_key(),
            table = owner.table()
        );
        let signature = sqlx::query_as::<_, DocumentSignature>(&sql)
            .bind(document_id)
            .bind(signature_data)
            .bind(signed_by)
            .fetch_one(executor)
            .await?;
        Ok(signature)
    }

    pub async fn list_signatures<'e, E>(
        &self,
        executor: E,
        owner: SignatureOwner,
        document_id: Uuid,
    ) -> Result<Vec<DocumentSignature>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "SELECT id, {fk} AS document_id, signature_data, signed_by, signed_at FROM {table} \
             WHERE {fk} = $1 ORDER BY signed_at ASC",
            fk = owner.foreign_key(),
            table = owner.table()
        );
        let signatures = sqlx::query_as::<_, DocumentSignature>(&sql)
            .bind(document_id)
            .fetch_all(executor)
            .await?;
        Ok(signatures)
    }
}
