// src/db/sequence_repo.rs
//
// Contadores de numeração por prefixo de período. Tudo aqui roda dentro
// da transação que insere o documento.

use sqlx::PgConnection;

use crate::{common::error::AppError, ledger::numbering::DocumentKind};

#[derive(Clone, Default)]
pub struct SequenceRepository;

impl SequenceRepository {
    pub fn new() -> Self {
        Self
    }

    fn number_source(kind: DocumentKind) -> (&'static str, &'static str) {
        match kind {
            DocumentKind::Quotation => ("quotations", "quotation_no"),
            DocumentKind::Invoice => ("invoices", "invoice_no"),
            DocumentKind::Receipt => ("receipts", "receipt_no"),
        }
    }

    /// Cria (ou toca) a linha do prefixo e devolve o valor atual. O upsert
    /// deixa a linha travada até o fim da transação, serializando emissões
    /// concorrentes do mesmo período.
    pub async fn lock_counter(&self, conn: &mut PgConnection, prefix: &str) -> Result<u32, AppError> {
        let current = sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO document_sequences (prefix, last_value)
            VALUES ($1, 0)
            ON CONFLICT (prefix) DO UPDATE SET updated_at = NOW()
            RETURNING last_value
            "#,
        )
        .bind(prefix)
        .fetch_one(&mut *conn)
        .await?;
        Ok(u32::try_from(current).unwrap_or(0))
    }

    /// Maior número já emitido com este prefixo (documentos importados ou
    /// anteriores ao contador).
    pub async fn latest_number(
        &self,
        conn: &mut PgConnection,
        kind: DocumentKind,
        prefix: &str,
    ) -> Result<Option<String>, AppError> {
        let (table, column) = Self::number_source(kind);
        let sql = format!(
            "SELECT {column} FROM {table} WHERE {column} LIKE $1 || '%' \
             ORDER BY length({column}) DESC, {column} DESC LIMIT 1"
        );
        let latest = sqlx::query_scalar::<_, String>(&sql)
            .bind(prefix)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(latest)
    }

    pub async fn store_counter(&self, conn: &mut PgConnection, prefix: &str, value: u32) -> Result<(), AppError> {
        let value = i32::try_from(value)
            .map_err(|_| anyhow::anyhow!("contador de numeração estourou para o prefixo {}", prefix))?;
        sqlx::query("UPDATE document_sequences SET last_value = $2, updated_at = NOW() WHERE prefix = $1")
            .bind(prefix)
            .bind(value)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }
}
