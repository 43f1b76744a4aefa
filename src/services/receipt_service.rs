// src/services/receipt_service.rs
//
// Recibos só são criados junto com o pagamento (ver invoice_service).
// Aqui ficam apenas leitura, assinatura e PDF.

use sqlx::PgPool;
use uuid::Uuid;

use super::document_service::{PdfRenderer, PrintableDocument};
use crate::{
    common::{
        error::AppError,
        i18n::Msg,
        pagination::{Page, PageRequest},
    },
    db::{AttachmentRepository, InvoiceRepository, ReceiptRepository},
    models::{
        document::{DocumentSignature, SignatureOwner, SignaturePayload},
        receipt::{ReceiptDetail, ReceiptView},
    },
};

#[derive(Clone)]
pub struct ReceiptService {
    receipt_repo: ReceiptRepository,
    invoice_repo: InvoiceRepository,
    attachment_repo: AttachmentRepository,
    renderer: PdfRenderer,
    pool: PgPool,
}

impl ReceiptService {
    pub fn new(
        receipt_repo: ReceiptRepository,
        invoice_repo: InvoiceRepository,
        attachment_repo: AttachmentRepository,
        renderer: PdfRenderer,
        pool: PgPool,
    ) -> Self {
        Self {
            receipt_repo,
            invoice_repo,
            attachment_repo,
            renderer,
            pool,
        }
    }

    pub async fn list(&self, page: PageRequest) -> Result<Page<ReceiptView>, AppError> {
        let (items, total) = tokio::try_join!(self.receipt_repo.list(page), self.receipt_repo.count())?;
        Ok(Page::new(items, total, page))
    }

    async fn find_view(&self, id: Uuid) -> Result<ReceiptView, AppError> {
        self.receipt_repo
            .find_view(id)
            .await?
            .ok_or(AppError::NotFound(Msg::ReceiptNotFound))
    }

    pub async fn get(&self, id: Uuid) -> Result<ReceiptDetail, AppError> {
        let (view, signatures) = tokio::try_join!(
            self.find_view(id),
            self.attachment_repo.list_signatures(&self.pool, SignatureOwner::Receipt, id),
        )?;
        Ok(ReceiptDetail { view, signatures })
    }

    /// Recibos de uma fatura, do mais recente para o mais antigo.
    pub async fn list_by_invoice(&self, invoice_id: Uuid) -> Result<Vec<ReceiptView>, AppError> {
        if self.invoice_repo.find_by_id(invoice_id).await?.is_none() {
            return Err(AppError::NotFound(Msg::InvoiceNotFound));
        }
        self.receipt_repo.list_by_invoice(invoice_id).await
    }

    pub async fn add_signature(&self, id: Uuid, payload: &SignaturePayload) -> Result<DocumentSignature, AppError> {
        if !self.receipt_repo.exists(id).await? {
            return Err(AppError::NotFound(Msg::ReceiptNotFound));
        }
        self.attachment_repo
            .add_signature(
                &self.pool,
                SignatureOwner::Receipt,
                id,
                &payload.signature_data,
                payload.signed_by.as_deref(),
            )
            .await
    }

    pub async fn pdf(&self, id: Uuid) -> Result<(String, Vec<u8>), AppError> {
        let view = self.find_view(id).await?;
        let document = PrintableDocument::from_receipt(&view);
        let filename = document.filename();
        let bytes = self.renderer.render(document).await?;
        Ok((filename, bytes))
    }
}
