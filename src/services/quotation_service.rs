// src/services/quotation_service.rs

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use super::{
    customer_service::{CustomerService, SnapshotFields},
    document_service::{PdfRenderer, PrintableDocument},
    invoice_service::InvoiceService,
    notification_service::NotificationService,
    numbering_service::NumberingService,
    pricing::{needs_reprice, price_new, reprice},
};
use crate::{
    common::{
        db_utils::retry_on_number_conflict,
        error::AppError,
        i18n::Msg,
        pagination::{Page, PageRequest},
    },
    db::{quotation_repo::QuotationWrite, AttachmentRepository, InvoiceRepository, QuotationRepository},
    ledger::{
        approval::{decide, decision_notes, plan_edit, Decision},
        conversion::{plan_conversion, ConversionPlan},
        numbering::DocumentKind,
        totals::{PricedDocument, Totals},
        LedgerError, LedgerPolicy,
    },
    models::{
        document::{
            CustomerSnapshot, DocumentImage, DocumentSignature, ImagePayload, LineOwner, SignatureOwner,
            SignaturePayload,
        },
        invoice::{Invoice, InvoiceDetail},
        quotation::{
            ApprovalStatus, CreateQuotationPayload, DecisionPayload, Quotation, QuotationDetail,
            QuotationStatus, UpdateQuotationPayload,
        },
    },
};

/// Token opaco do link público de aprovação.
pub fn new_approval_token() -> String {
    Uuid::new_v4().simple().to_string()
}

pub fn approval_url(public_base_url: &str, token: &str) -> String {
    format!("{}/public/quotations/{}", public_base_url.trim_end_matches('/'), token)
}

fn snapshot_of(quotation: &Quotation) -> CustomerSnapshot {
    CustomerSnapshot {
        name: quotation.customer_name.clone(),
        phone: quotation.customer_phone.clone(),
        address: quotation.customer_address.clone(),
        email: quotation.customer_email.clone(),
    }
}

fn stored_totals(quotation: &Quotation) -> Totals {
    Totals {
        subtotal: quotation.subtotal,
        discount_amount: quotation.discount,
        vat_percent: quotation.vat,
        vat_amount: quotation.vat_amount,
        total: quotation.total,
    }
}

#[derive(Clone)]
pub struct QuotationService {
    quotation_repo: QuotationRepository,
    invoice_repo: InvoiceRepository,
    attachment_repo: AttachmentRepository,
    numbering: NumberingService,
    customers: CustomerService,
    invoices: InvoiceService,
    notifications: NotificationService,
    renderer: PdfRenderer,
    policy: LedgerPolicy,
    public_base_url: String,
    pool: PgPool,
}

impl QuotationService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        quotation_repo: QuotationRepository,
        invoice_repo: InvoiceRepository,
        attachment_repo: AttachmentRepository,
        numbering: NumberingService,
        customers: CustomerService,
        invoices: InvoiceService,
        notifications: NotificationService,
        renderer: PdfRenderer,
        policy: LedgerPolicy,
        public_base_url: String,
        pool: PgPool,
    ) -> Self {
        Self {
            quotation_repo,
            invoice_repo,
            attachment_repo,
            numbering,
            customers,
            invoices,
            notifications,
            renderer,
            policy,
            public_base_url,
            pool,
        }
    }

    // =========================================================================
    //  LEITURA
    // =========================================================================

    async fn find(&self, id: Uuid) -> Result<Quotation, AppError> {
        self.quotation_repo
            .find_by_id(id)
            .await?
            .ok_or(AppError::NotFound(Msg::QuotationNotFound))
    }

    pub async fn assemble(&self, header: Quotation) -> Result<QuotationDetail, AppError> {
        let (items, images, signatures, invoice) = tokio::try_join!(
            self.attachment_repo.list_items(&self.pool, LineOwner::Quotation, header.id),
            self.attachment_repo.list_images(&self.pool, LineOwner::Quotation, header.id),
            self.attachment_repo.list_signatures(&self.pool, SignatureOwner::Quotation, header.id),
            self.quotation_repo.invoice_ref(&self.pool, header.id),
        )?;
        Ok(QuotationDetail {
            approval_url: approval_url(&self.public_base_url, &header.approval_token),
            header,
            items,
            images,
            signatures,
            invoice,
        })
    }

    pub async fn get(&self, id: Uuid) -> Result<QuotationDetail, AppError> {
        let quotation = self.find(id).await?;
        self.assemble(quotation).await
    }

    pub async fn list(&self, status: Option<QuotationStatus>, page: PageRequest) -> Result<Page<Quotation>, AppError> {
        let (items, total) = tokio::try_join!(
            self.quotation_repo.list(status, page),
            self.quotation_repo.count(status)
        )?;
        Ok(Page::new(items, total, page))
    }

    /// Visão pública pelo token (sem autenticação).
    pub async fn get_by_token(&self, token: &str) -> Result<QuotationDetail, AppError> {
        let quotation = self
            .quotation_repo
            .find_by_token(token)
            .await?
            .ok_or(AppError::NotFound(Msg::QuotationNotFound))?;
        self.assemble(quotation).await
    }

    // =========================================================================
    //  CRIAÇÃO / EDIÇÃO
    // =========================================================================

    pub async fn create(&self, payload: CreateQuotationPayload) -> Result<QuotationDetail, AppError> {
        let priced = price_new(payload.items, payload.discount, payload.vat, self.policy.discount)?;
        let customer = self
            .customers
            .resolve_snapshot(
                &self.pool,
                payload.customer_id,
                CustomerSnapshot::default(),
                SnapshotFields {
                    name: payload.customer_name.as_deref(),
                    phone: payload.customer_phone.as_deref(),
                    address: payload.customer_address.as_deref(),
                    email: payload.customer_email.as_deref(),
                },
            )
            .await?;

        let data = QuotationWrite {
            customer_id: payload.customer_id,
            customer: &customer,
            totals: &priced.totals,
            status: QuotationStatus::Pending,
            approval_status: ApprovalStatus::Pending,
            valid_until: payload.valid_until,
            notes: payload.notes.as_deref(),
        };

        let data = &data;
        let priced = &priced;
        let quotation = retry_on_number_conflict("create_quotation", move || self.try_create(data, priced)).await?;

        tracing::info!(quotation_no = %quotation.quotation_no, total = %quotation.total, "📝 Orçamento criado");

        let detail = self.assemble(quotation).await?;
        self.notifications.quotation_created(&detail);
        Ok(detail)
    }

    async fn try_create(&self, data: &QuotationWrite<'_>, priced: &PricedDocument) -> Result<Quotation, AppError> {
        let mut tx = self.pool.begin().await?;

        let quotation_no = self
            .numbering
            .allocate(&mut tx, DocumentKind::Quotation, Utc::now().date_naive())
            .await?;
        // Token novo a cada tentativa
        let quotation = self
            .quotation_repo
            .insert(&mut *tx, &quotation_no, &new_approval_token(), data)
            .await?;
        self.attachment_repo
            .insert_items(&mut tx, LineOwner::Quotation, quotation.id, &priced.lines)
            .await?;

        tx.commit().await?;
        Ok(quotation)
    }

    pub async fn update(&self, id: Uuid, payload: UpdateQuotationPayload) -> Result<QuotationDetail, AppError> {
        let reprices = needs_reprice(payload.items.as_deref(), payload.discount, payload.vat);
        if payload.status == Some(QuotationStatus::Converted) {
            return Err(LedgerError::CannotSetConverted.into());
        }

        let mut tx = self.pool.begin().await?;
        let current = self
            .quotation_repo
            .lock_by_id(&mut *tx, id)
            .await?
            .ok_or(AppError::NotFound(Msg::QuotationNotFound))?;

        // Status manual e aprovação andam juntos; convertido não muda totais
        let outcome = plan_edit(current.status, current.approval_status, payload.status, reprices)?;

        let repriced = if reprices {
            let stored_items = match payload.items {
                Some(_) => Vec::new(),
                None => self.attachment_repo.list_items(&mut *tx, LineOwner::Quotation, id).await?,
            };
            Some(reprice(
                stored_items,
                payload.items,
                current.discount,
                payload.discount,
                current.vat,
                payload.vat,
                self.policy.discount,
            )?)
        } else {
            None
        };
        let totals = repriced
            .as_ref()
            .map(|p| p.totals.clone())
            .unwrap_or_else(|| stored_totals(&current));

        let new_customer = payload.customer_id.filter(|cid| Some(*cid) != current.customer_id);
        let customer = self
            .customers
            .resolve_snapshot(
                &mut *tx,
                new_customer,
                snapshot_of(&current),
                SnapshotFields {
                    name: payload.customer_name.as_deref(),
                    phone: payload.customer_phone.as_deref(),
                    address: payload.customer_address.as_deref(),
                    email: payload.customer_email.as_deref(),
                },
            )
            .await?;

        let data = QuotationWrite {
            customer_id: payload.customer_id.or(current.customer_id),
            customer: &customer,
            totals: &totals,
            status: outcome.status,
            approval_status: outcome.approval_status,
            valid_until: payload.valid_until.or(current.valid_until),
            notes: payload.notes.as_deref().or(current.notes.as_deref()),
        };
        let quotation = self.quotation_repo.update(&mut *tx, id, &data).await?;

        if let Some(priced) = &repriced {
            self.attachment_repo.delete_items(&mut *tx, LineOwner::Quotation, id).await?;
            self.attachment_repo
                .insert_items(&mut tx, LineOwner::Quotation, id, &priced.lines)
                .await?;
        }

        tx.commit().await?;
        self.assemble(quotation).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        match self.quotation_repo.delete(&self.pool, id).await? {
            0 => Err(AppError::NotFound(Msg::QuotationNotFound)),
            _ => {
                tracing::info!(quotation_id = %id, "orçamento excluído");
                Ok(())
            }
        }
    }

    // =========================================================================
    //  CONVERSÃO EM FATURA
    // =========================================================================

    /// Devolve a fatura e se ela foi criada agora (`false` = já existia).
    pub async fn convert_to_invoice(&self, id: Uuid) -> Result<(InvoiceDetail, bool), AppError> {
        let (invoice, created) = retry_on_number_conflict("convert_to_invoice", move || self.try_convert(id)).await?;

        let detail = self.invoices.assemble(invoice).await?;
        if created {
            tracing::info!(
                invoice_no = %detail.header.invoice_no,
                quotation_id = %id,
                "🔁 Orçamento convertido em fatura"
            );
            self.notifications.invoice_converted(&detail);
        }
        Ok((detail, created))
    }

    async fn try_convert(&self, id: Uuid) -> Result<(Invoice, bool), AppError> {
        let mut tx = self.pool.begin().await?;

        // 1. Trava o orçamento: conversões concorrentes ficam em fila
        let quotation = self
            .quotation_repo
            .lock_by_id(&mut *tx, id)
            .await?
            .ok_or(AppError::NotFound(Msg::QuotationNotFound))?;

        let existing = self.invoice_repo.find_by_quotation(&mut *tx, id).await?;

        // 2. Decide: reaproveitar, recusar ou criar
        match plan_conversion(quotation.status, existing.is_some())? {
            ConversionPlan::ReturnExisting { repair_status } => {
                if repair_status {
                    tracing::warn!(quotation_no = %quotation.quotation_no, "status divergente, voltando para converted");
                    self.quotation_repo
                        .set_status(&mut *tx, id, QuotationStatus::Converted)
                        .await?;
                }
                tx.commit().await?;
                let invoice = existing.ok_or(AppError::NotFound(Msg::InvoiceNotFound))?;
                Ok((invoice, false))
            }
            ConversionPlan::Create => {
                let invoice = self.invoices.insert_from_quotation(&mut tx, &quotation).await?;
                self.quotation_repo
                    .set_status(&mut *tx, id, QuotationStatus::Converted)
                    .await?;
                tx.commit().await?;
                Ok((invoice, true))
            }
        }
    }

    // =========================================================================
    //  APROVAÇÃO PÚBLICA
    // =========================================================================

    pub async fn decide(&self, token: &str, decision: Decision, payload: DecisionPayload) -> Result<QuotationDetail, AppError> {
        let notes = match decision {
            Decision::Approve => decision_notes(payload.notes, None),
            Decision::Reject => decision_notes(payload.notes, payload.reason),
        };

        let mut tx = self.pool.begin().await?;
        let current = self
            .quotation_repo
            .lock_by_token(&mut *tx, token)
            .await?
            .ok_or(AppError::NotFound(Msg::QuotationNotFound))?;

        let outcome = decide(current.approval_status, decision)?;
        let quotation = self
            .quotation_repo
            .record_decision(&mut *tx, current.id, outcome.approval_status, outcome.status, notes.as_deref())
            .await?;
        tx.commit().await?;

        tracing::info!(
            quotation_no = %quotation.quotation_no,
            decision = ?decision,
            "✍️ Orçamento decidido pelo cliente"
        );
        self.notifications.quotation_decided(&quotation, decision);
        self.assemble(quotation).await
    }

    // =========================================================================
    //  ANEXOS / PDF
    // =========================================================================

    pub async fn add_signature(&self, id: Uuid, payload: &SignaturePayload) -> Result<DocumentSignature, AppError> {
        self.find(id).await?;
        self.attachment_repo
            .add_signature(
                &self.pool,
                SignatureOwner::Quotation,
                id,
                &payload.signature_data,
                payload.signed_by.as_deref(),
            )
            .await
    }

    pub async fn add_image(&self, id: Uuid, payload: &ImagePayload) -> Result<DocumentImage, AppError> {
        self.find(id).await?;
        self.attachment_repo
            .add_image(&self.pool, LineOwner::Quotation, id, &payload.url, payload.caption.as_deref())
            .await
    }

    pub async fn pdf(&self, id: Uuid) -> Result<(String, Vec<u8>), AppError> {
        let detail = self.get(id).await?;
        let document = PrintableDocument::from_quotation(&detail);
        let filename = document.filename();
        let bytes = self.renderer.render(document).await?;
        Ok((filename, bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::AppState, models::document::LineItemPayload};
    use rust_decimal::Decimal;

    #[test]
    fn approval_tokens_are_opaque_and_unique() {
        let a = new_approval_token();
        let b = new_approval_token();
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn approval_url_joins_without_double_slash() {
        assert_eq!(
            approval_url("https://app.example.com/", "abc"),
            "https://app.example.com/public/quotations/abc"
        );
        assert_eq!(
            approval_url("http://localhost:5173", "abc"),
            "http://localhost:5173/public/quotations/abc"
        );
    }

    fn item(name: &str, quantity: i32, price: &str) -> LineItemPayload {
        LineItemPayload {
            product_id: None,
            product_name: name.into(),
            description: None,
            quantity,
            price: price.parse().unwrap(),
        }
    }

    async fn new_quotation(state: &AppState) -> QuotationDetail {
        state
            .quotation_service
            .create(CreateQuotationPayload {
                customer_id: None,
                customer_name: Some("บริษัท ตัวอย่าง จำกัด".into()),
                customer_phone: None,
                customer_address: None,
                customer_email: None,
                items: vec![item("Camera", 2, "1000"), item("Install", 1, "500")],
                discount: None,
                vat: None,
                valid_until: None,
                notes: None,
            })
            .await
            .unwrap()
    }

    #[sqlx::test]
    #[ignore = "requer Postgres (DATABASE_URL)"]
    async fn converting_twice_returns_the_same_invoice(pool: PgPool) {
        let state = AppState::for_tests(pool.clone());
        let quotation = new_quotation(&state).await;
        let id = quotation.header.id;

        let (first, created) = state.quotation_service.convert_to_invoice(id).await.unwrap();
        assert!(created);
        assert_eq!(first.header.total, quotation.header.total);
        assert_eq!(first.items.len(), 2);

        let (again, created_again) = state.quotation_service.convert_to_invoice(id).await.unwrap();
        assert!(!created_again);
        assert_eq!(again.header.id, first.header.id);
        assert_eq!(again.header.invoice_no, first.header.invoice_no);

        let linked: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM invoices WHERE quotation_id = $1")
            .bind(id)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(linked, 1);

        let stored = state.quotation_service.get(id).await.unwrap();
        assert_eq!(stored.header.status, QuotationStatus::Converted);
        assert_eq!(stored.invoice.map(|i| i.id), Some(first.header.id));
    }

    #[sqlx::test]
    #[ignore = "requer Postgres (DATABASE_URL)"]
    async fn concurrent_conversions_create_a_single_invoice(pool: PgPool) {
        let state = AppState::for_tests(pool.clone());
        let id = new_quotation(&state).await.header.id;

        let (a, b) = tokio::join!(
            state.quotation_service.convert_to_invoice(id),
            state.quotation_service.convert_to_invoice(id),
        );
        let (a, created_a) = a.unwrap();
        let (b, created_b) = b.unwrap();

        assert_eq!(a.header.id, b.header.id);
        assert!(created_a ^ created_b);
    }

    #[sqlx::test]
    #[ignore = "requer Postgres (DATABASE_URL)"]
    async fn converted_quotation_keeps_its_items(pool: PgPool) {
        let state = AppState::for_tests(pool.clone());
        let quotation = new_quotation(&state).await;
        let id = quotation.header.id;
        state.quotation_service.convert_to_invoice(id).await.unwrap();

        let err = state
            .quotation_service
            .update(
                id,
                UpdateQuotationPayload {
                    items: Some(vec![item("Camera", 1, "1000")]),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Ledger(LedgerError::QuotationAlreadyConverted)));

        // só contato e observações
        let updated = state
            .quotation_service
            .update(
                id,
                UpdateQuotationPayload {
                    notes: Some("entregar na portaria".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.header.total, quotation.header.total);
        assert_eq!(updated.header.status, QuotationStatus::Converted);
        assert_eq!(updated.items.len(), 2);
    }

    #[sqlx::test]
    #[ignore = "requer Postgres (DATABASE_URL)"]
    async fn manual_accept_marks_the_quotation_approved(pool: PgPool) {
        let state = AppState::for_tests(pool.clone());
        let id = new_quotation(&state).await.header.id;

        let accepted = state
            .quotation_service
            .update(
                id,
                UpdateQuotationPayload {
                    status: Some(QuotationStatus::Accepted),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(accepted.header.status, QuotationStatus::Accepted);
        assert_eq!(accepted.header.approval_status, ApprovalStatus::Approved);
        assert!(accepted.header.decided_at.is_some());
        assert_eq!(accepted.header.total, Decimal::new(267500, 2));
    }
}
