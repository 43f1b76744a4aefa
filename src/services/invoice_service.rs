// src/services/invoice_service.rs

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::{
    customer_service::{CustomerService, SnapshotFields},
    document_service::{PdfRenderer, PrintableDocument},
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
    db::{
        invoice_repo::InvoiceWrite,
        receipt_repo::NewReceipt,
        AttachmentRepository, InvoiceRepository, ReceiptRepository,
    },
    ledger::{
        numbering::DocumentKind,
        payment::{apply_payment, paid_date_for, rebalance},
        totals::{PricedDocument, Totals},
        LedgerError, LedgerPolicy,
    },
    models::{
        auth::User,
        document::{
            CustomerSnapshot, DocumentImage, DocumentSignature, ImagePayload, LineOwner, SignatureOwner,
            SignaturePayload,
        },
        invoice::{
            CreateInvoicePayload, Invoice, InvoiceDetail, InvoiceStatus, PaymentResult, RecordPaymentPayload,
            UpdateInvoicePayload,
        },
        quotation::Quotation,
        receipt::Receipt,
    },
};

pub const DEFAULT_PAYMENT_METHOD: &str = "cash";

fn snapshot_of(invoice: &Invoice) -> CustomerSnapshot {
    CustomerSnapshot {
        name: invoice.customer_name.clone(),
        phone: invoice.customer_phone.clone(),
        address: invoice.customer_address.clone(),
        email: invoice.customer_email.clone(),
    }
}

fn stored_totals(invoice: &Invoice) -> Totals {
    Totals {
        subtotal: invoice.subtotal,
        discount_amount: invoice.discount,
        vat_percent: invoice.vat,
        vat_amount: invoice.vat_amount,
        total: invoice.total,
    }
}

fn payment_method(method: Option<&str>) -> &str {
    method
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .unwrap_or(DEFAULT_PAYMENT_METHOD)
}

#[derive(Clone)]
pub struct InvoiceService {
    invoice_repo: InvoiceRepository,
    attachment_repo: AttachmentRepository,
    receipt_repo: ReceiptRepository,
    numbering: NumberingService,
    customers: CustomerService,
    notifications: NotificationService,
    renderer: PdfRenderer,
    policy: LedgerPolicy,
    pool: PgPool,
}

impl InvoiceService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        invoice_repo: InvoiceRepository,
        attachment_repo: AttachmentRepository,
        receipt_repo: ReceiptRepository,
        numbering: NumberingService,
        customers: CustomerService,
        notifications: NotificationService,
        renderer: PdfRenderer,
        policy: LedgerPolicy,
        pool: PgPool,
    ) -> Self {
        Self {
            invoice_repo,
            attachment_repo,
            receipt_repo,
            numbering,
            customers,
            notifications,
            renderer,
            policy,
            pool,
        }
    }

    // =========================================================================
    //  LEITURA
    // =========================================================================

    async fn find(&self, id: Uuid) -> Result<Invoice, AppError> {
        self.invoice_repo
            .find_by_id(id)
            .await?
            .ok_or(AppError::NotFound(Msg::InvoiceNotFound))
    }

    /// Junta cabeçalho, origem, itens, imagens, assinaturas e pagamentos.
    pub async fn assemble(&self, header: Invoice) -> Result<InvoiceDetail, AppError> {
        let quotation_ref = async {
            match header.quotation_id {
                Some(quotation_id) => self.invoice_repo.quotation_ref(&self.pool, quotation_id).await,
                None => Ok(None),
            }
        };
        let (quotation, items, images, signatures, payments) = tokio::try_join!(
            quotation_ref,
            self.attachment_repo.list_items(&self.pool, LineOwner::Invoice, header.id),
            self.attachment_repo.list_images(&self.pool, LineOwner::Invoice, header.id),
            self.attachment_repo.list_signatures(&self.pool, SignatureOwner::Invoice, header.id),
            self.invoice_repo.list_payments(&self.pool, header.id),
        )?;
        Ok(InvoiceDetail {
            header,
            quotation,
            items,
            images,
            signatures,
            payments,
        })
    }

    pub async fn get(&self, id: Uuid) -> Result<InvoiceDetail, AppError> {
        let invoice = self.find(id).await?;
        self.assemble(invoice).await
    }

    pub async fn list(&self, status: Option<InvoiceStatus>, page: PageRequest) -> Result<Page<Invoice>, AppError> {
        let (items, total) = tokio::try_join!(self.invoice_repo.list(status, page), self.invoice_repo.count(status))?;
        Ok(Page::new(items, total, page))
    }

    // =========================================================================
    //  CRIAÇÃO / EDIÇÃO
    // =========================================================================

    pub async fn create(&self, payload: CreateInvoicePayload) -> Result<InvoiceDetail, AppError> {
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

        // Fatura nova não tem pagamentos: total zero já nasce paga
        let (remaining_amount, status) = rebalance(priced.totals.total, Decimal::ZERO);
        let data = InvoiceWrite {
            customer_id: payload.customer_id,
            customer: &customer,
            totals: &priced.totals,
            paid_amount: Decimal::ZERO,
            remaining_amount,
            status,
            paid_date: paid_date_for(status, None, Utc::now()),
            due_date: payload.due_date,
            notes: payload.notes.as_deref(),
        };

        let data = &data;
        let priced = &priced;
        let invoice = retry_on_number_conflict("create_invoice", move || self.try_create(data, priced)).await?;

        tracing::info!(invoice_no = %invoice.invoice_no, total = %invoice.total, "🧾 Fatura criada");
        self.assemble(invoice).await
    }

    async fn try_create(&self, data: &InvoiceWrite<'_>, priced: &PricedDocument) -> Result<Invoice, AppError> {
        let mut tx = self.pool.begin().await?;

        let invoice_no = self
            .numbering
            .allocate(&mut tx, DocumentKind::Invoice, Utc::now().date_naive())
            .await?;
        let invoice = self.invoice_repo.insert(&mut *tx, &invoice_no, None, data).await?;
        self.attachment_repo
            .insert_items(&mut tx, LineOwner::Invoice, invoice.id, &priced.lines)
            .await?;

        tx.commit().await?;
        Ok(invoice)
    }

    /// Cria a fatura de um orçamento dentro da transação da conversão:
    /// snapshot e totais gravados no orçamento, itens copiados sem recalcular.
    pub async fn insert_from_quotation(&self, conn: &mut PgConnection, quotation: &Quotation) -> Result<Invoice, AppError> {
        let invoice_no = self
            .numbering
            .allocate(&mut *conn, DocumentKind::Invoice, Utc::now().date_naive())
            .await?;

        let customer = CustomerSnapshot {
            name: quotation.customer_name.clone(),
            phone: quotation.customer_phone.clone(),
            address: quotation.customer_address.clone(),
            email: quotation.customer_email.clone(),
        };
        let totals = Totals {
            subtotal: quotation.subtotal,
            discount_amount: quotation.discount,
            vat_percent: quotation.vat,
            vat_amount: quotation.vat_amount,
            total: quotation.total,
        };
        let (remaining_amount, status) = rebalance(totals.total, Decimal::ZERO);

        let data = InvoiceWrite {
            customer_id: quotation.customer_id,
            customer: &customer,
            totals: &totals,
            paid_amount: Decimal::ZERO,
            remaining_amount,
            status,
            paid_date: paid_date_for(status, None, Utc::now()),
            due_date: None,
            notes: quotation.notes.as_deref(),
        };

        let invoice = self
            .invoice_repo
            .insert(&mut *conn, &invoice_no, Some(quotation.id), &data)
            .await?;
        self.attachment_repo
            .copy_quotation_items(&mut *conn, quotation.id, invoice.id)
            .await?;
        Ok(invoice)
    }

    pub async fn update(&self, id: Uuid, payload: UpdateInvoicePayload) -> Result<InvoiceDetail, AppError> {
        let mut tx = self.pool.begin().await?;
        let current = self
            .invoice_repo
            .lock_by_id(&mut *tx, id)
            .await?
            .ok_or(AppError::NotFound(Msg::InvoiceNotFound))?;

        // 1. Totais: recalculados só se itens, desconto ou IVA vieram
        let repriced = if needs_reprice(payload.items.as_deref(), payload.discount, payload.vat) {
            let stored_items = match payload.items {
                Some(_) => Vec::new(),
                None => self.attachment_repo.list_items(&mut *tx, LineOwner::Invoice, id).await?,
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

        // 2. Saldo sempre coerente com o total
        let (remaining_amount, status) = rebalance(totals.total, current.paid_amount);

        // 3. Cliente: trocar o cadastro recarrega o snapshot
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

        let data = InvoiceWrite {
            customer_id: payload.customer_id.or(current.customer_id),
            customer: &customer,
            totals: &totals,
            paid_amount: current.paid_amount,
            remaining_amount,
            status,
            paid_date: paid_date_for(status, current.paid_date, Utc::now()),
            due_date: payload.due_date.or(current.due_date),
            notes: payload.notes.as_deref().or(current.notes.as_deref()),
        };
        let invoice = self.invoice_repo.update(&mut *tx, id, &data).await?;

        if let Some(priced) = &repriced {
            self.attachment_repo.delete_items(&mut *tx, LineOwner::Invoice, id).await?;
            self.attachment_repo
                .insert_items(&mut tx, LineOwner::Invoice, id, &priced.lines)
                .await?;
        }

        tx.commit().await?;
        self.assemble(invoice).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        match self.invoice_repo.delete(&self.pool, id).await? {
            0 => Err(AppError::NotFound(Msg::InvoiceNotFound)),
            _ => {
                tracing::info!(invoice_id = %id, "fatura excluída");
                Ok(())
            }
        }
    }

    /// Troca manual de status: mexe só em status e data de quitação.
    pub async fn set_status(&self, id: Uuid, status: InvoiceStatus) -> Result<InvoiceDetail, AppError> {
        let mut tx = self.pool.begin().await?;
        let current = self
            .invoice_repo
            .lock_by_id(&mut *tx, id)
            .await?
            .ok_or(AppError::NotFound(Msg::InvoiceNotFound))?;

        let paid_date = paid_date_for(status, current.paid_date, Utc::now());
        let invoice = self
            .invoice_repo
            .set_status(&mut *tx, id, status, paid_date)
            .await?
            .ok_or(AppError::NotFound(Msg::InvoiceNotFound))?;
        tx.commit().await?;

        self.assemble(invoice).await
    }

    // =========================================================================
    //  PAGAMENTOS
    // =========================================================================

    pub async fn record_payment(
        &self,
        id: Uuid,
        payload: RecordPaymentPayload,
        acting_user: &User,
    ) -> Result<PaymentResult, AppError> {
        let amount = payload.amount.ok_or(LedgerError::NonPositivePayment)?;
        let method = payment_method(payload.payment_method.as_deref()).to_string();
        let notes = payload.notes.as_deref().map(str::trim).filter(|n| !n.is_empty());

        let method = method.as_str();
        let (invoice, receipt) = retry_on_number_conflict("record_payment", move || {
            self.try_record_payment(id, amount, method, notes, acting_user)
        })
        .await?;

        tracing::info!(
            invoice_no = %invoice.invoice_no,
            receipt_no = %receipt.receipt_no,
            amount = %receipt.amount,
            remaining = %invoice.remaining_amount,
            "💰 Pagamento registrado"
        );

        let detail = self.assemble(invoice).await?;
        match self.receipt_repo.find_view(receipt.id).await {
            Ok(Some(view)) => self.notifications.payment_recorded(&detail, &view),
            Ok(None) => {}
            Err(e) => tracing::warn!(error = ?e, "recibo não carregado para notificação"),
        }

        Ok(PaymentResult { invoice: detail, receipt })
    }

    async fn try_record_payment(
        &self,
        id: Uuid,
        amount: Decimal,
        method: &str,
        notes: Option<&str>,
        acting_user: &User,
    ) -> Result<(Invoice, Receipt), AppError> {
        let mut tx = self.pool.begin().await?;

        // 1. Trava a fatura
        let invoice = self
            .invoice_repo
            .lock_by_id(&mut *tx, id)
            .await?
            .ok_or(AppError::NotFound(Msg::InvoiceNotFound))?;

        // 2. Regra do saldo
        let outcome = apply_payment(
            invoice.total,
            invoice.paid_amount,
            invoice.status,
            amount,
            self.policy.overpayment,
        )?;

        // 3. Pagamento + saldo novo
        let payment = self
            .invoice_repo
            .insert_payment(&mut *tx, id, outcome.applied_amount, method, notes)
            .await?;
        let paid_date = paid_date_for(outcome.status, invoice.paid_date, Utc::now());
        let updated = self
            .invoice_repo
            .apply_balance(
                &mut *tx,
                id,
                outcome.paid_amount,
                outcome.remaining_amount,
                outcome.status,
                paid_date,
            )
            .await?;

        // 4. Recibo
        let receipt_no = self
            .numbering
            .allocate(&mut tx, DocumentKind::Receipt, Utc::now().date_naive())
            .await?;
        let receipt = self
            .receipt_repo
            .insert(
                &mut *tx,
                &receipt_no,
                &NewReceipt {
                    invoice_id: id,
                    payment_id: payment.id,
                    user_id: acting_user.id,
                    amount: outcome.applied_amount,
                    payment_method: method,
                    notes,
                },
            )
            .await?;

        tx.commit().await?;
        Ok((updated, receipt))
    }

    // =========================================================================
    //  ANEXOS / PDF
    // =========================================================================

    pub async fn add_signature(&self, id: Uuid, payload: &SignaturePayload) -> Result<DocumentSignature, AppError> {
        self.find(id).await?;
        self.attachment_repo
            .add_signature(
                &self.pool,
                SignatureOwner::Invoice,
                id,
                &payload.signature_data,
                payload.signed_by.as_deref(),
            )
            .await
    }

    pub async fn add_image(&self, id: Uuid, payload: &ImagePayload) -> Result<DocumentImage, AppError> {
        self.find(id).await?;
        self.attachment_repo
            .add_image(&self.pool, LineOwner::Invoice, id, &payload.url, payload.caption.as_deref())
            .await
    }

    pub async fn pdf(&self, id: Uuid) -> Result<(String, Vec<u8>), AppError> {
        let detail = self.get(id).await?;
        let document = PrintableDocument::from_invoice(&detail);
        let filename = document.filename();
        let bytes = self.renderer.render(document).await?;
        Ok((filename, bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppState,
        models::{auth::RegisterUserPayload, document::LineItemPayload},
    };

    #[test]
    fn payment_method_defaults_to_cash() {
        assert_eq!(payment_method(None), "cash");
        assert_eq!(payment_method(Some("  ")), "cash");
        assert_eq!(payment_method(Some(" transfer ")), "transfer");
    }

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn item(name: &str, quantity: i32, price: &str) -> LineItemPayload {
        LineItemPayload {
            product_id: None,
            product_name: name.into(),
            description: None,
            quantity,
            price: d(price),
        }
    }

    fn pay(amount: &str) -> RecordPaymentPayload {
        RecordPaymentPayload {
            amount: Some(d(amount)),
            payment_method: Some("transfer".into()),
            notes: None,
        }
    }

    async fn cashier(state: &AppState) -> User {
        state
            .auth_service
            .register_user(RegisterUserPayload {
                name: "Caixa".into(),
                email: "caixa@example.com".into(),
                password: "senha-forte".into(),
            })
            .await
            .unwrap()
            .user
    }

    #[sqlx::test]
    #[ignore = "requer Postgres (DATABASE_URL)"]
    async fn partial_then_full_payment_issues_one_receipt_each(pool: PgPool) {
        let state = AppState::for_tests(pool.clone());
        let user = cashier(&state).await;

        let invoice = state
            .invoice_service
            .create(CreateInvoicePayload {
                customer_id: None,
                customer_name: Some("Somchai".into()),
                customer_phone: None,
                customer_address: None,
                customer_email: None,
                items: vec![item("Camera", 2, "1000"), item("Install", 1, "500")],
                discount: None,
                vat: Some(d("7")),
                due_date: None,
                notes: None,
            })
            .await
            .unwrap();
        let id = invoice.header.id;
        assert_eq!(invoice.header.total, d("2675.00"));
        assert_eq!(invoice.header.status, InvoiceStatus::Unpaid);

        let first = state.invoice_service.record_payment(id, pay("1000"), &user).await.unwrap();
        assert_eq!(first.invoice.header.status, InvoiceStatus::Partial);
        assert_eq!(first.invoice.header.paid_amount, d("1000.00"));
        assert_eq!(first.invoice.header.remaining_amount, d("1675.00"));
        assert_eq!(first.receipt.amount, d("1000.00"));

        let second = state.invoice_service.record_payment(id, pay("1675.00"), &user).await.unwrap();
        assert_eq!(second.invoice.header.status, InvoiceStatus::Paid);
        assert_eq!(second.invoice.header.remaining_amount, Decimal::ZERO);
        assert!(second.invoice.header.paid_date.is_some());
        assert_eq!(second.invoice.payments.len(), 2);

        let receipts = state.receipt_service.list_by_invoice(id).await.unwrap();
        assert_eq!(receipts.len(), 2);
        assert_ne!(receipts[0].receipt.receipt_no, receipts[1].receipt.receipt_no);
        assert!(receipts.iter().all(|r| r.receipt.receipt_no.starts_with("REC")));

        // um recibo por pagamento, nunca mais nem menos
        let payment_rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM payments WHERE invoice_id = $1")
            .bind(id)
            .fetch_one(&pool)
            .await
            .unwrap();
        let receipt_rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM receipts WHERE invoice_id = $1")
            .bind(id)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(payment_rows, 2);
        assert_eq!(receipt_rows, 2);
    }
}
