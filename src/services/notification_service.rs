// src/services/notification_service.rs
//
// E-mails disparados depois do commit. Montagem das mensagens é pura;
// o envio (e a renderização do PDF anexo) roda em `SideEffects`.

use std::sync::Arc;

use rust_decimal::Decimal;

use super::{
    document_service::{format_money, PdfRenderer, PrintableDocument},
    notifier::{Notifier, OutgoingEmail, PdfAttachment},
    side_effects::SideEffects,
};
use crate::{
    ledger::approval::Decision,
    models::{
        auth::User,
        invoice::{InvoiceDetail, InvoiceStatus},
        quotation::{Quotation, QuotationDetail},
        receipt::ReceiptView,
    },
};

pub fn payment_method_label(method: &str) -> &str {
    match method {
        "cash" => "เงินสด",
        "transfer" => "โอนเงิน",
        "credit_card" => "บัตรเครดิต",
        "promptpay" => "พร้อมเพย์",
        "mobile_banking" => "Mobile Banking",
        "e_wallet" => "E-Wallet",
        "check" => "เช็ค",
        other => other,
    }
}

fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn layout(company_name: &str, heading: &str, rows: &[(&str, String)], footer: Option<&str>) -> String {
    let rows_html: String = rows
        .iter()
        .map(|(label, value)| {
            format!(
                "<tr><td style=\"padding:4px 12px 4px 0;color:#6b7280\">{}</td><td style=\"padding:4px 0\"><strong>{}</strong></td></tr>",
                label,
                escape_html(value)
            )
        })
        .collect();
    let footer_html = footer.map(|f| format!("<p>{}</p>", f)).unwrap_or_default();

    format!(
        "<!DOCTYPE html><html><head><meta charset=\"UTF-8\"></head>\
         <body style=\"font-family:Arial,sans-serif;color:#111827\">\
         <h2>{}</h2><table>{}</table>{}\
         <p style=\"color:#9ca3af;font-size:12px\">{}</p></body></html>",
        escape_html(heading),
        rows_html,
        footer_html,
        escape_html(company_name)
    )
}

fn baht(value: Decimal) -> String {
    format!("฿{}", format_money(value))
}

// =============================================================================
//  MENSAGENS
// =============================================================================

pub fn quotation_created_email(owner: &str, company_name: &str, detail: &QuotationDetail) -> OutgoingEmail {
    let q = &detail.header;
    let link = link_html(&detail.approval_url);
    OutgoingEmail {
        to: owner.to_string(),
        subject: format!("📝 สร้างใบเสนอราคาใหม่ #{}", q.quotation_no),
        html: layout(
            company_name,
            "ใบเสนอราคาใหม่",
            &[
                ("เลขที่", q.quotation_no.clone()),
                ("ลูกค้า", q.customer_name.clone()),
                ("ยอดรวม", baht(q.total)),
            ],
            Some(&link),
        ),
        attachment: None,
    }
}

pub fn quotation_decided_email(owner: &str, company_name: &str, quotation: &Quotation, decision: Decision) -> OutgoingEmail {
    let (subject, heading, notes_label) = match decision {
        Decision::Approve => (
            format!("🎉 ลูกค้าอนุมัติใบเสนอราคา #{}", quotation.quotation_no),
            "ลูกค้าอนุมัติใบเสนอราคาแล้ว",
            "หมายเหตุ",
        ),
        Decision::Reject => (
            format!("❌ ลูกค้าปฏิเสธใบเสนอราคา #{}", quotation.quotation_no),
            "ลูกค้าปฏิเสธใบเสนอราคา",
            "เหตุผล",
        ),
    };

    let mut rows = vec![
        ("เลขที่", quotation.quotation_no.clone()),
        ("ลูกค้า", quotation.customer_name.clone()),
        ("ยอดรวม", baht(quotation.total)),
    ];
    if let Some(notes) = &quotation.approval_notes {
        rows.push((notes_label, notes.clone()));
    }

    OutgoingEmail {
        to: owner.to_string(),
        subject,
        html: layout(company_name, heading, &rows, None),
        attachment: None,
    }
}

pub fn invoice_to_customer_email(to: &str, company_name: &str, detail: &InvoiceDetail) -> OutgoingEmail {
    let inv = &detail.header;
    let mut rows = vec![
        ("เลขที่", inv.invoice_no.clone()),
        ("ยอดรวม", baht(inv.total)),
        ("ยอดค้างชำระ", baht(inv.remaining_amount)),
    ];
    if let Some(due) = inv.due_date {
        rows.push(("ครบกำหนดชำระ", due.format("%d/%m/%Y").to_string()));
    }
    OutgoingEmail {
        to: to.to_string(),
        subject: format!("ใบแจ้งหนี้ #{} จาก {}", inv.invoice_no, company_name),
        html: layout(company_name, &format!("เรียน {}", inv.customer_name), &rows, None),
        attachment: None,
    }
}

pub fn invoice_converted_owner_email(owner: &str, company_name: &str, detail: &InvoiceDetail) -> OutgoingEmail {
    let inv = &detail.header;
    let source = detail
        .quotation
        .as_ref()
        .map(|q| q.quotation_no.clone())
        .unwrap_or_else(|| "-".to_string());
    OutgoingEmail {
        to: owner.to_string(),
        subject: format!("📄 แปลงใบเสนอราคาเป็นใบแจ้งหนี้ #{}", inv.invoice_no),
        html: layout(
            company_name,
            "สร้างใบแจ้งหนี้จากใบเสนอราคา",
            &[
                ("ใบเสนอราคา", source),
                ("ใบแจ้งหนี้", inv.invoice_no.clone()),
                ("ลูกค้า", inv.customer_name.clone()),
                ("ยอดรวม", baht(inv.total)),
            ],
            None,
        ),
        attachment: None,
    }
}

pub fn payment_received_email(owner: &str, company_name: &str, receipt: &ReceiptView) -> OutgoingEmail {
    let r = &receipt.receipt;
    OutgoingEmail {
        to: owner.to_string(),
        subject: format!("💰 ได้รับชำระเงิน {} ({})", baht(r.amount), receipt.invoice_no),
        html: layout(
            company_name,
            "ได้รับชำระเงิน",
            &[
                ("ใบแจ้งหนี้", receipt.invoice_no.clone()),
                ("ใบเสร็จ", r.receipt_no.clone()),
                ("ลูกค้า", receipt.customer_name.clone()),
                ("จำนวนเงิน", baht(r.amount)),
                ("วิธีชำระ", payment_method_label(&r.payment_method).to_string()),
                ("คงเหลือ", baht(receipt.invoice_remaining)),
                ("ผู้รับเงิน", receipt.issued_by_name.clone()),
            ],
            None,
        ),
        attachment: None,
    }
}

pub fn fully_paid_email(owner: &str, company_name: &str, detail: &InvoiceDetail) -> OutgoingEmail {
    let inv = &detail.header;
    OutgoingEmail {
        to: owner.to_string(),
        subject: format!("✅ ใบแจ้งหนี้ #{} ชำระครบแล้ว", inv.invoice_no),
        html: layout(
            company_name,
            "ชำระเงินครบถ้วน",
            &[
                ("ใบแจ้งหนี้", inv.invoice_no.clone()),
                ("ลูกค้า", inv.customer_name.clone()),
                ("ยอดรวม", baht(inv.total)),
                ("ชำระแล้ว", baht(inv.paid_amount)),
            ],
            None,
        ),
        attachment: None,
    }
}

pub fn receipt_to_customer_email(to: &str, company_name: &str, receipt: &ReceiptView) -> OutgoingEmail {
    let r = &receipt.receipt;
    OutgoingEmail {
        to: to.to_string(),
        subject: format!("ใบเสร็จรับเงิน #{} - ขอบคุณที่ใช้บริการ", r.receipt_no),
        html: layout(
            company_name,
            &format!("เรียน {}", receipt.customer_name),
            &[
                ("ใบเสร็จ", r.receipt_no.clone()),
                ("ใบแจ้งหนี้", receipt.invoice_no.clone()),
                ("จำนวนเงิน", baht(r.amount)),
                ("วิธีชำระ", payment_method_label(&r.payment_method).to_string()),
                ("คงเหลือ", baht(receipt.invoice_remaining)),
            ],
            None,
        ),
        attachment: None,
    }
}

fn link_html(link: &str) -> String {
    format!("<a href=\"{0}\">{0}</a>", escape_html(link))
}

pub fn password_reset_email(to: &str, name: &str, company_name: &str, link: &str) -> OutgoingEmail {
    let footer = format!("{}<br>ลิงก์นี้ใช้ได้ 1 ชั่วโมง และใช้ได้ครั้งเดียว", link_html(link));
    OutgoingEmail {
        to: to.to_string(),
        subject: format!("🔑 รีเซ็ตรหัสผ่าน - {}", company_name),
        html: layout(
            company_name,
            &format!("สวัสดี {}", name),
            &[("คำขอ", "รีเซ็ตรหัสผ่าน".to_string())],
            Some(&footer),
        ),
        attachment: None,
    }
}

pub fn email_verification_email(to: &str, name: &str, company_name: &str, link: &str) -> OutgoingEmail {
    let footer = format!("{}<br>ลิงก์นี้ใช้ได้ 24 ชั่วโมง", link_html(link));
    OutgoingEmail {
        to: to.to_string(),
        subject: format!("✉️ ยืนยันอีเมลของคุณ - {}", company_name),
        html: layout(
            company_name,
            &format!("สวัสดี {}", name),
            &[("อีเมล", to.to_string())],
            Some(&footer),
        ),
        attachment: None,
    }
}

// =============================================================================
//  DISPARO
// =============================================================================

#[derive(Clone)]
pub struct NotificationService {
    notifier: Arc<dyn Notifier>,
    renderer: PdfRenderer,
    side_effects: SideEffects,
    owner_email: Option<String>,
    company_name: String,
}

impl NotificationService {
    pub fn new(
        notifier: Arc<dyn Notifier>,
        renderer: PdfRenderer,
        side_effects: SideEffects,
        owner_email: Option<String>,
        company_name: String,
    ) -> Self {
        Self {
            notifier,
            renderer,
            side_effects,
            owner_email,
            company_name,
        }
    }

    fn send(&self, label: &'static str, email: OutgoingEmail) {
        let notifier = self.notifier.clone();
        self.side_effects.spawn(label, async move { notifier.send(email).await });
    }

    /// Renderiza o PDF e envia; se o PDF falhar, o e-mail segue sem anexo.
    fn send_with_pdf(&self, label: &'static str, mut email: OutgoingEmail, document: PrintableDocument) {
        let notifier = self.notifier.clone();
        let renderer = self.renderer.clone();
        self.side_effects.spawn(label, async move {
            let filename = document.filename();
            match renderer.render(document).await {
                Ok(bytes) => email.attachment = Some(PdfAttachment { filename, bytes }),
                Err(e) => tracing::warn!(label, error = %e, "PDF não anexado"),
            }
            notifier.send(email).await
        });
    }

    pub fn quotation_created(&self, detail: &QuotationDetail) {
        if let Some(owner) = &self.owner_email {
            self.send("quotation_created", quotation_created_email(owner, &self.company_name, detail));
        }
    }

    pub fn quotation_decided(&self, quotation: &Quotation, decision: Decision) {
        if let Some(owner) = &self.owner_email {
            self.send(
                "quotation_decided",
                quotation_decided_email(owner, &self.company_name, quotation, decision),
            );
        }
    }

    pub fn invoice_converted(&self, detail: &InvoiceDetail) {
        if let Some(to) = &detail.header.customer_email {
            self.send_with_pdf(
                "invoice_to_customer",
                invoice_to_customer_email(to, &self.company_name, detail),
                PrintableDocument::from_invoice(detail),
            );
        }
        if let Some(owner) = &self.owner_email {
            self.send(
                "invoice_converted",
                invoice_converted_owner_email(owner, &self.company_name, detail),
            );
        }
    }

    pub fn password_reset(&self, user: &User, link: &str) {
        self.send(
            "password_reset",
            password_reset_email(&user.email, &user.name, &self.company_name, link),
        );
    }

    pub fn email_verification(&self, user: &User, link: &str) {
        self.send(
            "email_verification",
            email_verification_email(&user.email, &user.name, &self.company_name, link),
        );
    }

    pub fn payment_recorded(&self, invoice: &InvoiceDetail, receipt: &ReceiptView) {
        if let Some(owner) = &self.owner_email {
            self.send("payment_received", payment_received_email(owner, &self.company_name, receipt));
            if invoice.header.status == InvoiceStatus::Paid {
                self.send("invoice_fully_paid", fully_paid_email(owner, &self.company_name, invoice));
            }
        }
        if let Some(to) = &receipt.customer_email {
            self.send_with_pdf(
                "receipt_to_customer",
                receipt_to_customer_email(to, &self.company_name, receipt),
                PrintableDocument::from_receipt(receipt),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{invoice::Invoice, receipt::Receipt},
        services::notifier::LogNotifier,
    };
    use chrono::Utc;
    use std::time::Duration;
    use uuid::Uuid;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn invoice(status: InvoiceStatus, email: Option<&str>) -> InvoiceDetail {
        let now = Utc::now();
        InvoiceDetail {
            header: Invoice {
                id: Uuid::new_v4(),
                invoice_no: "INV2568010001".into(),
                quotation_id: None,
                customer_id: None,
                customer_name: "ACME <script>".into(),
                customer_phone: None,
                customer_address: None,
                customer_email: email.map(str::to_string),
                subtotal: d("2500"),
                discount: d("0"),
                vat: d("7"),
                vat_amount: d("175.00"),
                total: d("2675.00"),
                paid_amount: d("2675.00"),
                remaining_amount: d("0.00"),
                status,
                paid_date: None,
                due_date: None,
                notes: None,
                created_at: now,
                updated_at: now,
            },
            quotation: None,
            items: vec![],
            images: vec![],
            signatures: vec![],
            payments: vec![],
        }
    }

    fn receipt(email: Option<&str>) -> ReceiptView {
        ReceiptView {
            receipt: Receipt {
                id: Uuid::new_v4(),
                receipt_no: "REC2568010002".into(),
                invoice_id: Uuid::new_v4(),
                payment_id: Uuid::new_v4(),
                user_id: Uuid::new_v4(),
                amount: d("1675.00"),
                payment_method: "transfer".into(),
                notes: None,
                created_at: Utc::now(),
            },
            invoice_no: "INV2568010001".into(),
            customer_name: "ACME".into(),
            customer_phone: None,
            customer_address: None,
            customer_email: email.map(str::to_string),
            invoice_total: d("2675.00"),
            invoice_remaining: d("0.00"),
            issued_by_name: "Owner".into(),
            issued_by_email: "owner@example.com".into(),
        }
    }

    fn service(notifier: Arc<LogNotifier>, owner: Option<&str>, effects: SideEffects) -> NotificationService {
        NotificationService::new(
            notifier,
            PdfRenderer::disabled("Test Co".into()),
            effects,
            owner.map(str::to_string),
            "Test Co".into(),
        )
    }

    #[test]
    fn payment_methods_have_thai_labels() {
        assert_eq!(payment_method_label("transfer"), "โอนเงิน");
        assert_eq!(payment_method_label("crypto"), "crypto");
    }

    #[test]
    fn receipt_email_mentions_amount_and_escapes_names() {
        let email = receipt_to_customer_email("acme@example.com", "Test Co", &receipt(None));
        assert_eq!(email.subject, "ใบเสร็จรับเงิน #REC2568010002 - ขอบคุณที่ใช้บริการ");
        assert!(email.html.contains("฿1675.00"));

        let email = fully_paid_email("owner@example.com", "Test Co", &invoice(InvoiceStatus::Paid, None));
        assert!(email.html.contains("ACME &lt;script&gt;"));
        assert!(!email.html.contains("<script>"));
    }

    #[tokio::test]
    async fn final_payment_notifies_owner_twice_and_customer_once() {
        let notifier = Arc::new(LogNotifier::new());
        let effects = SideEffects::new();
        let notifications = service(notifier.clone(), Some("owner@example.com"), effects.clone());

        notifications.payment_recorded(&invoice(InvoiceStatus::Paid, None), &receipt(Some("acme@example.com")));
        effects.shutdown(Duration::from_secs(5)).await;

        // recebido + quitado (dono) + recibo (cliente, sem PDF pois não há fontes)
        assert_eq!(notifier.sent_count(), 3);
    }

    #[test]
    fn account_emails_carry_the_escaped_link() {
        let email = password_reset_email(
            "owner@example.com",
            "Owner",
            "Test Co",
            "http://localhost:5173/reset-password/abc?x=1&y=2",
        );
        assert_eq!(email.to, "owner@example.com");
        assert!(email.html.contains("reset-password/abc?x=1&amp;y=2"));

        let email = email_verification_email("owner@example.com", "<b>Owner</b>", "Test Co", "http://x/verify-email/t");
        assert!(email.html.contains("verify-email/t"));
        assert!(email.html.contains("&lt;b&gt;Owner"));
    }

    #[tokio::test]
    async fn account_emails_go_to_the_user_even_without_owner() {
        let notifier = Arc::new(LogNotifier::new());
        let effects = SideEffects::new();
        let notifications = service(notifier.clone(), None, effects.clone());
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: "somchai@example.com".into(),
            name: "Somchai".into(),
            password_hash: "x".into(),
            role: crate::models::auth::UserRole::User,
            email_verified: false,
            email_verified_at: None,
            created_at: now,
            updated_at: now,
        };

        notifications.password_reset(&user, "http://x/reset-password/t");
        notifications.email_verification(&user, "http://x/verify-email/t");
        effects.shutdown(Duration::from_secs(5)).await;

        assert_eq!(notifier.sent_count(), 2);
    }

    #[tokio::test]
    async fn nothing_is_sent_without_addresses() {
        let notifier = Arc::new(LogNotifier::new());
        let effects = SideEffects::new();
        let notifications = service(notifier.clone(), None, effects.clone());

        notifications.payment_recorded(&invoice(InvoiceStatus::Partial, None), &receipt(None));
        notifications.invoice_converted(&invoice(InvoiceStatus::Unpaid, None));
        effects.shutdown(Duration::from_secs(5)).await;

        assert_eq!(notifier.sent_count(), 0);
    }
}
