// src/services/document_service.rs
//
// Geração de PDF (genpdf). As fontes são carregadas uma vez na subida;
// sem fontes o servidor sobe normalmente e só o PDF fica indisponível.

use std::{path::Path, sync::Arc};

use chrono::{DateTime, NaiveDate, Utc};
use genpdf::{
    elements,
    fonts::{FontData, FontFamily},
    style, Alignment, Element,
};
use image::Luma;
use qrcode::QrCode;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::{
    document::{CustomerSnapshot, DocumentItem},
    invoice::InvoiceDetail,
    quotation::QuotationDetail,
    receipt::ReceiptView,
};

const FONT_FAMILY: &str = "Roboto";

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("fontes indisponíveis: {0}")]
    FontsUnavailable(String),

    #[error("falha ao montar o layout: {0}")]
    Layout(String),

    #[error("falha ao gerar o QR code: {0}")]
    QrCode(String),

    #[error("tarefa de renderização abortada: {0}")]
    Task(String),
}

impl From<genpdf::error::Error> for RenderError {
    fn from(e: genpdf::error::Error) -> Self {
        RenderError::Layout(e.to_string())
    }
}

// =============================================================================
//  SNAPSHOT IMPRIMÍVEL
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct PrintLine {
    pub name: String,
    pub description: Option<String>,
    pub quantity: i32,
    pub price: Decimal,
    pub total: Decimal,
}

/// Tudo o que vai para o papel, já desacoplado das linhas do banco.
#[derive(Debug, Clone, PartialEq)]
pub struct PrintableDocument {
    pub title: &'static str,
    pub number: String,
    pub issued_at: DateTime<Utc>,
    pub customer: CustomerSnapshot,
    /// Linhas extras do cabeçalho ("Due date: ...", "Invoice: ...").
    pub facts: Vec<String>,
    pub lines: Vec<PrintLine>,
    pub summary: Vec<(String, Decimal)>,
    pub notes: Option<String>,
    /// Link impresso como QR code no rodapé.
    pub qr_link: Option<String>,
}

impl PrintableDocument {
    pub fn filename(&self) -> String {
        format!("{}.pdf", self.number)
    }

    pub fn from_quotation(detail: &QuotationDetail) -> Self {
        let q = &detail.header;
        let mut facts = Vec::new();
        if let Some(valid_until) = q.valid_until {
            facts.push(format!("Valid until: {}", format_date(valid_until)));
        }
        facts.push(format!("Status: {:?}", q.status));

        Self {
            title: "QUOTATION",
            number: q.quotation_no.clone(),
            issued_at: q.created_at,
            customer: CustomerSnapshot {
                name: q.customer_name.clone(),
                phone: q.customer_phone.clone(),
                address: q.customer_address.clone(),
                email: q.customer_email.clone(),
            },
            facts,
            lines: print_lines(&detail.items),
            summary: money_summary(q.subtotal, q.discount, q.vat, q.vat_amount, q.total),
            notes: q.notes.clone(),
            qr_link: Some(detail.approval_url.clone()),
        }
    }

    pub fn from_invoice(detail: &InvoiceDetail) -> Self {
        let inv = &detail.header;
        let mut facts = Vec::new();
        if let Some(quotation) = &detail.quotation {
            facts.push(format!("Quotation: {}", quotation.quotation_no));
        }
        if let Some(due_date) = inv.due_date {
            facts.push(format!("Due date: {}", format_date(due_date)));
        }
        facts.push(format!("Status: {:?}", inv.status));

        let mut summary = money_summary(inv.subtotal, inv.discount, inv.vat, inv.vat_amount, inv.total);
        summary.push(("Paid".to_string(), inv.paid_amount));
        summary.push(("Remaining".to_string(), inv.remaining_amount));

        Self {
            title: "INVOICE",
            number: inv.invoice_no.clone(),
            issued_at: inv.created_at,
            customer: CustomerSnapshot {
                name: inv.customer_name.clone(),
                phone: inv.customer_phone.clone(),
                address: inv.customer_address.clone(),
                email: inv.customer_email.clone(),
            },
            facts,
            lines: print_lines(&detail.items),
            summary,
            notes: inv.notes.clone(),
            qr_link: None,
        }
    }

    pub fn from_receipt(view: &ReceiptView) -> Self {
        let r = &view.receipt;
        Self {
            title: "RECEIPT",
            number: r.receipt_no.clone(),
            issued_at: r.created_at,
            customer: CustomerSnapshot {
                name: view.customer_name.clone(),
                phone: view.customer_phone.clone(),
                address: view.customer_address.clone(),
                email: view.customer_email.clone(),
            },
            facts: vec![
                format!("Invoice: {}", view.invoice_no),
                format!("Payment method: {}", r.payment_method),
                format!("Issued by: {}", view.issued_by_name),
            ],
            lines: Vec::new(),
            summary: vec![
                ("Invoice total".to_string(), view.invoice_total),
                ("Amount received".to_string(), r.amount),
                ("Remaining".to_string(), view.invoice_remaining),
            ],
            notes: r.notes.clone(),
            qr_link: None,
        }
    }
}

fn print_lines(items: &[DocumentItem]) -> Vec<PrintLine> {
    items
        .iter()
        .map(|item| PrintLine {
            name: item.product_name.clone(),
            description: item.description.clone(),
            quantity: item.quantity,
            price: item.price,
            total: item.total,
        })
        .collect()
}

fn money_summary(
    subtotal: Decimal,
    discount: Decimal,
    vat: Decimal,
    vat_amount: Decimal,
    total: Decimal,
) -> Vec<(String, Decimal)> {
    let mut summary = vec![("Subtotal".to_string(), subtotal)];
    if discount > Decimal::ZERO {
        summary.push(("Discount".to_string(), discount));
    }
    summary.push((format!("VAT {}%", vat.normalize()), vat_amount));
    summary.push(("Total".to_string(), total));
    summary
}

fn format_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

pub fn format_money(value: Decimal) -> String {
    format!("{:.2}", value)
}

// =============================================================================
//  RENDERIZADOR
// =============================================================================

#[derive(Clone)]
pub struct PdfRenderer {
    fonts: Option<Arc<FontFamily<FontData>>>,
    company_name: String,
}

impl PdfRenderer {
    pub fn new(font_dir: &Path, company_name: String) -> Self {
        let fonts = match genpdf::fonts::from_files(font_dir, FONT_FAMILY, None) {
            Ok(family) => {
                tracing::info!("✅ Fontes de PDF carregadas de {}", font_dir.display());
                Some(Arc::new(family))
            }
            Err(e) => {
                tracing::warn!(
                    "⚠️ Fontes {} não encontradas em {} ({}); PDFs desabilitados",
                    FONT_FAMILY,
                    font_dir.display(),
                    e
                );
                None
            }
        };
        Self { fonts, company_name }
    }

    /// Renderizador sem fontes.
    #[cfg(test)]
    pub fn disabled(company_name: String) -> Self {
        Self {
            fonts: None,
            company_name,
        }
    }

    #[cfg(test)]
    pub fn is_available(&self) -> bool {
        self.fonts.is_some()
    }

    pub async fn render(&self, document: PrintableDocument) -> Result<Vec<u8>, RenderError> {
        let fonts = self
            .fonts
            .clone()
            .ok_or_else(|| RenderError::FontsUnavailable(FONT_FAMILY.to_string()))?;
        let company_name = self.company_name.clone();

        // Layout e rasterização do QR são CPU puro
        tokio::task::spawn_blocking(move || layout(&document, (*fonts).clone(), &company_name))
            .await
            .map_err(|e| RenderError::Task(e.to_string()))?
    }
}

fn layout(
    document: &PrintableDocument,
    fonts: FontFamily<FontData>,
    company_name: &str,
) -> Result<Vec<u8>, RenderError> {
    let mut doc = genpdf::Document::new(fonts);
    doc.set_title(format!("{} {}", document.title, document.number));
    let mut decorator = genpdf::SimplePageDecorator::new();
    decorator.set_margins(10);
    doc.set_page_decorator(decorator);

    // --- CABEÇALHO ---
    doc.push(elements::Paragraph::new(company_name).styled(style::Style::new().bold().with_font_size(18)));
    doc.push(elements::Break::new(1.5));
    doc.push(
        elements::Paragraph::new(format!("{} #{}", document.title, document.number))
            .styled(style::Style::new().bold().with_font_size(14)),
    );
    doc.push(elements::Paragraph::new(format!(
        "Date: {}",
        document.issued_at.format("%d/%m/%Y")
    )));
    for fact in &document.facts {
        doc.push(elements::Paragraph::new(fact.as_str()));
    }

    doc.push(elements::Break::new(1));
    doc.push(elements::Paragraph::new(format!("Customer: {}", document.customer.name)).styled(style::Style::new().bold()));
    let contact = [&document.customer.address, &document.customer.phone, &document.customer.email];
    for line in contact.into_iter().flatten() {
        doc.push(elements::Paragraph::new(line.as_str()).styled(style::Style::new().with_font_size(10)));
    }
    doc.push(elements::Break::new(2));

    // --- ITENS ---
    if !document.lines.is_empty() {
        let mut table = elements::TableLayout::new(vec![4, 1, 2, 2]);
        table.set_cell_decorator(elements::FrameCellDecorator::new(true, true, false));

        let bold = style::Style::new().bold();
        table
            .row()
            .element(elements::Paragraph::new("Item").styled(bold))
            .element(elements::Paragraph::new("Qty").styled(bold))
            .element(elements::Paragraph::new("Price").styled(bold))
            .element(elements::Paragraph::new("Amount").styled(bold))
            .push()?;

        for line in &document.lines {
            let name = match &line.description {
                Some(description) if !description.trim().is_empty() => {
                    format!("{} ({})", line.name, description.trim())
                }
                _ => line.name.clone(),
            };
            table
                .row()
                .element(elements::Paragraph::new(name))
                .element(elements::Paragraph::new(line.quantity.to_string()))
                .element(elements::Paragraph::new(format_money(line.price)))
                .element(elements::Paragraph::new(format_money(line.total)))
                .push()?;
        }

        doc.push(table);
        doc.push(elements::Break::new(2));
    }

    // --- TOTAIS ---
    for (index, (label, value)) in document.summary.iter().enumerate() {
        let mut paragraph = elements::Paragraph::new(format!("{}: {}", label, format_money(*value)));
        paragraph.set_alignment(Alignment::Right);
        let last = index + 1 == document.summary.len();
        let style = if last {
            style::Style::new().bold().with_font_size(12)
        } else {
            style::Style::new()
        };
        doc.push(paragraph.styled(style));
    }

    if let Some(notes) = &document.notes {
        doc.push(elements::Break::new(2));
        doc.push(elements::Paragraph::new(format!("Notes: {}", notes)).styled(style::Style::new().italic().with_font_size(9)));
    }

    // --- QR CODE (link de aprovação) ---
    if let Some(link) = &document.qr_link {
        doc.push(elements::Break::new(2));
        doc.push(elements::Paragraph::new("Scan to review and approve").styled(style::Style::new().bold()));

        let code = QrCode::new(link.as_bytes()).map_err(|e| RenderError::QrCode(e.to_string()))?;
        let image_buffer = code.render::<Luma<u8>>().build();
        let dynamic_image = image::DynamicImage::ImageLuma8(image_buffer);
        let pdf_image = elements::Image::from_dynamic_image(dynamic_image)?.with_scale(genpdf::Scale::new(0.5, 0.5));
        doc.push(pdf_image);
        doc.push(elements::Paragraph::new(link.as_str()).styled(style::Style::new().with_font_size(8)));
    }

    let mut buffer = Vec::new();
    doc.render(&mut buffer)?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        invoice::{Invoice, InvoiceStatus, QuotationRef},
        quotation::{ApprovalStatus, Quotation, QuotationStatus},
        receipt::Receipt,
    };
    use uuid::Uuid;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn item(name: &str, quantity: i32, price: &str) -> DocumentItem {
        DocumentItem {
            id: Uuid::new_v4(),
            document_id: Uuid::new_v4(),
            product_id: None,
            product_name: name.to_string(),
            description: None,
            quantity,
            price: d(price),
            total: d(price) * Decimal::from(quantity),
            position: 0,
        }
    }

    fn quotation_detail() -> QuotationDetail {
        let now = Utc::now();
        QuotationDetail {
            header: Quotation {
                id: Uuid::new_v4(),
                quotation_no: "QT2568010001".into(),
                customer_id: None,
                customer_name: "ACME".into(),
                customer_phone: Some("0812345678".into()),
                customer_address: None,
                customer_email: None,
                subtotal: d("2500"),
                discount: d("0"),
                vat: d("7.00"),
                vat_amount: d("175.00"),
                total: d("2675.00"),
                status: QuotationStatus::Pending,
                approval_token: "abc".into(),
                approval_status: ApprovalStatus::Pending,
                approval_notes: None,
                decided_at: None,
                valid_until: NaiveDate::from_ymd_opt(2025, 2, 1),
                notes: None,
                created_at: now,
                updated_at: now,
            },
            approval_url: "http://localhost:5173/public/quotations/abc".into(),
            items: vec![item("Camera", 2, "1000"), item("Install", 1, "500")],
            images: vec![],
            signatures: vec![],
            invoice: None,
        }
    }

    #[test]
    fn quotation_snapshot_carries_totals_and_approval_link() {
        let doc = PrintableDocument::from_quotation(&quotation_detail());

        assert_eq!(doc.filename(), "QT2568010001.pdf");
        assert_eq!(doc.lines.len(), 2);
        assert_eq!(doc.qr_link.as_deref(), Some("http://localhost:5173/public/quotations/abc"));
        assert!(doc.facts.iter().any(|f| f == "Valid until: 01/02/2025"));

        // Sem desconto a linha não aparece
        let labels: Vec<&str> = doc.summary.iter().map(|(l, _)| l.as_str()).collect();
        assert_eq!(labels, vec!["Subtotal", "VAT 7%", "Total"]);
        assert_eq!(doc.summary.last().unwrap().1, d("2675.00"));
    }

    #[test]
    fn invoice_snapshot_includes_balance() {
        let q = quotation_detail();
        let now = Utc::now();
        let detail = InvoiceDetail {
            header: Invoice {
                id: Uuid::new_v4(),
                invoice_no: "INV2568010001".into(),
                quotation_id: Some(q.header.id),
                customer_id: None,
                customer_name: "ACME".into(),
                customer_phone: None,
                customer_address: None,
                customer_email: None,
                subtotal: d("2500"),
                discount: d("100"),
                vat: d("7"),
                vat_amount: d("168.00"),
                total: d("2568.00"),
                paid_amount: d("1000"),
                remaining_amount: d("1568.00"),
                status: InvoiceStatus::Partial,
                paid_date: None,
                due_date: None,
                notes: Some("net 30".into()),
                created_at: now,
                updated_at: now,
            },
            quotation: Some(QuotationRef {
                id: q.header.id,
                quotation_no: "QT2568010001".into(),
            }),
            items: q.items.clone(),
            images: vec![],
            signatures: vec![],
            payments: vec![],
        };

        let doc = PrintableDocument::from_invoice(&detail);
        assert_eq!(doc.title, "INVOICE");
        assert!(doc.qr_link.is_none());
        assert!(doc.facts.contains(&"Quotation: QT2568010001".to_string()));
        let labels: Vec<&str> = doc.summary.iter().map(|(l, _)| l.as_str()).collect();
        assert_eq!(labels, vec!["Subtotal", "Discount", "VAT 7%", "Total", "Paid", "Remaining"]);
    }

    #[test]
    fn receipt_snapshot_has_no_item_table() {
        let view = ReceiptView {
            receipt: Receipt {
                id: Uuid::new_v4(),
                receipt_no: "REC2568010001".into(),
                invoice_id: Uuid::new_v4(),
                payment_id: Uuid::new_v4(),
                user_id: Uuid::new_v4(),
                amount: d("1000"),
                payment_method: "transfer".into(),
                notes: None,
                created_at: Utc::now(),
            },
            invoice_no: "INV2568010001".into(),
            customer_name: "ACME".into(),
            customer_phone: None,
            customer_address: None,
            customer_email: Some("acme@example.com".into()),
            invoice_total: d("2675.00"),
            invoice_remaining: d("1675.00"),
            issued_by_name: "Owner".into(),
            issued_by_email: "owner@example.com".into(),
        };

        let doc = PrintableDocument::from_receipt(&view);
        assert!(doc.lines.is_empty());
        assert_eq!(doc.summary[1], ("Amount received".to_string(), d("1000")));
        assert!(doc.facts.contains(&"Payment method: transfer".to_string()));
    }

    #[test]
    fn money_is_printed_with_two_decimals() {
        assert_eq!(format_money(d("2675")), "2675.00");
        assert_eq!(format_money(d("0.5")), "0.50");
    }

    #[tokio::test]
    async fn rendering_without_fonts_fails_cleanly() {
        let renderer = PdfRenderer::disabled("Test Co".into());
        assert!(!renderer.is_available());

        let err = renderer
            .render(PrintableDocument::from_quotation(&quotation_detail()))
            .await
            .unwrap_err();
        assert!(matches!(err, RenderError::FontsUnavailable(_)));
    }
}
