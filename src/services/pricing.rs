// src/services/pricing.rs
//
// Cálculo de totais na criação e na edição de orçamentos/faturas.

use rust_decimal::Decimal;

use crate::{
    common::error::AppError,
    ledger::{
        totals::{compute_totals, LineItemDraft, PricedDocument},
        OverflowPolicy,
    },
    models::document::{DocumentItem, LineItemPayload},
};

pub fn price_new(
    items: Vec<LineItemPayload>,
    discount: Option<Decimal>,
    vat_percent: Option<Decimal>,
    policy: OverflowPolicy,
) -> Result<PricedDocument, AppError> {
    let drafts = items.into_iter().map(LineItemDraft::from).collect();
    Ok(compute_totals(drafts, discount, vat_percent, policy)?)
}

/// Itens, desconto ou IVA enviados na edição obrigam a recalcular tudo.
pub fn needs_reprice(items: Option<&[LineItemPayload]>, discount: Option<Decimal>, vat_percent: Option<Decimal>) -> bool {
    items.is_some() || discount.is_some() || vat_percent.is_some()
}

/// Recalcula usando o que veio na edição e, no que faltar, o que está gravado.
pub fn reprice(
    stored_items: Vec<DocumentItem>,
    new_items: Option<Vec<LineItemPayload>>,
    stored_discount: Decimal,
    discount: Option<Decimal>,
    stored_vat: Decimal,
    vat_percent: Option<Decimal>,
    policy: OverflowPolicy,
) -> Result<PricedDocument, AppError> {
    let drafts: Vec<LineItemDraft> = match new_items {
        Some(items) => items.into_iter().map(LineItemDraft::from).collect(),
        None => stored_items.into_iter().map(LineItemDraft::from).collect(),
    };
    Ok(compute_totals(
        drafts,
        Some(discount.unwrap_or(stored_discount)),
        Some(vat_percent.unwrap_or(stored_vat)),
        policy,
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::LedgerError;
    use uuid::Uuid;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn payload(name: &str, quantity: i32, price: &str) -> LineItemPayload {
        LineItemPayload {
            product_id: None,
            product_name: name.into(),
            description: None,
            quantity,
            price: d(price),
        }
    }

    fn stored(name: &str, quantity: i32, price: &str) -> DocumentItem {
        DocumentItem {
            id: Uuid::new_v4(),
            document_id: Uuid::new_v4(),
            product_id: None,
            product_name: name.into(),
            description: None,
            quantity,
            price: d(price),
            total: d(price) * Decimal::from(quantity),
            position: 0,
        }
    }

    #[test]
    fn new_document_uses_default_vat() {
        let priced = price_new(
            vec![payload("Camera", 2, "1000"), payload("Install", 1, "500")],
            None,
            None,
            OverflowPolicy::Allow,
        )
        .unwrap();
        assert_eq!(priced.totals.subtotal, d("2500"));
        assert_eq!(priced.totals.vat_amount, d("175.00"));
        assert_eq!(priced.totals.total, d("2675.00"));
    }

    #[test]
    fn empty_items_are_rejected() {
        let err = price_new(vec![], None, None, OverflowPolicy::Allow).unwrap_err();
        assert!(matches!(err, AppError::Ledger(LedgerError::EmptyItems)));
    }

    #[test]
    fn discount_only_edit_reuses_stored_items_and_vat() {
        let priced = reprice(
            vec![stored("Camera", 2, "1000"), stored("Install", 1, "500")],
            None,
            d("0"),
            Some(d("500")),
            d("7"),
            None,
            OverflowPolicy::Allow,
        )
        .unwrap();
        assert_eq!(priced.lines.len(), 2);
        assert_eq!(priced.totals.discount_amount, d("500"));
        assert_eq!(priced.totals.vat_amount, d("140.00"));
        assert_eq!(priced.totals.total, d("2140.00"));
    }

    #[test]
    fn new_items_replace_stored_ones() {
        let priced = reprice(
            vec![stored("Camera", 2, "1000")],
            Some(vec![payload("Cable", 10, "25")]),
            d("0"),
            None,
            d("0"),
            None,
            OverflowPolicy::Allow,
        )
        .unwrap();
        assert_eq!(priced.lines.len(), 1);
        assert_eq!(priced.totals.total, d("250"));
    }

    #[test]
    fn stored_line_totals_match_quantity_times_price() {
        // 3 x 0.333 seria gravado como 3 x 0.33; o preço é recusado antes
        let err = price_new(vec![payload("Parafuso", 3, "0.333")], None, None, OverflowPolicy::Allow).unwrap_err();
        assert!(matches!(err, AppError::Ledger(LedgerError::TooManyDecimals)));

        let priced = price_new(vec![payload("Parafuso", 3, "0.33")], Some(d("0")), None, OverflowPolicy::Allow).unwrap();
        let stored_items: Vec<DocumentItem> = priced
            .lines
            .iter()
            .map(|l| stored(&l.draft.name, l.draft.quantity, &l.draft.unit_price.to_string()))
            .collect();
        assert_eq!(stored_items[0].total, priced.lines[0].line_total);

        // edição só do desconto mantém o subtotal
        let repriced = reprice(stored_items, None, d("0"), Some(d("0.09")), d("7"), None, OverflowPolicy::Allow).unwrap();
        assert_eq!(repriced.totals.subtotal, priced.totals.subtotal);
        assert_eq!(repriced.totals.subtotal, d("0.99"));
    }

    #[test]
    fn reprice_trigger() {
        assert!(!needs_reprice(None, None, None));
        assert!(needs_reprice(None, None, Some(d("0"))));
        assert!(needs_reprice(Some(&[]), None, None));
    }
}
