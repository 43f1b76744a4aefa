// src/ledger/totals.rs

use rust_decimal::{Decimal, RoundingStrategy};
use uuid::Uuid;

use super::{LedgerError, OverflowPolicy};

pub const DEFAULT_VAT_PERCENT: Decimal = Decimal::from_parts(7, 0, 0, false, 0);
const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Limite exclusivo das colunas NUMERIC(14,2): 10^12.
pub const MAX_MONEY: Decimal = Decimal::from_parts(0xD4A5_1000, 0xE8, 0, false, 0);

/// Item como chega do cliente, antes de precificar.
#[derive(Debug, Clone, PartialEq)]
pub struct LineItemDraft {
    pub product_id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    pub quantity: i32,
    pub unit_price: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PricedLine {
    pub draft: LineItemDraft,
    pub line_total: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Totals {
    pub subtotal: Decimal,
    pub discount_amount: Decimal,
    pub vat_percent: Decimal,
    pub vat_amount: Decimal,
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PricedDocument {
    pub lines: Vec<PricedLine>,
    pub totals: Totals,
}

pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Aceita o valor se ele cabe numa coluna NUMERIC(14,2) sem arredondar.
pub fn check_money(value: Decimal) -> Result<Decimal, LedgerError> {
    if value.abs() >= MAX_MONEY {
        return Err(LedgerError::AmountOutOfRange);
    }
    if value.normalize().scale() > 2 {
        return Err(LedgerError::TooManyDecimals);
    }
    Ok(value)
}

/// Resultado de uma conta com dinheiro: `None` (estouro do Decimal) ou
/// fora da faixa da coluna viram `AmountOutOfRange`.
pub(crate) fn money_result(value: Option<Decimal>) -> Result<Decimal, LedgerError> {
    match value.map(round_money) {
        Some(v) if v.abs() < MAX_MONEY => Ok(v),
        _ => Err(LedgerError::AmountOutOfRange),
    }
}

pub fn line_total(quantity: i32, unit_price: Decimal) -> Result<Decimal, LedgerError> {
    money_result(Decimal::from(quantity).checked_mul(unit_price))
}

/// Valida os itens e calcula subtotal, desconto, IVA e total.
///
/// `total = (subtotal - desconto) + round2((subtotal - desconto) * iva / 100)`.
/// Desconto acima do subtotal segue a `discount_policy`.
pub fn compute_totals(
    items: Vec<LineItemDraft>,
    discount: Option<Decimal>,
    vat_percent: Option<Decimal>,
    discount_policy: OverflowPolicy,
) -> Result<PricedDocument, LedgerError> {
    if items.is_empty() {
        return Err(LedgerError::EmptyItems);
    }

    let discount = discount.unwrap_or(Decimal::ZERO);
    let vat_percent = vat_percent.unwrap_or(DEFAULT_VAT_PERCENT);

    if discount < Decimal::ZERO {
        return Err(LedgerError::NegativeDiscount);
    }
    check_money(discount)?;
    if vat_percent < Decimal::ZERO || vat_percent > HUNDRED {
        return Err(LedgerError::VatOutOfRange);
    }
    if vat_percent.normalize().scale() > 2 {
        return Err(LedgerError::TooManyDecimals);
    }

    let mut lines = Vec::with_capacity(items.len());
    for (index, draft) in items.into_iter().enumerate() {
        if draft.quantity < 1 {
            return Err(LedgerError::InvalidQuantity { index });
        }
        if draft.unit_price < Decimal::ZERO {
            return Err(LedgerError::NegativeUnitPrice { index });
        }
        check_money(draft.unit_price)?;
        let line_total = line_total(draft.quantity, draft.unit_price)?;
        lines.push(PricedLine { draft, line_total });
    }

    let subtotal = lines
        .iter()
        .try_fold(Decimal::ZERO, |acc, l| money_result(acc.checked_add(l.line_total)))?;

    let discount_amount = if discount > subtotal {
        match discount_policy {
            OverflowPolicy::Allow => discount,
            OverflowPolicy::Reject => return Err(LedgerError::DiscountExceedsSubtotal),
            OverflowPolicy::Clamp => subtotal,
        }
    } else {
        discount
    };

    let taxable = money_result(subtotal.checked_sub(discount_amount))?;
    let vat_amount = money_result(
        taxable
            .checked_mul(vat_percent)
            .and_then(|v| v.checked_div(HUNDRED)),
    )?;
    let total = money_result(taxable.checked_add(vat_amount))?;

    Ok(PricedDocument {
        lines,
        totals: Totals {
            subtotal: round_money(subtotal),
            discount_amount: round_money(discount_amount),
            vat_percent,
            vat_amount,
            total,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn item(quantity: i32, price: &str) -> LineItemDraft {
        LineItemDraft {
            product_id: None,
            name: "Serviço".to_string(),
            description: None,
            quantity,
            unit_price: d(price),
        }
    }

    #[test]
    fn standard_quotation_totals() {
        let priced = compute_totals(
            vec![item(2, "1000"), item(1, "500")],
            None,
            None,
            OverflowPolicy::Allow,
        )
        .unwrap();

        assert_eq!(priced.lines[0].line_total, d("2000"));
        assert_eq!(priced.lines[1].line_total, d("500"));
        assert_eq!(priced.totals.subtotal, d("2500"));
        assert_eq!(priced.totals.discount_amount, d("0"));
        assert_eq!(priced.totals.vat_percent, d("7"));
        assert_eq!(priced.totals.vat_amount, d("175.00"));
        assert_eq!(priced.totals.total, d("2675.00"));
    }

    #[test]
    fn discount_is_applied_before_vat() {
        let priced =
            compute_totals(vec![item(1, "1000")], Some(d("100")), Some(d("7")), OverflowPolicy::Allow)
                .unwrap();
        assert_eq!(priced.totals.vat_amount, d("63.00"));
        assert_eq!(priced.totals.total, d("963.00"));
    }

    #[test]
    fn vat_rounds_half_away_from_zero() {
        // 0.35 * 7% = 0.0245 -> 0.02 ; 0.50 * 7% = 0.035 -> 0.04
        let a = compute_totals(vec![item(1, "0.35")], None, None, OverflowPolicy::Allow).unwrap();
        assert_eq!(a.totals.vat_amount, d("0.02"));
        let b = compute_totals(vec![item(1, "0.50")], None, None, OverflowPolicy::Allow).unwrap();
        assert_eq!(b.totals.vat_amount, d("0.04"));
        assert_eq!(b.totals.total, d("0.54"));
    }

    #[test]
    fn zero_vat_leaves_total_equal_to_net() {
        let priced =
            compute_totals(vec![item(3, "12.50")], None, Some(d("0")), OverflowPolicy::Allow).unwrap();
        assert_eq!(priced.totals.vat_amount, d("0"));
        assert_eq!(priced.totals.total, d("37.50"));
    }

    #[test]
    fn requires_at_least_one_item() {
        let err = compute_totals(vec![], None, None, OverflowPolicy::Allow).unwrap_err();
        assert_eq!(err, LedgerError::EmptyItems);
    }

    #[test]
    fn rejects_non_positive_quantity_with_item_index() {
        let err = compute_totals(vec![item(1, "10"), item(0, "10")], None, None, OverflowPolicy::Allow)
            .unwrap_err();
        assert_eq!(err, LedgerError::InvalidQuantity { index: 1 });
    }

    #[test]
    fn rejects_negative_price_discount_and_bad_vat() {
        assert_eq!(
            compute_totals(vec![item(1, "-1")], None, None, OverflowPolicy::Allow).unwrap_err(),
            LedgerError::NegativeUnitPrice { index: 0 }
        );
        assert_eq!(
            compute_totals(vec![item(1, "1")], Some(d("-5")), None, OverflowPolicy::Allow).unwrap_err(),
            LedgerError::NegativeDiscount
        );
        assert_eq!(
            compute_totals(vec![item(1, "1")], None, Some(d("101")), OverflowPolicy::Allow).unwrap_err(),
            LedgerError::VatOutOfRange
        );
    }

    #[test]
    fn huge_prices_are_out_of_range_instead_of_overflowing() {
        assert_eq!(
            line_total(1_000_000, d("79228162514264337593543950")).unwrap_err(),
            LedgerError::AmountOutOfRange
        );
        assert_eq!(
            compute_totals(vec![item(1_000_000, "79228162514264337593543950")], None, None, OverflowPolicy::Allow)
                .unwrap_err(),
            LedgerError::AmountOutOfRange
        );
        // 1e13 não cabe em NUMERIC(14,2)
        assert_eq!(
            compute_totals(vec![item(1, "10000000000000")], None, None, OverflowPolicy::Allow).unwrap_err(),
            LedgerError::AmountOutOfRange
        );
    }

    #[test]
    fn sum_past_the_column_limit_is_out_of_range() {
        // cada linha cabe, a soma (com IVA) não
        let err = compute_totals(
            vec![item(1, "600000000000"), item(1, "600000000000")],
            None,
            Some(d("0")),
            OverflowPolicy::Allow,
        )
        .unwrap_err();
        assert_eq!(err, LedgerError::AmountOutOfRange);

        let err = compute_totals(vec![item(1, "999999999999")], None, None, OverflowPolicy::Allow).unwrap_err();
        assert_eq!(err, LedgerError::AmountOutOfRange);
    }

    #[test]
    fn more_than_two_decimals_are_rejected() {
        assert_eq!(
            compute_totals(vec![item(3, "0.333")], None, None, OverflowPolicy::Allow).unwrap_err(),
            LedgerError::TooManyDecimals
        );
        assert_eq!(
            compute_totals(vec![item(1, "10")], Some(d("0.005")), None, OverflowPolicy::Allow).unwrap_err(),
            LedgerError::TooManyDecimals
        );
        assert_eq!(
            compute_totals(vec![item(1, "10")], None, Some(d("7.125")), OverflowPolicy::Allow).unwrap_err(),
            LedgerError::TooManyDecimals
        );
        // zeros à direita não contam
        let priced = compute_totals(vec![item(3, "0.3300")], None, Some(d("0")), OverflowPolicy::Allow).unwrap();
        assert_eq!(priced.lines[0].line_total, d("0.99"));
        assert_eq!(priced.totals.subtotal, d("0.99"));
    }

    #[test]
    fn check_money_bounds() {
        assert_eq!(check_money(d("999999999999.99")).unwrap(), d("999999999999.99"));
        assert_eq!(check_money(MAX_MONEY).unwrap_err(), LedgerError::AmountOutOfRange);
        assert_eq!(check_money(-MAX_MONEY).unwrap_err(), LedgerError::AmountOutOfRange);
        assert_eq!(check_money(d("1.001")).unwrap_err(), LedgerError::TooManyDecimals);
    }

    #[test]
    fn discount_above_subtotal_follows_policy() {
        let items = || vec![item(1, "100")];

        let allowed = compute_totals(items(), Some(d("150")), Some(d("0")), OverflowPolicy::Allow).unwrap();
        assert_eq!(allowed.totals.discount_amount, d("150"));
        assert_eq!(allowed.totals.total, d("-50"));

        let clamped = compute_totals(items(), Some(d("150")), Some(d("0")), OverflowPolicy::Clamp).unwrap();
        assert_eq!(clamped.totals.discount_amount, d("100"));
        assert_eq!(clamped.totals.total, d("0"));

        let rejected = compute_totals(items(), Some(d("150")), None, OverflowPolicy::Reject).unwrap_err();
        assert_eq!(rejected, LedgerError::DiscountExceedsSubtotal);
    }
}
