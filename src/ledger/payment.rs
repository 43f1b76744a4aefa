// src/ledger/payment.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::{
    totals::{check_money, money_result, round_money},
    LedgerError, OverflowPolicy,
};
use crate::models::invoice::InvoiceStatus;

#[derive(Debug, Clone, PartialEq)]
pub struct PaymentOutcome {
    /// Valor efetivamente lançado (difere do pedido só sob `Clamp`).
    pub applied_amount: Decimal,
    pub paid_amount: Decimal,
    pub remaining_amount: Decimal,
    pub status: InvoiceStatus,
}

impl PaymentOutcome {
    pub fn fully_paid(&self) -> bool {
        self.status == InvoiceStatus::Paid
    }
}

/// paid se o saldo zerou, partial se já entrou algo, senão mantém `fallback`.
pub fn derive_status(paid_amount: Decimal, remaining_amount: Decimal, fallback: InvoiceStatus) -> InvoiceStatus {
    if remaining_amount <= Decimal::ZERO {
        InvoiceStatus::Paid
    } else if paid_amount > Decimal::ZERO {
        InvoiceStatus::Partial
    } else {
        fallback
    }
}

/// Recalcula saldo e status depois de uma edição do total da fatura.
pub fn rebalance(total: Decimal, paid_amount: Decimal) -> (Decimal, InvoiceStatus) {
    let remaining = round_money(total - paid_amount);
    (remaining, derive_status(paid_amount, remaining, InvoiceStatus::Unpaid))
}

/// Data de quitação: mantida se já estava paga, agora se acabou de quitar,
/// apagada em qualquer outro status.
pub fn paid_date_for(
    status: InvoiceStatus,
    previous: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    match status {
        InvoiceStatus::Paid => Some(previous.unwrap_or(now)),
        _ => None,
    }
}

/// Aplica um pagamento ao saldo atual da fatura.
pub fn apply_payment(
    total: Decimal,
    paid_amount: Decimal,
    current_status: InvoiceStatus,
    amount: Decimal,
    policy: OverflowPolicy,
) -> Result<PaymentOutcome, LedgerError> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::NonPositivePayment);
    }
    check_money(amount)?;

    let remaining = money_result(total.checked_sub(paid_amount))?;
    let applied_amount = if amount > remaining {
        match policy {
            OverflowPolicy::Allow => amount,
            OverflowPolicy::Reject => return Err(LedgerError::PaymentExceedsBalance),
            OverflowPolicy::Clamp if remaining <= Decimal::ZERO => {
                return Err(LedgerError::PaymentExceedsBalance)
            }
            OverflowPolicy::Clamp => remaining,
        }
    } else {
        amount
    };

    let new_paid = money_result(paid_amount.checked_add(applied_amount))?;
    let new_remaining = money_result(total.checked_sub(new_paid))?;

    Ok(PaymentOutcome {
        applied_amount,
        paid_amount: new_paid,
        remaining_amount: new_remaining,
        status: derive_status(new_paid, new_remaining, current_status),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn partial_then_full_payment() {
        let total = d("2675.00");

        let first = apply_payment(total, d("0"), InvoiceStatus::Unpaid, d("1000"), OverflowPolicy::Allow).unwrap();
        assert_eq!(first.paid_amount, d("1000"));
        assert_eq!(first.remaining_amount, d("1675.00"));
        assert_eq!(first.status, InvoiceStatus::Partial);
        assert!(!first.fully_paid());

        let second = apply_payment(
            total,
            first.paid_amount,
            first.status,
            d("1675.00"),
            OverflowPolicy::Allow,
        )
        .unwrap();
        assert_eq!(second.paid_amount, d("2675.00"));
        assert_eq!(second.remaining_amount, d("0.00"));
        assert_eq!(second.status, InvoiceStatus::Paid);
        assert!(second.fully_paid());
    }

    #[test]
    fn running_balance_after_many_payments() {
        let total = d("1000");
        let mut paid = d("0");
        let mut status = InvoiceStatus::Unpaid;
        for amount in ["100", "250.50", "49.50"] {
            let outcome = apply_payment(total, paid, status, d(amount), OverflowPolicy::Allow).unwrap();
            paid = outcome.paid_amount;
            status = outcome.status;
            assert_eq!(outcome.remaining_amount, total - paid);
        }
        assert_eq!(paid, d("400"));
        assert_eq!(status, InvoiceStatus::Partial);
    }

    #[test]
    fn rejects_zero_and_negative_amounts() {
        for amount in ["0", "-10"] {
            let err = apply_payment(d("100"), d("0"), InvoiceStatus::Unpaid, d(amount), OverflowPolicy::Allow)
                .unwrap_err();
            assert_eq!(err, LedgerError::NonPositivePayment);
        }
    }

    #[test]
    fn amounts_outside_the_column_range_are_rejected() {
        let err = apply_payment(
            d("100"),
            d("0"),
            InvoiceStatus::Unpaid,
            d("79228162514264337593543950"),
            OverflowPolicy::Allow,
        )
        .unwrap_err();
        assert_eq!(err, LedgerError::AmountOutOfRange);

        // cabe sozinho, mas o total pago estouraria a coluna
        let err = apply_payment(
            d("100"),
            d("999999999999"),
            InvoiceStatus::Paid,
            d("999999999999"),
            OverflowPolicy::Allow,
        )
        .unwrap_err();
        assert_eq!(err, LedgerError::AmountOutOfRange);

        let err = apply_payment(d("100"), d("0"), InvoiceStatus::Unpaid, d("10.005"), OverflowPolicy::Allow)
            .unwrap_err();
        assert_eq!(err, LedgerError::TooManyDecimals);
    }

    #[test]
    fn overpayment_follows_policy() {
        let allowed = apply_payment(d("100"), d("80"), InvoiceStatus::Partial, d("50"), OverflowPolicy::Allow).unwrap();
        assert_eq!(allowed.applied_amount, d("50"));
        assert_eq!(allowed.remaining_amount, d("-30"));
        assert_eq!(allowed.status, InvoiceStatus::Paid);

        let clamped = apply_payment(d("100"), d("80"), InvoiceStatus::Partial, d("50"), OverflowPolicy::Clamp).unwrap();
        assert_eq!(clamped.applied_amount, d("20"));
        assert_eq!(clamped.paid_amount, d("100"));
        assert_eq!(clamped.remaining_amount, d("0"));

        let rejected = apply_payment(d("100"), d("80"), InvoiceStatus::Partial, d("50"), OverflowPolicy::Reject)
            .unwrap_err();
        assert_eq!(rejected, LedgerError::PaymentExceedsBalance);
    }

    #[test]
    fn paying_a_settled_invoice_is_only_refused_by_strict_policies() {
        assert!(apply_payment(d("100"), d("100"), InvoiceStatus::Paid, d("1"), OverflowPolicy::Allow).is_ok());
        assert_eq!(
            apply_payment(d("100"), d("100"), InvoiceStatus::Paid, d("1"), OverflowPolicy::Clamp).unwrap_err(),
            LedgerError::PaymentExceedsBalance
        );
        assert_eq!(
            apply_payment(d("100"), d("100"), InvoiceStatus::Paid, d("1"), OverflowPolicy::Reject).unwrap_err(),
            LedgerError::PaymentExceedsBalance
        );
    }

    #[test]
    fn rebalance_after_total_edit() {
        assert_eq!(rebalance(d("500"), d("0")), (d("500"), InvoiceStatus::Unpaid));
        assert_eq!(rebalance(d("500"), d("200")), (d("300"), InvoiceStatus::Partial));
        assert_eq!(rebalance(d("150"), d("200")), (d("-50"), InvoiceStatus::Paid));
    }

    #[test]
    fn paid_date_is_kept_set_or_cleared() {
        let earlier = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap();
        assert_eq!(paid_date_for(InvoiceStatus::Paid, None, now), Some(now));
        assert_eq!(paid_date_for(InvoiceStatus::Paid, Some(earlier), now), Some(earlier));
        assert_eq!(paid_date_for(InvoiceStatus::Partial, Some(earlier), now), None);
    }
}
