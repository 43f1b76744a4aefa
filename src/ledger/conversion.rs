// src/ledger/conversion.rs

use super::LedgerError;
use crate::models::quotation::QuotationStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionPlan {
    /// Já existe fatura para o orçamento. `repair_status` indica que o
    /// status do orçamento divergiu e precisa voltar para `converted`.
    ReturnExisting { repair_status: bool },
    Create,
}

/// Decide o que fazer ao converter um orçamento em fatura.
pub fn plan_conversion(
    status: QuotationStatus,
    has_invoice: bool,
) -> Result<ConversionPlan, LedgerError> {
    if has_invoice {
        return Ok(ConversionPlan::ReturnExisting {
            repair_status: status != QuotationStatus::Converted,
        });
    }
    if status == QuotationStatus::Converted {
        return Err(LedgerError::ConvertedWithoutInvoice);
    }
    Ok(ConversionPlan::Create)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_invoice_for_any_unconverted_status() {
        for status in [
            QuotationStatus::Pending,
            QuotationStatus::Accepted,
            QuotationStatus::Rejected,
        ] {
            assert_eq!(plan_conversion(status, false), Ok(ConversionPlan::Create));
        }
    }

    #[test]
    fn repeated_conversion_returns_existing_invoice() {
        assert_eq!(
            plan_conversion(QuotationStatus::Converted, true),
            Ok(ConversionPlan::ReturnExisting { repair_status: false })
        );
    }

    #[test]
    fn drifted_status_is_repaired() {
        assert_eq!(
            plan_conversion(QuotationStatus::Accepted, true),
            Ok(ConversionPlan::ReturnExisting { repair_status: true })
        );
    }

    #[test]
    fn converted_without_invoice_is_an_integrity_conflict() {
        let err = plan_conversion(QuotationStatus::Converted, false).unwrap_err();
        assert_eq!(err, LedgerError::ConvertedWithoutInvoice);
        assert!(err.is_conflict());
    }
}
