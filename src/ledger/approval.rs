// src/ledger/approval.rs

use super::LedgerError;
use crate::models::quotation::{ApprovalStatus, QuotationStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApprovalOutcome {
    pub approval_status: ApprovalStatus,
    pub status: QuotationStatus,
}

/// Um token só decide uma vez: qualquer decisão sobre um orçamento que já
/// saiu de `pending` é conflito e não altera nada.
pub fn decide(current: ApprovalStatus, decision: Decision) -> Result<ApprovalOutcome, LedgerError> {
    if current != ApprovalStatus::Pending {
        return Err(LedgerError::AlreadyDecided);
    }
    Ok(match decision {
        Decision::Approve => ApprovalOutcome {
            approval_status: ApprovalStatus::Approved,
            status: QuotationStatus::Accepted,
        },
        Decision::Reject => ApprovalOutcome {
            approval_status: ApprovalStatus::Rejected,
            status: QuotationStatus::Rejected,
        },
    })
}

/// Edição manual pelo escritório. Status e aprovação andam juntos
/// (`accepted` <-> `approved`, `rejected` <-> `rejected`, `pending` <-> `pending`);
/// orçamento convertido só aceita dados cadastrais e notas.
pub fn plan_edit(
    status: QuotationStatus,
    approval_status: ApprovalStatus,
    requested: Option<QuotationStatus>,
    reprices: bool,
) -> Result<ApprovalOutcome, LedgerError> {
    if requested == Some(QuotationStatus::Converted) {
        return Err(LedgerError::CannotSetConverted);
    }
    if status == QuotationStatus::Converted && (reprices || requested.is_some()) {
        return Err(LedgerError::QuotationAlreadyConverted);
    }

    Ok(match requested {
        None => ApprovalOutcome { approval_status, status },
        Some(status) => ApprovalOutcome {
            approval_status: match status {
                QuotationStatus::Accepted => ApprovalStatus::Approved,
                QuotationStatus::Rejected => ApprovalStatus::Rejected,
                _ => ApprovalStatus::Pending,
            },
            status,
        },
    })
}

/// Notas da decisão. A rejeição aceita `reason` quando `notes` não vem.
pub fn decision_notes(notes: Option<String>, reason: Option<String>) -> Option<String> {
    notes
        .filter(|n| !n.trim().is_empty())
        .or(reason.filter(|r| !r.trim().is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approve_and_reject_mirror_into_quotation_status() {
        assert_eq!(
            decide(ApprovalStatus::Pending, Decision::Approve),
            Ok(ApprovalOutcome {
                approval_status: ApprovalStatus::Approved,
                status: QuotationStatus::Accepted
            })
        );
        assert_eq!(
            decide(ApprovalStatus::Pending, Decision::Reject),
            Ok(ApprovalOutcome {
                approval_status: ApprovalStatus::Rejected,
                status: QuotationStatus::Rejected
            })
        );
    }

    #[test]
    fn second_decision_is_a_conflict() {
        for current in [ApprovalStatus::Approved, ApprovalStatus::Rejected] {
            for decision in [Decision::Approve, Decision::Reject] {
                assert_eq!(decide(current, decision), Err(LedgerError::AlreadyDecided));
            }
        }
    }

    #[test]
    fn manual_status_keeps_approval_in_step() {
        let outcome = plan_edit(QuotationStatus::Pending, ApprovalStatus::Pending, Some(QuotationStatus::Accepted), false)
            .unwrap();
        assert_eq!(outcome.status, QuotationStatus::Accepted);
        assert_eq!(outcome.approval_status, ApprovalStatus::Approved);

        let outcome = plan_edit(QuotationStatus::Accepted, ApprovalStatus::Approved, Some(QuotationStatus::Pending), true)
            .unwrap();
        assert_eq!(outcome.approval_status, ApprovalStatus::Pending);

        let untouched = plan_edit(QuotationStatus::Rejected, ApprovalStatus::Rejected, None, true).unwrap();
        assert_eq!(untouched.status, QuotationStatus::Rejected);
        assert_eq!(untouched.approval_status, ApprovalStatus::Rejected);
    }

    #[test]
    fn converted_quotations_only_take_contact_edits() {
        assert_eq!(
            plan_edit(QuotationStatus::Pending, ApprovalStatus::Pending, Some(QuotationStatus::Converted), false),
            Err(LedgerError::CannotSetConverted)
        );
        assert_eq!(
            plan_edit(QuotationStatus::Converted, ApprovalStatus::Approved, None, true),
            Err(LedgerError::QuotationAlreadyConverted)
        );
        assert_eq!(
            plan_edit(QuotationStatus::Converted, ApprovalStatus::Approved, Some(QuotationStatus::Pending), false),
            Err(LedgerError::QuotationAlreadyConverted)
        );
        let outcome = plan_edit(QuotationStatus::Converted, ApprovalStatus::Approved, None, false).unwrap();
        assert_eq!(outcome.status, QuotationStatus::Converted);
    }

    #[test]
    fn reason_is_a_fallback_for_notes() {
        assert_eq!(
            decision_notes(None, Some("preço alto".into())),
            Some("preço alto".to_string())
        );
        assert_eq!(
            decision_notes(Some("ok".into()), Some("ignored".into())),
            Some("ok".to_string())
        );
        assert_eq!(decision_notes(Some("  ".into()), None), None);
    }
}
