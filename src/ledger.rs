// src/ledger.rs
//
// Núcleo puro do livro de documentos: numeração, totais, pagamentos,
// conversão orçamento -> fatura e decisão de aprovação.
// Nada aqui toca banco de dados ou rede.

pub mod approval;
pub mod conversion;
pub mod numbering;
pub mod payment;
pub mod policy;
pub mod totals;

use thiserror::Error;

pub use policy::{LedgerPolicy, OverflowPolicy};

/// Violações das regras do livro. Cada variante vira 400 (validação) ou
/// 400 (conflito de estado) na borda HTTP.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("pelo menos um item é obrigatório")]
    EmptyItems,

    #[error("item {index}: quantidade deve ser maior que zero")]
    InvalidQuantity { index: usize },

    #[error("item {index}: preço unitário não pode ser negativo")]
    NegativeUnitPrice { index: usize },

    #[error("desconto não pode ser negativo")]
    NegativeDiscount,

    #[error("IVA deve estar entre 0 e 100")]
    VatOutOfRange,

    #[error("desconto maior que o subtotal")]
    DiscountExceedsSubtotal,

    #[error("valor fora da faixa aceita (menor que 1.000.000.000.000)")]
    AmountOutOfRange,

    #[error("valores monetários aceitam no máximo 2 casas decimais")]
    TooManyDecimals,

    #[error("valor do pagamento deve ser positivo")]
    NonPositivePayment,

    #[error("pagamento maior que o saldo restante")]
    PaymentExceedsBalance,

    #[error("orçamento marcado como convertido sem fatura vinculada")]
    ConvertedWithoutInvoice,

    #[error("orçamento já foi decidido")]
    AlreadyDecided,

    #[error("status convertido só é atingido pela conversão em fatura")]
    CannotSetConverted,

    #[error("orçamento convertido não aceita mudança de itens, totais ou status")]
    QuotationAlreadyConverted,
}

impl LedgerError {
    /// Conflitos de máquina de estado (o restante é validação de entrada).
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            LedgerError::ConvertedWithoutInvoice
                | LedgerError::AlreadyDecided
                | LedgerError::QuotationAlreadyConverted
        )
    }
}
