// src/ledger/numbering.rs
//
// Números de documento no formato `{CÓDIGO}{ANO_BE}{MM}{SEQ:04}`,
// ex.: QT2568010001. O ano é o da era budista (gregoriano + 543).

use chrono::{Datelike, NaiveDate};

pub const BUDDHIST_ERA_OFFSET: i32 = 543;
pub const SEQUENCE_WIDTH: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Quotation,
    Invoice,
    Receipt,
}

impl DocumentKind {
    pub fn code(self) -> &'static str {
        match self {
            DocumentKind::Quotation => "QT",
            DocumentKind::Invoice => "INV",
            DocumentKind::Receipt => "REC",
        }
    }
}

/// Prefixo do período (tipo + ano BE + mês) para a data de referência.
pub fn period_prefix(kind: DocumentKind, reference_date: NaiveDate) -> String {
    format!(
        "{}{}{:02}",
        kind.code(),
        reference_date.year() + BUDDHIST_ERA_OFFSET,
        reference_date.month()
    )
}

pub fn format_number(prefix: &str, sequence: u32) -> String {
    format!("{prefix}{sequence:0width$}", width = SEQUENCE_WIDTH)
}

/// Extrai o sufixo numérico de um número já emitido com este prefixo.
/// Números de outro prefixo ou com sufixo não numérico são ignorados.
pub fn parse_sequence(prefix: &str, number: &str) -> Option<u32> {
    let suffix = number.strip_prefix(prefix)?;
    if suffix.len() < SEQUENCE_WIDTH || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    suffix.parse().ok()
}

/// Próximo valor da sequência: o maior entre o contador persistido e o
/// maior número existente, mais um. O contador nunca retrocede, então
/// números apagados não são reutilizados.
pub fn next_sequence(counter: u32, latest_existing: Option<u32>) -> u32 {
    counter.max(latest_existing.unwrap_or(0)) + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn prefix_uses_buddhist_year_and_padded_month() {
        assert_eq!(period_prefix(DocumentKind::Quotation, date(2025, 1, 15)), "QT256801");
        assert_eq!(period_prefix(DocumentKind::Invoice, date(2025, 11, 3)), "INV256811");
        assert_eq!(period_prefix(DocumentKind::Receipt, date(2024, 12, 31)), "REC256712");
    }

    #[test]
    fn first_number_of_a_period_is_0001() {
        let prefix = period_prefix(DocumentKind::Quotation, date(2025, 1, 1));
        assert_eq!(format_number(&prefix, next_sequence(0, None)), "QT2568010001");
    }

    #[test]
    fn continues_after_the_largest_existing_number() {
        let prefix = "INV256802";
        let latest = parse_sequence(prefix, "INV2568020042");
        assert_eq!(latest, Some(42));
        assert_eq!(format_number(prefix, next_sequence(0, latest)), "INV2568020043");
    }

    #[test]
    fn counter_wins_over_existing_numbers_after_deletion() {
        // 0007 foi apagado; o contador lembra que já emitimos até 7
        assert_eq!(next_sequence(7, Some(5)), 8);
    }

    #[test]
    fn sequence_is_strictly_increasing_within_a_period() {
        let prefix = "REC256803";
        let mut counter = 0;
        let mut issued = Vec::new();
        for _ in 0..5 {
            counter = next_sequence(counter, None);
            issued.push(format_number(prefix, counter));
        }
        assert!(issued.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(issued.last().map(String::as_str), Some("REC2568030005"));
    }

    #[test]
    fn ignores_numbers_from_other_prefixes_or_malformed_suffixes() {
        assert_eq!(parse_sequence("QT256801", "QT2568020001"), None);
        assert_eq!(parse_sequence("QT256801", "QT256801ABCD"), None);
        assert_eq!(parse_sequence("QT256801", "QT25680112"), None);
    }

    #[test]
    fn overflow_past_9999_keeps_counting() {
        assert_eq!(format_number("QT256801", 10000), "QT25680110000");
        assert_eq!(parse_sequence("QT256801", "QT25680110000"), Some(10000));
    }
}
