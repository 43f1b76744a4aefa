// src/ledger/policy.rs

use std::str::FromStr;

/// O que fazer quando um valor passa do limite natural
/// (desconto > subtotal, pagamento > saldo).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverflowPolicy {
    #[default]
    Allow,
    Reject,
    Clamp,
}

impl FromStr for OverflowPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "allow" => Ok(OverflowPolicy::Allow),
            "reject" => Ok(OverflowPolicy::Reject),
            "clamp" => Ok(OverflowPolicy::Clamp),
            other => Err(format!(
                "política desconhecida '{}' (use allow, reject ou clamp)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LedgerPolicy {
    pub discount: OverflowPolicy,
    pub overpayment: OverflowPolicy,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_policies_case_insensitively() {
        assert_eq!("allow".parse::<OverflowPolicy>(), Ok(OverflowPolicy::Allow));
        assert_eq!(" Reject ".parse::<OverflowPolicy>(), Ok(OverflowPolicy::Reject));
        assert_eq!("CLAMP".parse::<OverflowPolicy>(), Ok(OverflowPolicy::Clamp));
    }

    #[test]
    fn rejects_unknown_policy() {
        assert!("ignore".parse::<OverflowPolicy>().is_err());
    }

    #[test]
    fn default_allows_everything() {
        let policy = LedgerPolicy::default();
        assert_eq!(policy.discount, OverflowPolicy::Allow);
        assert_eq!(policy.overpayment, OverflowPolicy::Allow);
    }
}
