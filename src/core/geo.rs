//! Country to exchange eligibility. Callers consult this before using the
//! facade; the facade itself never gates on geography.

use crate::core::types::ExchangeId;

/// ISO 3166-1 alpha-2 codes where Binance is not offered
pub const BINANCE_RESTRICTED: &[&str] = &[
    "US", "CA", "NL", "GB", "BE", "JP", "SG", "MY", "CU", "IR", "KP", "SY",
];

pub fn is_eligible(exchange: ExchangeId, country_code: &str) -> bool {
    let country = country_code.trim();
    match exchange {
        ExchangeId::Binance => !BINANCE_RESTRICTED
            .iter()
            .any(|restricted| restricted.eq_ignore_ascii_case(country)),
        ExchangeId::Kraken | ExchangeId::CoinbaseAdvanced | ExchangeId::Coinbase => true,
    }
}

/// Exchanges available to a user in `country_code`, in display order
pub fn eligible_exchanges(country_code: &str) -> Vec<ExchangeId> {
    ExchangeId::ALL
        .into_iter()
        .filter(|exchange| is_eligible(*exchange, country_code))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binance_excluded_in_restricted_countries() {
        let us = eligible_exchanges("us");
        assert!(!us.contains(&ExchangeId::Binance));
        assert_eq!(
            us,
            vec![
                ExchangeId::Kraken,
                ExchangeId::CoinbaseAdvanced,
                ExchangeId::Coinbase
            ]
        );
    }

    #[test]
    fn test_all_exchanges_elsewhere() {
        assert_eq!(eligible_exchanges("DE"), ExchangeId::ALL.to_vec());
        assert_eq!(eligible_exchanges(" fr "), ExchangeId::ALL.to_vec());
    }
}
