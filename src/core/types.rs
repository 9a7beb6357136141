use crate::core::errors::ExchangeError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported venues. Closed set: every dispatch over it is an exhaustive match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExchangeId {
    Binance,
    Kraken,
    CoinbaseAdvanced,
    Coinbase,
}

impl ExchangeId {
    pub const ALL: [Self; 4] = [
        Self::Binance,
        Self::Kraken,
        Self::CoinbaseAdvanced,
        Self::Coinbase,
    ];

    /// Wire identifier, also used as the credential namespace prefix
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Binance => "binance",
            Self::Kraken => "kraken",
            Self::CoinbaseAdvanced => "coinbase_advanced",
            Self::Coinbase => "coinbase",
        }
    }

    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Binance => "Binance",
            Self::Kraken => "Kraken",
            Self::CoinbaseAdvanced => "Coinbase Advanced",
            Self::Coinbase => "Coinbase",
        }
    }

    /// Coinbase retail authenticates through OAuth only
    pub const fn uses_oauth(&self) -> bool {
        matches!(self, Self::Coinbase)
    }
}

impl fmt::Display for ExchangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExchangeId {
    type Err = ExchangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| ExchangeError::Unsupported(format!("Unknown exchange: {}", s)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderSide {
    Buy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Balance {
    pub asset: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub free: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub locked: Decimal,
}

impl Balance {
    pub fn is_empty(&self) -> bool {
        self.free.is_zero() && self.locked.is_zero()
    }
}

/// A sized order, built fresh for every trade
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderSpec {
    pub exchange: ExchangeId,
    pub fiat_amount: Decimal,
    pub currency: String,
    pub side: OrderSide,
    pub quantity: Decimal,
    pub precision_digits: u32,
    pub min_notional: Decimal,
}

/// Unified buy result. `btc_amount` is always net of BTC-denominated fees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeResult {
    pub order_id: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub btc_amount: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub fiat_spent: Decimal,
    pub currency: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub avg_price: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub trading_fee: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub trading_fee_btc: Decimal,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalResult {
    pub success: bool,
    pub provider_tx_id: Option<String>,
    pub error: Option<String>,
}

impl WithdrawalResult {
    pub fn submitted(provider_tx_id: impl Into<String>) -> Self {
        Self {
            success: true,
            provider_tx_id: Some(provider_tx_id.into()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            provider_tx_id: None,
            error: Some(error.into()),
        }
    }
}

/// Asset a fill's commission was charged in
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeeAsset {
    Base,
    Quote,
    Other(String),
}

impl FeeAsset {
    /// Classify a venue-reported commission asset against the traded pair
    pub fn classify(asset: &str, quote: &str) -> Self {
        if asset.eq_ignore_ascii_case("BTC") || asset.eq_ignore_ascii_case("XBT") {
            Self::Base
        } else if asset.eq_ignore_ascii_case(quote) {
            Self::Quote
        } else {
            Self::Other(asset.to_string())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fill {
    pub price: Decimal,
    pub qty: Decimal,
    pub commission: Decimal,
    pub commission_asset: FeeAsset,
}

/// How a venue reported an execution, decided once per response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionDetail {
    FillBased(Vec<Fill>),
    OrderLevelOnly {
        executed_qty: Decimal,
        cumulative_quote: Decimal,
        quote_fee: Decimal,
    },
}

/// Caller-facing envelope: `{success, data?, error?}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

impl<T> From<Result<T, ExchangeError>> for ApiResponse<T> {
    fn from(result: Result<T, ExchangeError>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => Self::err(e.user_message()),
        }
    }
}

/// Conversion helpers for the string-encoded numbers venues return
pub mod conversion {
    use super::*;

    pub fn parse_decimal(s: &str, field: &str) -> Result<Decimal, ExchangeError> {
        Decimal::from_str(s.trim())
            .or_else(|_| Decimal::from_scientific(s.trim()))
            .map_err(|e| ExchangeError::InvalidResponse(format!("Invalid {}: {}", field, e)))
    }

    /// Lenient parse for optional display values
    #[inline]
    pub fn string_to_decimal(s: &str) -> Decimal {
        parse_decimal(s, "value").unwrap_or(Decimal::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_exchange_id_round_trips_wire_names() {
        for id in ExchangeId::ALL {
            assert_eq!(id.as_str().parse::<ExchangeId>().unwrap(), id);
        }
        assert!("bitstamp".parse::<ExchangeId>().is_err());
    }

    #[test]
    fn test_api_response_from_error_uses_user_message() {
        let result: Result<u32, ExchangeError> =
            Err(ExchangeError::Transport("<!DOCTYPE html>".to_string()));
        let response = ApiResponse::from(result);
        assert!(!response.success);
        assert_eq!(
            response.error.as_deref(),
            Some(crate::core::errors::UNAVAILABLE_MESSAGE)
        );
    }

    #[test]
    fn test_fee_asset_classification() {
        assert_eq!(FeeAsset::classify("BTC", "EUR"), FeeAsset::Base);
        assert_eq!(FeeAsset::classify("eur", "EUR"), FeeAsset::Quote);
        assert_eq!(
            FeeAsset::classify("BNB", "EUR"),
            FeeAsset::Other("BNB".to_string())
        );
    }

    #[test]
    fn test_parse_decimal_accepts_scientific() {
        assert_eq!(
            conversion::parse_decimal("1e-5", "step").unwrap(),
            dec!(0.00001)
        );
        assert!(conversion::parse_decimal("abc", "step").is_err());
    }
}
