use rust_decimal::Decimal;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct CoinbaseAmount {
    #[serde(with = "rust_decimal::serde::str")]
    pub value: Decimal,
    #[serde(default)]
    pub currency: String,
}

/// `/api/v3/brokerage/accounts` page
#[derive(Debug, Deserialize)]
pub struct CoinbaseAccounts {
    pub accounts: Vec<CoinbaseAccount>,
    #[serde(default)]
    pub has_next: bool,
    #[serde(default)]
    pub cursor: String,
}

#[derive(Debug, Deserialize)]
pub struct CoinbaseAccount {
    pub uuid: String,
    pub currency: String,
    pub available_balance: CoinbaseAmount,
    #[serde(default)]
    pub hold: Option<CoinbaseAmount>,
}

#[derive(Debug, Deserialize)]
pub struct CoinbaseProduct {
    pub product_id: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub base_increment: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub quote_min_size: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct CoinbaseOrderResponse {
    pub success: bool,
    #[serde(default)]
    pub success_response: Option<CoinbaseOrderSuccess>,
    #[serde(default)]
    pub error_response: Option<CoinbaseOrderError>,
    #[serde(default)]
    pub failure_reason: String,
}

#[derive(Debug, Deserialize)]
pub struct CoinbaseOrderSuccess {
    pub order_id: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct CoinbaseOrderError {
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub error_details: String,
    #[serde(default)]
    pub preview_failure_reason: String,
}

impl CoinbaseOrderError {
    pub fn code(&self) -> &str {
        [&self.error, &self.preview_failure_reason]
            .into_iter()
            .find(|s| !s.is_empty())
            .map_or("UNKNOWN_FAILURE_REASON", String::as_str)
    }

    pub fn description(&self) -> &str {
        [&self.message, &self.error_details, &self.error, &self.preview_failure_reason]
            .into_iter()
            .find(|s| !s.is_empty())
            .map_or("Order rejected", String::as_str)
    }
}

#[derive(Debug, Deserialize)]
pub struct CoinbaseFills {
    #[serde(default)]
    pub fills: Vec<CoinbaseFill>,
}

#[derive(Debug, Deserialize)]
pub struct CoinbaseFill {
    #[serde(default)]
    pub trade_id: String,
    pub order_id: String,
    #[serde(default)]
    pub trade_time: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub size: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub commission: Decimal,
    /// When true `size` is a quote amount
    #[serde(default)]
    pub size_in_quote: bool,
}

impl CoinbaseFill {
    pub fn base_size(&self) -> Decimal {
        if self.size_in_quote && !self.price.is_zero() {
            self.size / self.price
        } else {
            self.size
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CoinbaseHistoricalOrder {
    pub order: CoinbaseOrderSummary,
}

#[derive(Debug, Deserialize)]
pub struct CoinbaseOrderSummary {
    pub order_id: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub filled_size: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub filled_value: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub total_fees: Decimal,
    #[serde(default)]
    pub created_time: String,
}

/// `/v2/...` responses wrap their payload in `data`
#[derive(Debug, Deserialize)]
pub struct V2Response<T> {
    pub data: T,
    #[serde(default)]
    pub pagination: Option<V2Pagination>,
}

#[derive(Debug, Deserialize)]
pub struct V2Pagination {
    #[serde(default)]
    pub next_starting_after: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct V2Account {
    pub id: String,
    pub currency: V2Currency,
    pub balance: V2Money,
}

/// Older API versions send the currency code, newer ones an object
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum V2Currency {
    Code(String),
    Detailed { code: String },
}

impl V2Currency {
    pub fn code(&self) -> &str {
        match self {
            Self::Code(code) | Self::Detailed { code } => code,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct V2Money {
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    #[serde(default)]
    pub currency: String,
}

#[derive(Debug, Deserialize)]
pub struct V2Transaction {
    pub id: String,
    #[serde(default)]
    pub status: String,
}

/// Error bodies across the brokerage, v2 and OAuth surfaces
#[derive(Debug, Deserialize)]
pub struct CoinbaseErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
    #[serde(default)]
    pub errors: Vec<V2Error>,
}

#[derive(Debug, Deserialize)]
pub struct V2Error {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub message: String,
}

impl CoinbaseErrorBody {
    /// `(code, message)` when the body carries a readable message
    pub fn code_and_message(&self) -> Option<(String, String)> {
        if let Some(first) = self.errors.first() {
            if !first.message.is_empty() {
                return Some((first.id.clone(), first.message.clone()));
            }
        }
        let message = self
            .message
            .as_ref()
            .or(self.error_description.as_ref())
            .filter(|m| !m.is_empty())?;
        Some((self.error.clone().unwrap_or_default(), message.clone()))
    }
}

/// `/oauth/token` success body
#[derive(Debug, Deserialize)]
pub struct OAuthTokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub expires_in: i64,
    #[serde(default)]
    pub token_type: String,
    #[serde(default)]
    pub scope: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_v2_currency_both_shapes() {
        let old: V2Account = serde_json::from_value(json!({
            "id": "a", "currency": "BTC", "balance": {"amount": "0.1", "currency": "BTC"}
        }))
        .unwrap();
        let new: V2Account = serde_json::from_value(json!({
            "id": "b", "currency": {"code": "BTC", "name": "Bitcoin"}, "balance": {"amount": "0.2", "currency": "BTC"}
        }))
        .unwrap();
        assert_eq!(old.currency.code(), "BTC");
        assert_eq!(new.currency.code(), "BTC");
        assert_eq!(new.balance.amount, dec!(0.2));
    }

    #[test]
    fn test_error_body_shapes() {
        let brokerage: CoinbaseErrorBody = serde_json::from_value(json!({
            "error": "INVALID_ARGUMENT", "message": "invalid product_id", "error_details": "", "preview_failure_reason": ""
        }))
        .unwrap();
        assert_eq!(
            brokerage.code_and_message(),
            Some(("INVALID_ARGUMENT".to_string(), "invalid product_id".to_string()))
        );

        let v2: CoinbaseErrorBody = serde_json::from_value(json!({
            "errors": [{"id": "validation_error", "message": "Amount exceeds balance"}]
        }))
        .unwrap();
        assert_eq!(
            v2.code_and_message(),
            Some(("validation_error".to_string(), "Amount exceeds balance".to_string()))
        );

        let empty: CoinbaseErrorBody = serde_json::from_value(json!({})).unwrap();
        assert_eq!(empty.code_and_message(), None);
    }

    #[test]
    fn test_quote_sized_fill_converts_to_base() {
        let fill: CoinbaseFill = serde_json::from_value(json!({
            "order_id": "o", "price": "50000", "size": "25", "commission": "0.15", "size_in_quote": true
        }))
        .unwrap();
        assert_eq!(fill.base_size(), dec!(0.0005));
    }
}
