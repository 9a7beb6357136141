use rust_decimal::Decimal;
use serde::Deserialize;

/// Error body returned with non-2xx statuses
#[derive(Debug, Deserialize)]
pub struct BinanceError {
    pub code: i64,
    pub msg: String,
}

#[derive(Debug, Deserialize)]
pub struct BinanceExchangeInfo {
    pub symbols: Vec<BinanceMarket>,
}

#[derive(Debug, Deserialize)]
pub struct BinanceMarket {
    pub symbol: String,
    #[serde(default)]
    pub filters: Vec<BinanceFilter>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "filterType")]
pub enum BinanceFilter {
    #[serde(rename = "LOT_SIZE")]
    LotSize {
        #[serde(rename = "stepSize", with = "rust_decimal::serde::str")]
        step_size: Decimal,
    },
    #[serde(rename = "NOTIONAL")]
    Notional {
        #[serde(rename = "minNotional", with = "rust_decimal::serde::str")]
        min_notional: Decimal,
    },
    #[serde(rename = "MIN_NOTIONAL")]
    MinNotional {
        #[serde(rename = "minNotional", with = "rust_decimal::serde::str")]
        min_notional: Decimal,
    },
    #[serde(other)]
    Other,
}

impl BinanceMarket {
    pub fn step_size(&self) -> Option<Decimal> {
        self.filters.iter().find_map(|filter| match filter {
            BinanceFilter::LotSize { step_size } => Some(*step_size),
            _ => None,
        })
    }

    /// `NOTIONAL` supersedes the legacy `MIN_NOTIONAL` filter
    pub fn min_notional(&self) -> Decimal {
        let notional = self.filters.iter().find_map(|filter| match filter {
            BinanceFilter::Notional { min_notional } => Some(*min_notional),
            _ => None,
        });
        let legacy = self.filters.iter().find_map(|filter| match filter {
            BinanceFilter::MinNotional { min_notional } => Some(*min_notional),
            _ => None,
        });
        notional.or(legacy).unwrap_or(Decimal::ZERO)
    }
}

#[derive(Debug, Deserialize)]
pub struct BinanceTickerPrice {
    pub symbol: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct BinanceAccountInfo {
    pub balances: Vec<BinanceBalance>,
}

#[derive(Debug, Deserialize)]
pub struct BinanceBalance {
    pub asset: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub free: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub locked: Decimal,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BinanceOrderResponse {
    pub symbol: String,
    pub order_id: u64,
    pub transact_time: i64,
    pub status: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub executed_qty: Decimal,
    #[serde(rename = "cummulativeQuoteQty", with = "rust_decimal::serde::str")]
    pub cumulative_quote_qty: Decimal,
    #[serde(default)]
    pub fills: Vec<BinanceFill>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BinanceFill {
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub qty: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub commission: Decimal,
    pub commission_asset: String,
}

/// One entry of `/sapi/v1/capital/config/getall`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BinanceCoinConfig {
    pub coin: String,
    #[serde(default)]
    pub network_list: Vec<BinanceNetwork>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BinanceNetwork {
    pub network: String,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub withdraw_enable: bool,
    #[serde(with = "rust_decimal::serde::str")]
    pub withdraw_fee: Decimal,
}

impl BinanceCoinConfig {
    /// Requested network, else the coin's default network
    pub fn network(&self, requested: Option<&str>) -> Option<&BinanceNetwork> {
        match requested {
            Some(name) => self
                .network_list
                .iter()
                .find(|n| n.network.eq_ignore_ascii_case(name)),
            None => self.network_list.iter().find(|n| n.is_default),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BinanceWithdrawResponse {
    pub id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_filters_parse_known_and_unknown_types() {
        let market: BinanceMarket = serde_json::from_value(json!({
            "symbol": "BTCEUR",
            "filters": [
                {"filterType": "PRICE_FILTER", "minPrice": "0.01", "maxPrice": "1000000", "tickSize": "0.01"},
                {"filterType": "LOT_SIZE", "minQty": "0.00001000", "maxQty": "9000", "stepSize": "0.00001000"},
                {"filterType": "NOTIONAL", "minNotional": "5.00000000", "applyMinToMarket": true}
            ]
        }))
        .unwrap();

        assert_eq!(market.step_size(), Some(dec!(0.00001)));
        assert_eq!(market.min_notional(), dec!(5));
    }

    #[test]
    fn test_legacy_min_notional_filter() {
        let market: BinanceMarket = serde_json::from_value(json!({
            "symbol": "BTCEUR",
            "filters": [
                {"filterType": "MIN_NOTIONAL", "minNotional": "10.00000000", "applyToMarket": true, "avgPriceMins": 5}
            ]
        }))
        .unwrap();
        assert_eq!(market.min_notional(), dec!(10));
        assert_eq!(market.step_size(), None);
    }

    #[test]
    fn test_coin_network_selection() {
        let config: BinanceCoinConfig = serde_json::from_value(json!({
            "coin": "BTC",
            "networkList": [
                {"network": "BTC", "isDefault": true, "withdrawEnable": true, "withdrawFee": "0.0002"},
                {"network": "BSC", "isDefault": false, "withdrawEnable": true, "withdrawFee": "0.0000035"}
            ]
        }))
        .unwrap();

        assert_eq!(config.network(None).unwrap().withdraw_fee, dec!(0.0002));
        assert_eq!(config.network(Some("bsc")).unwrap().withdraw_fee, dec!(0.0000035));
        assert!(config.network(Some("LIGHTNING")).is_none());
    }
}
