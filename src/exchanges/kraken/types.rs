use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;

/// Every Kraken response: `{"error": [...], "result": {...}}`
#[derive(Debug, Deserialize)]
pub struct KrakenResponse<T> {
    #[serde(default)]
    pub error: Vec<String>,
    pub result: Option<T>,
}

#[derive(Debug, Deserialize)]
pub struct KrakenBalanceEx {
    #[serde(with = "rust_decimal::serde::str")]
    pub balance: Decimal,
    #[serde(default, with = "rust_decimal::serde::str")]
    pub hold_trade: Decimal,
}

pub type KrakenBalances = HashMap<String, KrakenBalanceEx>;

#[derive(Debug, Deserialize)]
pub struct KrakenTicker {
    /// Last trade closed: `[price, lot volume]`
    pub c: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct KrakenAssetPair {
    #[serde(default)]
    pub altname: String,
    pub lot_decimals: u32,
    #[serde(default, with = "rust_decimal::serde::str_option")]
    pub ordermin: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::str_option")]
    pub costmin: Option<Decimal>,
}

impl KrakenAssetPair {
    /// Larger of the cost minimum and the volume minimum valued at `price`
    pub fn min_notional(&self, price: Decimal) -> Decimal {
        let from_volume = self.ordermin.map_or(Decimal::ZERO, |min| min * price);
        self.costmin.unwrap_or(Decimal::ZERO).max(from_volume)
    }
}

#[derive(Debug, Deserialize)]
pub struct KrakenAddOrder {
    pub txid: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct KrakenOrder {
    pub status: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub vol_exec: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub cost: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub fee: Decimal,
    #[serde(default)]
    pub closetm: Option<f64>,
    #[serde(default)]
    pub opentm: Option<f64>,
}

impl KrakenOrder {
    pub fn is_closed(&self) -> bool {
        self.status == "closed"
    }
}

#[derive(Debug, Deserialize)]
pub struct KrakenWithdrawInfo {
    pub method: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub fee: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct KrakenWithdrawal {
    pub refid: String,
}

/// Kraken's asset codes to common tickers: `XXBT`/`XBT` to `BTC`, `ZEUR` to `EUR`
pub fn normalize_asset(asset: &str) -> String {
    let code = match asset.split_once('.') {
        Some((code, _)) => code,
        None => asset,
    };
    let code = if code.len() == 4 && (code.starts_with('X') || code.starts_with('Z')) {
        &code[1..]
    } else {
        code
    };
    match code {
        "XBT" => "BTC".to_string(),
        "XDG" => "DOGE".to_string(),
        other => other.to_string(),
    }
}
