use crate::core::errors::ExchangeError;
use crate::core::kernel::{decode, RestClient, Signer};
use crate::exchanges::kraken::types::{
    KrakenAddOrder, KrakenAssetPair, KrakenBalances, KrakenOrder, KrakenResponse, KrakenTicker,
    KrakenWithdrawInfo, KrakenWithdrawal,
};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Thin typed wrapper around `RestClient` for the Kraken spot API
#[derive(Clone)]
pub struct KrakenRest<R: RestClient> {
    client: R,
    last_nonce: Arc<AtomicU64>,
}

impl<R: RestClient> KrakenRest<R> {
    pub fn new(client: R) -> Self {
        Self {
            client,
            last_nonce: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Millisecond nonce, strictly increasing across clones of this client
    pub fn next_nonce(&self) -> u64 {
        let now = chrono::Utc::now().timestamp_millis().max(0) as u64;
        let mut last = self.last_nonce.load(Ordering::Relaxed);
        loop {
            let next = now.max(last + 1);
            match self.last_nonce.compare_exchange_weak(
                last,
                next,
                Ordering::SeqCst,
                Ordering::Relaxed,
            ) {
                Ok(_) => return next,
                Err(current) => last = current,
            }
        }
    }

    /// `error` entries look like `EOrder:Insufficient funds`; the category is the code
    fn map_kraken_error(errors: &[String]) -> ExchangeError {
        let first = errors.first().map_or("", String::as_str);
        let code = first.split_once(':').map_or(first, |(category, _)| category);
        ExchangeError::business(code, errors.join(", "))
    }

    fn handle_response<T: DeserializeOwned>(
        result: Result<Value, ExchangeError>,
        context: &str,
    ) -> Result<T, ExchangeError> {
        let value = match result {
            Ok(value) => value,
            // Kraken keeps its envelope on error statuses too
            Err(ExchangeError::HttpStatus { status, body }) => {
                match serde_json::from_value::<KrakenResponse<Value>>(body.clone()) {
                    Ok(response) if !response.error.is_empty() => {
                        return Err(Self::map_kraken_error(&response.error))
                    }
                    _ => return Err(ExchangeError::HttpStatus { status, body }),
                }
            }
            Err(other) => return Err(other),
        };

        let response: KrakenResponse<Value> = decode(value, context)?;
        if !response.error.is_empty() {
            return Err(Self::map_kraken_error(&response.error));
        }
        let result = response
            .result
            .ok_or_else(|| ExchangeError::InvalidResponse(format!("{}: missing result", context)))?;
        decode(result, context)
    }

    async fn private<T: DeserializeOwned>(
        &self,
        method: &str,
        params: &[(&str, &str)],
        signer: &dyn Signer,
    ) -> Result<T, ExchangeError> {
        let endpoint = format!("/0/private/{}", method);
        let nonce = self.next_nonce().to_string();
        let mut form = Vec::with_capacity(params.len() + 1);
        form.push(("nonce", nonce.as_str()));
        form.extend_from_slice(params);

        Self::handle_response(
            self.client.post_form(&endpoint, &form, Some(signer)).await,
            method,
        )
    }

    pub async fn get_balances(&self, signer: &dyn Signer) -> Result<KrakenBalances, ExchangeError> {
        self.private("BalanceEx", &[], signer).await
    }

    pub async fn get_ticker_price(&self, pair: &str) -> Result<Decimal, ExchangeError> {
        let tickers: HashMap<String, KrakenTicker> = Self::handle_response(
            self.client.get("/0/public/Ticker", &[("pair", pair)], None).await,
            "Ticker",
        )?;

        let last = tickers
            .into_values()
            .next()
            .and_then(|ticker| ticker.c.into_iter().next())
            .ok_or_else(|| ExchangeError::InvalidResponse(format!("no ticker for {}", pair)))?;
        crate::core::types::conversion::parse_decimal(&last, "last price")
    }

    pub async fn get_asset_pair(&self, pair: &str) -> Result<KrakenAssetPair, ExchangeError> {
        let pairs: HashMap<String, KrakenAssetPair> = Self::handle_response(
            self.client.get("/0/public/AssetPairs", &[("pair", pair)], None).await,
            "AssetPairs",
        )?;

        pairs
            .into_values()
            .next()
            .ok_or_else(|| ExchangeError::Unsupported(format!("Kraken does not list {}", pair)))
    }

    pub async fn add_market_buy(
        &self,
        pair: &str,
        volume: &str,
        signer: &dyn Signer,
    ) -> Result<KrakenAddOrder, ExchangeError> {
        self.private(
            "AddOrder",
            &[
                ("ordertype", "market"),
                ("pair", pair),
                ("type", "buy"),
                ("volume", volume),
            ],
            signer,
        )
        .await
    }

    pub async fn query_orders(
        &self,
        txid: &str,
        signer: &dyn Signer,
    ) -> Result<HashMap<String, KrakenOrder>, ExchangeError> {
        self.private("QueryOrders", &[("txid", txid), ("trades", "true")], signer)
            .await
    }

    pub async fn get_withdraw_info(
        &self,
        key: &str,
        amount: &str,
        signer: &dyn Signer,
    ) -> Result<KrakenWithdrawInfo, ExchangeError> {
        self.private(
            "WithdrawInfo",
            &[("asset", "XBT"), ("key", key), ("amount", amount)],
            signer,
        )
        .await
    }

    pub async fn withdraw(
        &self,
        key: &str,
        amount: &str,
        signer: &dyn Signer,
    ) -> Result<KrakenWithdrawal, ExchangeError> {
        self.private(
            "Withdraw",
            &[("asset", "XBT"), ("key", key), ("amount", amount)],
            signer,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::kernel::ReqwestRest;
    use serde_json::json;

    type Rest = KrakenRest<ReqwestRest>;

    #[test]
    fn test_nonce_is_strictly_increasing() {
        let rest = Rest::new(ReqwestRest::new("http://127.0.0.1:9".to_string(), "kraken".to_string()).unwrap());
        let clone = rest.clone();
        let a = rest.next_nonce();
        let b = clone.next_nonce();
        let c = rest.next_nonce();
        assert!(a < b && b < c);
    }

    #[test]
    fn test_envelope_error_becomes_business_error() {
        let result: Result<KrakenAddOrder, _> = Rest::handle_response(
            Ok(json!({"error": ["EOrder:Insufficient funds"], "result": {}})),
            "AddOrder",
        );
        match result {
            Err(ExchangeError::Business { code, message }) => {
                assert_eq!(code, "EOrder");
                assert_eq!(message, "EOrder:Insufficient funds");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_missing_result_is_invalid_response() {
        let result: Result<KrakenAddOrder, _> =
            Rest::handle_response(Ok(json!({"error": []})), "AddOrder");
        assert!(matches!(result, Err(ExchangeError::InvalidResponse(_))));
    }
}
