use crate::core::errors::ExchangeError;
use crate::core::kernel::{decode, RestClient, RestRequest};
use crate::exchanges::coinbase::auth::CoinbaseAuth;
use crate::exchanges::coinbase::types::{
    CoinbaseAccount, CoinbaseAccounts, CoinbaseErrorBody, CoinbaseFill, CoinbaseFills,
    CoinbaseHistoricalOrder, CoinbaseOrderError, CoinbaseOrderResponse, CoinbaseOrderSummary,
    CoinbaseProduct, V2Account, V2Response, V2Transaction,
};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::json;

/// Upper bound on pages followed when listing accounts
const MAX_PAGES: usize = 20;

/// Typed wrapper over the Coinbase brokerage (`/api/v3`) and wallet (`/v2`) surfaces
#[derive(Clone)]
pub struct CoinbaseRest<R: RestClient> {
    client: R,
    auth: CoinbaseAuth<R>,
}

impl<R: RestClient> CoinbaseRest<R> {
    pub fn new(client: R, auth: CoinbaseAuth<R>) -> Self {
        Self { client, auth }
    }

    fn map_coinbase_error(err: ExchangeError) -> ExchangeError {
        match err {
            ExchangeError::HttpStatus { status, body } => {
                match serde_json::from_value::<CoinbaseErrorBody>(body.clone())
                    .ok()
                    .and_then(|parsed| parsed.code_and_message())
                {
                    Some((code, message)) if code.is_empty() => {
                        ExchangeError::business(status, message)
                    }
                    Some((code, message)) => ExchangeError::business(code, message),
                    None => ExchangeError::HttpStatus { status, body },
                }
            }
            other => other,
        }
    }

    async fn call<T: DeserializeOwned>(
        &self,
        request: RestRequest<'_>,
        user_id: Option<&str>,
        context: &str,
    ) -> Result<T, ExchangeError> {
        let value = self
            .auth
            .send(&self.client, request, user_id)
            .await
            .map_err(Self::map_coinbase_error)?;
        decode(value, context)
    }

    pub async fn list_brokerage_accounts(
        &self,
        user_id: Option<&str>,
    ) -> Result<Vec<CoinbaseAccount>, ExchangeError> {
        let mut accounts = Vec::new();
        let mut cursor = String::new();

        for _ in 0..MAX_PAGES {
            let mut params = vec![("limit", "250")];
            if !cursor.is_empty() {
                params.push(("cursor", cursor.as_str()));
            }
            let request =
                RestRequest::new(Method::GET, "/api/v3/brokerage/accounts").with_query(&params);
            let page: CoinbaseAccounts = self.call(request, user_id, "brokerage/accounts").await?;

            accounts.extend(page.accounts);
            if !page.has_next || page.cursor.is_empty() {
                break;
            }
            cursor = page.cursor;
        }

        Ok(accounts)
    }

    pub async fn list_wallet_accounts(
        &self,
        user_id: Option<&str>,
    ) -> Result<Vec<V2Account>, ExchangeError> {
        let mut accounts = Vec::new();
        let mut starting_after: Option<String> = None;

        for _ in 0..MAX_PAGES {
            let mut params = vec![("limit", "100")];
            if let Some(after) = starting_after.as_deref() {
                params.push(("starting_after", after));
            }
            let request = RestRequest::new(Method::GET, "/v2/accounts").with_query(&params);
            let page: V2Response<Vec<V2Account>> = self.call(request, user_id, "v2/accounts").await?;

            accounts.extend(page.data);
            match page.pagination.and_then(|p| p.next_starting_after) {
                Some(next) if !next.is_empty() => starting_after = Some(next),
                _ => break,
            }
        }

        Ok(accounts)
    }

    pub async fn get_product(
        &self,
        product_id: &str,
        user_id: Option<&str>,
    ) -> Result<CoinbaseProduct, ExchangeError> {
        let endpoint = format!("/api/v3/brokerage/products/{}", product_id);
        self.call(RestRequest::new(Method::GET, &endpoint), user_id, "brokerage/products")
            .await
    }

    /// Market IOC buy by base size; returns the order id
    pub async fn create_market_buy(
        &self,
        product_id: &str,
        base_size: &str,
        user_id: Option<&str>,
    ) -> Result<String, ExchangeError> {
        let body = json!({
            "client_order_id": uuid::Uuid::new_v4().to_string(),
            "product_id": product_id,
            "side": "BUY",
            "order_configuration": {
                "market_market_ioc": {
                    "base_size": base_size
                }
            }
        });
        let request = RestRequest::new(Method::POST, "/api/v3/brokerage/orders").with_json(&body)?;
        let response: CoinbaseOrderResponse =
            self.call(request, user_id, "brokerage/orders").await?;

        match (response.success, response.success_response) {
            (true, Some(success)) => Ok(success.order_id),
            _ => {
                let error = response.error_response.unwrap_or_else(|| CoinbaseOrderError {
                    error: response.failure_reason.clone(),
                    ..CoinbaseOrderError::default()
                });
                Err(ExchangeError::business(error.code(), error.description()))
            }
        }
    }

    pub async fn list_fills(
        &self,
        order_id: &str,
        user_id: Option<&str>,
    ) -> Result<Vec<CoinbaseFill>, ExchangeError> {
        let request = RestRequest::new(Method::GET, "/api/v3/brokerage/orders/historical/fills")
            .with_query(&[("order_ids", order_id)]);
        let fills: CoinbaseFills = self.call(request, user_id, "historical/fills").await?;
        Ok(fills.fills)
    }

    pub async fn get_order(
        &self,
        order_id: &str,
        user_id: Option<&str>,
    ) -> Result<CoinbaseOrderSummary, ExchangeError> {
        let endpoint = format!("/api/v3/brokerage/orders/historical/{}", order_id);
        let order: CoinbaseHistoricalOrder = self
            .call(RestRequest::new(Method::GET, &endpoint), user_id, "historical/order")
            .await?;
        Ok(order.order)
    }

    /// On-chain send from the BTC wallet account
    pub async fn send_bitcoin(
        &self,
        account_id: &str,
        address: &str,
        amount: &str,
        network: &str,
        user_id: Option<&str>,
    ) -> Result<V2Transaction, ExchangeError> {
        let endpoint = format!("/v2/accounts/{}/transactions", account_id);
        let body = json!({
            "type": "send",
            "to": address,
            "amount": amount,
            "currency": "BTC",
            "network": network,
            "idem": uuid::Uuid::new_v4().to_string(),
        });
        let request = RestRequest::new(Method::POST, &endpoint).with_json(&body)?;
        let response: V2Response<V2Transaction> =
            self.call(request, user_id, "v2/transactions").await?;
        Ok(response.data)
    }
}
