use crate::core::{
    credentials::CredentialStore,
    errors::ExchangeError,
    kernel::RestClient,
    sizing::{reduce_execution, OrderSizer, SizingConstraints},
    traits::OrderPlacer,
    types::{ExchangeId, ExecutionDetail, TradeResult},
};
use crate::exchanges::kraken::{rest::KrakenRest, signer::KrakenSigner, types::KrakenOrder};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Market orders usually close immediately; poll briefly before giving up
const ORDER_POLL_ATTEMPTS: usize = 5;
const ORDER_POLL_INTERVAL: Duration = Duration::from_millis(500);

pub struct Trading<R: RestClient> {
    rest: KrakenRest<R>,
    credentials: CredentialStore,
}

impl<R: RestClient + Clone> Trading<R> {
    pub fn new(rest: &KrakenRest<R>, credentials: CredentialStore) -> Self {
        Self {
            rest: rest.clone(),
            credentials,
        }
    }
}

pub fn pair_for(currency: &str) -> String {
    format!("XBT{}", currency.to_ascii_uppercase())
}

/// Kraken reports executions per order with the fee in the quote currency
pub fn execution_detail(order: &KrakenOrder) -> ExecutionDetail {
    ExecutionDetail::OrderLevelOnly {
        executed_qty: order.vol_exec,
        cumulative_quote: order.cost,
        quote_fee: order.fee,
    }
}

fn executed_at(order: &KrakenOrder) -> DateTime<Utc> {
    order
        .closetm
        .or(order.opentm)
        .and_then(|secs| DateTime::from_timestamp_millis((secs * 1000.0) as i64))
        .unwrap_or_else(Utc::now)
}

impl<R: RestClient> Trading<R> {
    async fn await_execution(
        &self,
        txid: &str,
        signer: &KrakenSigner,
    ) -> Result<KrakenOrder, ExchangeError> {
        let mut last = None;
        for attempt in 0..ORDER_POLL_ATTEMPTS {
            if attempt > 0 {
                tokio::time::sleep(ORDER_POLL_INTERVAL).await;
            }
            let mut orders = self.rest.query_orders(txid, signer).await?;
            if let Some(order) = orders.remove(txid) {
                if order.is_closed() {
                    return Ok(order);
                }
                debug!(txid, status = %order.status, attempt, "order not closed yet");
                last = Some(order);
            }
        }

        match last {
            Some(order) if order.vol_exec > Decimal::ZERO => {
                warn!(txid, status = %order.status, "reporting partially executed order");
                Ok(order)
            }
            _ => Err(ExchangeError::InvalidResponse(format!(
                "order {} has not executed",
                txid
            ))),
        }
    }
}

#[async_trait]
impl<R: RestClient> OrderPlacer for Trading<R> {
    #[instrument(skip(self), fields(exchange = "kraken"))]
    async fn execute_market_buy(
        &self,
        fiat_amount: Decimal,
        fee_percent_hint: Option<Decimal>,
        currency: &str,
        user_id: Option<&str>,
    ) -> Result<TradeResult, ExchangeError> {
        let currency = currency.to_ascii_uppercase();
        let pair = pair_for(&currency);

        let asset_pair = self.rest.get_asset_pair(&pair).await?;
        let price = self.rest.get_ticker_price(&pair).await?;
        let constraints =
            SizingConstraints::from_decimals(asset_pair.lot_decimals, asset_pair.min_notional(price));
        let spec = OrderSizer::size(ExchangeId::Kraken, fiat_amount, &currency, price, constraints)?;
        debug!(%price, volume = %spec.quantity, ?fee_percent_hint, "placing market buy");

        let signer = KrakenSigner::load(&self.credentials, user_id).await?;
        let added = self
            .rest
            .add_market_buy(&pair, &spec.quantity.to_string(), &signer)
            .await?;
        let txid = added
            .txid
            .into_iter()
            .next()
            .ok_or_else(|| ExchangeError::InvalidResponse("AddOrder returned no txid".to_string()))?;
        info!(%txid, "market buy submitted");

        let order = self.await_execution(&txid, &signer).await?;
        reduce_execution(txid, &currency, &execution_detail(&order), executed_at(&order))
    }
}
