use crate::core::{
    credentials::CredentialStore,
    errors::ExchangeError,
    kernel::RestClient,
    traits::AccountInfo,
    types::Balance,
};
use crate::exchanges::kraken::{
    rest::KrakenRest,
    signer::KrakenSigner,
    types::{normalize_asset, KrakenBalances},
};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::instrument;

pub struct Account<R: RestClient> {
    rest: KrakenRest<R>,
    credentials: CredentialStore,
}

impl<R: RestClient + Clone> Account<R> {
    pub fn new(rest: &KrakenRest<R>, credentials: CredentialStore) -> Self {
        Self {
            rest: rest.clone(),
            credentials,
        }
    }
}

#[async_trait]
impl<R: RestClient> AccountInfo for Account<R> {
    /// `BalanceEx`: free is the balance less funds held by open orders
    #[instrument(skip(self), fields(exchange = "kraken"))]
    async fn get_account_balances(
        &self,
        user_id: Option<&str>,
    ) -> Result<Vec<Balance>, ExchangeError> {
        let signer = KrakenSigner::load(&self.credentials, user_id).await?;
        let balances = self.rest.get_balances(&signer).await?;

        Ok(merge_balances(balances))
    }
}

/// Fold every Kraken ledger (spot, `.F` flex, `.S` staked) into one entry per asset
pub fn merge_balances(balances: KrakenBalances) -> Vec<Balance> {
    let mut merged: BTreeMap<String, Balance> = BTreeMap::new();
    for (asset, entry) in balances {
        let asset = normalize_asset(&asset);
        let balance = merged.entry(asset.clone()).or_insert_with(|| Balance {
            asset,
            free: Decimal::ZERO,
            locked: Decimal::ZERO,
        });
        balance.free += entry.balance - entry.hold_trade;
        balance.locked += entry.hold_trade;
    }

    merged
        .into_values()
        .filter(|balance| !balance.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_flex_and_spot_btc_merge_into_one_entry() {
        let balances: KrakenBalances = serde_json::from_value(json!({
            "XXBT": {"balance": "0.0100000000", "hold_trade": "0.0020000000"},
            "XBT.F": {"balance": "0.0050000000"},
            "ZEUR": {"balance": "12.5000"},
            "EUR.F": {"balance": "0.0000"}
        }))
        .unwrap();

        let merged = merge_balances(balances);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].asset, "BTC");
        assert_eq!(merged[0].free, dec!(0.013));
        assert_eq!(merged[0].locked, dec!(0.002));
        assert_eq!(merged[1].asset, "EUR");
        assert_eq!(merged[1].free, dec!(12.5));
    }
}
