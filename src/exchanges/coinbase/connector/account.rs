use crate::core::{errors::ExchangeError, kernel::RestClient, traits::AccountInfo, types::Balance};
use crate::exchanges::coinbase::{connector::CoinbaseFlavor, rest::CoinbaseRest};
use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::instrument;

pub struct Account<R: RestClient> {
    rest: CoinbaseRest<R>,
    flavor: CoinbaseFlavor,
}

impl<R: RestClient + Clone> Account<R> {
    pub fn new(rest: &CoinbaseRest<R>, flavor: CoinbaseFlavor) -> Self {
        Self {
            rest: rest.clone(),
            flavor,
        }
    }
}

impl<R: RestClient> Account<R> {
    /// Id of the BTC account, used as the source of withdrawals
    pub async fn btc_account_id(&self, user_id: Option<&str>) -> Result<String, ExchangeError> {
        let id = match self.flavor {
            CoinbaseFlavor::Advanced => self
                .rest
                .list_brokerage_accounts(user_id)
                .await?
                .into_iter()
                .find(|account| account.currency == "BTC")
                .map(|account| account.uuid),
            CoinbaseFlavor::Retail => self
                .rest
                .list_wallet_accounts(user_id)
                .await?
                .into_iter()
                .find(|account| account.currency.code() == "BTC")
                .map(|account| account.id),
        };
        id.ok_or_else(|| ExchangeError::business("NO_BTC_ACCOUNT", "No Bitcoin account found on Coinbase"))
    }
}

#[async_trait]
impl<R: RestClient> AccountInfo for Account<R> {
    #[instrument(skip(self), fields(exchange = "coinbase"))]
    async fn get_account_balances(
        &self,
        user_id: Option<&str>,
    ) -> Result<Vec<Balance>, ExchangeError> {
        let balances: Vec<Balance> = match self.flavor {
            CoinbaseFlavor::Advanced => self
                .rest
                .list_brokerage_accounts(user_id)
                .await?
                .into_iter()
                .map(|account| Balance {
                    asset: account.currency,
                    free: account.available_balance.value,
                    locked: account.hold.map_or(Decimal::ZERO, |hold| hold.value),
                })
                .collect(),
            CoinbaseFlavor::Retail => self
                .rest
                .list_wallet_accounts(user_id)
                .await?
                .into_iter()
                .map(|account| Balance {
                    asset: account.currency.code().to_string(),
                    free: account.balance.amount,
                    locked: Decimal::ZERO,
                })
                .collect(),
        };

        Ok(balances.into_iter().filter(|b| !b.is_empty()).collect())
    }
}
