use crate::core::{
    credentials::CredentialStore,
    errors::ExchangeError,
    kernel::RestClient,
    traits::AccountInfo,
    types::Balance,
};
use crate::exchanges::binance::{rest::BinanceRest, signer::BinanceSigner};
use async_trait::async_trait;
use tracing::instrument;

/// Account implementation for Binance
pub struct Account<R: RestClient> {
    rest: BinanceRest<R>,
    credentials: CredentialStore,
    recv_window: u64,
}

impl<R: RestClient + Clone> Account<R> {
    pub fn new(rest: &R, credentials: CredentialStore, recv_window: u64) -> Self {
        Self {
            rest: BinanceRest::new(rest.clone()),
            credentials,
            recv_window,
        }
    }
}

#[async_trait]
impl<R: RestClient> AccountInfo for Account<R> {
    #[instrument(skip(self), fields(exchange = "binance"))]
    async fn get_account_balances(
        &self,
        user_id: Option<&str>,
    ) -> Result<Vec<Balance>, ExchangeError> {
        let signer = BinanceSigner::load(&self.credentials, user_id, self.recv_window).await?;
        let account_info = self.rest.get_account_info(&signer).await?;

        let balances = account_info
            .balances
            .into_iter()
            .map(|balance| Balance {
                asset: balance.asset,
                free: balance.free,
                locked: balance.locked,
            })
            .filter(|balance| !balance.is_empty())
            .collect();

        Ok(balances)
    }
}
