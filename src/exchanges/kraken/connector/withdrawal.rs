use crate::core::{
    credentials::CredentialStore,
    errors::ExchangeError,
    kernel::RestClient,
    traits::{WithdrawalProvider, FALLBACK_WITHDRAWAL_FEE_BTC},
};
use crate::exchanges::kraken::{rest::KrakenRest, signer::KrakenSigner};
use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::{debug, info, instrument, warn};

/// Amount used to price a withdrawal when estimating its fee
const FEE_QUOTE_AMOUNT: &str = "0.001";

pub struct Withdrawal<R: RestClient> {
    rest: KrakenRest<R>,
    credentials: CredentialStore,
}

impl<R: RestClient + Clone> Withdrawal<R> {
    pub fn new(rest: &KrakenRest<R>, credentials: CredentialStore) -> Self {
        Self {
            rest: rest.clone(),
            credentials,
        }
    }
}

impl<R: RestClient> Withdrawal<R> {
    async fn fetch_withdrawal_fee(
        &self,
        user_id: Option<&str>,
        key: &str,
    ) -> Result<Decimal, ExchangeError> {
        let signer = KrakenSigner::load(&self.credentials, user_id).await?;
        let info = self
            .rest
            .get_withdraw_info(key, FEE_QUOTE_AMOUNT, &signer)
            .await?;
        Ok(info.fee)
    }
}

#[async_trait]
impl<R: RestClient> WithdrawalProvider for Withdrawal<R> {
    /// Estimated through `WithdrawInfo`, which needs a registered withdrawal key
    #[instrument(skip(self), fields(exchange = "kraken"))]
    async fn get_withdrawal_fee(
        &self,
        user_id: Option<&str>,
        destination: Option<&str>,
        _network: Option<&str>,
    ) -> Decimal {
        let Some(key) = destination.filter(|key| !key.is_empty()) else {
            debug!("no withdrawal key given, using fallback fee");
            return FALLBACK_WITHDRAWAL_FEE_BTC;
        };

        match self.fetch_withdrawal_fee(user_id, key).await {
            Ok(fee) => fee,
            Err(e) => {
                warn!(error = %e, "withdrawal fee lookup failed, using fallback");
                FALLBACK_WITHDRAWAL_FEE_BTC
            }
        }
    }

    /// `destination` is the label of an address registered on Kraken
    #[instrument(skip(self), fields(exchange = "kraken"))]
    async fn execute_withdrawal(
        &self,
        destination: &str,
        amount_btc: Decimal,
        _network: Option<&str>,
        user_id: Option<&str>,
    ) -> Result<String, ExchangeError> {
        if destination.trim().is_empty() {
            return Err(ExchangeError::InvalidParameters(
                "A Kraken withdrawal address name is required".to_string(),
            ));
        }
        if amount_btc <= Decimal::ZERO {
            return Err(ExchangeError::InvalidParameters(
                "Withdrawal amount must be positive".to_string(),
            ));
        }

        let signer = KrakenSigner::load(&self.credentials, user_id).await?;
        let withdrawal = self
            .rest
            .withdraw(destination, &amount_btc.to_string(), &signer)
            .await?;

        info!(refid = %withdrawal.refid, "withdrawal submitted");
        Ok(withdrawal.refid)
    }
}
