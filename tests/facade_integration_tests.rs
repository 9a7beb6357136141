mod common;

use common::{api_keys, harness, CDP_KEY_NAME, TEST_EC_PEM, USER};
use dcakit::core::credentials::CdpCredentials;
use dcakit::core::errors::UNAVAILABLE_MESSAGE;
use dcakit::{ExchangeId, ExchangeKeys};
use rust_decimal_macros::dec;
use wiremock::matchers::any;
use wiremock::{Mock, MockServer, ResponseTemplate};

const KRAKEN_SECRET: &str =
    "kQH5HW/8p1uGOVjbgWA7FunAmGO8lsSUXNsu3eow76sz84Q18fWxnyRzBHCd3pd5nE9qa99HAZtuZuj6F1huXg==";

async fn outage() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(
            ResponseTemplate::new(503)
                .insert_header("content-type", "text/html")
                .set_body_string("<!DOCTYPE html><html><body>Service Unavailable</body></html>"),
        )
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn test_html_outage_is_generic_on_every_venue() {
    let server = outage().await;
    let h = harness(&server);
    h.facade
        .store_exchange_keys(ExchangeId::Binance, USER, api_keys("k", "s"))
        .await;
    h.facade
        .store_exchange_keys(ExchangeId::Kraken, USER, api_keys("k", KRAKEN_SECRET))
        .await;
    h.facade
        .store_exchange_keys(
            ExchangeId::CoinbaseAdvanced,
            USER,
            ExchangeKeys::Cdp(CdpCredentials::new(CDP_KEY_NAME, TEST_EC_PEM)),
        )
        .await;

    for exchange in [ExchangeId::Binance, ExchangeId::Kraken, ExchangeId::CoinbaseAdvanced] {
        let balances = h.facade.get_account_balances(exchange, USER).await;
        assert!(!balances.success, "{}", exchange);
        assert_eq!(balances.error.as_deref(), Some(UNAVAILABLE_MESSAGE), "{}", exchange);

        let buy = h
            .facade
            .execute_market_buy(exchange, dec!(35), None, "EUR", USER)
            .await;
        assert_eq!(buy.error.as_deref(), Some(UNAVAILABLE_MESSAGE), "{}", exchange);
    }
}

#[tokio::test]
async fn test_withdrawal_fee_never_fails() {
    let server = outage().await;
    let h = harness(&server);
    h.facade
        .store_exchange_keys(ExchangeId::Binance, USER, api_keys("k", "s"))
        .await;
    h.facade
        .store_exchange_keys(ExchangeId::Kraken, USER, api_keys("k", KRAKEN_SECRET))
        .await;

    let binance = h
        .facade
        .get_withdrawal_fee(ExchangeId::Binance, USER, None, None)
        .await;
    assert_eq!(binance.data, Some(dec!(0.0005)));

    let kraken = h
        .facade
        .get_withdrawal_fee(ExchangeId::Kraken, USER, Some("ledger"), None)
        .await;
    assert_eq!(kraken.data, Some(dec!(0.0005)));

    // no stored keys at all still yields the estimate
    let other_user = h
        .facade
        .get_withdrawal_fee(ExchangeId::Binance, Some("user-2"), None, None)
        .await;
    assert_eq!(other_user.data, Some(dec!(0.0005)));

    for exchange in [ExchangeId::CoinbaseAdvanced, ExchangeId::Coinbase] {
        let fee = h.facade.get_withdrawal_fee(exchange, USER, None, None).await;
        assert_eq!(fee.data, Some(dec!(0.0001)), "{}", exchange);
    }
}

#[tokio::test]
async fn test_keys_are_scoped_per_user_and_exchange() {
    let server = MockServer::start().await;
    let h = harness(&server);

    h.facade
        .store_exchange_keys(ExchangeId::Binance, Some("alice"), api_keys("k", "s"))
        .await;

    for (exchange, user, expected) in [
        (ExchangeId::Binance, Some("alice"), true),
        (ExchangeId::Binance, Some("bob"), false),
        (ExchangeId::Binance, None, false),
        (ExchangeId::Kraken, Some("alice"), false),
    ] {
        let has = h.facade.has_exchange_keys(exchange, user).await;
        assert_eq!(has.data, Some(expected), "{} {:?}", exchange, user);
    }

    let missing = h
        .facade
        .get_account_balances(ExchangeId::Binance, Some("bob"))
        .await;
    assert_eq!(
        missing.error.as_deref(),
        Some("No API credentials configured for Binance")
    );
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_wrong_key_kind_is_rejected() {
    let server = MockServer::start().await;
    let h = harness(&server);

    let cdp_on_binance = h
        .facade
        .store_exchange_keys(
            ExchangeId::Binance,
            USER,
            ExchangeKeys::Cdp(CdpCredentials::new(CDP_KEY_NAME, TEST_EC_PEM)),
        )
        .await;
    assert!(!cdp_on_binance.success);

    let blank = h
        .facade
        .store_exchange_keys(ExchangeId::Kraken, USER, api_keys("  ", "secret"))
        .await;
    assert!(!blank.success);
    assert_eq!(
        h.facade.has_exchange_keys(ExchangeId::Kraken, USER).await.data,
        Some(false)
    );
}

#[tokio::test]
async fn test_binance_hidden_in_restricted_countries() {
    let server = MockServer::start().await;
    let h = harness(&server);

    let gb = h.facade.get_available_exchanges_for_user("gb").data.unwrap();
    assert!(!gb.contains(&ExchangeId::Binance));
    assert_eq!(gb.len(), 3);

    let de = h.facade.get_available_exchanges_for_user("DE").data.unwrap();
    assert_eq!(de.first(), Some(&ExchangeId::Binance));
}
