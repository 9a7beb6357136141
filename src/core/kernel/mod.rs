/// Kernel - exchange-agnostic transport layer
///
/// The kernel contains only transport logic and the authentication seam.
/// Venue modules supply endpoint paths, signers and response mapping.
///
/// # Architecture
///
/// ## Transport
/// - `RestClient`: unified HTTP interface returning parsed JSON or a classified error
/// - `ReqwestRest`: `reqwest`-backed implementation
///
/// ## Authentication
/// - `Signer`: pluggable per-request authentication
/// - `BearerSigner`: OAuth bearer tokens
///
/// Signers are built per call from freshly read credentials and passed into
/// `RestClient::send`.
///
/// # Example
/// ```rust,no_run
/// use dcakit::core::kernel::*;
///
/// # async fn example() -> Result<(), dcakit::ExchangeError> {
/// let rest = RestClientBuilder::new(RestClientConfig::new(
///     "https://api.kraken.com".to_string(),
///     "kraken".to_string(),
/// ))
/// .build()?;
///
/// let ticker = rest.get("/0/public/Ticker", &[("pair", "XBTEUR")], None).await?;
/// # let _ = ticker;
/// # Ok(())
/// # }
/// ```
pub mod rest;
pub mod signer;

pub use rest::{decode, encode_pairs, ReqwestRest, RestClient, RestClientBuilder, RestClientConfig, RestRequest};
pub use signer::{split_query, BearerSigner, SignatureResult, Signer};
