use super::client::{CachingHttpClient, FetchRequest, ResponseParser};
use super::util::{deserialize_price, round_to_cents};
use crate::core::error::{ParseError, ProviderError};
use crate::core::price::{CurrencyPrice, PriceProvider};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

pub const BB_RESPONSE_CACHE_KEY: &str = "bb_response";
pub const BB_RESPONSE_EXPIRATION: Duration = Duration::from_secs(10 * 60);

const PROVIDER_NAME: &str = "BB";

#[derive(Debug, Deserialize)]
struct BbResponse {
    object: Option<BbObject>,
}

#[derive(Debug, Deserialize)]
struct BbObject {
    daiars: Option<BbPrice>,
    daiusd: Option<BbPrice>,
    btcars: Option<BbPrice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BbPrice {
    #[serde(rename = "purchase_price", deserialize_with = "deserialize_price")]
    pub bid_price: f64,
    pub bid_currency: String,
    #[serde(rename = "selling_price", deserialize_with = "deserialize_price")]
    pub ask_price: f64,
    pub ask_currency: String,
    pub currency: String,
    pub price_change_percent: Option<String>,
    pub market_identifier: Option<String>,
}

impl BbPrice {
    fn to_currency_price(&self) -> CurrencyPrice {
        CurrencyPrice {
            description: format!(
                "{}/{}",
                self.bid_currency.to_uppercase(),
                self.ask_currency.to_uppercase()
            ),
            // "$" alone is ambiguous next to "US$"
            currency_symbol: self.currency.replace('$', "S"),
            bid_price: self.bid_price,
            ask_price: self.ask_price,
        }
    }
}

/// The markets the provider reports, all guaranteed present.
#[derive(Debug, Clone)]
pub struct BbMarkets {
    pub dai_ars: BbPrice,
    pub dai_usd: BbPrice,
    pub btc_ars: BbPrice,
}

impl BbMarkets {
    /// DAI/ARS, DAI/USD, BTC/ARS, then the derived ARS/USD rate.
    pub fn last_prices(&self) -> Vec<CurrencyPrice> {
        vec![
            self.dai_ars.to_currency_price(),
            self.dai_usd.to_currency_price(),
            self.btc_ars.to_currency_price(),
            self.ars_usd(),
        ]
    }

    /// Pesos per dollar through DAI. Single value: bid is always 0.
    fn ars_usd(&self) -> CurrencyPrice {
        CurrencyPrice {
            description: "ARS/USD".to_string(),
            currency_symbol: String::new(),
            bid_price: 0.0,
            ask_price: round_to_cents(self.dai_ars.ask_price / self.dai_usd.bid_price),
        }
    }
}

/// Decodes a BB tickers payload, failing when any reported market is absent.
#[derive(Debug, Clone, Copy, Default)]
pub struct BbResponseParser;

impl ResponseParser for BbResponseParser {
    type Output = BbMarkets;

    fn parse(&self, body: &[u8]) -> Result<BbMarkets, ParseError> {
        let response: BbResponse = serde_json::from_slice(body)?;
        let object = response.object.ok_or(ParseError::MissingField("object"))?;

        let markets = BbMarkets {
            dai_ars: object
                .daiars
                .ok_or(ParseError::MissingField("object.daiars"))?,
            dai_usd: object
                .daiusd
                .ok_or(ParseError::MissingField("object.daiusd"))?,
            btc_ars: object
                .btcars
                .ok_or(ParseError::MissingField("object.btcars"))?,
        };

        // The ARS/USD rate divides by this
        let divisor = markets.dai_usd.bid_price;
        if !divisor.is_finite() || divisor <= 0.0 {
            return Err(ParseError::InvalidPrice {
                field: "object.daiusd.purchase_price",
                value: divisor,
            });
        }

        Ok(markets)
    }
}

pub struct BbProvider {
    base_url: String,
    client: CachingHttpClient,
}

impl BbProvider {
    pub fn new(base_url: &str, client: CachingHttpClient) -> Self {
        Self {
            base_url: base_url.to_string(),
            client,
        }
    }

    fn request(&self) -> FetchRequest<BbResponseParser> {
        FetchRequest {
            url: self.base_url.clone(),
            cache_key: BB_RESPONSE_CACHE_KEY.to_string(),
            ttl: BB_RESPONSE_EXPIRATION,
            parser: BbResponseParser,
        }
    }
}

#[async_trait]
impl PriceProvider for BbProvider {
    #[instrument(name = "BbPriceFetch", skip(self))]
    async fn fetch_last_prices(&self) -> Result<Vec<CurrencyPrice>, ProviderError> {
        let markets = self
            .client
            .get(self.request())
            .await
            .map_err(|e| ProviderError::new(PROVIDER_NAME, e))?;

        let prices = markets.last_prices();
        debug!(count = prices.len(), "Derived prices");
        Ok(prices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cache::Cache;
    use crate::providers::client::{CachedValue, DEFAULT_TIMEOUT};
    use crate::store::memory::MemoryCache;
    use std::sync::Arc;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn market_json(
        bid_currency: &str,
        ask_currency: &str,
        bid: &str,
        ask: &str,
        symbol: &str,
    ) -> String {
        format!(
            r#"{{
                "purchase_price": "{bid}",
                "bid_currency": "{bid_currency}",
                "selling_price": "{ask}",
                "ask_currency": "{ask_currency}",
                "price_change_percent": "+0.5%",
                "currency": "{symbol}",
                "market_identifier": "{bid_currency}{ask_currency}"
            }}"#
        )
    }

    fn full_payload() -> String {
        format!(
            r#"{{"object": {{"daiars": {}, "daiusd": {}, "btcars": {}}}}}"#,
            market_json("dai", "ars", "94.0", "96.5", "$"),
            market_json("dai", "usd", "1.01", "1.05", "US$"),
            market_json("btc", "ars", "900000.00", "950000.00", "$"),
        )
    }

    async fn create_mock_server(body: String) -> MockServer {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/market/tickers/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&mock_server)
            .await;
        mock_server
    }

    fn new_provider(server: &MockServer) -> (BbProvider, Arc<MemoryCache<String, CachedValue>>) {
        let cache = Arc::new(MemoryCache::<String, CachedValue>::new());
        let client = CachingHttpClient::new(cache.clone(), DEFAULT_TIMEOUT).unwrap();
        let url = format!("{}/api/market/tickers/", server.uri());
        (BbProvider::new(&url, client), cache)
    }

    #[tokio::test]
    async fn test_fetch_last_prices_in_fixed_order() {
        let server = create_mock_server(full_payload()).await;
        let (provider, _) = new_provider(&server);

        let prices = provider.fetch_last_prices().await.unwrap();

        let descriptions: Vec<_> = prices.iter().map(|p| p.description.as_str()).collect();
        assert_eq!(descriptions, ["DAI/ARS", "DAI/USD", "BTC/ARS", "ARS/USD"]);

        assert_eq!(prices[0].bid_price, 94.0);
        assert_eq!(prices[0].ask_price, 96.5);
        assert_eq!(prices[1].bid_price, 1.01);
        assert_eq!(prices[1].ask_price, 1.05);
        assert_eq!(prices[2].bid_price, 900000.0);
        assert_eq!(prices[2].ask_price, 950000.0);
    }

    #[tokio::test]
    async fn test_cross_rate_is_rounded_single_value() {
        let server = create_mock_server(full_payload()).await;
        let (provider, _) = new_provider(&server);

        let prices = provider.fetch_last_prices().await.unwrap();
        let ars_usd = &prices[3];

        assert_eq!(ars_usd.description, "ARS/USD");
        assert_eq!(ars_usd.bid_price, 0.0);
        assert_eq!(ars_usd.ask_price, 95.54);
        assert!(ars_usd.is_single_value());
        assert!(ars_usd.currency_symbol.is_empty());
    }

    #[tokio::test]
    async fn test_dollar_glyph_is_replaced() {
        let server = create_mock_server(full_payload()).await;
        let (provider, _) = new_provider(&server);

        let prices = provider.fetch_last_prices().await.unwrap();

        assert_eq!(prices[0].currency_symbol, "S");
        assert_eq!(prices[1].currency_symbol, "USS");
        assert_eq!(prices[2].currency_symbol, "S");
    }

    #[tokio::test]
    async fn test_cached_response_is_reused() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/market/tickers/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(full_payload()))
            .expect(1)
            .mount(&mock_server)
            .await;
        let (provider, cache) = new_provider(&mock_server);

        let first = provider.fetch_last_prices().await.unwrap();
        let second = provider.fetch_last_prices().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(cache.len().await, 1);
        assert!(cache.get(&BB_RESPONSE_CACHE_KEY.to_string()).await.is_some());
    }

    #[tokio::test]
    async fn test_missing_market_is_parse_error_and_not_cached() {
        let body = format!(
            r#"{{"object": {{"daiusd": {}, "btcars": {}}}}}"#,
            market_json("dai", "usd", "1.01", "1.05", "US$"),
            market_json("btc", "ars", "900000.00", "950000.00", "$"),
        );
        let server = create_mock_server(body).await;
        let (provider, cache) = new_provider(&server);

        let err = provider.fetch_last_prices().await.unwrap_err();

        assert!(err.is_parse());
        assert_eq!(
            err.to_string(),
            "Fetching prices from BB failed: Missing field in response: object.daiars"
        );
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_missing_object_is_parse_error() {
        let server = create_mock_server(r#"{"errors": []}"#.to_string()).await;
        let (provider, cache) = new_provider(&server);

        let err = provider.fetch_last_prices().await.unwrap_err();

        assert!(err.is_parse());
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_zero_dollar_bid_is_parse_error() {
        let body = format!(
            r#"{{"object": {{"daiars": {}, "daiusd": {}, "btcars": {}}}}}"#,
            market_json("dai", "ars", "94.0", "96.5", "$"),
            market_json("dai", "usd", "0", "1.05", "US$"),
            market_json("btc", "ars", "900000.00", "950000.00", "$"),
        );
        let server = create_mock_server(body).await;
        let (provider, cache) = new_provider(&server);

        let err = provider.fetch_last_prices().await.unwrap_err();

        assert!(err.is_parse());
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_non_finite_price_is_parse_error_and_not_cached() {
        let body = format!(
            r#"{{"object": {{"daiars": {}, "daiusd": {}, "btcars": {}}}}}"#,
            market_json("dai", "ars", "94.0", "NaN", "$"),
            market_json("dai", "usd", "1.01", "1.05", "US$"),
            market_json("btc", "ars", "inf", "1e400", "$"),
        );
        let server = create_mock_server(body).await;
        let (provider, cache) = new_provider(&server);

        let err = provider.fetch_last_prices().await.unwrap_err();

        assert!(err.is_parse());
        assert!(err.to_string().contains("invalid price \"NaN\""));
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_server_error_is_fetch_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;
        let (provider, cache) = new_provider(&mock_server);

        let err = provider.fetch_last_prices().await.unwrap_err();

        assert!(err.is_fetch());
        assert!(err.to_string().contains("HTTP error: 503"));
        assert!(cache.is_empty().await);
    }

    #[test]
    fn test_parser_accepts_numeric_prices() {
        let body = r#"{"object": {
            "daiars": {"purchase_price": 94, "bid_currency": "dai", "selling_price": 96.5,
                       "ask_currency": "ars", "currency": "$"},
            "daiusd": {"purchase_price": 1.01, "bid_currency": "dai", "selling_price": 1.05,
                       "ask_currency": "usd", "currency": "US$"},
            "btcars": {"purchase_price": 1, "bid_currency": "btc", "selling_price": 2,
                       "ask_currency": "ars", "currency": "$"}
        }}"#;

        let markets = BbResponseParser.parse(body.as_bytes()).unwrap();
        assert_eq!(markets.dai_ars.ask_price, 96.5);
        assert!(markets.dai_ars.market_identifier.is_none());
        assert_eq!(markets.last_prices()[3].ask_price, 95.54);
    }
}
