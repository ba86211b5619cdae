use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, header};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use shared_utils::env::get_env_var;
use snafu::{ResultExt, ensure};
use tracing::debug;

use crate::{
    models::{asset::Symbol, bar::{Bar, BarSeries}, timeframe::Timeframe},
    providers::{
        ApiSnafu, ClientBuildSnafu, DEFAULT_TIMEOUT, DataProvider, EmptyApiKeySnafu,
        EmptyResponseSnafu, InvalidApiKeySnafu, MalformedResponseSnafu, MissingEnvVarSnafu,
        NoTradesYetSnafu, ProviderError, ProviderId, ProviderInitError, RateLimitedSnafu,
        ReqwestSnafu, fugle_rest::response::FugleCandle,
    },
};

pub const BASE_URL: &str = "https://api.fugle.tw/marketdata/v1.0/stock";

/// Environment variable holding the Fugle API key.
pub const API_KEY_ENV: &str = "FUGLE_API_KEY";

pub struct FugleProvider {
    client: Client,
    base_url: String,
}

impl FugleProvider {
    /// Creates a provider against the production endpoint.
    pub fn new(api_key: SecretString) -> Result<Self, ProviderInitError> {
        Self::with_options(api_key, BASE_URL, DEFAULT_TIMEOUT)
    }

    /// Creates a new Fugle provider.
    ///
    /// Reads the API key from the `FUGLE_API_KEY` environment variable.
    pub fn from_env() -> Result<Self, ProviderInitError> {
        let key = get_env_var(API_KEY_ENV).context(MissingEnvVarSnafu)?;
        Self::new(SecretString::from(key))
    }

    /// Creates a provider with an explicit base URL and request timeout.
    ///
    /// The key is trimmed; pasted keys often carry a trailing newline.
    pub fn with_options(
        api_key: SecretString,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ProviderInitError> {
        let trimmed = api_key.expose_secret().trim();
        ensure!(!trimmed.is_empty(), EmptyApiKeySnafu);

        let mut key_value = header::HeaderValue::from_str(trimmed).context(InvalidApiKeySnafu)?;
        key_value.set_sensitive(true);

        let mut headers = header::HeaderMap::new();
        headers.insert("X-API-KEY", key_value);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .context(ClientBuildSnafu)?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl DataProvider for FugleProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Fugle
    }

    async fn fetch_intraday(&self, symbol: &Symbol) -> Result<BarSeries, ProviderError> {
        let url = format!("{}/intraday/candles/{}", self.base_url, symbol.code());
        debug!(%symbol, %url, "fetching fugle intraday candles");

        let response = self.client.get(&url).send().await.context(ReqwestSnafu)?;
        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return RateLimitedSnafu {
                provider: ProviderId::Fugle,
            }
            .fail();
        }
        let body = response.text().await.context(ReqwestSnafu)?;

        let bars = parse_candles(symbol, status, &body)?;
        Ok(BarSeries::new(symbol.clone(), Timeframe::ONE_MINUTE, bars))
    }
}

/// Classifies a candles payload.
///
/// Order matters: an empty payload, then an explicit `error` field, then a
/// missing `data` key, then an empty `data` array.
pub fn parse_candles(
    symbol: &Symbol,
    status: StatusCode,
    body: &str,
) -> Result<Vec<Bar>, ProviderError> {
    let symbol_name = symbol.to_string();
    ensure!(
        !body.trim().is_empty(),
        EmptyResponseSnafu {
            symbol: symbol_name.clone()
        }
    );

    let payload: Value = serde_json::from_str(body).map_err(|e| {
        MalformedResponseSnafu {
            message: format!("invalid JSON: {e}"),
        }
        .build()
    })?;

    let object = match &payload {
        Value::Object(map) if !map.is_empty() => map,
        Value::Null | Value::Object(_) => {
            return EmptyResponseSnafu {
                symbol: symbol_name,
            }
            .fail();
        }
        _ => {
            return MalformedResponseSnafu {
                message: "expected a JSON object",
            }
            .fail();
        }
    };

    if let Some(error) = object.get("error") {
        return ApiSnafu {
            message: value_to_message(error),
        }
        .fail();
    }
    if !status.is_success() {
        let message = object
            .get("message")
            .map(value_to_message)
            .unwrap_or_else(|| status.to_string());
        return ApiSnafu { message }.fail();
    }

    let data = object.get("data").ok_or_else(|| {
        MalformedResponseSnafu {
            message: "missing `data` field",
        }
        .build()
    })?;

    let candles: Vec<FugleCandle> = serde_json::from_value(data.clone()).map_err(|e| {
        MalformedResponseSnafu {
            message: format!("bad candle row: {e}"),
        }
        .build()
    })?;
    ensure!(!candles.is_empty(), NoTradesYetSnafu { symbol: symbol_name });

    Ok(candles.into_iter().map(Bar::from).collect())
}

fn value_to_message(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
