//! HTTP plumbing shared by the adapters.

use reqwest::header::{HeaderMap, ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, SET_COOKIE};
use reqwest::{Client, RequestBuilder};

use crate::config::FetchConfig;
use crate::errors::MarketDataError;

pub(crate) const ACCEPT_HTML: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
pub(crate) const ACCEPT_JSON: &str = "application/json, text/plain, */*";
pub(crate) const ACCEPT_LANGUAGE_ZH: &str = "zh-CN,zh;q=0.9";

/// A fully read response body with the headers adapters care about.
#[derive(Debug)]
pub(crate) struct FetchedBody {
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl FetchedBody {
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
    }

    /// All `Set-Cookie` values joined into a single `Cookie` header value.
    pub fn cookie_header(&self) -> String {
        join_set_cookie(
            self.headers
                .get_all(SET_COOKIE)
                .iter()
                .filter_map(|value| value.to_str().ok()),
        )
    }
}

/// Default client used by most adapters.
pub(crate) fn default_client(config: &FetchConfig) -> Client {
    Client::builder()
        .timeout(config.request_timeout)
        .user_agent(config.user_agent.clone())
        .build()
        .unwrap_or_else(|_| Client::new())
}

pub(crate) fn html_request(client: &Client, url: &str) -> RequestBuilder {
    client
        .get(url)
        .header(ACCEPT, ACCEPT_HTML)
        .header(ACCEPT_LANGUAGE, ACCEPT_LANGUAGE_ZH)
}

pub(crate) fn json_request(client: &Client, url: &str) -> RequestBuilder {
    client.get(url).header(ACCEPT, ACCEPT_JSON)
}

/// Send a request and read the whole body, mapping failures to the
/// source-attributed error taxonomy.
pub(crate) async fn fetch(
    source_id: &str,
    request: RequestBuilder,
) -> Result<FetchedBody, MarketDataError> {
    let response = request
        .send()
        .await
        .map_err(|e| MarketDataError::from_request(source_id, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(MarketDataError::Status {
            source_id: source_id.to_string(),
            status: status.as_u16(),
        });
    }

    let headers = response.headers().clone();
    let body = response
        .bytes()
        .await
        .map_err(|e| MarketDataError::from_request(source_id, e))?
        .to_vec();

    Ok(FetchedBody { headers, body })
}

/// Decode a JSON body into `T`.
pub(crate) fn decode_json<T: serde::de::DeserializeOwned>(
    source_id: &str,
    body: &[u8],
) -> Result<T, MarketDataError> {
    serde_json::from_slice(body).map_err(|e| MarketDataError::Decode {
        source_id: source_id.to_string(),
        message: e.to_string(),
    })
}

/// Keep only the `name=value` part of each `Set-Cookie` header.
pub(crate) fn join_set_cookie<'a>(items: impl IntoIterator<Item = &'a str>) -> String {
    items
        .into_iter()
        .filter_map(|item| item.split(';').next())
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .collect::<Vec<_>>()
        .join("; ")
}
