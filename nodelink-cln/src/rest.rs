use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, error, trace};
use nodelink::transport::endpoint_url;
use nodelink::{Error, Result, SettingsProvider, Transport};
use reqwest::Client;
use serde_json::Value;
use url::Url;

/// Versioned path segment of every REST route
pub const API_PREFIX: &str = "v1";

/// Header carrying the rune
pub const AUTH_HEADER: &str = "Rune";

/// Async HTTP transport to a CLN REST endpoint.
///
/// Settings are read on every call. The two underlying clients differ only in
/// certificate checking; the one matching the current `tls_verify` is used.
#[derive(Clone)]
pub struct RestTransport {
    settings: Arc<dyn SettingsProvider>,
    verifying: Client,
    trusting: Client,
}

impl RestTransport {
    /// Create a new RestTransport
    pub fn new(settings: Arc<dyn SettingsProvider>) -> Result<Self> {
        let verifying = Client::builder().build().map_err(Error::connectivity)?;
        let trusting = Client::builder()
            .danger_accept_invalid_certs(true)
            .build()
            .map_err(Error::connectivity)?;
        Ok(Self { settings, verifying, trusting })
    }

    /// URL of `route` for the current settings, `ws(s)` when `socket` is set
    pub fn url(&self, route: &str, socket: bool) -> Result<Url> {
        endpoint_url(&self.settings.endpoint(), API_PREFIX, route, socket)
    }
}

#[async_trait]
impl Transport for RestTransport {
    async fn call(&self, route: &str, params: Value) -> Result<Value> {
        let endpoint = self.settings.endpoint();
        let url = endpoint_url(&endpoint, API_PREFIX, route, false)?;
        let client = if endpoint.tls_verify { &self.verifying } else { &self.trusting };
        trace!("REST request: {} {}", route, params);

        let res = client
            .post(url.clone())
            .header(AUTH_HEADER, endpoint.credential.as_str())
            .json(&params)
            .send()
            .await;
        let response = match res {
            Ok(response) => response,
            Err(err) => {
                error!("{}: {}: {}", route, url, err);
                return Err(Error::connectivity(err));
            }
        };

        let status = response.status();
        let body = match response.bytes().await {
            Ok(body) => body,
            Err(err) => {
                error!("{}: {}: reading body: {}", route, url, err);
                return Err(Error::connectivity(err));
            }
        };
        let value: Value = serde_json::from_slice(&body).map_err(|e| {
            Error::InvalidResponse(format!("{}: HTTP {}: {}", route, status, e))
        })?;
        if !status.is_success() {
            debug!("{}: HTTP {}: {}", route, status, value);
        }
        Ok(value)
    }
}
