use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use url::Url;

use crate::config::EndpointConfig;
use crate::error::{Error, Result};

/// Issues one authenticated request to the node and returns the decoded body.
///
/// A decodable body is returned whatever it contains, including the node's
/// own error payloads. Only transport-level failures are errors here. There
/// is no retry: Lightning operations such as payments are not idempotent.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Call `route` with a JSON `params` body
    async fn call(&self, route: &str, params: Value) -> Result<Value>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn call(&self, route: &str, params: Value) -> Result<Value> {
        (**self).call(route, params).await
    }
}

/// Build the URL for `route` under the versioned `path_prefix`.
///
/// A host without a scheme is assumed to be `https`. Trailing slashes on the
/// host are dropped before joining. With `socket` set, `http(s)` becomes
/// `ws(s)`.
pub fn endpoint_url(
    config: &EndpointConfig,
    path_prefix: &str,
    route: &str,
    socket: bool,
) -> Result<Url> {
    let host = config.host.trim();
    if host.is_empty() {
        return Err(Error::InvalidEndpoint("empty host".to_string()));
    }
    let mut base =
        if host.contains("://") { host.to_string() } else { format!("https://{}", host) };
    while base.ends_with('/') {
        base.pop();
    }
    if let Some(port) = config.port {
        base = format!("{}:{}", base, port);
    }
    if socket {
        if let Some(rest) = base.strip_prefix("https://") {
            base = format!("wss://{}", rest);
        } else if let Some(rest) = base.strip_prefix("http://") {
            base = format!("ws://{}", rest);
        }
    }
    let prefix = path_prefix.trim_matches('/');
    let route = route.trim_start_matches('/');
    let joined = if prefix.is_empty() {
        format!("{}/{}", base, route)
    } else {
        format!("{}/{}/{}", base, prefix, route)
    };
    Url::parse(&joined).map_err(|e| Error::InvalidEndpoint(format!("{}: {}", joined, e)))
}
