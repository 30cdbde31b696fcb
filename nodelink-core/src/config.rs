use core::fmt;
use std::sync::{Arc, RwLock};

use serde::Deserialize;

/// Where the node is and how to authenticate to it
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct EndpointConfig {
    /// Host name or address, optionally with an `http://` or `https://` scheme
    pub host: String,
    /// TCP port, omitted from the URL when absent
    #[serde(default)]
    pub port: Option<u16>,
    /// Opaque bearer credential
    #[serde(default)]
    pub credential: String,
    /// Verify the node's TLS certificate
    #[serde(default = "default_tls_verify")]
    pub tls_verify: bool,
}

fn default_tls_verify() -> bool {
    true
}

impl EndpointConfig {
    /// Create a config with TLS verification on
    pub fn new(host: impl Into<String>, port: Option<u16>, credential: impl Into<String>) -> Self {
        Self { host: host.into(), port, credential: credential.into(), tls_verify: true }
    }

    /// Builder-style TLS verification toggle
    pub fn with_tls_verify(mut self, tls_verify: bool) -> Self {
        self.tls_verify = tls_verify;
        self
    }
}

// the credential must never reach a log line
impl fmt::Debug for EndpointConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("credential", &"<redacted>")
            .field("tls_verify", &self.tls_verify)
            .finish()
    }
}

/// Source of the current endpoint configuration.
///
/// Transports read it on every call, so switching nodes at runtime does not
/// require rebuilding the adapter.
pub trait SettingsProvider: Send + Sync {
    /// A snapshot of the current endpoint
    fn endpoint(&self) -> EndpointConfig;
}

impl SettingsProvider for EndpointConfig {
    fn endpoint(&self) -> EndpointConfig {
        self.clone()
    }
}

impl<S: SettingsProvider + ?Sized> SettingsProvider for Arc<S> {
    fn endpoint(&self) -> EndpointConfig {
        (**self).endpoint()
    }
}

/// A settings handle that can be updated while adapters are in use
#[derive(Clone, Debug)]
pub struct SharedSettings {
    inner: Arc<RwLock<EndpointConfig>>,
}

impl SharedSettings {
    /// Create a new handle
    pub fn new(config: EndpointConfig) -> Self {
        Self { inner: Arc::new(RwLock::new(config)) }
    }

    /// Replace the endpoint; subsequent calls on every clone see the new value
    pub fn update(&self, config: EndpointConfig) {
        let mut guard = match self.inner.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = config;
    }
}

impl SettingsProvider for SharedSettings {
    fn endpoint(&self) -> EndpointConfig {
        match self.inner.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}
