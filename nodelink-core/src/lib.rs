#![crate_name = "nodelink"]

//! A uniform interface over Lightning node backends.
//!
//! Each node implementation provides a [`Backend`]. Application code holds an
//! `Arc<dyn Backend>` chosen at configuration time and never branches on the
//! node type. See [`backend::Backend`] for the operation set and
//! [`capability`] for feature negotiation.

#![forbid(unsafe_code)]
#![warn(rustdoc::broken_intra_doc_links)]
#![warn(missing_docs)]

/// Satoshi / millisatoshi amounts
pub mod amount;
/// The backend trait
pub mod backend;
/// Capability matrix
pub mod capability;
/// Endpoint configuration and settings providers
pub mod config;
/// Errors
pub mod error;
/// LNURL-auth signature derivation
pub mod lnurl;
/// Canonical records and application request shapes
pub mod model;
/// Alias-fallback field resolution
pub mod normalize;
/// Transport abstraction
pub mod transport;
/// Version gate
pub mod version;

pub use backend::Backend;
pub use capability::{Capability, CapabilityRule, Support};
pub use config::{EndpointConfig, SettingsProvider, SharedSettings};
pub use error::{Error, Result};
pub use transport::Transport;
pub use version::{is_supported_version, NodeVersions};
