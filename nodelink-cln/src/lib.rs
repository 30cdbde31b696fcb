#![crate_name = "nodelink_cln"]

//! Core Lightning REST backend.
//!
//! [`ClnRest`] implements [`nodelink::Backend`] over CLN's REST interface,
//! where every RPC method is a `POST /v1/<method>` authenticated by a rune.

#![forbid(unsafe_code)]
#![warn(rustdoc::broken_intra_doc_links)]

/// The backend adapter
pub mod cln;
/// CLN response conversion
pub mod convert;
/// HTTP transport
pub mod rest;

pub use self::cln::ClnRest;
pub use self::rest::RestTransport;
