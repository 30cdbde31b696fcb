use bitcoin_hashes::{sha256, Hash};

use crate::model::LnurlAuthSignature;

/// Derive the LNURL-auth response from a node message signature.
///
/// The counterparty expects the SHA-256 of the signature text returned by the
/// node's message-signing call, as lowercase hex.
pub fn lnurl_auth_signature(node_signature: &str) -> LnurlAuthSignature {
    let digest = sha256::Hash::hash(node_signature.as_bytes());
    LnurlAuthSignature { signature: hex::encode(digest.to_byte_array()) }
}
