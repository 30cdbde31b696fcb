#![allow(missing_docs)]

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::amount::Msat;

/// A channel in the active-channel view.
///
/// Monetary fields are exact satoshi decimal strings, see
/// [`Msat::to_sat_string`](crate::amount::Msat::to_sat_string).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub active: bool,
    pub remote_pubkey: String,
    pub channel_point: Option<String>,
    pub chan_id: Option<String>,
    pub alias: Option<String>,
    pub capacity: String,
    pub local_balance: String,
    pub remote_balance: String,
    pub total_satoshis_sent: String,
    pub total_satoshis_received: String,
    pub num_updates: String,
    pub csv_delay: Option<u64>,
    pub private: bool,
    pub local_chan_reserve_sat: String,
    pub remote_chan_reserve_sat: String,
    pub close_address: Option<String>,
}

/// On-chain balance.
///
/// Components are kept in msat so output values that are not whole satoshis
/// survive. The total is derived, so it always equals confirmed plus
/// unconfirmed. Serializes as exact satoshi decimal strings, like
/// [`LightningBalance`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockchainBalance {
    confirmed: Msat,
    unconfirmed: Msat,
}

impl BlockchainBalance {
    /// Create from the two components
    pub fn new(confirmed: Msat, unconfirmed: Msat) -> Self {
        Self { confirmed, unconfirmed }
    }

    pub fn confirmed_balance(&self) -> Msat {
        self.confirmed
    }

    pub fn unconfirmed_balance(&self) -> Msat {
        self.unconfirmed
    }

    /// Confirmed plus unconfirmed, saturating
    pub fn total_balance(&self) -> Msat {
        Msat(self.confirmed.msat().saturating_add(self.unconfirmed.msat()))
    }
}

impl Serialize for BlockchainBalance {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("BlockchainBalance", 3)?;
        s.serialize_field("total_balance", &self.total_balance().to_sat_string())?;
        s.serialize_field("confirmed_balance", &self.confirmed.to_sat_string())?;
        s.serialize_field("unconfirmed_balance", &self.unconfirmed.to_sat_string())?;
        s.end()
    }
}

/// Off-chain balance split by channel state, in exact satoshi decimal strings
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct LightningBalance {
    /// Our side of normal, open channels
    pub balance: String,
    /// Our side of channels awaiting funding confirmation
    pub pending_open_balance: String,
}

/// Wallet outputs
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Transactions {
    pub transactions: Vec<Value>,
}

/// Outgoing payments
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Payments {
    pub payments: Vec<Value>,
}

/// Routing fees earned, in an exact satoshi decimal string
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct FeeReport {
    pub total_fee_sum: String,
}

/// A node signature over an arbitrary message
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SignedMessage {
    pub signature: String,
    pub recid: Option<String>,
    pub zbase: Option<String>,
}

/// Outcome of a message verification
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct VerifiedMessage {
    pub verified: bool,
    pub pubkey: Option<String>,
}

/// The LNURL-auth response signature, lowercase hex
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct LnurlAuthSignature {
    pub signature: String,
}

/// On-chain send
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionRequest {
    /// Destination address
    pub addr: String,
    /// Satoshis to send, ignored when `send_all` is set
    #[serde(default)]
    pub amount: u64,
    /// Decimal sat/vbyte
    pub sat_per_vbyte: String,
    /// Spend only these outpoints (`txid:vout`)
    #[serde(default)]
    pub utxos: Option<Vec<String>>,
    /// Sweep the whole wallet
    #[serde(default)]
    pub send_all: bool,
}

/// Channel open
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct OpenChannelRequest {
    /// Peer node id
    pub node_pubkey: String,
    /// Channel size in satoshis
    pub satoshis: u64,
    /// Decimal sat/vbyte
    pub sat_per_vbyte: String,
    /// Do not announce the channel
    #[serde(default)]
    pub private: bool,
    /// Minimum confirmations of the funding inputs
    #[serde(default)]
    pub min_confs: Option<u32>,
    /// Fund from these outpoints (`txid:vout`)
    #[serde(default)]
    pub utxos: Vec<String>,
}

/// Peer connection
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ConnectPeerRequest {
    pub pubkey: String,
    pub host: String,
}

/// Invoice creation
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct InvoiceRequest {
    #[serde(default)]
    pub memo: String,
    /// Satoshis
    pub value: u64,
    /// Seconds
    pub expiry: u64,
}

/// BOLT11 payment
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct PayInvoiceRequest {
    pub payment_request: String,
    /// Satoshis, for invoices without an amount
    #[serde(default)]
    pub amt: Option<u64>,
    #[serde(default)]
    pub max_fee_percent: Option<f64>,
}

/// Spontaneous payment
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct KeysendRequest {
    pub pubkey: String,
    /// Satoshis
    pub amt: u64,
    #[serde(default)]
    pub max_fee_percent: Option<f64>,
}

/// Routing fee policy update
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct SetFeesRequest {
    /// Apply to every channel
    #[serde(default)]
    pub global: bool,
    /// Target channel when not global
    #[serde(default)]
    pub channel_id: Option<String>,
    pub base_fee_msat: u64,
    /// Proportional fee, parts per million
    pub fee_rate_ppm: u64,
}

/// Message verification
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct VerifyMessageRequest {
    pub msg: String,
    /// zbase-encoded signature
    pub signature: String,
    /// Expected signer, when known
    #[serde(default)]
    pub pubkey: Option<String>,
}

/// Offer amount: a fixed value or whatever the payer chooses
#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OfferAmount {
    #[default]
    Any,
    Sat(u64),
}

/// BOLT12 offer creation
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateOfferRequest {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub single_use: bool,
    #[serde(default)]
    pub amount: OfferAmount,
}
