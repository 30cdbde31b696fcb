use async_trait::async_trait;
use serde_json::Value;

use crate::capability::{Capability, CapabilityRule, Support};
use crate::error::Result;
use crate::model::{
    BlockchainBalance, Channel, ConnectPeerRequest, CreateOfferRequest, FeeReport,
    InvoiceRequest, KeysendRequest, LightningBalance, LnurlAuthSignature, OpenChannelRequest,
    PayInvoiceRequest, Payments, SetFeesRequest, SignedMessage, TransactionRequest, Transactions,
    VerifiedMessage, VerifyMessageRequest,
};
use crate::version::NodeVersions;

/// The uniform operation set every node implementation provides.
///
/// Requests are in application terms (satoshis, sat/vbyte) and results are
/// canonical records. Operations that the node reports as failed resolve to
/// [`Error::Remote`](crate::Error::Remote) with the node's payload; operations
/// that cannot reach the node resolve to
/// [`Error::Connectivity`](crate::Error::Connectivity).
///
/// Implementations do not check their own capabilities before acting;
/// callers consult [`Backend::supports`] first.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Short name of the node implementation, for logs
    fn name(&self) -> &'static str;

    /// Whether the node is an LND derivative
    fn is_lnd_based(&self) -> bool {
        false
    }

    /// How `capability` is decided for this backend
    fn capability(&self, capability: Capability) -> CapabilityRule;

    /// Answer a capability without knowing the node's versions.
    ///
    /// [`CapabilityRule::Remote`] capabilities are read from the node with a
    /// read-only query, yielding false when the node does not answer in the
    /// expected shape. Other rules are evaluated locally, so version-gated
    /// capabilities come out false; use [`Backend::supports`] when versions
    /// are known.
    async fn query_capability(&self, capability: Capability) -> bool;

    /// Check a capability against the connected node.
    ///
    /// Static and version-gated capabilities are answered immediately; remote
    /// ones return a pending query.
    fn supports<'a>(&'a self, capability: Capability, node: &NodeVersions) -> Support<'a> {
        match self.capability(capability).evaluate(node) {
            Some(value) => Support::Known(value),
            None => Support::Query(self.query_capability(capability)),
        }
    }

    /// Wallet outputs
    async fn get_transactions(&self) -> Result<Transactions>;

    /// Active channels; closed, on-chain-settled and unconfirmed ones are excluded
    async fn get_channels(&self) -> Result<Vec<Channel>>;

    /// On-chain balance
    async fn get_blockchain_balance(&self) -> Result<BlockchainBalance>;

    /// Off-chain balance
    async fn get_lightning_balance(&self) -> Result<LightningBalance>;

    /// Send on-chain
    async fn send_coins(&self, request: &TransactionRequest) -> Result<Value>;

    /// Identity and status of our node
    async fn get_my_node_info(&self) -> Result<Value>;

    /// Node information
    async fn get_node_info(&self) -> Result<Value>;

    /// Invoices we issued
    async fn get_invoices(&self) -> Result<Value>;

    /// Issue a BOLT11 invoice
    async fn create_invoice(&self, request: &InvoiceRequest) -> Result<Value>;

    /// Outgoing payments
    async fn get_payments(&self) -> Result<Payments>;

    /// Fresh on-chain receive address
    async fn get_new_address(&self) -> Result<Value>;

    /// Fund a channel and wait for the funding transaction to be broadcast
    async fn open_channel(&self, request: &OpenChannelRequest) -> Result<Value>;

    /// Connect to a peer
    async fn connect_peer(&self, request: &ConnectPeerRequest) -> Result<Value>;

    /// Decode a BOLT11/BOLT12 string
    async fn decode_payment_request(&self, payment_request: &str) -> Result<Value>;

    /// Pay a BOLT11 invoice
    async fn pay_lightning_invoice(&self, request: &PayInvoiceRequest) -> Result<Value>;

    /// Spontaneous payment
    async fn send_keysend(&self, request: &KeysendRequest) -> Result<Value>;

    /// Close a channel by id or peer
    async fn close_channel(&self, channel_id: &str) -> Result<Value>;

    /// Routing fees earned
    async fn get_fees(&self) -> Result<FeeReport>;

    /// Update routing fees
    async fn set_fees(&self, request: &SetFeesRequest) -> Result<Value>;

    /// Spendable outputs
    async fn get_utxos(&self) -> Result<Value>;

    /// Sign an arbitrary message with the node key
    async fn sign_message(&self, message: &str) -> Result<SignedMessage>;

    /// Verify a message signature
    async fn verify_message(&self, request: &VerifyMessageRequest) -> Result<VerifiedMessage>;

    /// Answer an LNURL-auth challenge
    async fn lnurl_auth(&self, challenge: &str) -> Result<LnurlAuthSignature>;

    /// BOLT12 offers
    async fn list_offers(&self) -> Result<Value>;

    /// Create a BOLT12 offer
    async fn create_offer(&self, request: &CreateOfferRequest) -> Result<Value>;

    /// Disable a BOLT12 offer
    async fn disable_offer(&self, offer_id: &str) -> Result<Value>;

    /// Request an invoice for `amount_sat` from a BOLT12 offer
    async fn fetch_invoice_from_offer(&self, bolt12: &str, amount_sat: u64) -> Result<Value>;
}
