use core::fmt;

use futures::future::BoxFuture;

use crate::version::NodeVersions;

/// Features a backend may or may not offer
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Capability {
    MessageSigning,
    LnurlAuth,
    OnchainSends,
    OnchainReceiving,
    LightningSends,
    Keysend,
    ChannelManagement,
    PendingChannels,
    Mpp,
    Amp,
    CoinControl,
    ChannelCoinControl,
    HopPicking,
    Accounts,
    Routing,
    NodeInfo,
    SingleFeesEarnedTotal,
    AddressTypeSelection,
    Taproot,
    BumpFee,
    Lsps,
    NetworkInfo,
    SimpleTaprootChannels,
    CustomPreimages,
    Sweep,
    OnchainBatching,
    ChannelBatching,
    Lsps1CustomMessage,
    Lsps1Rest,
    Offers,
}

impl Capability {
    /// Every capability, in declaration order
    pub const ALL: [Capability; 30] = [
        Capability::MessageSigning,
        Capability::LnurlAuth,
        Capability::OnchainSends,
        Capability::OnchainReceiving,
        Capability::LightningSends,
        Capability::Keysend,
        Capability::ChannelManagement,
        Capability::PendingChannels,
        Capability::Mpp,
        Capability::Amp,
        Capability::CoinControl,
        Capability::ChannelCoinControl,
        Capability::HopPicking,
        Capability::Accounts,
        Capability::Routing,
        Capability::NodeInfo,
        Capability::SingleFeesEarnedTotal,
        Capability::AddressTypeSelection,
        Capability::Taproot,
        Capability::BumpFee,
        Capability::Lsps,
        Capability::NetworkInfo,
        Capability::SimpleTaprootChannels,
        Capability::CustomPreimages,
        Capability::Sweep,
        Capability::OnchainBatching,
        Capability::ChannelBatching,
        Capability::Lsps1CustomMessage,
        Capability::Lsps1Rest,
        Capability::Offers,
    ];

    /// Stable snake_case name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MessageSigning => "message_signing",
            Self::LnurlAuth => "lnurl_auth",
            Self::OnchainSends => "onchain_sends",
            Self::OnchainReceiving => "onchain_receiving",
            Self::LightningSends => "lightning_sends",
            Self::Keysend => "keysend",
            Self::ChannelManagement => "channel_management",
            Self::PendingChannels => "pending_channels",
            Self::Mpp => "mpp",
            Self::Amp => "amp",
            Self::CoinControl => "coin_control",
            Self::ChannelCoinControl => "channel_coin_control",
            Self::HopPicking => "hop_picking",
            Self::Accounts => "accounts",
            Self::Routing => "routing",
            Self::NodeInfo => "node_info",
            Self::SingleFeesEarnedTotal => "single_fees_earned_total",
            Self::AddressTypeSelection => "address_type_selection",
            Self::Taproot => "taproot",
            Self::BumpFee => "bump_fee",
            Self::Lsps => "lsps",
            Self::NetworkInfo => "network_info",
            Self::SimpleTaprootChannels => "simple_taproot_channels",
            Self::CustomPreimages => "custom_preimages",
            Self::Sweep => "sweep",
            Self::OnchainBatching => "onchain_batching",
            Self::ChannelBatching => "channel_batching",
            Self::Lsps1CustomMessage => "lsps1_custom_message",
            Self::Lsps1Rest => "lsps1_rest",
            Self::Offers => "offers",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a backend decides whether it has a capability
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CapabilityRule {
    /// Fixed for the backend implementation
    Static(bool),
    /// Depends on the connected node's reported versions
    Versioned {
        /// Minimum software version
        min_version: &'static str,
        /// Minimum for builds carrying a build tag
        special_build_min: Option<&'static str>,
        /// Minimum API version, checked in addition to the software version
        min_api_version: Option<&'static str>,
    },
    /// Requires a read-only query to the node
    Remote,
}

impl CapabilityRule {
    /// Evaluate the rule without I/O; `None` for [`CapabilityRule::Remote`]
    pub fn evaluate(&self, node: &NodeVersions) -> Option<bool> {
        match *self {
            CapabilityRule::Static(value) => Some(value),
            CapabilityRule::Versioned { min_version, special_build_min, min_api_version } =>
                Some(node.supports(Some(min_version), special_build_min, min_api_version)),
            CapabilityRule::Remote => None,
        }
    }
}

/// Answer to a capability check.
///
/// `Known` answers need no round trip. `Query` is a pending read-only call to
/// the node and only yields its answer when awaited.
pub enum Support<'a> {
    /// Answer available now
    Known(bool),
    /// Answer available once the node responds
    Query(BoxFuture<'a, bool>),
}

impl<'a> Support<'a> {
    /// The answer, if it needs no round trip
    pub fn known(&self) -> Option<bool> {
        match self {
            Support::Known(value) => Some(*value),
            Support::Query(_) => None,
        }
    }

    /// Wait for the answer
    pub async fn resolve(self) -> bool {
        match self {
            Support::Known(value) => value,
            Support::Query(query) => query.await,
        }
    }
}

impl fmt::Debug for Support<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Support::Known(value) => f.debug_tuple("Known").field(value).finish(),
            Support::Query(_) => f.write_str("Query(..)"),
        }
    }
}
