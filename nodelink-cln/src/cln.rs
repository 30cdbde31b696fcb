use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, trace, warn};
use nodelink::amount::{decimal_times_1000, sat_to_msat};
use nodelink::lnurl::lnurl_auth_signature;
use nodelink::model::{
    BlockchainBalance, Channel, ConnectPeerRequest, CreateOfferRequest, FeeReport,
    InvoiceRequest, KeysendRequest, LightningBalance, LnurlAuthSignature, OfferAmount,
    OpenChannelRequest, PayInvoiceRequest, Payments, SetFeesRequest, SignedMessage,
    TransactionRequest, Transactions, VerifiedMessage, VerifyMessageRequest,
};
use nodelink::normalize::array_field;
use nodelink::{
    Backend, Capability, CapabilityRule, Error, NodeVersions, Result, SettingsProvider, Transport,
};
use serde_json::{json, Map, Value};

use crate::convert;
use crate::rest::RestTransport;

/// Seconds `fetchinvoice` waits for the offer issuer
pub const FETCH_INVOICE_TIMEOUT: u64 = 60;

const COIN_CONTROL: CapabilityRule = CapabilityRule::Versioned {
    min_version: "v0.8.2",
    special_build_min: None,
    min_api_version: Some("v0.4.0"),
};

/// Core Lightning over its REST interface
pub struct ClnRest<T = RestTransport> {
    transport: T,
}

impl ClnRest<RestTransport> {
    /// Create a new ClnRest talking HTTP to the endpoint in `settings`
    pub fn new(settings: Arc<dyn SettingsProvider>) -> Result<Self> {
        Ok(Self::with_transport(RestTransport::new(settings)?))
    }
}

impl<T: Transport> ClnRest<T> {
    /// Create a new ClnRest over an arbitrary transport
    pub fn with_transport(transport: T) -> Self {
        Self { transport }
    }

    /// The underlying transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    async fn request(&self, route: &str, params: Value) -> Result<Value> {
        let body = self.transport.call(route, params).await?;
        if convert::is_remote_error(&body) {
            debug!("{} failed: {}", route, body);
            return Err(Error::Remote(body));
        }
        trace!("{} response: {}", route, body);
        Ok(body)
    }
}

/// CLN feerate string for a decimal sat/vbyte rate
pub fn feerate(sat_per_vbyte: &str) -> Result<String> {
    Ok(format!("{}perkb", decimal_times_1000(sat_per_vbyte)?))
}

/// A fresh label for invoices and offers
pub fn random_label() -> String {
    format!("nodelink.{}", rand::random::<u64>())
}

#[async_trait]
impl<T: Transport> Backend for ClnRest<T> {
    fn name(&self) -> &'static str {
        "cln-rest"
    }

    fn capability(&self, capability: Capability) -> CapabilityRule {
        use Capability::*;
        match capability {
            MessageSigning | LnurlAuth | OnchainSends | OnchainReceiving | LightningSends
            | Keysend | ChannelManagement | Routing | NodeInfo | SingleFeesEarnedTotal | Sweep
            | Lsps1Rest => CapabilityRule::Static(true),
            CoinControl | ChannelCoinControl => COIN_CONTROL,
            Offers => CapabilityRule::Remote,
            PendingChannels | Mpp | Amp | HopPicking | Accounts | AddressTypeSelection
            | Taproot | BumpFee | Lsps | NetworkInfo | SimpleTaprootChannels | CustomPreimages
            | OnchainBatching | ChannelBatching | Lsps1CustomMessage =>
                CapabilityRule::Static(false),
        }
    }

    async fn query_capability(&self, capability: Capability) -> bool {
        match capability {
            Capability::Offers => match self.request("listconfigs", json!({})).await {
                Ok(configs) => convert::config_flag(&configs, convert::OFFERS_CONFIG),
                Err(e) => {
                    warn!("could not read {}: {}", convert::OFFERS_CONFIG, e);
                    false
                }
            },
            other => {
                // without node versions a version gate fails closed
                let value = self.capability(other).evaluate(&NodeVersions::default());
                debug!("{} is not read from the node, answering {:?}", other, value);
                value.unwrap_or(false)
            }
        }
    }

    async fn get_transactions(&self) -> Result<Transactions> {
        let funds = self.request("listfunds", json!({})).await?;
        Ok(Transactions { transactions: array_field(&funds, "outputs").to_vec() })
    }

    async fn get_channels(&self) -> Result<Vec<Channel>> {
        let body = self.request("listpeerchannels", json!({})).await?;
        Ok(convert::channels(&body))
    }

    async fn get_blockchain_balance(&self) -> Result<BlockchainBalance> {
        let funds = self.request("listfunds", json!({})).await?;
        Ok(convert::blockchain_balance(&funds))
    }

    async fn get_lightning_balance(&self) -> Result<LightningBalance> {
        let funds = self.request("listfunds", json!({})).await?;
        Ok(convert::lightning_balance(&funds))
    }

    async fn send_coins(&self, request: &TransactionRequest) -> Result<Value> {
        let satoshi = if request.send_all { json!("all") } else { json!(request.amount) };
        let mut params = Map::new();
        params.insert("destination".into(), json!(request.addr));
        params.insert("satoshi".into(), satoshi);
        params.insert("feerate".into(), json!(feerate(&request.sat_per_vbyte)?));
        if let Some(utxos) = &request.utxos {
            params.insert("utxos".into(), json!(utxos));
        }
        self.request("withdraw", Value::Object(params)).await
    }

    async fn get_my_node_info(&self) -> Result<Value> {
        self.request("getinfo", json!({})).await
    }

    async fn get_node_info(&self) -> Result<Value> {
        self.request("getinfo", json!({})).await
    }

    async fn get_invoices(&self) -> Result<Value> {
        self.request("listinvoices", json!({})).await
    }

    async fn create_invoice(&self, request: &InvoiceRequest) -> Result<Value> {
        let params = json!({
            "description": request.memo,
            "label": random_label(),
            "amount_msat": sat_to_msat(request.value)?,
            "expiry": request.expiry,
            "exposeprivatechannels": true,
        });
        self.request("invoice", params).await
    }

    async fn get_payments(&self) -> Result<Payments> {
        let pays = self.request("listpays", json!({})).await?;
        Ok(Payments { payments: array_field(&pays, "pays").to_vec() })
    }

    async fn get_new_address(&self) -> Result<Value> {
        self.request("newaddr", json!({})).await
    }

    async fn open_channel(&self, request: &OpenChannelRequest) -> Result<Value> {
        let mut params = Map::new();
        params.insert("id".into(), json!(request.node_pubkey));
        params.insert("amount".into(), json!(request.satoshis));
        params.insert("feerate".into(), json!(feerate(&request.sat_per_vbyte)?));
        params.insert("announce".into(), json!(!request.private));
        if let Some(min_confs) = request.min_confs {
            params.insert("minconf".into(), json!(min_confs));
        }
        if !request.utxos.is_empty() {
            params.insert("utxos".into(), json!(request.utxos));
        }
        self.request("fundchannel", Value::Object(params)).await
    }

    async fn connect_peer(&self, request: &ConnectPeerRequest) -> Result<Value> {
        let id = format!("{}@{}", request.pubkey, request.host);
        self.request("connect", json!({ "id": id })).await
    }

    async fn decode_payment_request(&self, payment_request: &str) -> Result<Value> {
        self.request("decode", json!({ "string": payment_request })).await
    }

    async fn pay_lightning_invoice(&self, request: &PayInvoiceRequest) -> Result<Value> {
        let mut params = Map::new();
        params.insert("bolt11".into(), json!(request.payment_request));
        if let Some(amt) = request.amt {
            params.insert("amount_msat".into(), json!(sat_to_msat(amt)?));
        }
        if let Some(max_fee_percent) = request.max_fee_percent {
            params.insert("maxfeepercent".into(), json!(max_fee_percent));
        }
        self.request("pay", Value::Object(params)).await
    }

    async fn send_keysend(&self, request: &KeysendRequest) -> Result<Value> {
        let mut params = Map::new();
        params.insert("destination".into(), json!(request.pubkey));
        params.insert("amount_msat".into(), json!(sat_to_msat(request.amt)?));
        if let Some(max_fee_percent) = request.max_fee_percent {
            params.insert("maxfeepercent".into(), json!(max_fee_percent));
        }
        self.request("keysend", Value::Object(params)).await
    }

    async fn close_channel(&self, channel_id: &str) -> Result<Value> {
        self.request("close", json!({ "id": channel_id })).await
    }

    async fn get_fees(&self) -> Result<FeeReport> {
        let info = self.request("getinfo", json!({})).await?;
        Ok(convert::fee_report(&info))
    }

    async fn set_fees(&self, request: &SetFeesRequest) -> Result<Value> {
        let id = match (request.global, &request.channel_id) {
            (true, _) => "all".to_string(),
            (false, Some(channel_id)) => channel_id.clone(),
            (false, None) =>
                return Err(Error::InvalidRequest("set_fees: no channel and not global".into())),
        };
        let params = json!({
            "id": id,
            "feebase": request.base_fee_msat,
            "feeppm": request.fee_rate_ppm,
        });
        self.request("setchannel", params).await
    }

    async fn get_utxos(&self) -> Result<Value> {
        let funds = self.request("listfunds", json!({})).await?;
        Ok(Value::Array(array_field(&funds, "outputs").to_vec()))
    }

    async fn sign_message(&self, message: &str) -> Result<SignedMessage> {
        let body = self.request("signmessage", json!({ "message": message })).await?;
        convert::signed_message(&body)
    }

    async fn verify_message(&self, request: &VerifyMessageRequest) -> Result<VerifiedMessage> {
        let mut params = Map::new();
        params.insert("message".into(), json!(request.msg));
        params.insert("zbase".into(), json!(request.signature));
        if let Some(pubkey) = &request.pubkey {
            params.insert("pubkey".into(), json!(pubkey));
        }
        let body = self.request("checkmessage", Value::Object(params)).await?;
        Ok(convert::verified_message(&body))
    }

    async fn lnurl_auth(&self, challenge: &str) -> Result<LnurlAuthSignature> {
        let signed = self.sign_message(challenge).await?;
        Ok(lnurl_auth_signature(&signed.signature))
    }

    async fn list_offers(&self) -> Result<Value> {
        self.request("listoffers", json!({})).await
    }

    async fn create_offer(&self, request: &CreateOfferRequest) -> Result<Value> {
        let amount = match request.amount {
            OfferAmount::Any => json!("any"),
            OfferAmount::Sat(sat) => json!(format!("{}msat", sat_to_msat(sat)?)),
        };
        let label = request.label.clone().unwrap_or_else(random_label);
        let mut params = Map::new();
        params.insert("amount".into(), amount);
        if let Some(description) = &request.description {
            params.insert("description".into(), json!(description));
        }
        params.insert("label".into(), json!(label));
        params.insert("single_use".into(), json!(request.single_use));
        self.request("offer", Value::Object(params)).await
    }

    async fn disable_offer(&self, offer_id: &str) -> Result<Value> {
        self.request("disableoffer", json!({ "offer_id": offer_id })).await
    }

    async fn fetch_invoice_from_offer(&self, bolt12: &str, amount_sat: u64) -> Result<Value> {
        let params = json!({
            "offer": bolt12,
            "amount_msat": sat_to_msat(amount_sat)?,
            "timeout": FETCH_INVOICE_TIMEOUT,
        });
        self.request("fetchinvoice", params).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn feerate_translation() {
        assert_eq!(feerate("1").unwrap(), "1000perkb");
        assert_eq!(feerate("2.5").unwrap(), "2500perkb");
        assert_eq!(feerate("0.253").unwrap(), "253perkb");
        assert!(matches!(feerate("1.2345"), Err(Error::InvalidRequest(_))));
        assert!(matches!(feerate("fast"), Err(Error::InvalidRequest(_))));
    }

    #[test]
    fn labels_are_prefixed_and_distinct() {
        let a = random_label();
        let b = random_label();
        assert!(a.starts_with("nodelink."));
        assert_ne!(a, b);
    }
}
