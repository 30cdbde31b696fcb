use std::collections::HashMap;
use std::io;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use nodelink::amount::Msat;
use nodelink::model::{
    ConnectPeerRequest, CreateOfferRequest, InvoiceRequest, KeysendRequest, OfferAmount,
    OpenChannelRequest, PayInvoiceRequest, SetFeesRequest, TransactionRequest,
    VerifyMessageRequest,
};
use nodelink::{Backend, Capability, Error, NodeVersions, Result, Support, Transport};
use nodelink_cln::ClnRest;
use serde_json::{json, Value};

/// Canned responses per route; records every call
#[derive(Default)]
struct MockTransport {
    responses: HashMap<&'static str, Value>,
    calls: Mutex<Vec<(String, Value)>>,
}

impl MockTransport {
    fn with(mut self, route: &'static str, response: Value) -> Self {
        self.responses.insert(route, response);
        self
    }

    fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().unwrap().clone()
    }

    fn last_params(&self, route: &str) -> Value {
        self.calls()
            .into_iter()
            .rev()
            .find(|(r, _)| r == route)
            .map(|(_, p)| p)
            .expect("route not called")
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn call(&self, route: &str, params: Value) -> Result<Value> {
        self.calls.lock().unwrap().push((route.to_string(), params));
        Ok(self.responses.get(route).cloned().unwrap_or_else(|| json!({})))
    }
}

struct UnreachableTransport;

#[async_trait]
impl Transport for UnreachableTransport {
    async fn call(&self, _route: &str, _params: Value) -> Result<Value> {
        Err(Error::connectivity(io::Error::new(io::ErrorKind::ConnectionRefused, "refused")))
    }
}

fn backend(mock: MockTransport) -> (Arc<MockTransport>, ClnRest<Arc<MockTransport>>) {
    let mock = Arc::new(mock);
    (mock.clone(), ClnRest::with_transport(mock))
}

fn node(version: &str, api_version: &str) -> NodeVersions {
    NodeVersions::new(Some(version.to_string()), Some(api_version.to_string()))
}

#[tokio::test]
async fn channels_are_normalized_and_filtered() {
    let (_, cln) = backend(MockTransport::default().with(
        "listpeerchannels",
        json!({"channels": [
            {
                "peer_id": "02aa",
                "peer_connected": true,
                "state": "CHANNELD_NORMAL",
                "to_us_msat": 3_000_000,
                "total_msat": 5_000_000,
            },
            {"peer_id": "02bb", "state": "ONCHAIN", "to_us_msat": 1000, "total_msat": 1000},
            {"peer_id": "02cc", "state": "CLOSED"},
            {"peer_id": "02dd", "state": "CHANNELD_AWAITING_LOCKIN"},
        ]}),
    ));
    let channels = cln.get_channels().await.unwrap();
    assert_eq!(channels.len(), 1);
    let channel = &channels[0];
    assert_eq!(channel.remote_pubkey, "02aa");
    assert_eq!(channel.local_balance, "3000");
    assert_eq!(channel.remote_balance, "2000");
    assert_eq!(channel.capacity, "5000");
}

#[tokio::test]
async fn deprecated_aliases_give_the_same_channel() {
    let (_, modern) = backend(MockTransport::default().with(
        "listpeerchannels",
        json!({"channels": [
            {"state": "CHANNELD_NORMAL", "to_us_msat": 10_000, "total_msat": 20_000},
        ]}),
    ));
    let (_, legacy) = backend(MockTransport::default().with(
        "listpeerchannels",
        json!({"channels": [
            {"state": "CHANNELD_NORMAL", "msatoshi_to_us": 10_000, "msatoshi_total": 20_000},
        ]}),
    ));
    assert_eq!(modern.get_channels().await.unwrap(), legacy.get_channels().await.unwrap());
}

#[tokio::test]
async fn blockchain_balance_from_outputs() {
    let (mock, cln) = backend(MockTransport::default().with(
        "listfunds",
        json!({"outputs": [
            {"amount_msat": 50_000_000, "status": "confirmed"},
            {"amount_msat": 1_000_000, "status": "unconfirmed"},
        ]}),
    ));
    let balance = cln.get_blockchain_balance().await.unwrap();
    assert_eq!(balance.total_balance(), Msat(51_000_000));
    assert_eq!(balance.confirmed_balance(), Msat(50_000_000));
    assert_eq!(balance.unconfirmed_balance(), Msat(1_000_000));
    assert_eq!(
        serde_json::to_value(balance).unwrap(),
        json!({
            "total_balance": "51000",
            "confirmed_balance": "50000",
            "unconfirmed_balance": "1000",
        })
    );
    assert_eq!(mock.calls()[0].0, "listfunds");
}

#[tokio::test]
async fn blockchain_balance_keeps_partial_satoshis() {
    let (_, cln) = backend(MockTransport::default().with(
        "listfunds",
        json!({"outputs": [
            {"amount_msat": 1500, "status": "confirmed"},
            {"amount_msat": 999, "status": "unconfirmed"},
        ]}),
    ));
    let balance = cln.get_blockchain_balance().await.unwrap();
    assert_eq!(balance.confirmed_balance(), Msat(1500));
    assert_eq!(balance.unconfirmed_balance(), Msat(999));
    assert_eq!(balance.total_balance(), Msat(2499));
    assert_eq!(
        serde_json::to_value(balance).unwrap(),
        json!({
            "total_balance": "2.499",
            "confirmed_balance": "1.5",
            "unconfirmed_balance": "0.999",
        })
    );
}

#[tokio::test]
async fn lightning_balance_is_returned() {
    let (_, cln) = backend(MockTransport::default().with(
        "listfunds",
        json!({"channels": [
            {"state": "CHANNELD_NORMAL", "our_amount_msat": 4_000_000},
            {"state": "CHANNELD_AWAITING_LOCKIN", "our_amount_msat": 1_500_000},
        ]}),
    ));
    let balance = cln.get_lightning_balance().await.unwrap();
    assert_eq!(balance.balance, "4000");
    assert_eq!(balance.pending_open_balance, "1500");
}

#[tokio::test]
async fn missing_containers_are_empty() {
    let (_, cln) = backend(MockTransport::default());
    assert!(cln.get_channels().await.unwrap().is_empty());
    assert!(cln.get_transactions().await.unwrap().transactions.is_empty());
    assert!(cln.get_payments().await.unwrap().payments.is_empty());
    assert_eq!(cln.get_blockchain_balance().await.unwrap().total_balance(), Msat::ZERO);
    assert_eq!(cln.get_fees().await.unwrap().total_fee_sum, "0");
}

#[tokio::test]
async fn remote_errors_are_passed_through() {
    let failure = json!({"code": 205, "message": "Could not find a route"});
    let (_, cln) = backend(MockTransport::default().with("pay", failure.clone()));
    let request =
        PayInvoiceRequest { payment_request: "lnbc1".into(), ..Default::default() };
    match cln.pay_lightning_invoice(&request).await {
        Err(Error::Remote(body)) => assert_eq!(body, failure),
        other => panic!("expected remote error, got {:?}", other),
    }
}

#[tokio::test]
async fn unreachable_node_fails_every_operation() {
    let cln = ClnRest::with_transport(UnreachableTransport);
    let tx = TransactionRequest {
        addr: "bc1q".into(),
        amount: 1000,
        sat_per_vbyte: "1".into(),
        ..Default::default()
    };
    let open = OpenChannelRequest {
        node_pubkey: "02aa".into(),
        satoshis: 100_000,
        sat_per_vbyte: "2".into(),
        ..Default::default()
    };
    let connect = ConnectPeerRequest { pubkey: "02aa".into(), host: "1.2.3.4:9735".into() };
    let invoice = InvoiceRequest { memo: "m".into(), value: 10, expiry: 3600 };
    let pay = PayInvoiceRequest { payment_request: "lnbc1".into(), ..Default::default() };
    let keysend = KeysendRequest { pubkey: "02aa".into(), amt: 10, max_fee_percent: None };
    let fees =
        SetFeesRequest { global: true, base_fee_msat: 1000, fee_rate_ppm: 1, channel_id: None };
    let verify =
        VerifyMessageRequest { msg: "m".into(), signature: "d1".into(), pubkey: None };
    let offer = CreateOfferRequest::default();

    let mut failures: Vec<Error> = Vec::new();
    failures.extend(cln.get_transactions().await.err());
    failures.extend(cln.get_channels().await.err());
    failures.extend(cln.get_blockchain_balance().await.err());
    failures.extend(cln.get_lightning_balance().await.err());
    failures.extend(cln.send_coins(&tx).await.err());
    failures.extend(cln.get_my_node_info().await.err());
    failures.extend(cln.get_node_info().await.err());
    failures.extend(cln.get_invoices().await.err());
    failures.extend(cln.create_invoice(&invoice).await.err());
    failures.extend(cln.get_payments().await.err());
    failures.extend(cln.get_new_address().await.err());
    failures.extend(cln.open_channel(&open).await.err());
    failures.extend(cln.connect_peer(&connect).await.err());
    failures.extend(cln.decode_payment_request("lnbc1").await.err());
    failures.extend(cln.pay_lightning_invoice(&pay).await.err());
    failures.extend(cln.send_keysend(&keysend).await.err());
    failures.extend(cln.close_channel("abcd").await.err());
    failures.extend(cln.get_fees().await.err());
    failures.extend(cln.set_fees(&fees).await.err());
    failures.extend(cln.get_utxos().await.err());
    failures.extend(cln.sign_message("m").await.err());
    failures.extend(cln.verify_message(&verify).await.err());
    failures.extend(cln.lnurl_auth("challenge").await.err());
    failures.extend(cln.list_offers().await.err());
    failures.extend(cln.create_offer(&offer).await.err());
    failures.extend(cln.disable_offer("offer").await.err());
    failures.extend(cln.fetch_invoice_from_offer("lno1", 10).await.err());

    assert_eq!(failures.len(), 27);
    for failure in failures {
        assert!(failure.is_connectivity(), "{:?}", failure);
        assert!(failure.to_string().contains("refused"));
    }
    assert!(!cln.query_capability(Capability::Offers).await);
}

#[tokio::test]
async fn lnurl_auth_hashes_the_signature() {
    let (mock, cln) =
        backend(MockTransport::default().with("signmessage", json!({"signature": "abc"})));
    let first = cln.lnurl_auth("k1").await.unwrap();
    let second = cln.lnurl_auth("k1").await.unwrap();
    assert_eq!(first.signature, "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad");
    assert_eq!(first, second);
    assert_eq!(mock.last_params("signmessage"), json!({"message": "k1"}));
}

#[tokio::test]
async fn onchain_send_translation() {
    let (mock, cln) = backend(MockTransport::default());
    let request = TransactionRequest {
        addr: "bc1qdest".into(),
        amount: 25_000,
        sat_per_vbyte: "1.5".into(),
        utxos: Some(vec!["txid:0".into()]),
        send_all: false,
    };
    cln.send_coins(&request).await.unwrap();
    assert_eq!(
        mock.last_params("withdraw"),
        json!({
            "destination": "bc1qdest",
            "satoshi": 25_000,
            "feerate": "1500perkb",
            "utxos": ["txid:0"],
        })
    );

    let sweep = TransactionRequest { send_all: true, utxos: None, ..request };
    cln.send_coins(&sweep).await.unwrap();
    let params = mock.last_params("withdraw");
    assert_eq!(params["satoshi"], json!("all"));
    assert!(params.get("utxos").is_none());
}

#[tokio::test]
async fn bad_feerate_is_rejected_before_sending() {
    let (mock, cln) = backend(MockTransport::default());
    let request = TransactionRequest {
        addr: "bc1q".into(),
        amount: 1,
        sat_per_vbyte: "0.0001".into(),
        ..Default::default()
    };
    assert!(matches!(cln.send_coins(&request).await, Err(Error::InvalidRequest(_))));
    assert!(mock.calls().is_empty());
}

#[tokio::test]
async fn channel_open_translation() {
    let (mock, cln) = backend(MockTransport::default());
    let request = OpenChannelRequest {
        node_pubkey: "02aa".into(),
        satoshis: 100_000,
        sat_per_vbyte: "2".into(),
        private: true,
        min_confs: Some(3),
        utxos: vec![],
    };
    cln.open_channel(&request).await.unwrap();
    assert_eq!(
        mock.last_params("fundchannel"),
        json!({
            "id": "02aa",
            "amount": 100_000,
            "feerate": "2000perkb",
            "announce": false,
            "minconf": 3,
        })
    );
}

#[tokio::test]
async fn payment_translation() {
    let (mock, cln) = backend(MockTransport::default());
    let pay = PayInvoiceRequest {
        payment_request: "lnbc1".into(),
        amt: Some(21),
        max_fee_percent: Some(0.5),
    };
    cln.pay_lightning_invoice(&pay).await.unwrap();
    assert_eq!(
        mock.last_params("pay"),
        json!({"bolt11": "lnbc1", "amount_msat": 21_000, "maxfeepercent": 0.5})
    );

    let keysend = KeysendRequest { pubkey: "02bb".into(), amt: 5, max_fee_percent: None };
    cln.send_keysend(&keysend).await.unwrap();
    assert_eq!(mock.last_params("keysend"), json!({"destination": "02bb", "amount_msat": 5000}));

    let connect = ConnectPeerRequest { pubkey: "02cc".into(), host: "10.0.0.1:9735".into() };
    cln.connect_peer(&connect).await.unwrap();
    assert_eq!(mock.last_params("connect"), json!({"id": "02cc@10.0.0.1:9735"}));
}

#[tokio::test]
async fn invoice_translation() {
    let (mock, cln) = backend(MockTransport::default());
    let request = InvoiceRequest { memo: "coffee".into(), value: 1500, expiry: 600 };
    cln.create_invoice(&request).await.unwrap();
    let params = mock.last_params("invoice");
    assert_eq!(params["amount_msat"], json!(1_500_000));
    assert_eq!(params["description"], json!("coffee"));
    assert_eq!(params["expiry"], json!(600));
    assert_eq!(params["exposeprivatechannels"], json!(true));
    assert!(params["label"].as_str().unwrap().starts_with("nodelink."));
}

#[tokio::test]
async fn fee_policy_translation() {
    let (mock, cln) = backend(MockTransport::default());
    let global = SetFeesRequest {
        global: true,
        channel_id: None,
        base_fee_msat: 1000,
        fee_rate_ppm: 10,
    };
    cln.set_fees(&global).await.unwrap();
    assert_eq!(
        mock.last_params("setchannel"),
        json!({"id": "all", "feebase": 1000, "feeppm": 10})
    );

    let one = SetFeesRequest { global: false, channel_id: Some("123x1x0".into()), ..global };
    cln.set_fees(&one).await.unwrap();
    assert_eq!(mock.last_params("setchannel")["id"], json!("123x1x0"));

    let neither = SetFeesRequest { channel_id: None, ..one };
    assert!(matches!(cln.set_fees(&neither).await, Err(Error::InvalidRequest(_))));
}

#[tokio::test]
async fn offer_translation() {
    let (mock, cln) = backend(MockTransport::default());
    cln.create_offer(&CreateOfferRequest::default()).await.unwrap();
    let params = mock.last_params("offer");
    assert_eq!(params["amount"], json!("any"));
    assert_eq!(params["single_use"], json!(false));
    assert!(params.get("description").is_none());
    assert!(params["label"].as_str().unwrap().starts_with("nodelink."));

    let fixed = CreateOfferRequest {
        description: Some("tips".into()),
        label: Some("tip-jar".into()),
        single_use: true,
        amount: OfferAmount::Sat(2),
    };
    cln.create_offer(&fixed).await.unwrap();
    assert_eq!(
        mock.last_params("offer"),
        json!({"amount": "2000msat", "description": "tips", "label": "tip-jar", "single_use": true})
    );

    cln.fetch_invoice_from_offer("lno1qq", 3).await.unwrap();
    assert_eq!(
        mock.last_params("fetchinvoice"),
        json!({"offer": "lno1qq", "amount_msat": 3000, "timeout": 60})
    );

    cln.disable_offer("abcd").await.unwrap();
    assert_eq!(mock.last_params("disableoffer"), json!({"offer_id": "abcd"}));
}

#[tokio::test]
async fn message_verification() {
    let (mock, cln) = backend(
        MockTransport::default().with("checkmessage", json!({"verified": true, "pubkey": "02aa"})),
    );
    let request =
        VerifyMessageRequest { msg: "hello".into(), signature: "d1sig".into(), pubkey: None };
    let verified = cln.verify_message(&request).await.unwrap();
    assert!(verified.verified);
    assert_eq!(verified.pubkey.as_deref(), Some("02aa"));
    assert_eq!(mock.last_params("checkmessage"), json!({"message": "hello", "zbase": "d1sig"}));
}

#[tokio::test]
async fn static_and_versioned_capabilities() {
    let (mock, cln) = backend(MockTransport::default());
    let current = node("v23.08", "v0.10.5");
    assert_eq!(cln.supports(Capability::Keysend, &current).known(), Some(true));
    assert_eq!(cln.supports(Capability::Mpp, &current).known(), Some(false));
    assert_eq!(cln.supports(Capability::CoinControl, &current).known(), Some(true));
    let coin_control = |node: &NodeVersions| cln.supports(Capability::CoinControl, node).known();
    assert_eq!(coin_control(&node("v0.8.1", "v0.10.5")), Some(false));
    assert_eq!(coin_control(&node("v23.08", "v0.3.9")), Some(false));
    assert_eq!(coin_control(&NodeVersions::default()), Some(false));
    assert!(mock.calls().is_empty());
}

#[tokio::test]
async fn direct_query_follows_fixed_rules() {
    let (mock, cln) = backend(MockTransport::default());
    assert!(cln.query_capability(Capability::Keysend).await);
    assert!(cln.query_capability(Capability::LnurlAuth).await);
    assert!(!cln.query_capability(Capability::Mpp).await);
    assert!(!cln.query_capability(Capability::CoinControl).await);
    assert!(mock.calls().is_empty());
}

#[tokio::test]
async fn offers_capability_reads_node_config() {
    let current = node("v23.08", "v0.10.5");

    let (mock, flat) =
        backend(MockTransport::default().with("listconfigs", json!({"experimental-offers": true})));
    let support = flat.supports(Capability::Offers, &current);
    assert!(matches!(support, Support::Query(_)));
    assert!(support.resolve().await);
    assert_eq!(mock.calls().len(), 1);

    let (_, nested) = backend(MockTransport::default().with(
        "listconfigs",
        json!({"configs": {"experimental-offers": {"set": true, "source": "cmdline"}}}),
    ));
    assert!(nested.supports(Capability::Offers, &current).resolve().await);

    let (_, absent) = backend(MockTransport::default().with("listconfigs", json!({"configs": {}})));
    assert!(!absent.supports(Capability::Offers, &current).resolve().await);

    let (_, failing) = backend(
        MockTransport::default()
            .with("listconfigs", json!({"code": -32602, "message": "Unknown config"})),
    );
    assert!(!failing.supports(Capability::Offers, &current).resolve().await);
}
