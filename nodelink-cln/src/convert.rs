//! Conversion of CLN responses into the canonical records.
//!
//! CLN has renamed most amount fields over its releases (`msatoshi_to_us`,
//! `to_us_msat`, ...) and moved from sat to msat units for some of them. The
//! alias tables below list every name we accept, newest first.

use log::debug;
use nodelink::model::{BlockchainBalance, Channel, FeeReport, LightningBalance};
use nodelink::model::{SignedMessage, VerifiedMessage};
use nodelink::normalize::{
    array_field, bool_field, msat, sat, str_field, sum_amounts, u64_field, AmountConcept,
};
use nodelink::{Error, Result};
use serde_json::Value;

/// Channel state of an open, usable channel
pub const STATE_NORMAL: &str = "CHANNELD_NORMAL";
/// Channel state while the funding transaction confirms
pub const STATE_AWAITING_LOCKIN: &str = "CHANNELD_AWAITING_LOCKIN";

/// States that are left out of the active-channel view
pub const EXCLUDED_CHANNEL_STATES: &[&str] = &["ONCHAIN", "CLOSED", STATE_AWAITING_LOCKIN];

/// Config key gating BOLT12 support
pub const OFFERS_CONFIG: &str = "experimental-offers";

pub const TO_US: AmountConcept = AmountConcept {
    concept: "to_us",
    aliases: &[msat("to_us_msat"), msat("to_us"), msat("msatoshi_to_us")],
};

pub const TOTAL: AmountConcept = AmountConcept {
    concept: "total",
    aliases: &[msat("total_msat"), msat("total"), msat("msatoshi_total")],
};

pub const OUT_FULFILLED: AmountConcept = AmountConcept {
    concept: "out_fulfilled",
    aliases: &[msat("out_fulfilled_msat"), msat("out_fulfilled"), msat("out_msatoshi_fulfilled")],
};

pub const IN_FULFILLED: AmountConcept = AmountConcept {
    concept: "in_fulfilled",
    aliases: &[msat("in_fulfilled_msat"), msat("in_fulfilled"), msat("in_msatoshi_fulfilled")],
};

pub const OUR_RESERVE: AmountConcept = AmountConcept {
    concept: "our_reserve",
    aliases: &[msat("our_reserve_msat"), msat("our_reserve"), sat("our_channel_reserve_satoshis")],
};

pub const THEIR_RESERVE: AmountConcept = AmountConcept {
    concept: "their_reserve",
    aliases: &[
        msat("their_reserve_msat"),
        msat("their_reserve"),
        sat("their_channel_reserve_satoshis"),
    ],
};

/// Value of a `listfunds` output
pub const OUTPUT_VALUE: AmountConcept =
    AmountConcept { concept: "output_value", aliases: &[msat("amount_msat"), sat("value")] };

/// Our side of a `listfunds` channel
pub const OUR_CHANNEL_AMOUNT: AmountConcept = AmountConcept {
    concept: "our_amount",
    aliases: &[msat("our_amount_msat"), sat("channel_sat")],
};

pub const FEES_COLLECTED: AmountConcept = AmountConcept {
    concept: "fees_collected",
    aliases: &[msat("fees_collected_msat"), msat("msatoshi_fees_collected")],
};

/// Whether `body` is a CLN error object, `{"code": <int>, "message": <str>}`
pub fn is_remote_error(body: &Value) -> bool {
    let code = body.get("code").map_or(false, Value::is_i64);
    code && body.get("message").map_or(false, Value::is_string)
}

/// Whether a channel in `state` belongs in the active-channel view
pub fn is_listed_state(state: Option<&str>) -> bool {
    match state {
        Some(state) => !EXCLUDED_CHANNEL_STATES.contains(&state),
        None => true,
    }
}

/// Normalize one `listpeerchannels` entry
pub fn channel_from_peer_channel(raw: &Value) -> Channel {
    let to_us = TO_US.resolve(raw);
    let total = TOTAL.resolve(raw);
    let updates = u64_field(raw, &["in_payments_offered"])
        .unwrap_or(0)
        .saturating_add(u64_field(raw, &["out_payments_offered"]).unwrap_or(0));
    let channel_point = str_field(raw, &["funding_txid"]).map(|txid| {
        match u64_field(raw, &["funding_outnum"]) {
            Some(outnum) => format!("{}:{}", txid, outnum),
            None => txid,
        }
    });

    Channel {
        active: bool_field(raw, &["peer_connected", "connected"]).unwrap_or(false),
        remote_pubkey: str_field(raw, &["peer_id", "id"]).unwrap_or_default(),
        channel_point,
        chan_id: str_field(raw, &["channel_id"]),
        alias: None,
        capacity: total.to_sat_string(),
        local_balance: to_us.to_sat_string(),
        remote_balance: total.saturating_sub(to_us).to_sat_string(),
        total_satoshis_sent: OUT_FULFILLED.resolve(raw).to_sat_string(),
        total_satoshis_received: IN_FULFILLED.resolve(raw).to_sat_string(),
        num_updates: updates.to_string(),
        csv_delay: u64_field(raw, &["our_to_self_delay"]),
        private: bool_field(raw, &["private"]).unwrap_or(false),
        local_chan_reserve_sat: OUR_RESERVE.resolve(raw).to_sat_string(),
        remote_chan_reserve_sat: THEIR_RESERVE.resolve(raw).to_sat_string(),
        close_address: str_field(raw, &["close_to_addr"]),
    }
}

/// The active-channel view of a `listpeerchannels` response.
///
/// Accepts both the `{"channels": [...]}` envelope and a bare array.
pub fn channels(body: &Value) -> Vec<Channel> {
    let entries = match body {
        Value::Array(entries) => entries.as_slice(),
        _ => array_field(body, "channels"),
    };
    entries
        .iter()
        .filter(|raw| {
            let state = channel_state(raw);
            let listed = is_listed_state(state);
            if !listed {
                debug!("skipping channel in state {:?}", state);
            }
            listed
        })
        .map(channel_from_peer_channel)
        .collect()
}

fn channel_state(channel: &Value) -> Option<&str> {
    channel.get("state").and_then(Value::as_str)
}

/// On-chain balance from the `outputs` of a `listfunds` response
pub fn blockchain_balance(listfunds: &Value) -> BlockchainBalance {
    let outputs = array_field(listfunds, "outputs");
    let is_confirmed = |o: &Value| o.get("status").and_then(Value::as_str) == Some("confirmed");
    let confirmed = sum_amounts(outputs, &OUTPUT_VALUE, |o| is_confirmed(o));
    let unconfirmed = sum_amounts(outputs, &OUTPUT_VALUE, |o| !is_confirmed(o));
    BlockchainBalance::new(confirmed, unconfirmed)
}

/// Off-chain balance from the `channels` of a `listfunds` response
pub fn lightning_balance(listfunds: &Value) -> LightningBalance {
    let channels = array_field(listfunds, "channels");
    let in_state = |state: &'static str| move |c: &Value| channel_state(c) == Some(state);
    let balance = sum_amounts(channels, &OUR_CHANNEL_AMOUNT, in_state(STATE_NORMAL));
    let pending = sum_amounts(channels, &OUR_CHANNEL_AMOUNT, in_state(STATE_AWAITING_LOCKIN));
    LightningBalance {
        balance: balance.to_sat_string(),
        pending_open_balance: pending.to_sat_string(),
    }
}

/// Routing fees earned, from a `getinfo` response
pub fn fee_report(getinfo: &Value) -> FeeReport {
    FeeReport { total_fee_sum: FEES_COLLECTED.resolve(getinfo).to_sat_string() }
}

/// A `signmessage` response.
///
/// The signature is the whole point of the call, so its absence is an error
/// rather than an empty default.
pub fn signed_message(body: &Value) -> Result<SignedMessage> {
    let signature = str_field(body, &["signature"])
        .ok_or_else(|| Error::InvalidResponse(format!("signmessage: no signature in {}", body)))?;
    Ok(SignedMessage {
        signature,
        recid: str_field(body, &["recid"]),
        zbase: str_field(body, &["zbase"]),
    })
}

/// A `checkmessage` response
pub fn verified_message(body: &Value) -> VerifiedMessage {
    VerifiedMessage {
        verified: bool_field(body, &["verified"]).unwrap_or(false),
        pubkey: str_field(body, &["pubkey"]),
    }
}

/// Whether boolean config `name` is set in a `listconfigs` response.
///
/// Older nodes return flat `{"name": true}`; newer ones nest it as
/// `{"configs": {"name": {"set": true}}}`.
pub fn config_flag(listconfigs: &Value, name: &str) -> bool {
    if let Some(entry) = listconfigs.get("configs").and_then(|c| c.get(name)) {
        return bool_field(entry, &["set", "value_bool"]).unwrap_or(false);
    }
    bool_field(listconfigs, &[name]).unwrap_or(false)
}
