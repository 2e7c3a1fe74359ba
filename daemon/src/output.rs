//! JSON payloads printed by each command.
//!
//! Amounts are rendered as decimal strings: `accrued`/`balance` with eight
//! fractional digits for display, plus the exact value alongside.

use guru_accrual::{MinerStatus, Settlement, StartOutcome, StopOutcome};
use guru_store::{MinerRecord, WalletRecord};
use guru_types::{Amount, Timestamp, UserId};
use guru_utils::format_duration_millis;
use serde_json::{json, Value};

fn amount(a: Amount) -> Value {
    Value::String(a.to_string())
}

fn timestamp(t: Option<Timestamp>) -> Value {
    t.map_or(Value::Null, |t| json!(t.as_millis()))
}

pub fn start(user: UserId, outcome: StartOutcome) -> Value {
    json!({ "ok": true, "user": user.get(), "result": outcome })
}

fn settlement(s: &Settlement) -> Value {
    json!({
        "accrued": amount(s.accrued),
        "accrued_exact": s.accrued.to_exact_string(),
        "balance": amount(s.balance),
        "elapsed": format_duration_millis(s.elapsed_millis),
        "settled_at": s.settled_at.as_millis(),
    })
}

pub fn stop(user: UserId, outcome: &StopOutcome) -> Value {
    match outcome.settlement() {
        Some(s) => {
            let mut payload = settlement(s);
            payload["ok"] = json!(true);
            payload["user"] = json!(user.get());
            payload
        }
        None => json!({
            "ok": true,
            "user": user.get(),
            "accrued": amount(Amount::ZERO),
            "message": "Miner already stopped",
        }),
    }
}

pub fn claim(user: UserId, s: &Settlement) -> Value {
    let mut payload = settlement(s);
    payload["ok"] = json!(true);
    payload["user"] = json!(user.get());
    payload
}

fn miner(m: &MinerRecord) -> Value {
    json!({
        "user_id": m.user_id.get(),
        "is_active": m.is_active,
        "hash_rate": m.hash_rate.to_string(),
        "last_started": timestamp(m.last_started),
        "last_claimed": timestamp(m.last_claimed),
    })
}

fn wallet(w: &WalletRecord) -> Value {
    json!({
        "user_id": w.user_id.get(),
        "balance": amount(w.balance),
        "updated_at": w.updated_at.as_millis(),
    })
}

pub fn status(status: &MinerStatus) -> Value {
    json!({
        "miner": status.miner.as_ref().map_or(Value::Null, miner),
        "wallet": status
            .wallet
            .as_ref()
            .map_or_else(|| json!({ "balance": amount(Amount::ZERO) }), wallet),
        "accrued": amount(status.accrued),
        "as_of": status.as_of.as_millis(),
    })
}

pub fn error(message: &str) -> Value {
    json!({ "ok": false, "error": message })
}
