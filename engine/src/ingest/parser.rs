//! Socket frame parsing.
//!
//! Frames are JSON objects `{ "type": <kind>, "payload": {...} }`. Known kinds
//! become drafts; unknown kinds are logged and skipped; anything malformed is a
//! [`FrameParseError`].

use corelib::models::{Category, Metadata, NotificationDraft, Priority};
use serde::Deserialize;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::warn;

use crate::local::explorer_url;

#[derive(Debug, Error)]
pub enum FrameParseError {
    #[error("frame is not valid json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("frame has no string `type` field")]
    MissingType,

    #[error("`{kind}` frame has an invalid payload: {source}")]
    Payload {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    payload: Value,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PriceUpdate {
    pub symbol: String,
    pub price: f64,
    #[serde(default, rename = "change24h")]
    pub change_24h: Option<f64>,
    /// Alert objects exactly as the server sent them. `null` reads as none.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub alerts: Vec<Value>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionUpdate {
    pub tx_hash: String,
    pub status: String,
    #[serde(default)]
    pub amount: Option<Value>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub chain_id: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityAlert {
    #[serde(default)]
    pub alert_type: Option<String>,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub details: Option<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SocketFrame {
    Notification(NotificationDraft),
    Bulk(Vec<NotificationDraft>),
    PriceUpdate(PriceUpdate),
    TransactionUpdate(TransactionUpdate),
    SecurityAlert(SecurityAlert),
}

fn payload<T: serde::de::DeserializeOwned>(
    kind: &'static str,
    value: Value,
) -> Result<T, FrameParseError> {
    serde_json::from_value(value).map_err(|source| FrameParseError::Payload { kind, source })
}

/// `Ok(None)` means the frame was well formed but of a kind nobody handles.
pub fn parse_frame(raw: &str) -> Result<Option<SocketFrame>, FrameParseError> {
    let envelope: Envelope = serde_json::from_str(raw)?;
    let kind = envelope.kind.ok_or(FrameParseError::MissingType)?;

    let frame = match kind.as_str() {
        "notification" => SocketFrame::Notification(payload("notification", envelope.payload)?),
        "bulk_notifications" => SocketFrame::Bulk(payload("bulk_notifications", envelope.payload)?),
        "price_update" => SocketFrame::PriceUpdate(payload("price_update", envelope.payload)?),
        "transaction_update" => {
            SocketFrame::TransactionUpdate(payload("transaction_update", envelope.payload)?)
        }
        "security_alert" => SocketFrame::SecurityAlert(payload("security_alert", envelope.payload)?),
        other => {
            warn!(kind = other, "unknown socket message type");
            return Ok(None);
        }
    };
    Ok(Some(frame))
}

/// Renders a JSON scalar the way it reads in a sentence.
fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn object(value: Value) -> Metadata {
    match value {
        Value::Object(map) => map,
        _ => Metadata::new(),
    }
}

impl SocketFrame {
    pub fn kind(&self) -> &'static str {
        match self {
            SocketFrame::Notification(_) => "notification",
            SocketFrame::Bulk(_) => "bulk_notifications",
            SocketFrame::PriceUpdate(_) => "price_update",
            SocketFrame::TransactionUpdate(_) => "transaction_update",
            SocketFrame::SecurityAlert(_) => "security_alert",
        }
    }

    pub fn into_drafts(self) -> Vec<NotificationDraft> {
        match self {
            SocketFrame::Notification(draft) => vec![draft],
            SocketFrame::Bulk(drafts) => drafts,
            SocketFrame::PriceUpdate(update) => price_drafts(update),
            SocketFrame::TransactionUpdate(update) => vec![transaction_draft(update)],
            SocketFrame::SecurityAlert(alert) => vec![security_draft(alert)],
        }
    }
}

/// One draft per embedded alert; an update without alerts yields nothing.
fn price_drafts(update: PriceUpdate) -> Vec<NotificationDraft> {
    let PriceUpdate {
        symbol,
        price,
        change_24h,
        alerts,
    } = update;

    alerts
        .into_iter()
        .map(|alert| {
            let condition = alert.get("condition").map(display).unwrap_or_default();
            let target = alert.get("targetPrice").map(display).unwrap_or_default();
            NotificationDraft::new(
                Category::Price,
                Priority::Medium,
                format!("Price Alert: {symbol}"),
                format!("{symbol} is now {condition} {target}. Current price: {price}"),
            )
            .with_metadata(object(json!({
                "symbol": symbol,
                "price": price,
                "change24h": change_24h,
                "alert": alert,
            })))
        })
        .collect()
}

fn transaction_draft(update: TransactionUpdate) -> NotificationDraft {
    let (priority, body) = match update.status.as_str() {
        "pending" => (
            Priority::Low,
            "Transaction submitted and pending confirmation".to_string(),
        ),
        "confirmed" => (Priority::Medium, "Transaction confirmed successfully".to_string()),
        "failed" => (Priority::High, "Transaction failed to execute".to_string()),
        other => (Priority::Low, format!("Transaction status: {other}")),
    };

    NotificationDraft::new(
        Category::Transaction,
        priority,
        format!("Transaction {}", capitalize(&update.status)),
        body,
    )
    .with_action_url(explorer_url(update.chain_id, &update.tx_hash))
    .with_metadata(object(json!({
        "txHash": update.tx_hash,
        "status": update.status,
        "amount": update.amount,
        "token": update.token,
        "chainId": update.chain_id,
    })))
}

fn security_draft(alert: SecurityAlert) -> NotificationDraft {
    let priority = if alert.severity.as_deref() == Some("critical") {
        Priority::High
    } else {
        Priority::Medium
    };
    let body = alert
        .message
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| "Security event detected".to_string());

    NotificationDraft::new(Category::Security, priority, "Security Alert", body).with_metadata(
        object(json!({
            "alertType": alert.alert_type,
            "severity": alert.severity,
            "details": alert.details,
        })),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drafts(raw: Value) -> Vec<NotificationDraft> {
        parse_frame(&raw.to_string())
            .unwrap()
            .map(SocketFrame::into_drafts)
            .unwrap_or_default()
    }

    #[test]
    fn notification_frame_passes_draft_through() {
        let out = drafts(json!({
            "type": "notification",
            "payload": {
                "type": "system",
                "priority": "low",
                "title": "Maintenance",
                "message": "Back in 5 minutes"
            }
        }));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].category, Category::System);
        assert_eq!(out[0].body, "Back in 5 minutes");
    }

    #[test]
    fn bulk_frame_keeps_order() {
        let item = |t: &str| json!({ "type": "price", "priority": "low", "title": t, "message": "m" });
        let out = drafts(json!({
            "type": "bulk_notifications",
            "payload": [item("a"), item("b"), item("c")]
        }));
        let titles: Vec<&str> = out.iter().map(|d| d.title.as_str()).collect();
        assert_eq!(titles, ["a", "b", "c"]);
    }

    #[test]
    fn price_update_fans_out_per_alert() {
        let out = drafts(json!({
            "type": "price_update",
            "payload": {
                "symbol": "ETH",
                "price": 3150.5,
                "change24h": -2.1,
                "alerts": [
                    { "condition": "above", "targetPrice": 3100 },
                    { "condition": "below", "targetPrice": 3200 }
                ]
            }
        }));

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].title, "Price Alert: ETH");
        assert_eq!(out[0].priority, Priority::Medium);
        assert_eq!(out[0].body, "ETH is now above 3100. Current price: 3150.5");
        let meta = out[1].metadata.as_ref().unwrap();
        assert_eq!(meta["alert"]["condition"], "below");
        assert_eq!(meta["change24h"], -2.1);
    }

    #[test]
    fn price_update_without_alerts_is_silent() {
        let out = drafts(json!({
            "type": "price_update",
            "payload": { "symbol": "BTC", "price": 1.0 }
        }));
        assert!(out.is_empty());
    }

    #[test]
    fn price_update_with_null_alerts_is_silent() {
        let frame = json!({
            "type": "price_update",
            "payload": { "symbol": "BTC", "price": 1.0, "alerts": null }
        })
        .to_string();

        let parsed = parse_frame(&frame).unwrap().unwrap();
        assert_eq!(parsed.kind(), "price_update");
        assert!(parsed.into_drafts().is_empty());
    }

    #[test]
    fn transaction_update_maps_status() {
        let out = drafts(json!({
            "type": "transaction_update",
            "payload": {
                "txHash": "0xfeed",
                "status": "failed",
                "amount": "2",
                "token": "USDC",
                "chainId": 8453
            }
        }));
        assert_eq!(out[0].title, "Transaction Failed");
        assert_eq!(out[0].priority, Priority::High);
        assert_eq!(out[0].body, "Transaction failed to execute");
        assert_eq!(out[0].action_url.as_deref(), Some("https://basescan.org/tx/0xfeed"));

        let odd = drafts(json!({
            "type": "transaction_update",
            "payload": { "txHash": "0x1", "status": "reverted" }
        }));
        assert_eq!(odd[0].title, "Transaction Reverted");
        assert_eq!(odd[0].priority, Priority::Low);
        assert_eq!(odd[0].body, "Transaction status: reverted");
        assert_eq!(odd[0].action_url.as_deref(), Some("https://etherscan.io/tx/0x1"));
    }

    #[test]
    fn security_alert_severity_and_default_message() {
        let critical = drafts(json!({
            "type": "security_alert",
            "payload": { "alertType": "login", "severity": "critical", "message": "New device" }
        }));
        assert_eq!(critical[0].priority, Priority::High);
        assert_eq!(critical[0].body, "New device");

        let vague = drafts(json!({ "type": "security_alert", "payload": { "severity": "low" } }));
        assert_eq!(vague[0].priority, Priority::Medium);
        assert_eq!(vague[0].body, "Security event detected");
    }

    #[test]
    fn unknown_kind_is_skipped() {
        let parsed = parse_frame(r#"{"type":"heartbeat","payload":{}}"#).unwrap();
        assert!(parsed.is_none());
    }

    #[test]
    fn malformed_frames_are_errors() {
        assert!(matches!(parse_frame("not json"), Err(FrameParseError::Json(_))));
        assert!(matches!(
            parse_frame(r#"{"payload":{}}"#),
            Err(FrameParseError::MissingType)
        ));
        assert!(matches!(
            parse_frame(r#"{"type":"transaction_update","payload":{"status":"pending"}}"#),
            Err(FrameParseError::Payload { kind: "transaction_update", .. })
        ));
    }
}
