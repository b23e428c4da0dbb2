//! Local producer and the draft builders behind in-app actions.
//!
//! Every builder returns an already-shaped [`NotificationDraft`]; nothing here
//! touches the store. Drafts reach ingestion through [`LocalProducer`].

use std::fmt;

use corelib::models::{AlertCondition, Category, Metadata, NotificationDraft, Priority};
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tracing::warn;

use crate::ingest::IngestEvent;

/// Block explorer transaction URL for `chain_id`. Unknown chains fall back to
/// Ethereum mainnet.
pub fn explorer_url(chain_id: Option<u64>, tx_hash: &str) -> String {
    let base = match chain_id {
        Some(56) => "https://bscscan.com/tx/",
        Some(8453) => "https://basescan.org/tx/",
        Some(137) => "https://polygonscan.com/tx/",
        _ => "https://etherscan.io/tx/",
    };
    format!("{base}{tx_hash}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxStage {
    Initiated,
    Pending,
    Confirmed,
    Failed,
}

impl TxStage {
    pub fn as_str(self) -> &'static str {
        match self {
            TxStage::Initiated => "initiated",
            TxStage::Pending => "pending",
            TxStage::Confirmed => "confirmed",
            TxStage::Failed => "failed",
        }
    }

    pub fn priority(self) -> Priority {
        match self {
            TxStage::Initiated | TxStage::Pending => Priority::Low,
            TxStage::Confirmed => Priority::Medium,
            TxStage::Failed => Priority::High,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            TxStage::Initiated => "Transaction Initiated",
            TxStage::Pending => "Transaction Pending",
            TxStage::Confirmed => "Transaction Confirmed",
            TxStage::Failed => "Transaction Failed",
        }
    }
}

impl fmt::Display for TxStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A transaction the user kicked off locally.
#[derive(Debug, Clone, Default)]
pub struct TxDetails {
    pub tx_hash: Option<String>,
    pub amount: Option<String>,
    pub token: Option<String>,
    pub chain_id: Option<u64>,
}

fn metadata(value: Value) -> Metadata {
    match value {
        Value::Object(map) => map,
        _ => Metadata::new(),
    }
}

pub fn price_alert_set(
    symbol: &str,
    current_price: f64,
    target_price: f64,
    condition: AlertCondition,
) -> NotificationDraft {
    NotificationDraft::new(
        Category::Price,
        Priority::Medium,
        format!("Price Alert Set: {symbol}"),
        format!("You'll be notified when {symbol} goes {condition} {target_price}"),
    )
    .with_metadata(metadata(json!({
        "symbol": symbol,
        "currentPrice": current_price,
        "targetPrice": target_price,
        "condition": condition,
    })))
}

pub fn transaction(stage: TxStage, tx: &TxDetails) -> NotificationDraft {
    let body = match (&tx.amount, &tx.token) {
        (Some(amount), Some(token)) => format!("{amount} {token} transaction {stage}"),
        _ => format!("Transaction {stage}"),
    };

    let mut draft = NotificationDraft::new(Category::Transaction, stage.priority(), stage.title(), body)
        .with_metadata(metadata(json!({
            "txHash": tx.tx_hash,
            "amount": tx.amount,
            "token": tx.token,
            "chainId": tx.chain_id,
            "type": stage.as_str(),
        })));

    if let (Some(chain_id), Some(hash)) = (tx.chain_id, tx.tx_hash.as_deref()) {
        draft = draft.with_action_url(explorer_url(Some(chain_id), hash));
    }
    draft
}

pub fn security_alert(message: &str, severity: Priority) -> NotificationDraft {
    NotificationDraft::new(Category::Security, severity, "Security Alert", message)
        .with_metadata(metadata(json!({ "severity": severity })))
}

pub fn liquidity_warning(pool: &str, warning_type: &str, message: &str) -> NotificationDraft {
    NotificationDraft::new(
        Category::Liquidity,
        Priority::Medium,
        format!("Liquidity Warning: {pool}"),
        message,
    )
    .with_metadata(metadata(json!({ "poolName": pool, "warningType": warning_type })))
}

pub fn system(title: &str, message: &str, priority: Priority) -> NotificationDraft {
    NotificationDraft::new(Category::System, priority, title, message).with_metadata(Metadata::new())
}

/// Platform update announcement; security patches are high priority.
pub fn system_update(update_type: &str, message: &str) -> NotificationDraft {
    let priority = if update_type == "security_patch" {
        Priority::High
    } else {
        Priority::Low
    };
    system("System Update", message, priority)
}

/// Outcome of a trade action triggered from a position view. The action itself
/// happens elsewhere; only its outcome is announced.
#[derive(Debug, Clone, PartialEq)]
pub enum TradeTrigger {
    EmergencyWithdraw { pool: String, succeeded: bool },
    Rebalance { portfolio: String, succeeded: bool },
}

impl TradeTrigger {
    pub fn draft(&self) -> NotificationDraft {
        match self {
            TradeTrigger::EmergencyWithdraw { pool, succeeded: true } => NotificationDraft::new(
                Category::Liquidity,
                Priority::High,
                "Emergency Withdrawal Complete",
                format!("Funds withdrawn from {pool}"),
            ),
            TradeTrigger::EmergencyWithdraw { pool, succeeded: false } => NotificationDraft::new(
                Category::Liquidity,
                Priority::High,
                "Emergency Withdrawal Failed",
                format!("Could not withdraw from {pool}"),
            ),
            TradeTrigger::Rebalance { portfolio, succeeded: true } => NotificationDraft::new(
                Category::Transaction,
                Priority::Medium,
                "Rebalance Complete",
                format!("{portfolio} rebalanced to target weights"),
            ),
            TradeTrigger::Rebalance { portfolio, succeeded: false } => NotificationDraft::new(
                Category::Transaction,
                Priority::High,
                "Rebalance Failed",
                format!("{portfolio} could not be rebalanced"),
            ),
        }
    }
}

/// Hands locally built drafts to the ingestion channel.
#[derive(Debug, Clone)]
pub struct LocalProducer {
    tx: mpsc::Sender<IngestEvent>,
}

impl LocalProducer {
    pub fn new(tx: mpsc::Sender<IngestEvent>) -> Self {
        Self { tx }
    }

    /// Returns `false` once ingestion has shut down.
    pub async fn push(&self, draft: NotificationDraft) -> bool {
        match self.tx.send(IngestEvent::Local(draft)).await {
            Ok(()) => true,
            Err(_) => {
                warn!("ingestion closed; local notification dropped");
                false
            }
        }
    }

    /// Non-blocking variant for synchronous callers. A full channel drops the draft.
    pub fn try_push(&self, draft: NotificationDraft) -> bool {
        match self.tx.try_send(IngestEvent::Local(draft)) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "local notification dropped");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explorer_url_by_chain() {
        assert_eq!(explorer_url(Some(1), "0xa"), "https://etherscan.io/tx/0xa");
        assert_eq!(explorer_url(Some(56), "0xa"), "https://bscscan.com/tx/0xa");
        assert_eq!(explorer_url(Some(8453), "0xa"), "https://basescan.org/tx/0xa");
        assert_eq!(explorer_url(Some(137), "0xa"), "https://polygonscan.com/tx/0xa");
        assert_eq!(explorer_url(Some(42161), "0xa"), "https://etherscan.io/tx/0xa");
        assert_eq!(explorer_url(None, "0xa"), "https://etherscan.io/tx/0xa");
    }

    #[test]
    fn transaction_draft_shapes() {
        let full = transaction(
            TxStage::Failed,
            &TxDetails {
                tx_hash: Some("0xbeef".into()),
                amount: Some("1.5".into()),
                token: Some("ETH".into()),
                chain_id: Some(137),
            },
        );
        assert_eq!(full.priority, Priority::High);
        assert_eq!(full.title, "Transaction Failed");
        assert_eq!(full.body, "1.5 ETH transaction failed");
        assert_eq!(full.action_url.as_deref(), Some("https://polygonscan.com/tx/0xbeef"));
        assert_eq!(full.metadata.unwrap()["type"], "failed");

        let bare = transaction(
            TxStage::Initiated,
            &TxDetails {
                tx_hash: Some("0xbeef".into()),
                ..Default::default()
            },
        );
        assert_eq!(bare.priority, Priority::Low);
        assert_eq!(bare.body, "Transaction initiated");
        assert!(bare.action_url.is_none(), "no chain id, no explorer link");
    }

    #[test]
    fn system_update_priority() {
        assert_eq!(system_update("security_patch", "m").priority, Priority::High);
        assert_eq!(system_update("feature", "m").priority, Priority::Low);
    }

    #[tokio::test]
    async fn producer_reports_closed_channel() {
        let (tx, rx) = mpsc::channel(1);
        let producer = LocalProducer::new(tx);
        assert!(producer.try_push(system("a", "b", Priority::Low)));
        assert!(!producer.try_push(system("c", "d", Priority::Low)), "channel full");

        drop(rx);
        assert!(!producer.push(system("e", "f", Priority::Low)).await);
    }
}
