//! Notification pipeline: ingestion fan-in, delivery side channels, local
//! producers, and the price alert book.

pub mod alerts;
pub mod delivery;
pub mod ingest;
pub mod local;

pub use alerts::{AlertError, PriceAlertBook};
pub use delivery::{DeliveryDispatcher, DeliveryError, DeliveryReport};
pub use ingest::{EntranceAnimator, IngestEvent, Ingestor};
pub use local::{LocalProducer, TradeTrigger, TxDetails, TxStage};
