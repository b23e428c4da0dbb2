use thiserror::Error;

pub mod alert;
pub mod change_feed;
pub mod notification;
pub mod settings;

pub use alert::{AlertCondition, PriceAlert};
pub use change_feed::{ChangeEvent, ChangeKind, NotificationRow, RowFilter};
pub use notification::{
    Category, Metadata, Notification, NotificationDraft, NotificationId, Priority,
};
pub use settings::{NotificationSettings, SettingsPatch};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("unknown notification category: {0}")]
    UnknownCategory(String),

    #[error("unknown notification priority: {0}")]
    UnknownPriority(String),
}
