//! Notification inbox: the capped in-memory list, the state reducer around it,
//! and the SQLite repository whose writes feed the change stream.

pub mod error;
pub mod repository;
pub mod state;
pub mod store;

pub use error::StoreError;
pub use state::{Admitted, NotificationAction, NotificationHub, NotificationState};
pub use store::{NotificationStore, STORE_CAPACITY};
