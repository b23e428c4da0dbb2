mod init;
mod slow;
mod spans;
mod trace_id;

pub use init::{LogFormat, init_logger};
pub use slow::{time_if_slow, warn_if_slow};
pub use spans::{child_span, root_span};
pub use trace_id::TraceId;
