use tracing::{Span, field};

use super::TraceId;

/// Root span for one pipeline run (ingestion worker, frame loop, socket producer).
pub fn root_span(name: &'static str, trace_id: &TraceId) -> Span {
    tracing::info_span!(
        "root",
        name = %name,
        trace_id = %trace_id,
        user_id = field::Empty
    )
}

/// Child span; inherits `trace_id` from the enclosing root.
pub fn child_span(name: &'static str) -> Span {
    tracing::info_span!("child", name = %name, user_id = field::Empty)
}
