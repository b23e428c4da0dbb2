use scheduler::motion::{MotionSpec, RenderSink, Transition};
use tracing::info;

/// Render sink for headless runs: every animation request becomes a log line.
#[derive(Debug, Default, Clone)]
pub struct LogRenderSink;

impl RenderSink for LogRenderSink {
    fn animate(&self, target: &str, spec: &MotionSpec) -> anyhow::Result<()> {
        let transition = match spec.transition {
            Transition::Instant => "instant".to_string(),
            Transition::Tween { duration, .. } => format!("tween {}ms", duration.as_millis()),
            Transition::Spring {
                stiffness, damping, ..
            } => format!("spring {stiffness}/{damping}"),
        };
        info!(target_id = %target, transition = %transition, "render");
        Ok(())
    }
}
