use thiserror::Error;

use crate::types::TaskId;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    #[error("animation task {task_id} panicked: {message}")]
    CallbackPanicked { task_id: TaskId, message: String },

    #[error("render failed after {attempts} attempts: {message}")]
    RetriesExhausted { attempts: u32, message: String },

    #[error("frame scheduler has been torn down")]
    TornDown,
}
