//! Boundary adapters: the realtime socket client, desktop banner and sound
//! channels, file-backed client storage, and a logging render sink.

pub mod desktop;
pub mod render;
pub mod socket;
pub mod storage;
