use std::io::Write;

use super::{SoundCue, SoundPlayer};

/// Rings the terminal bell. Volume is not controllable on a bell.
#[derive(Debug, Default, Clone)]
pub struct TerminalBell;

impl SoundPlayer for TerminalBell {
    fn play(&self, cue: SoundCue) -> anyhow::Result<()> {
        tracing::debug!(volume = cue.volume, "playing notification sound");
        let mut err = std::io::stderr().lock();
        err.write_all(b"\x07")?;
        err.flush()?;
        Ok(())
    }
}
