//! Audible cue for error notifications.
//!
//! The terminal has no tone generator, so the cue is the BEL character. A
//! cue that cannot be produced is logged at debug level and otherwise
//! ignored.

use std::io::{self, Write};

use tracing::debug;

/// Something that can make a short notification sound.
pub trait SoundCue {
    /// Play the cue at `volume` (0.0 - 1.0).
    fn play(&mut self, volume: f64) -> io::Result<()>;
}

/// Rings the terminal bell on stdout.
#[derive(Debug, Default)]
pub struct TerminalBell;

impl SoundCue for TerminalBell {
    fn play(&mut self, _volume: f64) -> io::Result<()> {
        let mut stdout = io::stdout();
        stdout.write_all(b"\x07")?;
        stdout.flush()
    }
}

/// Play the cue if a volume is configured; never fails.
pub fn play_notification_sound(cue: &mut dyn SoundCue, volume: Option<f64>) {
    let Some(volume) = volume else {
        return;
    };
    if let Err(e) = cue.play(volume) {
        debug!(error = %e, "notification sound failed");
    }
}
