//! # Sample Display
//!
//! Consumers for samples arriving at the receiver.
//!
//! [`ConsoleDisplay`] draws a framed text view of each sample:
//!
//! ```text
//! ============================================================
//! Xbox Controller State
//! ============================================================
//! Left Stick:  X= 0.500 Y=-0.300
//! Right Stick: X= 0.000 Y= 0.000
//! Triggers:    L= 0.000 R= 0.000
//! Buttons:     A LB
//! ============================================================
//! ```

use std::io::Write;

use tracing::warn;

use crate::controller::sample::ControllerSample;

/// ANSI sequence that clears the terminal and homes the cursor
pub const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

const RULE_WIDTH: usize = 60;

/// Receives every successfully decoded sample, in arrival order
pub trait SampleConsumer {
    fn consume(&mut self, sample: ControllerSample);
}

impl<F> SampleConsumer for F
where
    F: FnMut(ControllerSample),
{
    fn consume(&mut self, sample: ControllerSample) {
        self(sample)
    }
}

/// Renders a sample as the framed text block shown by [`ConsoleDisplay`].
#[must_use]
pub fn render(sample: &ControllerSample) -> String {
    let state = &sample.state;
    let rule = "=".repeat(RULE_WIDTH);

    let pressed: Vec<&str> = state.buttons.pressed().map(|b| b.wire_name()).collect();
    let buttons = if pressed.is_empty() {
        "-".to_string()
    } else {
        pressed.join(" ")
    };

    format!(
        "{rule}\n\
         Xbox Controller State\n\
         {rule}\n\
         Left Stick:  X={:6.3} Y={:6.3}\n\
         Right Stick: X={:6.3} Y={:6.3}\n\
         Triggers:    L={:6.3} R={:6.3}\n\
         Buttons:     {}\n\
         {rule}\n",
        state.left_stick.x,
        state.left_stick.y,
        state.right_stick.x,
        state.right_stick.y,
        state.triggers.left,
        state.triggers.right,
        buttons,
        rule = rule,
    )
}

/// Writes each sample to a terminal (or any writer)
pub struct ConsoleDisplay<W: Write> {
    out: W,
    clear_screen: bool,
    write_failed: bool,
}

impl ConsoleDisplay<std::io::Stdout> {
    /// Display on standard output
    #[must_use]
    pub fn stdout(clear_screen: bool) -> Self {
        Self::new(std::io::stdout(), clear_screen)
    }
}

impl<W: Write> ConsoleDisplay<W> {
    pub fn new(out: W, clear_screen: bool) -> Self {
        Self {
            out,
            clear_screen,
            write_failed: false,
        }
    }

    /// Draw one sample
    pub fn show(&mut self, sample: &ControllerSample) -> std::io::Result<()> {
        if self.clear_screen {
            self.out.write_all(CLEAR_SCREEN.as_bytes())?;
        }
        self.out.write_all(render(sample).as_bytes())?;
        self.out.flush()
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> SampleConsumer for ConsoleDisplay<W> {
    fn consume(&mut self, sample: ControllerSample) {
        match self.show(&sample) {
            Ok(()) => self.write_failed = false,
            Err(e) => {
                if !self.write_failed {
                    warn!("Failed to draw sample: {}", e);
                }
                self.write_failed = true;
            }
        }
    }
}

/// Drops samples older than the newest one already passed on
///
/// UDP may reorder datagrams; this keeps the display from jumping back in
/// time. Equal timestamps pass through.
#[derive(Debug)]
pub struct StaleFilter<C> {
    inner: C,
    enabled: bool,
    newest: Option<f64>,
    dropped: u64,
}

impl<C: SampleConsumer> StaleFilter<C> {
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            enabled: true,
            newest: None,
            dropped: 0,
        }
    }

    /// Turn filtering on or off; when off every sample passes
    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Samples dropped so far
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }
}

impl<C: SampleConsumer> SampleConsumer for StaleFilter<C> {
    fn consume(&mut self, sample: ControllerSample) {
        if self.enabled {
            if let Some(newest) = self.newest {
                if sample.timestamp < newest {
                    self.dropped += 1;
                    return;
                }
            }
            self.newest = Some(sample.timestamp);
        }
        self.inner.consume(sample);
    }
}
