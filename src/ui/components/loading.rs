//! Spinner shown while issues, picker candidates or saves are in flight.

const FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Braille spinner advanced once per event-loop tick.
#[derive(Debug, Clone, Default)]
pub struct LoadingIndicator {
    frame: usize,
}

impl LoadingIndicator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tick(&mut self) {
        self.frame = (self.frame + 1) % FRAMES.len();
    }

    /// Current frame followed by `message`.
    pub fn text(&self, message: &str) -> String {
        format!("{} {}", FRAMES[self.frame], message)
    }
}
