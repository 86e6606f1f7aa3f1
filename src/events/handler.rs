//! Terminal event polling.

use std::time::Duration;

use crossterm::event::{self, Event as CrosstermEvent, KeyEventKind};

use super::Event;

/// Blocks on crossterm input for at most one tick.
pub struct EventHandler {
    tick_rate: Duration,
}

impl EventHandler {
    /// `tick_rate_ms` comes from `settings.tick_rate_ms`; it drives the
    /// spinner, toast expiry and the header clock.
    pub fn with_tick_rate(tick_rate_ms: u64) -> Self {
        Self {
            tick_rate: Duration::from_millis(tick_rate_ms.max(1)),
        }
    }

    /// Next key or resize, or `Event::Tick` when the tick elapses first.
    pub fn next(&self) -> std::io::Result<Event> {
        if !event::poll(self.tick_rate)? {
            return Ok(Event::Tick);
        }

        let event = match event::read()? {
            // Release events arrive on Windows only.
            CrosstermEvent::Key(key) if key.kind == KeyEventKind::Release => Event::Tick,
            CrosstermEvent::Key(key) => Event::Key(key),
            CrosstermEvent::Resize(width, height) => Event::Resize(width, height),
            _ => Event::Tick,
        };
        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_rate_from_settings() {
        let handler = EventHandler::with_tick_rate(250);
        assert_eq!(handler.tick_rate, Duration::from_millis(250));
    }

    #[test]
    fn test_zero_tick_rate_is_raised() {
        let handler = EventHandler::with_tick_rate(0);
        assert_eq!(handler.tick_rate, Duration::from_millis(1));
    }
}
