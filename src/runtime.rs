use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::session::Keystroke;

/// Unified event type consumed by the app runner
#[derive(Clone, Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Resize,
    Tick,
}

/// Source of terminal events (keyboard, resize, etc.)
pub trait EventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    /// Returns Ok(event) if an event arrives before the timeout, or Err(Timeout) if it expires.
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError>;
}

/// Production event source using crossterm
pub struct CrosstermEventSource {
    rx: Receiver<AppEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            let forwarded = match event::read() {
                Ok(CtEvent::Key(key)) if key.kind != KeyEventKind::Release => {
                    tx.send(AppEvent::Key(key))
                }
                Ok(CtEvent::Resize(_, _)) => tx.send(AppEvent::Resize),
                Ok(_) => Ok(()),
                Err(err) => {
                    tracing::error!(%err, "terminal event stream failed");
                    break;
                }
            };
            if forwarded.is_err() {
                break;
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Channel-fed event source for headless runs and tests
pub struct ChannelEventSource {
    rx: Receiver<AppEvent>,
}

impl ChannelEventSource {
    pub fn new(rx: Receiver<AppEvent>) -> Self {
        Self { rx }
    }
}

impl EventSource for ChannelEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Runner that advances the application one event/tick at a time
pub struct Runner<E: EventSource> {
    event_source: E,
    tick: Duration,
}

impl<E: EventSource> Runner<E> {
    pub fn new(event_source: E, tick: Duration) -> Self {
        Self { event_source, tick }
    }

    /// Blocks up to the tick interval and returns the next event, or Tick on timeout
    pub fn step(&self) -> AppEvent {
        match self.event_source.recv_timeout(self.tick) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => AppEvent::Tick,
        }
    }
}

/// Map a terminal key to practice input. Modifier chords, navigation and
/// function keys are not practice input.
pub fn key_to_keystroke(key: &KeyEvent) -> Option<Keystroke> {
    if key
        .modifiers
        .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
    {
        return None;
    }
    match key.code {
        KeyCode::Char(c) => Some(Keystroke::Char(c)),
        KeyCode::Enter => Some(Keystroke::Char('\n')),
        KeyCode::Tab => Some(Keystroke::Char('\t')),
        KeyCode::Backspace => Some(Keystroke::Backspace),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::sync::mpsc;

    #[test]
    fn step_returns_tick_on_timeout() {
        let (_tx, rx) = mpsc::channel();
        let runner = Runner::new(ChannelEventSource::new(rx), Duration::from_millis(1));

        // With no events available, step should yield Tick
        assert_matches!(runner.step(), AppEvent::Tick);
    }

    #[test]
    fn step_passes_through_events() {
        let (tx, rx) = mpsc::channel();
        tx.send(AppEvent::Resize).unwrap();
        let runner = Runner::new(ChannelEventSource::new(rx), Duration::from_millis(10));

        assert_matches!(runner.step(), AppEvent::Resize);
    }

    #[test]
    fn key_mapping() {
        let key = |code, modifiers| KeyEvent::new(code, modifiers);

        assert_eq!(
            key_to_keystroke(&key(KeyCode::Char('a'), KeyModifiers::NONE)),
            Some(Keystroke::Char('a'))
        );
        assert_eq!(
            key_to_keystroke(&key(KeyCode::Char('A'), KeyModifiers::SHIFT)),
            Some(Keystroke::Char('A'))
        );
        assert_eq!(
            key_to_keystroke(&key(KeyCode::Enter, KeyModifiers::NONE)),
            Some(Keystroke::Char('\n'))
        );
        assert_eq!(
            key_to_keystroke(&key(KeyCode::Backspace, KeyModifiers::NONE)),
            Some(Keystroke::Backspace)
        );
        assert_eq!(
            key_to_keystroke(&key(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            None
        );
        assert_eq!(key_to_keystroke(&key(KeyCode::Left, KeyModifiers::NONE)), None);
        assert_eq!(key_to_keystroke(&key(KeyCode::Esc, KeyModifiers::NONE)), None);
    }
}
