use crate::boundaries::BoundaryErrorState;
use crate::result::{ContentType, MistakeLog, SessionResult};
use crate::state::{
    create_initial_state, keystroke_actions, reduce, Action, ErrorMode, NewlineMode, TypingState,
};
use crate::typing_policy::{judge, Outcome};
use crate::visual::{derive_visual_session, VisualSessionState};

pub const DEFAULT_IDLE_TIMEOUT_MS: i64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionConfig {
    pub error_mode: ErrorMode,
    pub newline_mode: NewlineMode,
    pub content_type: ContentType,
    /// Gaps between keystrokes longer than this count only up to this much active time
    pub idle_timeout_ms: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            error_mode: ErrorMode::default(),
            newline_mode: NewlineMode::default(),
            content_type: ContentType::default(),
            idle_timeout_ms: DEFAULT_IDLE_TIMEOUT_MS,
        }
    }
}

/// Pre-validated input from the keyboard layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keystroke {
    Char(char),
    Backspace,
}

/// One practice run: the typing automaton plus the bookkeeping needed to
/// produce a [`SessionResult`] when it completes.
///
/// This is the adapter between an event loop and [`reduce`]; all judging
/// happens in the pure reducer.
#[derive(Debug, Clone)]
pub struct PracticeSession {
    pub config: SessionConfig,
    state: TypingState,
    units: BoundaryErrorState,
    log: MistakeLog,
    last_activity: Option<i64>,
    active_ms: i64,
    result: Option<SessionResult>,
}

impl PracticeSession {
    pub fn new(text: impl Into<String>, config: SessionConfig) -> Self {
        let state = create_initial_state(text, config.error_mode);
        tracing::debug!(
            session = %state.id,
            len = state.len(),
            error_mode = %config.error_mode,
            "session created"
        );
        Self::from_state(state, config)
    }

    fn from_state(state: TypingState, config: SessionConfig) -> Self {
        Self {
            units: BoundaryErrorState::for_text(&state.text),
            state,
            config,
            log: MistakeLog::default(),
            last_activity: None,
            active_ms: 0,
            result: None,
        }
    }

    pub fn state(&self) -> &TypingState {
        &self.state
    }

    pub fn prompt(&self) -> &str {
        &self.state.text
    }

    pub fn visual(&self) -> VisualSessionState {
        derive_visual_session(&self.state)
    }

    pub fn has_started(&self) -> bool {
        self.state.started_at.is_some()
    }

    pub fn has_finished(&self) -> bool {
        self.state.is_complete()
    }

    pub fn result(&self) -> Option<&SessionResult> {
        self.result.as_ref()
    }

    pub fn active_ms(&self) -> i64 {
        self.active_ms
    }

    /// Apply one keystroke. Returns the session result on the keystroke that
    /// completes the session, and `None` otherwise.
    pub fn press(&mut self, key: Keystroke, timestamp: i64) -> Option<&SessionResult> {
        if self.state.is_complete() {
            return None;
        }

        match key {
            Keystroke::Char(c) => {
                let actions =
                    keystroke_actions(&self.state, c, timestamp, self.config.newline_mode);
                for action in actions {
                    self.apply(action);
                }
            }
            Keystroke::Backspace => self.apply(Action::backspace(timestamp)),
        }

        if self.state.is_complete() && self.result.is_none() {
            self.finish();
            return self.result.as_ref();
        }
        None
    }

    /// Discard this run and start a fresh one, keeping text or mode when not given
    pub fn reset(&mut self, text: Option<String>, error_mode: Option<ErrorMode>) {
        if let Some(mode) = error_mode {
            self.config.error_mode = mode;
        }
        let state = reduce(std::mem::take(&mut self.state), Action::Reset { text, error_mode });
        tracing::debug!(session = %state.id, "session reset");
        *self = Self::from_state(state, self.config);
    }

    fn apply(&mut self, action: Action) {
        let idx = self.state.cursor_position;
        let (timestamp, judged) = match action {
            Action::TypeChar { ch, timestamp } => {
                let outcome = self
                    .state
                    .accepts_input()
                    .then(|| self.state.expected_char())
                    .flatten()
                    .map(|expected| judge(expected, ch));
                (timestamp, outcome)
            }
            Action::Backspace { timestamp } => (timestamp, None),
            Action::Reset { .. } => (0, None),
        };

        let before = self.state.cursor_position;
        self.state = reduce(std::mem::take(&mut self.state), action);
        let moved_back = self.state.cursor_position < before;

        if judged.is_none() && !moved_back {
            return;
        }
        self.track_activity(timestamp);

        if let Some(outcome) = judged {
            self.log.record(&self.state.characters, idx, outcome);
            if outcome == Outcome::Incorrect {
                self.units.mark_error(idx);
            }
        }
        if self.state.cursor_position > before {
            self.units
                .on_advance(self.state.cursor_position, self.state.len());
        }
    }

    fn track_activity(&mut self, timestamp: i64) {
        if let Some(last) = self.last_activity {
            let gap = (timestamp - last).max(0);
            self.active_ms += gap.min(self.config.idle_timeout_ms);
        }
        self.last_activity = Some(timestamp);
    }

    fn finish(&mut self) {
        self.units.finish();
        let result = SessionResult::build(
            &self.state,
            &self.log,
            &self.units,
            self.active_ms,
            self.config.content_type,
        );
        tracing::info!(
            session = %self.state.id,
            wpm = result.net_wpm,
            accuracy = result.accuracy,
            mistakes = result.mistakes,
            "session complete"
        );
        self.result = Some(result);
    }
}
