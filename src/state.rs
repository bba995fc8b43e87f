use crate::typing_policy;
use crate::visual::first_error_index;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How an incorrect keystroke affects the cursor and whether backspace is honoured
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    clap::ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ErrorMode {
    /// Wrong keys leave the cursor in place until the right key is pressed
    StopOnError,
    /// Wrong keys are recorded and the cursor moves on; no backspace
    AdvanceOnError,
    /// Wrong keys move the cursor on, and must be fixed with backspace before completion
    #[default]
    CorrectionRequired,
}

/// Whether a newline in the text has to be typed explicitly
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    clap::ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum NewlineMode {
    #[default]
    Required,
    Optional,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CharState {
    Pending,
    Correct,
    Incorrect,
    Corrected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionStatus {
    #[default]
    Idle,
    Active,
    Complete,
}

/// Ledger entry for one position of the practice text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypedCharacter {
    pub char: char,
    pub state: CharState,
    /// Keystrokes applied at this position, whatever their outcome
    pub attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typed_at: Option<i64>,
}

impl TypedCharacter {
    pub fn pending(c: char) -> Self {
        Self {
            char: c,
            state: CharState::Pending,
            attempts: 0,
            typed_at: None,
        }
    }
}

/// Authoritative state of one practice run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingState {
    pub id: Uuid,
    pub text: String,
    pub characters: Vec<TypedCharacter>,
    pub cursor_position: usize,
    pub error_mode: ErrorMode,
    pub status: SessionStatus,
    pub started_at: Option<i64>,
    pub completed_at: Option<i64>,
}

/// Input applied to a [`TypingState`] by [`reduce`]
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    TypeChar {
        ch: char,
        timestamp: i64,
    },
    Backspace {
        timestamp: i64,
    },
    /// Start over with a fresh state; `None` fields keep the previous value
    Reset {
        text: Option<String>,
        error_mode: Option<ErrorMode>,
    },
}

impl Action {
    pub fn type_char(ch: char, timestamp: i64) -> Self {
        Action::TypeChar { ch, timestamp }
    }

    pub fn backspace(timestamp: i64) -> Self {
        Action::Backspace { timestamp }
    }
}

pub fn create_initial_state(text: impl Into<String>, error_mode: ErrorMode) -> TypingState {
    let text = text.into();
    let characters = text.chars().map(TypedCharacter::pending).collect();

    TypingState {
        id: Uuid::new_v4(),
        text,
        characters,
        cursor_position: 0,
        error_mode,
        status: SessionStatus::Idle,
        started_at: None,
        completed_at: None,
    }
}

impl TypingState {
    pub fn len(&self) -> usize {
        self.characters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.status == SessionStatus::Complete
    }

    /// Character expected at the cursor, if the cursor is still inside the text
    pub fn expected_char(&self) -> Option<char> {
        self.characters.get(self.cursor_position).map(|c| c.char)
    }

    /// Whether a TYPE_CHAR would be applied rather than ignored
    pub fn accepts_input(&self) -> bool {
        self.status != SessionStatus::Complete && self.cursor_position < self.characters.len()
    }

    pub fn has_incorrect(&self) -> bool {
        self.characters
            .iter()
            .any(|c| c.state == CharState::Incorrect)
    }

    pub fn first_error_index(&self) -> Option<usize> {
        first_error_index(&self.characters)
    }

    fn begin(&mut self, timestamp: i64) {
        if self.started_at.is_none() {
            self.started_at = Some(timestamp);
        }
        if self.status == SessionStatus::Idle {
            self.status = SessionStatus::Active;
        }
    }

    fn check_completion(&mut self, timestamp: i64) {
        if self.cursor_position < self.characters.len() {
            return;
        }
        let blocked = self.error_mode == ErrorMode::CorrectionRequired && self.has_incorrect();
        if !blocked {
            self.status = SessionStatus::Complete;
            self.completed_at = Some(timestamp);
        }
    }
}

/// Pure transition function of the session automaton.
///
/// Structurally invalid actions (typing after completion, backspace at the
/// start or in a mode without backspace) return the state unchanged.
pub fn reduce(state: TypingState, action: Action) -> TypingState {
    match action {
        Action::TypeChar { ch, timestamp } => type_char(state, ch, timestamp),
        Action::Backspace { timestamp } => backspace(state, timestamp),
        Action::Reset { text, error_mode } => {
            let error_mode = error_mode.unwrap_or(state.error_mode);
            create_initial_state(text.unwrap_or(state.text), error_mode)
        }
    }
}

fn type_char(mut state: TypingState, ch: char, timestamp: i64) -> TypingState {
    if state.is_empty() && !state.is_complete() {
        // nothing to type: the first keystroke ends the session
        state.begin(timestamp);
        state.check_completion(timestamp);
        return state;
    }
    if !state.accepts_input() {
        return state;
    }
    state.begin(timestamp);
    typing_policy::apply_write(&mut state, ch, timestamp);
    state.check_completion(timestamp);
    state
}

fn backspace(mut state: TypingState, timestamp: i64) -> TypingState {
    if !typing_policy::allows_backspace(state.error_mode)
        || state.status == SessionStatus::Complete
        || state.cursor_position == 0
    {
        return state;
    }
    state.begin(timestamp);
    typing_policy::apply_backspace(&mut state);
    state
}

/// Expand one physical keystroke into the TYPE_CHAR actions it stands for.
///
/// With optional newlines, a key matching the character after an expected
/// newline types through both, one millisecond apart.
pub fn keystroke_actions(
    state: &TypingState,
    ch: char,
    timestamp: i64,
    newline_mode: NewlineMode,
) -> Vec<Action> {
    let idx = state.cursor_position;
    let expected = |i: usize| state.characters.get(i).map(|c| c.char);

    let skips_newline = newline_mode == NewlineMode::Optional
        && ch != '\n'
        && expected(idx) == Some('\n')
        && expected(idx + 1) == Some(ch);

    if skips_newline {
        vec![
            Action::type_char('\n', timestamp),
            Action::type_char(ch, timestamp + 1),
        ]
    } else {
        vec![Action::type_char(ch, timestamp)]
    }
}

pub fn type_key(
    state: TypingState,
    ch: char,
    timestamp: i64,
    newline_mode: NewlineMode,
) -> TypingState {
    keystroke_actions(&state, ch, timestamp, newline_mode)
        .into_iter()
        .fold(state, reduce)
}
