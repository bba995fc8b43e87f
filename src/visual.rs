//! Render-ready projection of a [`TypingState`].
//!
//! Everything here is recomputed from the ledger on every change. There is
//! no incremental state, so the error-zone overlay cannot drift out of sync
//! when the user backspaces and retypes.

use crate::state::{CharState, ErrorMode, TypedCharacter, TypingState};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VisualState {
    Pending,
    Correct,
    Incorrect,
    Corrected,
    /// Typed over an open error: shown as pass-through of the earliest mistake
    ErrorZone,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualCharacter {
    pub char: char,
    pub visual_state: VisualState,
    pub is_cursor: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualSessionState {
    pub characters: Vec<VisualCharacter>,
    pub is_complete: bool,
    pub has_unfixed_errors: bool,
    pub first_error_index: Option<usize>,
    /// Cursor progress through the text, 0-100
    pub progress: u8,
}

pub fn first_error_index(characters: &[TypedCharacter]) -> Option<usize> {
    characters
        .iter()
        .position(|c| c.state == CharState::Incorrect)
}

/// Visual category of one position. Only the earliest open error gets the
/// strong `Incorrect` marker in correction-required mode; everything typed
/// after it up to the cursor reads as `ErrorZone`.
pub fn derive_visual_state(
    stored: CharState,
    index: usize,
    cursor_position: usize,
    error_mode: ErrorMode,
    first_error: Option<usize>,
) -> VisualState {
    let correcting = error_mode == ErrorMode::CorrectionRequired;
    match stored {
        CharState::Incorrect => {
            if !correcting || first_error == Some(index) {
                VisualState::Incorrect
            } else {
                VisualState::ErrorZone
            }
        }
        CharState::Corrected => VisualState::Corrected,
        CharState::Pending => VisualState::Pending,
        CharState::Correct => match first_error {
            Some(first) if correcting && first < index && index < cursor_position => {
                VisualState::ErrorZone
            }
            _ => VisualState::Correct,
        },
    }
}

pub fn derive_visual_characters(state: &TypingState) -> Vec<VisualCharacter> {
    let first_error = state.first_error_index();
    state
        .characters
        .iter()
        .enumerate()
        .map(|(idx, c)| VisualCharacter {
            char: c.char,
            visual_state: derive_visual_state(
                c.state,
                idx,
                state.cursor_position,
                state.error_mode,
                first_error,
            ),
            is_cursor: idx == state.cursor_position && !state.is_complete(),
        })
        .collect()
}

pub fn derive_visual_session(state: &TypingState) -> VisualSessionState {
    let first_error = state.first_error_index();
    VisualSessionState {
        characters: derive_visual_characters(state),
        is_complete: state.is_complete(),
        has_unfixed_errors: first_error.is_some(),
        first_error_index: first_error,
        progress: progress(state),
    }
}

fn progress(state: &TypingState) -> u8 {
    if state.is_empty() {
        return if state.is_complete() { 100 } else { 0 };
    }
    let pct = state.cursor_position as f64 / state.len() as f64 * 100.0;
    pct.round().clamp(0.0, 100.0) as u8
}
