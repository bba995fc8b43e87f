use crate::state::{CharState, ErrorMode, TypedCharacter, TypingState};

#[derive(Clone, Debug, Copy, PartialEq, Eq)]
pub enum Outcome {
    Correct,
    Incorrect,
}

pub fn judge(expected: char, typed: char) -> Outcome {
    if typed == expected {
        Outcome::Correct
    } else {
        Outcome::Incorrect
    }
}

/// Apply one keystroke to a ledger entry. A position that was ever left
/// incorrect becomes `Corrected` rather than `Correct` when fixed.
fn record(character: &mut TypedCharacter, outcome: Outcome, timestamp: i64) {
    character.attempts += 1;
    character.typed_at = Some(timestamp);
    character.state = match (outcome, character.state) {
        (Outcome::Incorrect, _) => CharState::Incorrect,
        (Outcome::Correct, CharState::Incorrect | CharState::Corrected) => CharState::Corrected,
        (Outcome::Correct, _) => CharState::Correct,
    };
}

fn prepare_input(state: &mut TypingState, c: char, timestamp: i64) -> Outcome {
    let idx = state.cursor_position;
    let character = &mut state.characters[idx];
    let outcome = judge(character.char, c);
    record(character, outcome, timestamp);
    outcome
}

/// Wrong keys stay on the current position until the right key is pressed
pub fn write_strict(state: &mut TypingState, c: char, timestamp: i64) -> Outcome {
    let outcome = prepare_input(state, c, timestamp);
    if outcome == Outcome::Correct {
        state.cursor_position += 1;
    }
    outcome
}

/// Every key is recorded and the cursor always moves on
pub fn write_normal(state: &mut TypingState, c: char, timestamp: i64) -> Outcome {
    let outcome = prepare_input(state, c, timestamp);
    state.cursor_position += 1;
    outcome
}

/// Caller guarantees the cursor is inside the text and the session is not complete.
pub fn apply_write(state: &mut TypingState, c: char, timestamp: i64) -> Outcome {
    match state.error_mode {
        ErrorMode::StopOnError => write_strict(state, c, timestamp),
        ErrorMode::AdvanceOnError | ErrorMode::CorrectionRequired => {
            write_normal(state, c, timestamp)
        }
    }
}

pub fn allows_backspace(mode: ErrorMode) -> bool {
    mode == ErrorMode::CorrectionRequired
}

/// Step back one position. The vacated entry returns to `Pending`, except the
/// earliest open error, which stays `Incorrect` until it is retyped correctly.
pub fn apply_backspace(state: &mut TypingState) {
    let first_error = state.first_error_index();
    state.cursor_position -= 1;

    let idx = state.cursor_position;
    let vacated = &mut state.characters[idx];
    if vacated.state == CharState::Incorrect && first_error == Some(idx) {
        return;
    }
    vacated.state = CharState::Pending;
    vacated.typed_at = None;
}
