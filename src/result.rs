use crate::boundaries::{BoundaryErrorState, UnitErrors, UnitKind};
use crate::state::{CharState, ErrorMode, TypedCharacter, TypingState};
use crate::typing_policy::Outcome;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

const CHARS_PER_WORD: f64 = 5.0;
const MS_PER_MINUTE: f64 = 60_000.0;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum_macros::Display,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum CharCategory {
    Lowercase,
    Uppercase,
    Number,
    Punctuation,
    Space,
}

impl CharCategory {
    pub fn of(c: char) -> Self {
        if c.is_whitespace() {
            CharCategory::Space
        } else if c.is_numeric() {
            CharCategory::Number
        } else if c.is_uppercase() {
            CharCategory::Uppercase
        } else if c.is_alphabetic() {
            CharCategory::Lowercase
        } else {
            CharCategory::Punctuation
        }
    }
}

/// Kind of practice material a session was generated from
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Default,
    Serialize,
    Deserialize,
    clap::ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ContentType {
    #[default]
    Words,
    Sentences,
    Paragraphs,
    Code,
    Custom,
}

/// Keystroke bookkeeping that the ledger alone cannot reconstruct: total
/// keystrokes and mistakes, the first mistake registered at each position, and
/// every wrong keystroke per expected key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MistakeLog {
    pub keystrokes: u32,
    pub mistakes: u32,
    pub by_key: BTreeMap<char, u32>,
    pub by_pair: BTreeMap<String, u32>,
    pub wrong_keystrokes_by_key: BTreeMap<char, u32>,
    positions: BTreeSet<usize>,
}

impl MistakeLog {
    /// Record a keystroke judged at `idx`. Each position contributes to the
    /// per-key and per-pair maps at most once, against the expected character.
    pub fn record(&mut self, characters: &[TypedCharacter], idx: usize, outcome: Outcome) {
        self.keystrokes += 1;
        if outcome == Outcome::Correct {
            return;
        }
        self.mistakes += 1;
        let Some(expected) = characters.get(idx).map(|c| c.char) else {
            return;
        };
        *self.wrong_keystrokes_by_key.entry(expected).or_insert(0) += 1;
        if !self.positions.insert(idx) {
            return;
        }
        *self.by_key.entry(expected).or_insert(0) += 1;
        if let Some(prev) = idx.checked_sub(1).and_then(|p| characters.get(p)) {
            *self.by_pair.entry(pair_key(prev.char, expected)).or_insert(0) += 1;
        }
    }

    pub fn mistaken_positions(&self) -> usize {
        self.positions.len()
    }
}

pub fn pair_key(prev: char, next: char) -> String {
    let mut key = String::with_capacity(8);
    key.push(prev);
    key.push(next);
    key
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPerformance {
    pub characters: u32,
    pub attempts: u32,
    pub mistakes: u32,
    pub wpm: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitSummary {
    pub total: usize,
    pub with_errors: usize,
    pub error_ratio: f64,
}

impl From<&UnitErrors> for UnitSummary {
    fn from(units: &UnitErrors) -> Self {
        let total = units.units_total();
        let with_errors = units.units_with_errors();
        Self {
            total,
            with_errors,
            error_ratio: unit_error_ratio(with_errors, total),
        }
    }
}

/// Immutable snapshot of one completed session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResult {
    pub id: Uuid,
    pub started_at: i64,
    pub completed_at: i64,
    pub duration_ms: i64,
    pub error_mode: ErrorMode,
    pub content_type: ContentType,
    pub text_length: usize,
    pub gross_wpm: u32,
    pub net_wpm: u32,
    pub accuracy: u32,
    pub total_keystrokes: u32,
    pub correct_keystrokes: u32,
    pub mistakes: u32,
    pub uncorrected_errors: u32,
    pub corrected_characters: u32,
    pub category_breakdown: BTreeMap<CharCategory, CategoryPerformance>,
    pub mistakes_by_key: BTreeMap<char, u32>,
    pub mistakes_by_pair: BTreeMap<String, u32>,
    /// Every wrong keystroke per expected key, retries included
    #[serde(default)]
    pub mistaken_keystrokes_by_key: BTreeMap<char, u32>,
    pub keystrokes_by_key: BTreeMap<char, u32>,
    pub keystrokes_by_pair: BTreeMap<String, u32>,
    pub words: UnitSummary,
    pub sentences: UnitSummary,
    pub paragraphs: UnitSummary,
}

/// Words per minute over the whole text, five characters to a word
pub fn calculate_gross_wpm(text_length: usize, duration_ms: i64) -> u32 {
    if duration_ms <= 0 {
        return 0;
    }
    let minutes = duration_ms as f64 / MS_PER_MINUTE;
    ((text_length as f64 / CHARS_PER_WORD) / minutes).round() as u32
}

/// Gross WPM less the mistakes-per-minute penalty, never below zero
pub fn calculate_net_wpm(gross_wpm: u32, mistakes: u32, duration_ms: i64) -> u32 {
    if duration_ms <= 0 {
        return 0;
    }
    let minutes = duration_ms as f64 / MS_PER_MINUTE;
    (gross_wpm as f64 - mistakes as f64 / minutes).round().max(0.0) as u32
}

/// Percentage of keystrokes that were correct, rounded down so that any
/// mistake keeps the score below 100.
pub fn calculate_accuracy(total_typed: u32, mistakes: u32) -> u32 {
    if total_typed == 0 {
        return 100;
    }
    let correct = total_typed.saturating_sub(mistakes) as u64;
    (correct * 100 / total_typed as u64) as u32
}

/// Share of units with errors, rounded to two decimals
pub fn unit_error_ratio(with_errors: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (with_errors as f64 / total as f64 * 100.0).round() / 100.0
}

fn category_breakdown(
    characters: &[TypedCharacter],
    duration_ms: i64,
) -> BTreeMap<CharCategory, CategoryPerformance> {
    let mut breakdown: BTreeMap<CharCategory, CategoryPerformance> = BTreeMap::new();
    let mut clean: BTreeMap<CharCategory, u32> = BTreeMap::new();

    for c in characters {
        let category = CharCategory::of(c.char);
        let entry = breakdown.entry(category).or_default();
        entry.characters += 1;
        match c.state {
            // attempts and mistakes only come from fixed characters
            CharState::Corrected => {
                entry.attempts += c.attempts;
                entry.mistakes += c.attempts.saturating_sub(1);
            }
            CharState::Correct => *clean.entry(category).or_insert(0) += 1,
            CharState::Pending | CharState::Incorrect => {}
        }
    }

    let total_chars = characters.len() as f64;
    let minutes = duration_ms as f64 / MS_PER_MINUTE;
    for (category, perf) in breakdown.iter_mut() {
        let share_minutes = minutes * perf.characters as f64 / total_chars;
        if share_minutes > 0.0 {
            let words = clean.get(category).copied().unwrap_or(0) as f64 / CHARS_PER_WORD;
            perf.wpm = (words / share_minutes).round() as u32;
        }
    }
    breakdown
}

fn keystrokes_by_key_and_pair(
    characters: &[TypedCharacter],
) -> (BTreeMap<char, u32>, BTreeMap<String, u32>) {
    let mut by_key = BTreeMap::new();
    let mut by_pair = BTreeMap::new();
    for (idx, c) in characters.iter().enumerate() {
        if c.attempts == 0 {
            continue;
        }
        *by_key.entry(c.char).or_insert(0) += c.attempts;
        if idx > 0 {
            *by_pair
                .entry(pair_key(characters[idx - 1].char, c.char))
                .or_insert(0) += c.attempts;
        }
    }
    (by_key, by_pair)
}

impl SessionResult {
    /// Compute the result of a finished session from its ledger, keystroke
    /// log, boundary counters and active typing duration.
    pub fn build(
        state: &TypingState,
        log: &MistakeLog,
        units: &BoundaryErrorState,
        duration_ms: i64,
        content_type: ContentType,
    ) -> Self {
        let characters = &state.characters;
        let text_length = characters.len();
        let started_at = state.started_at.unwrap_or_default();
        let completed_at = state.completed_at.unwrap_or(started_at + duration_ms);

        let total_keystrokes = log.keystrokes;
        let mistakes = log.mistakes.min(total_keystrokes);
        let gross_wpm = calculate_gross_wpm(text_length, duration_ms);
        let (keystrokes_by_key, keystrokes_by_pair) = keystrokes_by_key_and_pair(characters);
        let count_state =
            |s: CharState| characters.iter().filter(|c| c.state == s).count() as u32;

        Self {
            id: Uuid::new_v4(),
            started_at,
            completed_at,
            duration_ms,
            error_mode: state.error_mode,
            content_type,
            text_length,
            gross_wpm,
            net_wpm: calculate_net_wpm(gross_wpm, mistakes, duration_ms),
            accuracy: calculate_accuracy(total_keystrokes, mistakes),
            total_keystrokes,
            correct_keystrokes: total_keystrokes - mistakes,
            mistakes,
            uncorrected_errors: count_state(CharState::Incorrect),
            corrected_characters: count_state(CharState::Corrected),
            category_breakdown: category_breakdown(characters, duration_ms),
            mistakes_by_key: log.by_key.clone(),
            mistakes_by_pair: log.by_pair.clone(),
            mistaken_keystrokes_by_key: log.wrong_keystrokes_by_key.clone(),
            keystrokes_by_key,
            keystrokes_by_pair,
            words: units.units(UnitKind::Word).into(),
            sentences: units.units(UnitKind::Sentence).into(),
            paragraphs: units.units(UnitKind::Paragraph).into(),
        }
    }

    pub fn duration_secs(&self) -> f64 {
        self.duration_ms as f64 / 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{create_initial_state, reduce, Action};
    use crate::typing_policy::judge;

    fn run(text: &str, mode: ErrorMode, keys: &str, step_ms: i64) -> (TypingState, MistakeLog) {
        let mut state = create_initial_state(text, mode);
        let mut log = MistakeLog::default();
        for (i, c) in keys.chars().enumerate() {
            if let Some(expected) = state.expected_char() {
                let idx = state.cursor_position;
                log.record(&state.characters, idx, judge(expected, c));
            }
            state = reduce(state, Action::type_char(c, i as i64 * step_ms));
        }
        (state, log)
    }

    #[test]
    fn test_calculate_accuracy_floors() {
        assert_eq!(calculate_accuracy(10, 3), 70);
        assert_eq!(calculate_accuracy(11, 2), 81);
        assert_eq!(calculate_accuracy(200, 1), 99);
        assert_eq!(calculate_accuracy(5, 0), 100);
        assert_eq!(calculate_accuracy(0, 0), 100);
    }

    #[test]
    fn test_calculate_wpm() {
        assert_eq!(calculate_gross_wpm(50, 60_000), 10);
        assert_eq!(calculate_gross_wpm(25, 30_000), 10);
        assert_eq!(calculate_gross_wpm(50, 0), 0);

        assert_eq!(calculate_net_wpm(10, 2, 60_000), 8);
        assert_eq!(calculate_net_wpm(10, 4, 30_000), 2);
        assert_eq!(calculate_net_wpm(3, 20, 60_000), 0);
    }

    #[test]
    fn test_unit_error_ratio() {
        assert_eq!(unit_error_ratio(1, 3), 0.33);
        assert_eq!(unit_error_ratio(2, 3), 0.67);
        assert_eq!(unit_error_ratio(0, 0), 0.0);
    }

    #[test]
    fn test_char_category() {
        assert_eq!(CharCategory::of('a'), CharCategory::Lowercase);
        assert_eq!(CharCategory::of('Q'), CharCategory::Uppercase);
        assert_eq!(CharCategory::of('7'), CharCategory::Number);
        assert_eq!(CharCategory::of(';'), CharCategory::Punctuation);
        assert_eq!(CharCategory::of(' '), CharCategory::Space);
        assert_eq!(CharCategory::of('\n'), CharCategory::Space);
    }

    #[test]
    fn test_mistake_counted_once_per_position() {
        let (_, log) = run("ab", ErrorMode::StopOnError, "xab", 100);
        assert_eq!(log.by_key, BTreeMap::from([('a', 1)]));
        assert!(log.by_pair.is_empty());

        let (_, log) = run("ab", ErrorMode::StopOnError, "xyab", 100);
        assert_eq!(log.by_key, BTreeMap::from([('a', 1)]));
        assert_eq!(log.wrong_keystrokes_by_key, BTreeMap::from([('a', 2)]));
        assert_eq!(log.mistakes, 2);
        assert_eq!(log.keystrokes, 4);
    }

    #[test]
    fn test_mistake_pairs_use_preceding_expected_char() {
        let (_, log) = run("the", ErrorMode::StopOnError, "tgxhe", 100);
        assert_eq!(log.by_key, BTreeMap::from([('h', 1)]));
        assert_eq!(log.by_pair, BTreeMap::from([("th".to_string(), 1)]));
        assert_eq!(log.mistaken_positions(), 1);
    }

    #[test]
    fn test_build_result() {
        let (state, log) = run("Ab 1", ErrorMode::StopOnError, "Axb 1", 1000);
        assert!(state.is_complete());
        let mut units = BoundaryErrorState::for_text(&state.text);
        units.mark_error(1);
        units.finish();

        let result = SessionResult::build(&state, &log, &units, 60_000, ContentType::Custom);

        assert_eq!(result.text_length, 4);
        assert_eq!(result.total_keystrokes, 5);
        assert_eq!(result.mistakes, 1);
        assert_eq!(result.correct_keystrokes, 4);
        assert_eq!(result.accuracy, 80);
        assert_eq!(result.gross_wpm, 1);
        assert_eq!(result.net_wpm, 0);
        assert_eq!(result.corrected_characters, 1);
        assert_eq!(result.uncorrected_errors, 0);
        assert_eq!(result.started_at, 0);
        assert_eq!(result.completed_at, 4000);
        assert_eq!(result.mistakes_by_key, BTreeMap::from([('b', 1)]));
        assert_eq!(result.keystrokes_by_key.get(&'b'), Some(&2));
        assert_eq!(result.keystrokes_by_pair.get("Ab"), Some(&2));

        let lower = result.category_breakdown[&CharCategory::Lowercase];
        assert_eq!(lower.characters, 1);
        assert_eq!(lower.attempts, 2);
        assert_eq!(lower.mistakes, 1);
        assert_eq!(lower.wpm, 0);
        let upper = result.category_breakdown[&CharCategory::Uppercase];
        assert_eq!(upper.characters, 1);
        assert_eq!(upper.attempts, 0);
        assert_eq!(upper.mistakes, 0);
        assert!(result.category_breakdown.contains_key(&CharCategory::Number));
        assert!(!result.category_breakdown.contains_key(&CharCategory::Punctuation));

        assert_eq!(result.words.total, 2);
        assert_eq!(result.words.with_errors, 1);
        assert_eq!(result.words.error_ratio, 0.5);
        assert_eq!(result.sentences.error_ratio, 1.0);
    }

    #[test]
    fn test_category_wpm_uses_time_share() {
        // 16 characters over 16 s: each character gets 1/60 of a minute
        let (state, log) = run(
            "abcdefghij 12345",
            ErrorMode::StopOnError,
            "abcdefghij 1x2345",
            100,
        );
        assert!(state.is_complete());
        let units = BoundaryErrorState::for_text(&state.text);
        let result = SessionResult::build(&state, &log, &units, 16_000, ContentType::Custom);

        let lower = result.category_breakdown[&CharCategory::Lowercase];
        assert_eq!(lower.characters, 10);
        assert_eq!(lower.wpm, 12);
        assert_eq!(lower.attempts, 0);

        let space = result.category_breakdown[&CharCategory::Space];
        assert_eq!(space.characters, 1);
        assert_eq!(space.wpm, 12);

        // the fixed '2' is left out of the numerator
        let number = result.category_breakdown[&CharCategory::Number];
        assert_eq!(number.characters, 5);
        assert_eq!(number.attempts, 2);
        assert_eq!(number.mistakes, 1);
        assert_eq!(number.wpm, 10);
    }

    #[test]
    fn test_residual_errors_in_advance_mode() {
        let (state, log) = run("abcd", ErrorMode::AdvanceOnError, "axcy", 100);
        let units = BoundaryErrorState::for_text(&state.text);
        let result = SessionResult::build(&state, &log, &units, 30_000, ContentType::Words);

        assert_eq!(result.uncorrected_errors, 2);
        assert_eq!(result.accuracy, 50);
        assert_eq!(result.mistakes_by_key, BTreeMap::from([('b', 1), ('d', 1)]));
    }

    #[test]
    fn test_result_json_roundtrip() {
        let (state, log) = run("hi!", ErrorMode::StopOnError, "hxi!", 250);
        let units = BoundaryErrorState::for_text(&state.text);
        let result = SessionResult::build(&state, &log, &units, 750, ContentType::Sentences);

        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"mistakesByKey\":{\"i\":1}"));
        assert!(json.contains("\"contentType\":\"sentences\""));

        let back: SessionResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, result);
    }
}
