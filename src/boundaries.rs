//! Word, sentence and paragraph boundaries of a practice text, and the
//! per-unit error flags collected while it is typed.
//!
//! Offsets are character indices, matching positions in the session ledger.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnitKind {
    Word,
    Sentence,
    Paragraph,
}

/// Start offsets of every unit in a text, in ascending order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundarySet {
    pub words: Vec<usize>,
    pub sentences: Vec<usize>,
    pub paragraphs: Vec<usize>,
}

impl BoundarySet {
    pub fn detect(text: &str) -> Self {
        let chars: Vec<char> = text.chars().collect();
        Self {
            words: word_boundaries(&chars),
            sentences: sentence_boundaries(&chars),
            paragraphs: paragraph_boundaries(&chars),
        }
    }

    pub fn starts(&self, kind: UnitKind) -> &[usize] {
        match kind {
            UnitKind::Word => &self.words,
            UnitKind::Sentence => &self.sentences,
            UnitKind::Paragraph => &self.paragraphs,
        }
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn is_sentence_end(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

/// Offsets where a run of word characters begins
pub fn word_boundaries(chars: &[char]) -> Vec<usize> {
    chars
        .iter()
        .enumerate()
        .filter(|&(i, &c)| is_word_char(c) && (i == 0 || !is_word_char(chars[i - 1])))
        .map(|(i, _)| i)
        .collect()
}

/// Offset 0 plus the first non-space offset after each run of `.`, `!` or `?`
pub fn sentence_boundaries(chars: &[char]) -> Vec<usize> {
    if chars.is_empty() {
        return Vec::new();
    }
    let mut starts = vec![0];
    for (i, &c) in chars.iter().enumerate() {
        let run_continues = chars.get(i + 1).is_some_and(|&n| is_sentence_end(n));
        if !is_sentence_end(c) || run_continues {
            continue;
        }
        if let Some(next) = (i + 1..chars.len()).find(|&j| !chars[j].is_whitespace()) {
            starts.push(next);
        }
    }
    starts.dedup();
    starts
}

/// Offset 0 plus the first non-newline offset after two or more newlines
pub fn paragraph_boundaries(chars: &[char]) -> Vec<usize> {
    if chars.is_empty() {
        return Vec::new();
    }
    let mut starts = vec![0];
    let mut newlines = 0;
    for (i, &c) in chars.iter().enumerate() {
        if c == '\n' {
            newlines += 1;
            continue;
        }
        if newlines >= 2 && i > 0 {
            starts.push(i);
        }
        newlines = 0;
    }
    starts
}

/// Error flags for one unit kind.
///
/// A unit is tainted by the first incorrect keystroke typed inside it and
/// stays tainted even if the character is later fixed. The flag of the unit
/// being typed is folded into the counter once the cursor moves past the
/// unit's end or the session finishes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitErrors {
    starts: Vec<usize>,
    flags: Vec<bool>,
    current: Option<usize>,
    units_with_errors: usize,
}

impl UnitErrors {
    pub fn new(starts: Vec<usize>) -> Self {
        let flags = vec![false; starts.len()];
        Self {
            starts,
            flags,
            current: None,
            units_with_errors: 0,
        }
    }

    /// Unit containing `offset`. Text before the first start belongs to the first unit.
    pub fn unit_at(&self, offset: usize) -> Option<usize> {
        if self.starts.is_empty() {
            return None;
        }
        Some(
            self.starts
                .partition_point(|&s| s <= offset)
                .saturating_sub(1),
        )
    }

    pub fn mark_error(&mut self, offset: usize) {
        let Some(unit) = self.unit_at(offset) else {
            return;
        };
        if self.current.is_some_and(|u| u != unit) {
            self.flush();
        }
        self.current = Some(unit);
    }

    pub fn on_advance(&mut self, cursor: usize, text_len: usize) {
        let Some(unit) = self.current else {
            return;
        };
        let left_unit = cursor >= text_len || self.unit_at(cursor).is_some_and(|u| u > unit);
        if left_unit {
            self.flush();
        }
    }

    pub fn finish(&mut self) {
        self.flush();
    }

    fn flush(&mut self) {
        if let Some(unit) = self.current.take() {
            if !self.flags[unit] {
                self.flags[unit] = true;
                self.units_with_errors += 1;
            }
        }
    }

    pub fn current_has_error(&self) -> bool {
        self.current.is_some()
    }

    pub fn has_error(&self, unit: usize) -> bool {
        self.flags.get(unit).copied().unwrap_or(false)
    }

    pub fn units_total(&self) -> usize {
        self.starts.len()
    }

    pub fn units_with_errors(&self) -> usize {
        self.units_with_errors
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundaryErrorState {
    pub words: UnitErrors,
    pub sentences: UnitErrors,
    pub paragraphs: UnitErrors,
}

impl BoundaryErrorState {
    pub fn new(boundaries: &BoundarySet) -> Self {
        Self {
            words: UnitErrors::new(boundaries.words.clone()),
            sentences: UnitErrors::new(boundaries.sentences.clone()),
            paragraphs: UnitErrors::new(boundaries.paragraphs.clone()),
        }
    }

    pub fn for_text(text: &str) -> Self {
        Self::new(&BoundarySet::detect(text))
    }

    fn all_mut(&mut self) -> [&mut UnitErrors; 3] {
        [&mut self.words, &mut self.sentences, &mut self.paragraphs]
    }

    /// An incorrect keystroke at `offset` taints the word, sentence and paragraph around it
    pub fn mark_error(&mut self, offset: usize) {
        for units in self.all_mut() {
            units.mark_error(offset);
        }
    }

    pub fn on_advance(&mut self, cursor: usize, text_len: usize) {
        for units in self.all_mut() {
            units.on_advance(cursor, text_len);
        }
    }

    pub fn finish(&mut self) {
        for units in self.all_mut() {
            units.finish();
        }
    }

    pub fn units(&self, kind: UnitKind) -> &UnitErrors {
        match kind {
            UnitKind::Word => &self.words,
            UnitKind::Sentence => &self.sentences,
            UnitKind::Paragraph => &self.paragraphs,
        }
    }
}
