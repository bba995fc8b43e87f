//! SM-2 scheduling of weak keys.

use crate::stats::KeyStats;
use itertools::Itertools;
use std::cmp::Ordering;

pub const MS_PER_DAY: i64 = 86_400_000;

/// Binary review outcome for one key in one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grade {
    /// The key was typed correctly more often than not.
    Pass,
    /// The key was missed at least as often as it was hit.
    Fail,
}

impl Grade {
    /// Position on the SM-2 0-5 quality scale.
    pub fn quality(self) -> u8 {
        match self {
            Grade::Pass => 4,
            Grade::Fail => 1,
        }
    }

    pub fn from_session(correct: u32, mistakes: u32) -> Self {
        if correct > mistakes {
            Grade::Pass
        } else {
            Grade::Fail
        }
    }
}

/// SM-2 parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sm2 {
    /// Ease never drops below this.
    pub min_ease: f64,
    /// Ease never rises above this; also the starting ease of a new key.
    pub max_ease: f64,
    /// Interval after the first success, in days.
    pub first_interval: u32,
    /// Interval after the second consecutive success, in days.
    pub second_interval: u32,
}

impl Default for Sm2 {
    fn default() -> Self {
        Self {
            min_ease: 1.3,
            max_ease: 2.5,
            first_interval: 1,
            second_interval: 6,
        }
    }
}

impl Sm2 {
    pub fn next_ease(&self, ease: f64, grade: Grade) -> f64 {
        let q = 5.0 - grade.quality() as f64;
        (ease + (0.1 - q * (0.08 + q * 0.02))).clamp(self.min_ease, self.max_ease)
    }

    /// New `(interval, repetitions)` after a review graded `grade`
    pub fn next_interval(
        &self,
        interval: u32,
        repetitions: u32,
        new_ease: f64,
        grade: Grade,
    ) -> (u32, u32) {
        match (grade, repetitions) {
            (Grade::Fail, _) => (1, 0),
            (Grade::Pass, 0) => (self.first_interval, 1),
            (Grade::Pass, 1) => (self.second_interval, 2),
            (Grade::Pass, n) => {
                let next = (interval as f64 * new_ease).round().max(1.0) as u32;
                (next, n + 1)
            }
        }
    }

    /// Update a key's ease, interval and due date after a session.
    pub fn review(&self, stats: &mut KeyStats, grade: Grade, now: i64) {
        let ease = self.next_ease(stats.ease_factor, grade);
        let (interval, repetitions) =
            self.next_interval(stats.interval, stats.repetitions, ease, grade);

        stats.ease_factor = ease;
        stats.interval = interval;
        stats.repetitions = repetitions;
        stats.next_review_date = now + interval as i64 * MS_PER_DAY;

        tracing::debug!(
            key = %stats.key,
            grade = grade.quality(),
            ease,
            interval,
            "key reviewed"
        );
    }
}

/// Keys whose review date has passed, most overdue first
pub fn due_keys<'a>(keys: impl IntoIterator<Item = &'a KeyStats>, now: i64) -> Vec<&'a KeyStats> {
    keys.into_iter()
        .filter(|k| k.next_review_date <= now)
        .sorted_by(|a, b| {
            a.next_review_date
                .cmp(&b.next_review_date)
                .then(a.key.cmp(&b.key))
        })
        .collect()
}

pub fn difficulty(stats: &KeyStats) -> f64 {
    1.0 / stats.ease_factor + stats.mistake_rate
}

/// Keys with at least three attempts ranked by `1/ease + mistakeRate`, hardest first
pub fn hardest_keys<'a>(keys: impl IntoIterator<Item = &'a KeyStats>) -> Vec<&'a KeyStats> {
    keys.into_iter()
        .filter(|k| k.total_attempts >= 3)
        .sorted_by(|a, b| {
            difficulty(b)
                .partial_cmp(&difficulty(a))
                .unwrap_or(Ordering::Equal)
                .then(a.key.cmp(&b.key))
        })
        .collect()
}
