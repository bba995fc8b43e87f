//! Long-lived performance profile built up one session at a time.

use crate::result::{CharCategory, ContentType, SessionResult};
use crate::srs::{self, Grade, Sm2};
use crate::time_series::WpmPoint;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

pub const WPM_HISTORY_LIMIT: usize = 200;
pub const RECENT_SESSIONS_LIMIT: usize = 100;
pub const WEAKEST_LIMIT: usize = 10;

const MIN_KEY_ATTEMPTS: u32 = 5;
const MIN_PAIR_ATTEMPTS: u32 = 3;
const MIN_CATEGORY_ATTEMPTS: u32 = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyStats {
    pub key: char,
    pub category: CharCategory,
    pub total_attempts: u32,
    pub mistakes: u32,
    pub mistake_rate: f64,
    pub ease_factor: f64,
    /// Days until the next review
    pub interval: u32,
    /// Consecutive successful reviews
    #[serde(default)]
    pub repetitions: u32,
    pub next_review_date: i64,
    pub last_practiced: i64,
}

impl KeyStats {
    pub fn new(key: char, now: i64) -> Self {
        Self {
            key,
            category: CharCategory::of(key),
            total_attempts: 0,
            mistakes: 0,
            mistake_rate: 0.0,
            ease_factor: Sm2::default().max_ease,
            interval: 1,
            repetitions: 0,
            next_review_date: now,
            last_practiced: now,
        }
    }

    fn record(&mut self, attempts: u32, mistakes: u32, now: i64) {
        self.total_attempts += attempts;
        self.mistakes += mistakes;
        self.mistake_rate = rate(self.mistakes, self.total_attempts);
        self.last_practiced = now;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairStats {
    pub pair: String,
    pub total_attempts: u32,
    pub mistakes: u32,
    pub mistake_rate: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStats {
    pub total_attempts: u32,
    pub mistakes: u32,
    pub mistake_rate: f64,
    pub average_wpm: f64,
    pub best_wpm: u32,
    pub sessions: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentTypeStats {
    pub sessions: u32,
    pub average_wpm: f64,
    pub best_wpm: u32,
    pub average_accuracy: f64,
}

/// Cumulative statistics across every completed session.
///
/// Speeds are net WPM. Key and pair entries appear the first time the key or
/// pair is mistyped and accumulate attempts from then on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserStats {
    pub total_sessions: u32,
    pub total_keystrokes: u64,
    pub total_mistakes: u64,
    pub total_time_ms: i64,
    pub average_wpm: f64,
    pub best_wpm: u32,
    pub average_accuracy: f64,
    pub wpm_history: Vec<WpmPoint>,
    pub key_stats: BTreeMap<char, KeyStats>,
    pub pair_stats: BTreeMap<String, PairStats>,
    pub category_stats: BTreeMap<CharCategory, CategoryStats>,
    pub content_type_stats: BTreeMap<ContentType, ContentTypeStats>,
    pub weakest_keys: Vec<char>,
    pub weakest_pairs: Vec<String>,
    pub weakest_categories: Vec<CharCategory>,
    pub recent_sessions: Vec<SessionResult>,
    pub last_session_at: Option<i64>,
}

/// Fold one completed session into a copy of `current`.
pub fn aggregate(current: &UserStats, result: &SessionResult) -> UserStats {
    let mut next = current.clone();
    next.merge(result);
    next
}

/// `(old × n + new) / (n + 1)`
pub fn running_mean(old: f64, n: u32, new: f64) -> f64 {
    (old * n as f64 + new) / (n as f64 + 1.0)
}

fn rate(mistakes: u32, attempts: u32) -> f64 {
    if attempts == 0 {
        0.0
    } else {
        mistakes as f64 / attempts as f64
    }
}

fn by_rate_desc<K: Ord>(a: (f64, K), b: (f64, K)) -> Ordering {
    b.0.partial_cmp(&a.0)
        .unwrap_or(Ordering::Equal)
        .then(a.1.cmp(&b.1))
}

impl UserStats {
    pub fn merge(&mut self, result: &SessionResult) {
        let n = self.total_sessions;
        let wpm = result.net_wpm;

        self.average_wpm = running_mean(self.average_wpm, n, wpm as f64);
        self.average_accuracy = running_mean(self.average_accuracy, n, result.accuracy as f64);
        self.best_wpm = self.best_wpm.max(wpm);
        self.total_keystrokes += result.total_keystrokes as u64;
        self.total_mistakes += result.mistakes as u64;
        self.total_time_ms += result.duration_ms;

        self.wpm_history
            .push(WpmPoint::new(result.completed_at, wpm, result.accuracy));
        if self.wpm_history.len() > WPM_HISTORY_LIMIT {
            let excess = self.wpm_history.len() - WPM_HISTORY_LIMIT;
            self.wpm_history.drain(..excess);
        }

        self.merge_keys(result);
        self.merge_pairs(result);
        self.merge_categories(result);
        self.merge_content_type(result);

        self.recent_sessions.insert(0, result.clone());
        self.recent_sessions.truncate(RECENT_SESSIONS_LIMIT);

        self.total_sessions += 1;
        self.last_session_at = Some(result.completed_at);
        self.refresh_rankings();

        let weakest: String = self.weakest_keys.iter().collect();
        tracing::info!(
            sessions = self.total_sessions,
            average_wpm = self.average_wpm,
            %weakest,
            "stats aggregated"
        );
    }

    fn merge_keys(&mut self, result: &SessionResult) {
        let now = result.completed_at;
        let sm2 = Sm2::default();
        let keys = result
            .keystrokes_by_key
            .keys()
            .chain(result.mistakes_by_key.keys())
            .copied()
            .unique();

        for key in keys {
            let mistakes = result.mistakes_by_key.get(&key).copied().unwrap_or(0);
            if mistakes == 0 && !self.key_stats.contains_key(&key) {
                continue;
            }
            let attempts = result
                .keystrokes_by_key
                .get(&key)
                .copied()
                .unwrap_or(mistakes)
                .max(mistakes);

            let stats = self
                .key_stats
                .entry(key)
                .or_insert_with(|| KeyStats::new(key, now));
            stats.record(attempts, mistakes, now);
            if mistakes > 0 {
                // results saved before per-keystroke counts fall back to positions
                let wrong = result
                    .mistaken_keystrokes_by_key
                    .get(&key)
                    .copied()
                    .unwrap_or(mistakes)
                    .clamp(mistakes, attempts);
                sm2.review(stats, Grade::from_session(attempts - wrong, wrong), now);
            }
        }
    }

    fn merge_pairs(&mut self, result: &SessionResult) {
        let pairs = result
            .keystrokes_by_pair
            .keys()
            .chain(result.mistakes_by_pair.keys())
            .unique();

        for pair in pairs {
            let mistakes = result.mistakes_by_pair.get(pair).copied().unwrap_or(0);
            if mistakes == 0 && !self.pair_stats.contains_key(pair) {
                continue;
            }
            let attempts = result
                .keystrokes_by_pair
                .get(pair)
                .copied()
                .unwrap_or(mistakes)
                .max(mistakes);

            let stats = self
                .pair_stats
                .entry(pair.clone())
                .or_insert_with(|| PairStats {
                    pair: pair.clone(),
                    total_attempts: 0,
                    mistakes: 0,
                    mistake_rate: 0.0,
                });
            stats.total_attempts += attempts;
            stats.mistakes += mistakes;
            stats.mistake_rate = rate(stats.mistakes, stats.total_attempts);
        }
    }

    fn merge_categories(&mut self, result: &SessionResult) {
        for (&category, perf) in &result.category_breakdown {
            let stats = self.category_stats.entry(category).or_default();
            stats.total_attempts += perf.attempts;
            stats.mistakes += perf.mistakes;
            stats.mistake_rate = rate(stats.mistakes, stats.total_attempts);
            stats.average_wpm = running_mean(stats.average_wpm, stats.sessions, perf.wpm as f64);
            stats.best_wpm = stats.best_wpm.max(perf.wpm);
            stats.sessions += 1;
        }
    }

    fn merge_content_type(&mut self, result: &SessionResult) {
        let stats = self
            .content_type_stats
            .entry(result.content_type)
            .or_default();
        stats.average_wpm = running_mean(stats.average_wpm, stats.sessions, result.net_wpm as f64);
        stats.average_accuracy =
            running_mean(stats.average_accuracy, stats.sessions, result.accuracy as f64);
        stats.best_wpm = stats.best_wpm.max(result.net_wpm);
        stats.sessions += 1;
    }

    /// Recompute the weakest key, pair and category lists.
    pub fn refresh_rankings(&mut self) {
        self.weakest_keys = self
            .key_stats
            .values()
            .filter(|k| k.total_attempts >= MIN_KEY_ATTEMPTS)
            .sorted_by(|a, b| by_rate_desc((a.mistake_rate, a.key), (b.mistake_rate, b.key)))
            .take(WEAKEST_LIMIT)
            .map(|k| k.key)
            .collect();

        self.weakest_pairs = self
            .pair_stats
            .values()
            .filter(|p| p.total_attempts >= MIN_PAIR_ATTEMPTS)
            .sorted_by(|a, b| by_rate_desc((a.mistake_rate, &a.pair), (b.mistake_rate, &b.pair)))
            .take(WEAKEST_LIMIT)
            .map(|p| p.pair.clone())
            .collect();

        self.weakest_categories = self
            .category_stats
            .iter()
            .filter(|(_, c)| c.total_attempts >= MIN_CATEGORY_ATTEMPTS && c.mistake_rate > 0.0)
            .sorted_by(|a, b| by_rate_desc((a.1.mistake_rate, *a.0), (b.1.mistake_rate, *b.0)))
            .map(|(&category, _)| category)
            .collect();
    }

    pub fn due_keys(&self, now: i64) -> Vec<&KeyStats> {
        srs::due_keys(self.key_stats.values(), now)
    }

    pub fn hardest_keys(&self) -> Vec<&KeyStats> {
        srs::hardest_keys(self.key_stats.values())
    }
}
