use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use rand::RngCore;

use crate::config::Config;
use crate::language::{ContentTagCache, Language};
use crate::result::{ContentType, SessionResult};
use crate::runtime::key_to_keystroke;
use crate::session::PracticeSession;
use crate::stats::{KeyStats, UserStats};
use crate::word_generator::WordGenerator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Typing,
    Results,
    KeyStats,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortBy {
    Key,
    MistakeRate,
    Attempts,
    NextReview,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyStatsView {
    pub scroll_offset: usize,
    pub sort_by: SortBy,
    pub sort_ascending: bool,
}

impl Default for KeyStatsView {
    fn default() -> Self {
        Self {
            scroll_offset: 0,
            sort_by: SortBy::MistakeRate,
            sort_ascending: false,
        }
    }
}

impl KeyStatsView {
    /// Keys of `stats` in the view's order
    pub fn sorted<'a>(&self, stats: &'a UserStats) -> Vec<&'a KeyStats> {
        let mut keys: Vec<&KeyStats> = stats.key_stats.values().collect();
        keys.sort_by(|a, b| {
            let cmp = match self.sort_by {
                SortBy::Key => a.key.cmp(&b.key),
                SortBy::MistakeRate => a
                    .mistake_rate
                    .partial_cmp(&b.mistake_rate)
                    .unwrap_or(std::cmp::Ordering::Equal),
                SortBy::Attempts => a.total_attempts.cmp(&b.total_attempts),
                SortBy::NextReview => a.next_review_date.cmp(&b.next_review_date),
            };
            if self.sort_ascending {
                cmp
            } else {
                cmp.reverse()
            }
        });
        keys
    }

    fn sort(&mut self, sort_by: SortBy) {
        self.sort_by = sort_by;
        self.scroll_offset = 0;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitType {
    Restart,
    New,
    Quit,
}

/// Everything the terminal front end shows and mutates
pub struct App {
    pub config: Config,
    pub session: PracticeSession,
    pub stats: UserStats,
    pub state: AppState,
    pub key_stats_view: KeyStatsView,
    pub custom_prompt: Option<String>,
    /// Latest clock reading seen, in milliseconds
    pub now: i64,
    language: Language,
    cache: ContentTagCache,
    completed: Option<SessionResult>,
}

impl App {
    pub fn new(
        config: Config,
        language: Language,
        stats: UserStats,
        custom_prompt: Option<String>,
        rng: &mut dyn RngCore,
    ) -> Self {
        let custom_prompt = custom_prompt.filter(|p| !p.is_empty());
        let mut cache = ContentTagCache::new();
        let prompt = WordGenerator::new(config.word_gen_config(custom_prompt.clone()))
            .generate_prompt(&language, &stats, &mut cache, rng);
        let session = PracticeSession::new(prompt, config.session_config(content_type(&custom_prompt)));

        Self {
            config,
            session,
            stats,
            state: AppState::Typing,
            key_stats_view: KeyStatsView::default(),
            custom_prompt,
            now: 0,
            language,
            cache,
            completed: None,
        }
    }

    /// Handle one key press at `now` (milliseconds). Returns how to leave the
    /// current session, if the key asks for that.
    pub fn on_key(&mut self, key: KeyEvent, now: i64) -> Option<ExitType> {
        self.now = now;
        if key.code == KeyCode::Esc
            || (key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c'))
        {
            return Some(ExitType::Quit);
        }

        match self.state {
            AppState::Typing => match key.code {
                KeyCode::Left => Some(ExitType::Restart),
                KeyCode::Right => Some(ExitType::New),
                _ => {
                    let keystroke = key_to_keystroke(&key)?;
                    if let Some(result) = self.session.press(keystroke, now) {
                        self.completed = Some(result.clone());
                        self.state = AppState::Results;
                    }
                    None
                }
            },
            AppState::Results => match key.code {
                KeyCode::Char('r') => Some(ExitType::Restart),
                KeyCode::Char('n') => Some(ExitType::New),
                KeyCode::Char('s') => {
                    self.state = AppState::KeyStats;
                    None
                }
                _ => None,
            },
            AppState::KeyStats => {
                let view = &mut self.key_stats_view;
                match key.code {
                    KeyCode::Char('r') => return Some(ExitType::Restart),
                    KeyCode::Char('n') => return Some(ExitType::New),
                    KeyCode::Char('b') | KeyCode::Backspace => self.state = AppState::Results,
                    KeyCode::Up => view.scroll_offset = view.scroll_offset.saturating_sub(1),
                    // clamped when rendering
                    KeyCode::Down => view.scroll_offset += 1,
                    KeyCode::PageUp => view.scroll_offset = view.scroll_offset.saturating_sub(10),
                    KeyCode::PageDown => view.scroll_offset += 10,
                    KeyCode::Home => view.scroll_offset = 0,
                    KeyCode::Char('1') => view.sort(SortBy::Key),
                    KeyCode::Char('2') => view.sort(SortBy::MistakeRate),
                    KeyCode::Char('3') => view.sort(SortBy::Attempts),
                    KeyCode::Char('4') => view.sort(SortBy::NextReview),
                    KeyCode::Char(' ') => {
                        view.sort_ascending = !view.sort_ascending;
                        view.scroll_offset = 0;
                    }
                    _ => {}
                }
                None
            }
        }
    }

    pub fn on_tick(&mut self, now: i64) {
        self.now = now;
    }

    /// The result of a session that finished since the last call
    pub fn take_completed(&mut self) -> Option<SessionResult> {
        self.completed.take()
    }

    /// Result of the session on screen, once it has finished
    pub fn result(&self) -> Option<&SessionResult> {
        self.session.result()
    }

    /// Start the next session: the same text again, or freshly generated text
    /// drawn with the current weak keys.
    pub fn reset(&mut self, exit: ExitType, rng: &mut dyn RngCore) {
        match exit {
            ExitType::Restart => self.session.reset(None, None),
            ExitType::New => {
                let prompt = WordGenerator::new(self.config.word_gen_config(self.custom_prompt.clone()))
                    .generate_prompt(&self.language, &self.stats, &mut self.cache, rng);
                self.session.reset(Some(prompt), None);
            }
            ExitType::Quit => return,
        }
        self.state = AppState::Typing;
        self.key_stats_view = KeyStatsView::default();
        self.completed = None;
    }
}

fn content_type(custom_prompt: &Option<String>) -> ContentType {
    if custom_prompt.is_some() {
        ContentType::Custom
    } else {
        ContentType::Words
    }
}
