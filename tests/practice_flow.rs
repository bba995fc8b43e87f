use std::collections::BTreeMap;

use assert_matches::assert_matches;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tempfile::tempdir;

use typewise::language::{ContentTagCache, SupportedLanguage};
use typewise::result::SessionResult;
use typewise::session::{Keystroke, PracticeSession, SessionConfig};
use typewise::srs::MS_PER_DAY;
use typewise::state::{CharState, ErrorMode, SessionStatus};
use typewise::stats::{aggregate, UserStats};
use typewise::store::{SessionLog, SqliteBlobStore, StatsRepository};
use typewise::visual::VisualState;
use typewise::word_generator::{WordGenConfig, WordGenerator};

fn session(text: &str, error_mode: ErrorMode) -> PracticeSession {
    PracticeSession::new(
        text,
        SessionConfig {
            error_mode,
            ..SessionConfig::default()
        },
    )
}

fn type_keys(session: &mut PracticeSession, keys: &str, start: i64) -> Option<SessionResult> {
    let mut result = None;
    for (i, c) in keys.chars().enumerate() {
        if let Some(r) = session.press(Keystroke::Char(c), start + i as i64 * 200) {
            result = Some(r.clone());
        }
    }
    result
}

#[test]
fn stop_on_error_holds_the_cursor() {
    let mut s = session("hi", ErrorMode::StopOnError);

    type_keys(&mut s, "x", 0);
    assert_eq!(s.state().cursor_position, 0);
    assert_eq!(s.state().characters[0].state, CharState::Incorrect);

    type_keys(&mut s, "h", 200);
    assert_eq!(s.state().characters[0].state, CharState::Corrected);

    let result = type_keys(&mut s, "i", 400).expect("completes on the last key");
    assert_eq!(s.state().status, SessionStatus::Complete);
    assert_eq!(result.total_keystrokes, 3);
    assert_eq!(result.accuracy, 66);
}

#[test]
fn correction_required_shows_error_zone() {
    let mut s = session("abc", ErrorMode::CorrectionRequired);
    assert_eq!(type_keys(&mut s, "xyz", 0), None);

    assert!(s
        .state()
        .characters
        .iter()
        .all(|c| c.state == CharState::Incorrect));
    assert_eq!(s.state().status, SessionStatus::Active);

    let visual: Vec<VisualState> = s.visual().characters.iter().map(|c| c.visual_state).collect();
    assert_eq!(
        visual,
        [
            VisualState::Incorrect,
            VisualState::ErrorZone,
            VisualState::ErrorZone
        ]
    );
}

#[test]
fn repeated_mistakes_count_once_per_key() {
    let mut s = session("ab", ErrorMode::StopOnError);
    let result = type_keys(&mut s, "xab", 0).unwrap();
    assert_eq!(result.mistakes_by_key, BTreeMap::from([('a', 1)]));

    let mut s = session("ab", ErrorMode::StopOnError);
    let result = type_keys(&mut s, "xxab", 0).unwrap();
    assert_eq!(result.mistakes_by_key, BTreeMap::from([('a', 1)]));
    assert_eq!(result.mistakes, 2);
}

#[test]
fn weak_keys_emerge_and_get_scheduled() {
    let mut stats = UserStats::default();
    for round in 0..3 {
        let mut s = session("ab", ErrorMode::StopOnError);
        let result = type_keys(&mut s, "xab", round * 10_000).unwrap();
        stats = aggregate(&stats, &result);
    }

    assert_eq!(stats.total_sessions, 3);
    assert_eq!(stats.weakest_keys, vec!['a']);
    assert!(!stats.key_stats.contains_key(&'b'));

    let a = &stats.key_stats[&'a'];
    assert_eq!(a.total_attempts, 6);
    assert_eq!(a.mistakes, 3);
    assert_eq!(a.interval, 1);
    assert_eq!(a.ease_factor, 1.3);
    assert_eq!(
        a.next_review_date,
        stats.last_session_at.unwrap() + MS_PER_DAY
    );
    assert!(stats.due_keys(a.next_review_date).iter().any(|k| k.key == 'a'));
    assert!(stats.due_keys(a.next_review_date - 1).is_empty());
}

#[test]
fn retries_on_a_key_fail_its_review() {
    let mut s = session("ab", ErrorMode::StopOnError);
    let result = type_keys(&mut s, "xxxab", 0).unwrap();
    assert_eq!(result.mistakes_by_key, BTreeMap::from([('a', 1)]));
    assert_eq!(result.mistaken_keystrokes_by_key, BTreeMap::from([('a', 3)]));
    assert_eq!(result.keystrokes_by_key.get(&'a'), Some(&4));

    let stats = aggregate(&UserStats::default(), &result);
    let a = &stats.key_stats[&'a'];
    assert_eq!(a.repetitions, 0);
    assert_eq!(a.interval, 1);
    assert!((a.ease_factor - 1.96).abs() < 1e-9);
}

#[test]
fn adaptive_prompts_follow_weak_keys() {
    let language = SupportedLanguage::English.load().unwrap();
    let mut stats = UserStats::default();
    stats.weakest_keys = vec!['z'];

    let generator = WordGenerator::new(WordGenConfig {
        number_of_words: 200,
        weak_key_intensity: 1.0,
        ..WordGenConfig::default()
    });
    let mut cache = ContentTagCache::new();
    let mut rng = StdRng::seed_from_u64(11);
    let adaptive = generator.generate_prompt(&language, &stats, &mut cache, &mut rng);

    let uniform = WordGenerator::new(WordGenConfig {
        number_of_words: 200,
        adaptive: false,
        ..WordGenConfig::default()
    });
    let mut rng = StdRng::seed_from_u64(11);
    let plain = uniform.generate_prompt(&language, &stats, &mut cache, &mut rng);

    let count_z = |s: &str| s.chars().filter(|&c| c == 'z').count();
    assert_eq!(adaptive.split(' ').count(), 200);
    assert!(count_z(&adaptive) > count_z(&plain));
    assert!(!cache.is_empty());
}

#[test]
fn results_persist_across_reopen() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("state").join("stats.db");
    let log = SessionLog::new(dir.path().join("log.csv"));

    let mut s = session("hello world", ErrorMode::AdvanceOnError);
    let result = type_keys(&mut s, "hellp world", 0).unwrap();
    assert_eq!(result.uncorrected_errors, 1);

    let saved = {
        let mut repo = StatsRepository::new(SqliteBlobStore::open(&db).unwrap());
        let saved = repo.record(&result).unwrap();
        log.append(&result).unwrap();
        saved
    };

    let repo = StatsRepository::new(SqliteBlobStore::open(&db).unwrap());
    assert_eq!(repo.load_stats().unwrap(), saved);
    assert_matches!(repo.last_result().unwrap(), Some(r) if r.id == result.id);

    let rows = log.read_all().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].mistakes, 1);
}
