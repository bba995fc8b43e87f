use super::adaptive::AdaptiveSelector;
use super::cache::ContentTagCache;
use super::core::Language;
use rand::seq::SliceRandom;
use rand::RngCore;

/// Trait for different word selection strategies
pub trait WordSelector {
    /// Select `count` words from the language
    fn select_words(
        &self,
        language: &Language,
        count: usize,
        cache: &mut ContentTagCache,
        rng: &mut dyn RngCore,
    ) -> Vec<String>;
}

/// Uniform selection without weak-key bias
pub struct RandomSelector;

impl WordSelector for RandomSelector {
    fn select_words(
        &self,
        language: &Language,
        count: usize,
        _cache: &mut ContentTagCache,
        rng: &mut dyn RngCore,
    ) -> Vec<String> {
        (0..count)
            .filter_map(|_| language.words.choose(rng))
            .cloned()
            .collect()
    }
}

/// Selection biased toward words containing the user's weakest keys
pub struct WeakKeySelector {
    adaptive: AdaptiveSelector,
}

impl WeakKeySelector {
    pub fn new(adaptive: AdaptiveSelector) -> Self {
        Self { adaptive }
    }
}

impl WordSelector for WeakKeySelector {
    fn select_words(
        &self,
        language: &Language,
        count: usize,
        cache: &mut ContentTagCache,
        rng: &mut dyn RngCore,
    ) -> Vec<String> {
        if self.adaptive.is_uniform() {
            return RandomSelector.select_words(language, count, cache, rng);
        }
        self.adaptive
            .select_many(&language.words, count, cache, rng)
            .into_iter()
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn create_test_language() -> Language {
        Language {
            name: "test".to_string(),
            size: 4,
            words: vec![
                "jazz".to_string(),
                "the".to_string(),
                "and".to_string(),
                "for".to_string(),
            ],
        }
    }

    #[test]
    fn test_random_selector() {
        let lang = create_test_language();
        let mut rng = StdRng::seed_from_u64(3);
        let words = RandomSelector.select_words(&lang, 10, &mut ContentTagCache::new(), &mut rng);

        assert_eq!(words.len(), 10);
        assert!(words.iter().all(|w| lang.words.contains(w)));
    }

    #[test]
    fn test_weak_key_selector_targets_weak_keys() {
        let lang = create_test_language();
        let selector = WeakKeySelector::new(AdaptiveSelector::new(['z'], 1.0));
        let mut cache = ContentTagCache::new();
        let mut rng = StdRng::seed_from_u64(11);

        let words = selector.select_words(&lang, 200, &mut cache, &mut rng);
        let jazz = words.iter().filter(|w| w.as_str() == "jazz").count();
        assert_eq!(words.len(), 200);
        assert!(jazz > 100, "jazz drawn {jazz} times");
        assert_eq!(cache.len(), 4);
    }

    #[test]
    fn test_weak_key_selector_falls_back_to_random() {
        let lang = create_test_language();
        let selector = WeakKeySelector::new(AdaptiveSelector::uniform());
        let mut cache = ContentTagCache::new();
        let mut rng = StdRng::seed_from_u64(5);

        let words = selector.select_words(&lang, 5, &mut cache, &mut rng);
        assert_eq!(words.len(), 5);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_empty_language() {
        let lang = Language {
            name: "empty".to_string(),
            size: 0,
            words: vec![],
        };
        let mut rng = StdRng::seed_from_u64(0);
        let mut cache = ContentTagCache::new();
        assert!(RandomSelector
            .select_words(&lang, 3, &mut cache, &mut rng)
            .is_empty());
        assert!(WeakKeySelector::new(AdaptiveSelector::new(['a'], 1.0))
            .select_words(&lang, 3, &mut cache, &mut rng)
            .is_empty());
    }
}
