use crate::language::{
    AdaptiveSelector, ContentTagCache, Language, RandomSelector, WeakKeySelector, WordSelector,
};
use crate::stats::UserStats;
use rand::RngCore;

/// Configuration for word generation
#[derive(Debug, Clone, PartialEq)]
pub struct WordGenConfig {
    pub number_of_words: usize,
    pub custom_prompt: Option<String>,
    /// Bias selection toward the profile's weakest keys
    pub adaptive: bool,
    pub weak_key_intensity: f64,
}

impl Default for WordGenConfig {
    fn default() -> Self {
        Self {
            number_of_words: 15,
            custom_prompt: None,
            adaptive: true,
            weak_key_intensity: 0.7,
        }
    }
}

/// Builds the practice text for the next session
pub struct WordGenerator {
    config: WordGenConfig,
}

impl WordGenerator {
    pub fn new(config: WordGenConfig) -> Self {
        Self { config }
    }

    pub fn generate_prompt(
        &self,
        language: &Language,
        stats: &UserStats,
        cache: &mut ContentTagCache,
        rng: &mut dyn RngCore,
    ) -> String {
        if let Some(ref custom_prompt) = self.config.custom_prompt {
            return custom_prompt.clone();
        }

        let selector = self.selector(stats);
        let words = selector.select_words(language, self.config.number_of_words, cache, rng);
        tracing::debug!(
            words = words.len(),
            adaptive = self.config.adaptive,
            "prompt generated"
        );
        words.join(" ")
    }

    fn selector(&self, stats: &UserStats) -> Box<dyn WordSelector> {
        if self.config.adaptive && !stats.weakest_keys.is_empty() {
            Box::new(WeakKeySelector::new(AdaptiveSelector::new(
                stats.weakest_keys.iter().copied(),
                self.config.weak_key_intensity,
            )))
        } else {
            Box::new(RandomSelector)
        }
    }
}
