use super::cache::{count_chars, ContentTagCache};
use rand::seq::SliceRandom;
use rand::Rng;

/// Weighted draw over a content pool that favours items dense in weak keys.
///
/// An item's weight is `1 + occurrences × intensity × 2`, where occurrences
/// counts the item's characters (case-insensitively) that are weak keys. With
/// no weak keys or zero intensity every item is equally likely.
#[derive(Debug, Clone, PartialEq)]
pub struct AdaptiveSelector {
    weak_keys: Vec<char>,
    intensity: f64,
}

impl AdaptiveSelector {
    pub fn new(weak_keys: impl IntoIterator<Item = char>, intensity: f64) -> Self {
        let mut keys: Vec<char> = weak_keys
            .into_iter()
            .flat_map(char::to_lowercase)
            .collect();
        keys.sort_unstable();
        keys.dedup();
        Self {
            weak_keys: keys,
            intensity: intensity.clamp(0.0, 1.0),
        }
    }

    pub fn uniform() -> Self {
        Self::new([], 0.0)
    }

    pub fn weak_keys(&self) -> &[char] {
        &self.weak_keys
    }

    pub fn intensity(&self) -> f64 {
        self.intensity
    }

    pub fn is_uniform(&self) -> bool {
        self.weak_keys.is_empty() || self.intensity == 0.0
    }

    fn weight_for(&self, occurrences: u32) -> f64 {
        1.0 + occurrences as f64 * self.intensity * 2.0
    }

    pub fn weight(&self, item: &str) -> f64 {
        let counts = count_chars(item);
        let occurrences = self.weak_keys.iter().filter_map(|k| counts.get(k)).sum();
        self.weight_for(occurrences)
    }

    pub fn weight_cached(&self, item: &str, cache: &mut ContentTagCache) -> f64 {
        self.weight_for(cache.occurrences(item, &self.weak_keys))
    }

    pub fn select<'p, T, R>(&self, pool: &'p [T], rng: &mut R) -> Option<&'p T>
    where
        T: AsRef<str>,
        R: Rng + ?Sized,
    {
        if self.is_uniform() {
            return pool.choose(rng);
        }
        let weights: Vec<f64> = pool.iter().map(|item| self.weight(item.as_ref())).collect();
        roulette(&weights, rng).map(|i| &pool[i])
    }

    /// Like [`select`](Self::select), reusing character counts from `cache`.
    pub fn select_cached<'p, T, R>(
        &self,
        pool: &'p [T],
        cache: &mut ContentTagCache,
        rng: &mut R,
    ) -> Option<&'p T>
    where
        T: AsRef<str>,
        R: Rng + ?Sized,
    {
        if self.is_uniform() {
            return pool.choose(rng);
        }
        let weights: Vec<f64> = pool
            .iter()
            .map(|item| self.weight_cached(item.as_ref(), cache))
            .collect();
        roulette(&weights, rng).map(|i| &pool[i])
    }

    /// `count` independent draws, with replacement
    pub fn select_many<'p, T, R>(
        &self,
        pool: &'p [T],
        count: usize,
        cache: &mut ContentTagCache,
        rng: &mut R,
    ) -> Vec<&'p T>
    where
        T: AsRef<str>,
        R: Rng + ?Sized,
    {
        (0..count)
            .map_while(|_| self.select_cached(pool, cache, rng))
            .collect()
    }
}

/// Cumulative-weight roulette; `None` when there is nothing to pick from.
pub fn roulette<R: Rng + ?Sized>(weights: &[f64], rng: &mut R) -> Option<usize> {
    let total: f64 = weights.iter().sum();
    if weights.is_empty() || total <= 0.0 {
        return None;
    }
    let target = rng.gen::<f64>() * total;
    let mut cumulative = 0.0;
    for (i, w) in weights.iter().enumerate() {
        cumulative += w;
        if target < cumulative {
            return Some(i);
        }
    }
    Some(weights.len() - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_weight() {
        let selector = AdaptiveSelector::new(['Q', 'z'], 0.5);
        assert_eq!(selector.weak_keys(), &['q', 'z']);
        assert_eq!(selector.weight("quiz"), 3.0);
        assert_eq!(selector.weight("QUIZ"), 3.0);
        assert_eq!(selector.weight("hello"), 1.0);

        let mut cache = ContentTagCache::new();
        assert_eq!(selector.weight_cached("Pizza", &mut cache), 3.0);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_intensity_is_clamped() {
        assert_eq!(AdaptiveSelector::new(['a'], 3.0).intensity(), 1.0);
        assert!(AdaptiveSelector::new(['a'], 0.0).is_uniform());
        assert!(AdaptiveSelector::uniform().is_uniform());
    }

    #[test]
    fn test_roulette_is_deterministic_for_fixed_draws() {
        let weights = [1.0, 9.0];
        assert_eq!(roulette(&weights, &mut StepRng::new(0, 0)), Some(0));
        assert_eq!(roulette(&weights, &mut StepRng::new(1 << 63, 0)), Some(1));
        assert_eq!(roulette(&weights, &mut StepRng::new(u64::MAX, 0)), Some(1));
        assert_eq!(roulette(&[], &mut StepRng::new(0, 0)), None);
    }

    #[test]
    fn test_select_from_empty_pool() {
        let pool: [&str; 0] = [];
        let mut rng = StdRng::seed_from_u64(1);
        assert!(AdaptiveSelector::new(['a'], 1.0).select(&pool, &mut rng).is_none());
        assert!(AdaptiveSelector::uniform().select(&pool, &mut rng).is_none());
    }

    #[test]
    fn test_weak_key_items_are_favoured() {
        let pool = ["aaaa", "bbbb"];
        let selector = AdaptiveSelector::new(['a'], 1.0);
        let mut cache = ContentTagCache::new();
        let mut rng = StdRng::seed_from_u64(42);

        let picks = selector.select_many(&pool, 1_000, &mut cache, &mut rng);
        let favoured = picks.iter().filter(|w| ***w == "aaaa").count();
        assert_eq!(picks.len(), 1_000);
        assert!(favoured > 800, "weak-key item drawn {favoured} times");
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_same_seed_same_selection() {
        let pool = ["the", "quiz", "jazz", "box", "water"];
        let selector = AdaptiveSelector::new(['z', 'x'], 0.7);
        let draw = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut cache = ContentTagCache::new();
            selector.select_many(&pool, 20, &mut cache, &mut rng)
        };
        assert_eq!(draw(7), draw(7));
    }
}
