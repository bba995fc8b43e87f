use std::collections::{BTreeMap, HashMap};

/// Lowercased character counts per content item, computed on first use.
///
/// Owned by the caller and passed to the selector; `clear` drops everything
/// so tests and language switches start cold.
#[derive(Debug, Default, Clone)]
pub struct ContentTagCache {
    tags: HashMap<String, BTreeMap<char, u32>>,
}

impl ContentTagCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn char_counts(&mut self, item: &str) -> &BTreeMap<char, u32> {
        self.tags
            .entry(item.to_string())
            .or_insert_with(|| count_chars(item))
    }

    /// How many characters of `item` are one of `keys` (already lowercased)
    pub fn occurrences(&mut self, item: &str, keys: &[char]) -> u32 {
        let counts = self.char_counts(item);
        keys.iter().filter_map(|k| counts.get(k)).sum()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn clear(&mut self) {
        self.tags.clear();
    }
}

pub(crate) fn count_chars(item: &str) -> BTreeMap<char, u32> {
    let mut counts = BTreeMap::new();
    for c in item.chars().flat_map(char::to_lowercase) {
        *counts.entry(c).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_are_case_insensitive() {
        let mut cache = ContentTagCache::new();
        let counts = cache.char_counts("AaB");
        assert_eq!(counts.get(&'a'), Some(&2));
        assert_eq!(counts.get(&'b'), Some(&1));
        assert_eq!(cache.occurrences("AaB", &['a', 'z']), 2);
    }

    #[test]
    fn test_cache_fills_and_clears() {
        let mut cache = ContentTagCache::new();
        assert!(cache.is_empty());
        cache.occurrences("hello", &['l']);
        cache.occurrences("hello", &['o']);
        cache.occurrences("world", &['o']);
        assert_eq!(cache.len(), 2);

        cache.clear();
        assert!(cache.is_empty());
    }
}
