//! Rule registry with atomic snapshot replacement.
//!
//! # Design Decisions
//! - Pattern order and the pattern → rule mapping live in one immutable [`RuleSet`]
//! - Readers load the current `Arc<RuleSet>` without locking
//! - Reload publishes a whole new `RuleSet`; rules are never mutated in place

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::rules::Rule;

/// An immutable generation of rules.
#[derive(Debug, Default)]
pub struct RuleSet {
    /// Rules in declaration order.
    rules: Vec<Arc<Rule>>,
    /// Pattern text → position in `rules`.
    index: HashMap<String, usize>,
    generation: u64,
}

impl RuleSet {
    /// Build a rule set from rules in declaration order.
    ///
    /// If two rules share the same pattern text the later declaration replaces the earlier one
    /// and takes its position at the end. The loader rejects such files, this only matters
    /// for rule sets assembled in code.
    pub fn new(rules: impl IntoIterator<Item = Rule>) -> Self {
        let mut ordered: Vec<Arc<Rule>> = Vec::new();
        for rule in rules {
            ordered.retain(|existing| existing.pattern() != rule.pattern());
            ordered.push(Arc::new(rule));
        }

        let index = ordered
            .iter()
            .enumerate()
            .map(|(i, rule)| (rule.pattern().to_owned(), i))
            .collect();

        Self {
            rules: ordered,
            index,
            generation: 0,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rules in declaration order.
    pub fn iter(&self) -> std::slice::Iter<'_, Arc<Rule>> {
        self.rules.iter()
    }

    /// Look up a rule by its pattern text.
    pub fn get(&self, pattern: &str) -> Option<&Arc<Rule>> {
        self.index.get(pattern).map(|&i| &self.rules[i])
    }

    /// Patterns in declaration order.
    pub fn patterns(&self) -> impl Iterator<Item = &str> + '_ {
        self.rules.iter().map(|rule| rule.pattern())
    }

    /// Generation number assigned by the registry when this set was published.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Shared holder of the currently active [`RuleSet`].
#[derive(Debug)]
pub struct RuleRegistry {
    current: ArcSwap<RuleSet>,
    next_generation: AtomicU64,
}

impl RuleRegistry {
    pub fn new(mut rules: RuleSet) -> Self {
        rules.generation = 1;
        Self {
            current: ArcSwap::from_pointee(rules),
            next_generation: AtomicU64::new(2),
        }
    }

    pub fn empty() -> Self {
        Self::new(RuleSet::empty())
    }

    /// The active rule set. The returned snapshot stays valid across later replacements.
    pub fn snapshot(&self) -> Arc<RuleSet> {
        self.current.load_full()
    }

    /// Atomically publish `rules`, returning the generation number assigned to it.
    pub fn replace(&self, mut rules: RuleSet) -> u64 {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        rules.generation = generation;
        self.current.store(Arc::new(rules));
        generation
    }

    pub fn len(&self) -> usize {
        self.current.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.load().is_empty()
    }
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::testing::rule;
    use std::thread;

    #[test]
    fn test_order_and_index_agree() {
        let set = RuleSet::new([
            rule("/a", &[("X-R", "1")], vec![]),
            rule("/b", &[("X-R", "2")], vec![]),
        ]);

        assert_eq!(set.patterns().collect::<Vec<_>>(), vec!["/a", "/b"]);
        assert_eq!(set.get("/b").unwrap().pattern(), "/b");
        assert!(set.get("/c").is_none());
    }

    #[test]
    fn test_duplicate_pattern_later_wins() {
        let set = RuleSet::new([
            rule("/a", &[("X-R", "1")], vec![]),
            rule("/b", &[("X-R", "2")], vec![]),
            rule("/a", &[("X-R", "3")], vec![]),
        ]);

        assert_eq!(set.len(), 2);
        assert_eq!(set.patterns().collect::<Vec<_>>(), vec!["/b", "/a"]);
        let headers = set.get("/a").unwrap().default_headers().unwrap();
        assert_eq!(headers[0].value(), "3");
    }

    #[test]
    fn test_replace_publishes_new_generation() {
        let registry = RuleRegistry::new(RuleSet::new([rule("/a", &[("X-R", "1")], vec![])]));
        let before = registry.snapshot();
        assert_eq!(before.generation(), 1);

        let generation = registry.replace(RuleSet::empty());
        assert_eq!(generation, 2);
        assert!(registry.is_empty());

        // Old snapshot is untouched.
        assert_eq!(before.len(), 1);
        assert_eq!(registry.snapshot().generation(), 2);
    }

    #[test]
    fn test_concurrent_readers_see_whole_generations() {
        fn generation_set(tag: usize) -> RuleSet {
            let tag = tag.to_string();
            RuleSet::new((0..20).map(|i| {
                let pattern = format!("/r{i}");
                rule(&pattern, &[("X-Gen", tag.as_str())], vec![])
            }))
        }

        let registry = Arc::new(RuleRegistry::new(generation_set(0)));

        let readers: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                thread::spawn(move || {
                    for _ in 0..2_000 {
                        let snapshot = registry.snapshot();
                        let tags: Vec<_> = snapshot
                            .iter()
                            .map(|r| r.default_headers().unwrap()[0].value().clone())
                            .collect();
                        assert_eq!(tags.len(), 20);
                        assert!(tags.iter().all(|t| *t == tags[0]), "mixed generations");
                        for (i, pattern) in snapshot.patterns().enumerate() {
                            assert_eq!(pattern, format!("/r{i}"));
                            assert!(snapshot.get(pattern).is_some());
                        }
                    }
                })
            })
            .collect();

        for tag in 1..200 {
            registry.replace(generation_set(tag));
        }

        for reader in readers {
            reader.join().unwrap();
        }
    }
}
