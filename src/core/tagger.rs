// File: src/core/tagger.rs
use crate::core::estimator::Estimator;
use crate::core::types::{Tag, TagCandidate};
use crate::grammar::{Grammar, TagGranularity};
use crate::lexicon::{PosTagger, SenseAbstraction, SenseInventory, SenseSpace};
use lru::LruCache;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::num::NonZeroUsize;
use std::sync::Arc;

pub const DEFAULT_CACHE_SIZE: usize = 10_000;

/// Memoized word -> `(tag, emission probability)` pipeline for one grammar.
///
/// A word is POS-tagged standalone (plus a "no POS" reading), each noun or verb
/// reading is expanded into abstracted sense clusters (plus "no sense"), and every
/// combination is mapped through the grammar's tagging rule. Tags the grammar never
/// saw are dropped; zero-probability readings are kept.
pub struct LexicalAbstractionCache {
    grammar: Arc<Grammar>,
    pos_tagger: Box<dyn PosTagger>,
    senses: Box<dyn SenseInventory>,
    noun_model: Box<dyn SenseAbstraction>,
    verb_model: Box<dyn SenseAbstraction>,
    pos_cache: LruCache<String, Arc<[Option<String>]>>,
    sense_cache: LruCache<(String, String), Arc<[Option<String>]>>,
    tag_cache: LruCache<String, Arc<[TagCandidate]>>,
    estimators: HashMap<Tag, Estimator>,
}

impl LexicalAbstractionCache {
    pub fn new(
        grammar: Arc<Grammar>,
        pos_tagger: Box<dyn PosTagger>,
        senses: Box<dyn SenseInventory>,
        noun_model: Box<dyn SenseAbstraction>,
        verb_model: Box<dyn SenseAbstraction>,
        capacity: usize,
    ) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            grammar,
            pos_tagger,
            senses,
            noun_model,
            verb_model,
            pos_cache: LruCache::new(capacity),
            sense_cache: LruCache::new(capacity),
            tag_cache: LruCache::new(capacity),
            estimators: HashMap::new(),
        }
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    pub fn shared_grammar(&self) -> Arc<Grammar> {
        Arc::clone(&self.grammar)
    }

    /// All grammar readings of `word`, sorted by tag.
    pub fn get_tags(&mut self, word: &str) -> Arc<[TagCandidate]> {
        if let Some(hit) = self.tag_cache.get(word) {
            return Arc::clone(hit);
        }

        let mut readings: BTreeMap<Tag, f64> = BTreeMap::new();
        let pos_readings = self.pos_readings(word);
        for pos in pos_readings.iter() {
            let sense_readings = self.sense_readings(word, pos.as_deref());
            for sense in sense_readings.iter() {
                let tag = self.grammar.tag_for(word, pos.as_deref(), sense.as_deref());
                if readings.contains_key(&tag) || !self.grammar.has_tag(&tag) {
                    continue;
                }
                let p = self.emission_probability(&tag, word);
                readings.insert(tag, p);
            }
        }

        let candidates: Arc<[TagCandidate]> = readings
            .into_iter()
            .map(|(tag, probability)| TagCandidate { tag, probability })
            .collect();
        self.tag_cache.put(word.to_string(), Arc::clone(&candidates));
        candidates
    }

    /// Standalone POS readings of the word, always ending with `None`.
    fn pos_readings(&mut self, word: &str) -> Arc<[Option<String>]> {
        if let Some(hit) = self.pos_cache.get(word) {
            return Arc::clone(hit);
        }
        let mut tags: Vec<Option<String>> = self.pos_tagger.tags(word).into_iter().map(Some).collect();
        tags.push(None);
        let tags: Arc<[Option<String>]> = tags.into();
        self.pos_cache.put(word.to_string(), Arc::clone(&tags));
        tags
    }

    /// Abstracted sense clusters for a reading, always including `None`.
    fn sense_readings(&mut self, word: &str, pos: Option<&str>) -> Arc<[Option<String>]> {
        let pos = match pos {
            Some(pos) if self.grammar.config().tagtype == TagGranularity::Semantic => pos,
            _ => return Arc::from(vec![None]),
        };
        let space = match SenseSpace::from_pos(pos) {
            Some(space) if word.chars().count() >= space.min_word_len() => space,
            _ => return Arc::from(vec![None]),
        };

        let key = (word.to_string(), pos.to_string());
        if let Some(hit) = self.sense_cache.get(&key) {
            return Arc::clone(hit);
        }

        let model = match space {
            SenseSpace::Noun => &self.noun_model,
            SenseSpace::Verb => &self.verb_model,
        };
        let mut clusters: BTreeSet<Option<String>> = BTreeSet::new();
        clusters.insert(None);
        for sense in self.senses.senses(word, space) {
            clusters.extend(model.abstract_sense(&sense).into_iter().map(Some));
        }
        let clusters: Arc<[Option<String>]> = clusters.into_iter().collect();
        self.sense_cache.put(key, Arc::clone(&clusters));
        clusters
    }

    /// `P(word | tag)`, 0 when the word never occurred under the tag.
    fn emission_probability(&mut self, tag: &Tag, word: &str) -> f64 {
        let table = match self.grammar.tag_table(tag) {
            Some(table) => table,
            None => return 0.0,
        };
        let kind = self.grammar.config().estimator;
        let estimator = self.estimators.entry(tag.clone()).or_insert_with(|| {
            let sample_size = table.values().sum();
            Estimator::new(kind, sample_size, table.len() as u64)
        });
        table.get(word).map_or(0.0, |&count| estimator.probability(count))
    }

    pub fn cached_words(&self) -> usize {
        self.tag_cache.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::estimator::EstimatorKind;
    use crate::grammar::GrammarConfig;
    use crate::lexicon::{LexiconPosTagger, LexiconSenses, TreeCutModel};

    fn fixture(granularity: TagGranularity, capacity: usize) -> LexicalAbstractionCache {
        let mut grammar = Grammar::new(GrammarConfig { tagtype: granularity, estimator: EstimatorKind::Mle });
        grammar.insert_word(Tag::new("nn1"), "dog", 3);
        grammar.insert_word(Tag::new("nn1"), "cat", 1);
        grammar.insert_word(Tag::new("nn1_animal.n.01"), "dog", 1);
        grammar.insert_word(Tag::new("vv0"), "go", 1);
        grammar.insert_word(Tag::new("char2"), "go", 1);
        grammar.insert_word(Tag::new("number4"), "1999", 1);

        let mut pos = LexiconPosTagger::new();
        pos.insert("dog", "nn1");
        pos.insert("go", "vv0");
        pos.insert("ox", "nn1");
        let mut senses = LexiconSenses::new();
        senses.insert("dog", SenseSpace::Noun, "dog.n.01");
        senses.insert("ox", SenseSpace::Noun, "ox.n.01");
        let mut nouns = TreeCutModel::new();
        nouns.insert("dog.n.01", "animal.n.01");
        nouns.insert("ox.n.01", "animal.n.01");

        LexicalAbstractionCache::new(
            Arc::new(grammar),
            Box::new(pos),
            Box::new(senses),
            Box::new(nouns),
            Box::new(TreeCutModel::new()),
            capacity,
        )
    }

    fn tags_of(cache: &mut LexicalAbstractionCache, word: &str) -> Vec<(String, f64)> {
        cache
            .get_tags(word)
            .iter()
            .map(|c| (c.tag.to_string(), c.probability))
            .collect()
    }

    #[test]
    fn combines_pos_and_sense_readings() {
        let mut cache = fixture(TagGranularity::Semantic, 16);
        assert_eq!(
            tags_of(&mut cache, "dog"),
            vec![("nn1".to_string(), 0.75), ("nn1_animal.n.01".to_string(), 1.0)]
        );
    }

    #[test]
    fn pos_granularity_skips_senses() {
        let mut cache = fixture(TagGranularity::Pos, 16);
        assert_eq!(tags_of(&mut cache, "dog"), vec![("nn1".to_string(), 0.75)]);
    }

    #[test]
    fn short_nouns_skip_sense_lookup_and_keep_zero_entries() {
        let mut cache = fixture(TagGranularity::Semantic, 16);
        // "ox" has a noun sense but is too short for lookup; neither table holds it.
        assert_eq!(
            tags_of(&mut cache, "ox"),
            vec![("char2".to_string(), 0.0), ("nn1".to_string(), 0.0)]
        );
        // Fallback "no POS" reading yields char2.
        assert_eq!(
            tags_of(&mut cache, "go"),
            vec![("char2".to_string(), 1.0), ("vv0".to_string(), 1.0)]
        );
    }

    #[test]
    fn digits_and_unknown_words() {
        let mut cache = fixture(TagGranularity::Semantic, 16);
        assert_eq!(tags_of(&mut cache, "1999"), vec![("number4".to_string(), 1.0)]);
        assert!(cache.get_tags("zebra").is_empty());
    }

    #[test]
    fn cache_is_bounded() {
        let mut cache = fixture(TagGranularity::Semantic, 2);
        for word in ["dog", "cat", "go", "1999"] {
            cache.get_tags(word);
        }
        assert_eq!(cache.cached_words(), 2);
        assert_eq!(tags_of(&mut cache, "dog"), vec![("nn1".to_string(), 0.75), ("nn1_animal.n.01".to_string(), 1.0)]);
    }
}
