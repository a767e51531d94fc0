use crate::core::converter::{case_accepted, is_all_digits, splits_digit_run, CaseOptions};
use crate::core::splitter::{PrefixSplitter, Splitter};
use crate::core::tagger::LexicalAbstractionCache;
use crate::core::trie::{PrefixId, StructureTrie, ROOT};
use crate::core::types::{BaseStructure, ScoredPassword, Tag};
use crate::grammar::{Grammar, GrammarBundle};
use log::trace;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    /// Drop partial segmentations that can no longer beat the best complete one.
    pub prune: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self { prune: true }
    }
}

/// A fragment placed in the search tree. Children point at their parent by index
/// into the arena owned by a single `search` call; `prefix` is the validator node
/// for the tags chosen from the root down to here.
#[derive(Debug, Clone)]
struct SegmentNode {
    start: usize,
    end: usize,
    parent: Option<usize>,
    path_probability: f64,
    prefix: PrefixId,
}

#[derive(Debug, Default)]
struct BestCandidate {
    probability: f64,
    structure: Option<BaseStructure>,
    segmentation: Option<Vec<String>>,
}

impl BestCandidate {
    fn could_take(&self, total: f64) -> bool {
        total > 0.0 && total >= self.probability
    }

    /// Higher probability wins; equal probability goes to the lexicographically
    /// smaller segmentation, then the smaller base structure.
    fn offer(&mut self, total: f64, structure: &BaseStructure, segmentation: Vec<String>) {
        let better = match (&self.segmentation, &self.structure) {
            _ if total > self.probability => true,
            (Some(current_seg), Some(current_bs)) if total == self.probability => {
                (&segmentation, structure.to_string()) < (current_seg, current_bs.to_string())
            }
            _ => false,
        };
        if better {
            self.probability = total;
            self.structure = Some(structure.clone());
            self.segmentation = Some(segmentation);
        }
    }

    /// Whether a branch with upper bound `bound` may still win or tie.
    fn reachable(&self, bound: f64) -> bool {
        bound > self.probability || (bound > 0.0 && bound == self.probability)
    }
}

/// Finds the most probable grammar derivation of passwords.
///
/// Owns the per-grammar validator and tagging cache; one engine per worker.
pub struct ScoringEngine {
    grammar: Arc<Grammar>,
    trie: StructureTrie,
    vocabulary: HashSet<String>,
    tagger: LexicalAbstractionCache,
    splitter: Box<dyn Splitter>,
    options: SearchOptions,
    last: Option<ScoredPassword>,
}

impl ScoringEngine {
    pub fn new(tagger: LexicalAbstractionCache) -> Self {
        let grammar = tagger.shared_grammar();
        let trie = StructureTrie::from_structures(
            grammar.base_structures().iter().map(|(bs, &prior)| (bs, prior)),
        );
        let vocabulary = grammar.vocabulary();
        Self {
            grammar,
            trie,
            vocabulary,
            tagger,
            splitter: Box::new(PrefixSplitter::default()),
            options: SearchOptions::default(),
            last: None,
        }
    }

    pub fn from_bundle(bundle: GrammarBundle, cache_size: usize) -> Self {
        let GrammarBundle { grammar, noun_model, verb_model, pos_tagger, senses } = bundle;
        Self::new(LexicalAbstractionCache::new(
            Arc::new(grammar),
            Box::new(pos_tagger),
            Box::new(senses),
            Box::new(noun_model),
            Box::new(verb_model),
            cache_size,
        ))
    }

    pub fn with_splitter(mut self, splitter: Box<dyn Splitter>) -> Self {
        self.splitter = splitter;
        self
    }

    pub fn with_options(mut self, options: SearchOptions) -> Self {
        self.options = options;
        self
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    /// Scores a password, reusing the previous result when the same password
    /// arrives twice in a row.
    pub fn score(&mut self, password: &str) -> ScoredPassword {
        if let Some(last) = &self.last {
            if last.password == password {
                return last.clone();
            }
        }
        let scored = self.search(password);
        self.last = Some(scored.clone());
        scored
    }

    /// Scores a password and applies case acceptance: a password that is not
    /// lowercase only keeps its probability when an enabled transform of the
    /// segmentation reproduces it exactly.
    pub fn evaluate(&mut self, password: &str, case: CaseOptions) -> ScoredPassword {
        let scored = self.score(password);
        if scored.probability == 0.0 {
            return scored;
        }
        let segments = scored.segmentation.as_deref().unwrap_or(&[]);
        if case_accepted(password, segments, case) {
            scored
        } else {
            ScoredPassword {
                base_structure: None,
                probability: 0.0,
                ..scored
            }
        }
    }

    /// Maximum-probability decomposition of `password` under the grammar.
    pub fn search(&mut self, password: &str) -> ScoredPassword {
        if is_all_digits(password) {
            let structure = BaseStructure::new(vec![Tag::number(password.chars().count())]);
            if let Some(prior) = self.grammar.prior(&structure).filter(|&p| p > 0.0) {
                return ScoredPassword {
                    password: password.to_string(),
                    base_structure: Some(structure),
                    segmentation: Some(vec![password.to_string()]),
                    probability: prior,
                };
            }
        }

        let mut arena = vec![SegmentNode {
            start: 0,
            end: 0,
            parent: None,
            path_probability: 1.0,
            prefix: ROOT,
        }];
        let mut queue: VecDeque<(usize, usize)> = VecDeque::new();
        queue.push_back((0, 0));
        let mut best = BestCandidate::default();

        while let Some((head, offset)) = queue.pop_front() {
            let tail = &password[offset..];
            for cut in self.splitter.split_points(tail) {
                let (first, rest) = tail.split_at(cut);
                let folded = first.to_lowercase();
                if !self.vocabulary.contains(&folded) || splits_digit_run(first, rest) {
                    continue;
                }

                let candidates = self.tagger.get_tags(&folded);
                for candidate in candidates.iter() {
                    let Some(prefix) = self.trie.advance(arena[head].prefix, &candidate.tag) else {
                        continue;
                    };
                    let path_probability = arena[head].path_probability * candidate.probability;
                    let node = SegmentNode {
                        start: offset,
                        end: offset + cut,
                        parent: Some(head),
                        path_probability,
                        prefix,
                    };

                    if rest.is_empty() {
                        if let Some((structure, prior)) = self.trie.completed(prefix) {
                            let total = path_probability * prior;
                            if best.could_take(total) {
                                let segmentation = collect_segments(&arena, &node, password);
                                best.offer(total, structure, segmentation);
                            }
                        }
                        continue;
                    }

                    let bound = path_probability * self.trie.max_prior_below(prefix);
                    if !self.options.prune || best.reachable(bound) {
                        arena.push(node);
                        queue.push_back((arena.len() - 1, offset + cut));
                    }
                }
            }
        }

        trace!("{} searched {} nodes, p = {}", password, arena.len(), best.probability);
        ScoredPassword {
            password: password.to_string(),
            base_structure: best.structure,
            segmentation: best.segmentation,
            probability: best.probability,
        }
    }
}

/// Fragments from the root down to `leaf`, in password order.
fn collect_segments(arena: &[SegmentNode], leaf: &SegmentNode, password: &str) -> Vec<String> {
    let mut segments = vec![password[leaf.start..leaf.end].to_string()];
    let mut cursor = leaf.parent;
    while let Some(idx) = cursor {
        let node = &arena[idx];
        if node.parent.is_some() {
            segments.push(password[node.start..node.end].to_string());
        }
        cursor = node.parent;
    }
    segments.reverse();
    segments
}
