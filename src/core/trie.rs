// --- File: src/core/trie.rs
use crate::core::types::{BaseStructure, Tag};
use std::collections::HashMap;

/// Index of a node in the structure trie. The root is the empty tag prefix.
pub type PrefixId = usize;

pub const ROOT: PrefixId = 0;

#[derive(Debug, Clone)]
struct PrefixNode {
    children: HashMap<Tag, PrefixId>,
    /// Set when the prefix ending here is itself a complete base structure.
    structure: Option<usize>,
    max_prior_in_subtree: f64,
}

impl PrefixNode {
    fn new() -> Self {
        Self { children: HashMap::new(), structure: None, max_prior_in_subtree: 0.0 }
    }
}

/// Structural validator: every contiguous leading run of tags of every base
/// structure is a node. Extending a prefix by one tag is a single hash lookup,
/// so the search carries a `PrefixId` instead of re-hashing a growing string.
#[derive(Debug, Clone)]
pub struct StructureTrie {
    nodes: Vec<PrefixNode>,
    structures: Vec<(BaseStructure, f64)>,
}

impl StructureTrie {
    pub fn new() -> Self {
        Self { nodes: vec![PrefixNode::new()], structures: Vec::new() }
    }

    pub fn from_structures<'a, I>(structures: I) -> Self
    where
        I: IntoIterator<Item = (&'a BaseStructure, f64)>,
    {
        let mut trie = Self::new();
        for (structure, prior) in structures {
            trie.insert(structure, prior);
        }
        trie
    }

    /// Inserts a base structure with its prior. O(k) in the number of tags.
    pub fn insert(&mut self, structure: &BaseStructure, prior: f64) {
        let mut node_idx = ROOT;
        let mut path = vec![ROOT];
        for tag in structure.tags() {
            let next_idx = if let Some(&id) = self.nodes[node_idx].children.get(tag) {
                id
            } else {
                let new_node_id = self.nodes.len();
                self.nodes.push(PrefixNode::new());
                self.nodes[node_idx].children.insert(tag.clone(), new_node_id);
                new_node_id
            };
            node_idx = next_idx;
            path.push(node_idx);
        }

        match self.nodes[node_idx].structure {
            Some(existing) => self.structures[existing].1 = prior,
            None => {
                self.nodes[node_idx].structure = Some(self.structures.len());
                self.structures.push((structure.clone(), prior));
            }
        }

        // Propagate the max prior up the path
        for &idx in path.iter().rev() {
            if prior > self.nodes[idx].max_prior_in_subtree {
                self.nodes[idx].max_prior_in_subtree = prior;
            } else {
                break;
            }
        }
    }

    /// Extends `prefix` by one tag; `None` when no base structure continues that way.
    pub fn advance(&self, prefix: PrefixId, tag: &Tag) -> Option<PrefixId> {
        self.nodes.get(prefix)?.children.get(tag).copied()
    }

    /// Whether `tags` is a prefix of at least one base structure.
    pub fn exists(&self, tags: &[Tag]) -> bool {
        let mut node_idx = ROOT;
        for tag in tags {
            match self.advance(node_idx, tag) {
                Some(next) => node_idx = next,
                None => return false,
            }
        }
        true
    }

    /// The base structure and prior completed exactly at `prefix`, if any.
    pub fn completed(&self, prefix: PrefixId) -> Option<(&BaseStructure, f64)> {
        let id = self.nodes.get(prefix)?.structure?;
        let (structure, prior) = &self.structures[id];
        Some((structure, *prior))
    }

    /// Largest prior among the base structures that start with `prefix`.
    pub fn max_prior_below(&self, prefix: PrefixId) -> f64 {
        self.nodes.get(prefix).map_or(0.0, |n| n.max_prior_in_subtree)
    }

    pub fn structure_count(&self) -> usize {
        self.structures.len()
    }
}

impl Default for StructureTrie {
    fn default() -> Self {
        Self::new()
    }
}
