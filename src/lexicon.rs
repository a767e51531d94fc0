// File: src/lexicon.rs
//
// Interfaces to the lexical collaborators the tagger depends on, with the
// file-backed implementations shipped alongside a grammar.

use crate::error::{GuesserError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Lexical sense space a part-of-speech maps into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SenseSpace {
    Noun,
    Verb,
}

impl SenseSpace {
    /// CLAWS-style tags: `nn1`, `np1` are nouns, `vv0`, `vvd` are verbs.
    pub fn from_pos(pos: &str) -> Option<Self> {
        match pos.chars().next().map(|c| c.to_ascii_lowercase()) {
            Some('n') => Some(Self::Noun),
            Some('v') => Some(Self::Verb),
            _ => None,
        }
    }

    /// Shortest word for which sense lookup is informative.
    pub fn min_word_len(self) -> usize {
        match self {
            Self::Noun => 3,
            Self::Verb => 2,
        }
    }

    fn parse(code: &str) -> Option<Self> {
        match code {
            "n" => Some(Self::Noun),
            "v" => Some(Self::Verb),
            _ => None,
        }
    }
}

/// Part-of-speech tagger run on a standalone word.
pub trait PosTagger {
    fn tags(&self, word: &str) -> Vec<String>;
}

/// Lexical sense database (word -> sense ids within a space).
pub trait SenseInventory {
    fn senses(&self, word: &str, space: SenseSpace) -> Vec<String>;
}

/// Tree-cut model collapsing a fine-grained sense into coarser clusters.
pub trait SenseAbstraction {
    fn abstract_sense(&self, sense: &str) -> Vec<String>;
}

/// Part-of-speech lexicon: `word<TAB>pos1,pos2` per line.
#[derive(Debug, Clone, Default)]
pub struct LexiconPosTagger {
    entries: HashMap<String, Vec<String>>,
}

impl LexiconPosTagger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, word: &str, pos: &str) {
        self.entries.entry(word.to_string()).or_default().push(pos.to_string());
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let mut tagger = Self::new();
        for (line_no, fields) in read_tsv(path)? {
            if fields.len() != 2 {
                return Err(malformed(path, line_no));
            }
            for pos in fields[1].split(',').map(str::trim).filter(|p| !p.is_empty()) {
                tagger.insert(&fields[0], pos);
            }
        }
        Ok(tagger)
    }
}

impl PosTagger for LexiconPosTagger {
    fn tags(&self, word: &str) -> Vec<String> {
        self.entries.get(word).cloned().unwrap_or_default()
    }
}

/// Sense lexicon: `word<TAB>n|v<TAB>sense1,sense2` per line.
#[derive(Debug, Clone, Default)]
pub struct LexiconSenses {
    entries: HashMap<(String, SenseSpace), Vec<String>>,
}

impl LexiconSenses {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, word: &str, space: SenseSpace, sense: &str) {
        self.entries
            .entry((word.to_string(), space))
            .or_default()
            .push(sense.to_string());
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let mut senses = Self::new();
        for (line_no, fields) in read_tsv(path)? {
            let space = match (fields.len(), fields.get(1).and_then(|c| SenseSpace::parse(c))) {
                (3, Some(space)) => space,
                _ => return Err(malformed(path, line_no)),
            };
            for sense in fields[2].split(',').map(str::trim).filter(|s| !s.is_empty()) {
                senses.insert(&fields[0], space, sense);
            }
        }
        Ok(senses)
    }
}

impl SenseInventory for LexiconSenses {
    fn senses(&self, word: &str, space: SenseSpace) -> Vec<String> {
        self.entries
            .get(&(word.to_string(), space))
            .cloned()
            .unwrap_or_default()
    }
}

/// A trained tree cut, stored as sense id -> abstracted cluster ids.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TreeCutModel {
    clusters: HashMap<String, Vec<String>>,
}

impl TreeCutModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, sense: &str, cluster: &str) {
        self.clusters
            .entry(sense.to_string())
            .or_default()
            .push(cluster.to_string());
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .map_err(|e| GuesserError::io(format!("opening {}", path.display()), e))?;
        serde_json::from_reader(BufReader::new(file))
            .map_err(|e| GuesserError::json(format!("reading {}", path.display()), e))
    }
}

impl SenseAbstraction for TreeCutModel {
    fn abstract_sense(&self, sense: &str) -> Vec<String> {
        self.clusters.get(sense).cloned().unwrap_or_default()
    }
}

/// Reads a tab-separated file, skipping blank lines. Yields 1-based line numbers.
pub(crate) fn read_tsv(path: &Path) -> Result<Vec<(usize, Vec<String>)>> {
    let file = File::open(path)
        .map_err(|e| GuesserError::io(format!("opening {}", path.display()), e))?;
    let mut rows = Vec::new();
    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|e| GuesserError::io(format!("reading {}", path.display()), e))?;
        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            continue;
        }
        rows.push((idx + 1, line.split('\t').map(str::to_string).collect()));
    }
    Ok(rows)
}

pub(crate) fn malformed(path: &Path, line_no: usize) -> GuesserError {
    GuesserError::invalid_grammar(format!("malformed line {} in {}", line_no, path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn pos_maps_to_sense_space() {
        assert_eq!(SenseSpace::from_pos("nn1"), Some(SenseSpace::Noun));
        assert_eq!(SenseSpace::from_pos("VV0"), Some(SenseSpace::Verb));
        assert_eq!(SenseSpace::from_pos("jj"), None);
        assert_eq!(SenseSpace::from_pos(""), None);
    }

    #[test]
    fn loads_pos_lexicon() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "love\tnn1,vv0").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "dog\tnn1").unwrap();
        let tagger = LexiconPosTagger::from_file(file.path()).unwrap();
        assert_eq!(tagger.tags("love"), vec!["nn1", "vv0"]);
        assert_eq!(tagger.tags("dog"), vec!["nn1"]);
        assert!(tagger.tags("cat").is_empty());
    }

    #[test]
    fn rejects_malformed_sense_line() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "dog\tx\tdog.n.01").unwrap();
        let err = LexiconSenses::from_file(file.path()).unwrap_err();
        assert!(matches!(err, GuesserError::InvalidGrammar { .. }));
    }

    #[test]
    fn tree_cut_reads_json_map() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"dog.n.01": ["animal.n.01", "canine.n.02"]}}"#).unwrap();
        let model = TreeCutModel::from_file(file.path()).unwrap();
        assert_eq!(model.abstract_sense("dog.n.01"), vec!["animal.n.01", "canine.n.02"]);
        assert!(model.abstract_sense("cat.n.01").is_empty());
    }
}
