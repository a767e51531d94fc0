// File: src/grammar.rs
use crate::core::estimator::EstimatorKind;
use crate::core::types::{BaseStructure, Tag};
use crate::error::{GuesserError, Result};
use crate::lexicon::{malformed, read_tsv, LexiconPosTagger, LexiconSenses, TreeCutModel};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;

pub const CONFIG_FILE: &str = "config.json";
pub const RULES_FILE: &str = "rules.tsv";
pub const NONTERMINALS_DIR: &str = "nonterminals";
pub const NOUN_TREECUT_FILE: &str = "noun_treecut.json";
pub const VERB_TREECUT_FILE: &str = "verb_treecut.json";
pub const POS_LEXICON_FILE: &str = "pos_lexicon.tsv";
pub const SENSES_FILE: &str = "senses.tsv";

/// Whether tags carry a sense cluster on top of the part-of-speech.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TagGranularity {
    Pos,
    #[default]
    #[serde(alias = "backoff")]
    Semantic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct GrammarConfig {
    #[serde(default)]
    pub tagtype: TagGranularity,
    #[serde(default)]
    pub estimator: EstimatorKind,
}

/// A trained grammar: base structure priors plus per-tag word counts.
#[derive(Debug, Clone, Default)]
pub struct Grammar {
    config: GrammarConfig,
    base_structures: HashMap<BaseStructure, f64>,
    tag_tables: HashMap<Tag, HashMap<String, u64>>,
}

impl Grammar {
    pub fn new(config: GrammarConfig) -> Self {
        Self { config, ..Self::default() }
    }

    pub fn config(&self) -> GrammarConfig {
        self.config
    }

    pub fn insert_structure(&mut self, structure: BaseStructure, prior: f64) {
        self.base_structures.insert(structure, prior);
    }

    pub fn insert_word(&mut self, tag: Tag, word: &str, count: u64) {
        *self
            .tag_tables
            .entry(tag)
            .or_default()
            .entry(word.to_lowercase())
            .or_insert(0) += count;
    }

    pub fn base_structures(&self) -> &HashMap<BaseStructure, f64> {
        &self.base_structures
    }

    pub fn prior(&self, structure: &BaseStructure) -> Option<f64> {
        self.base_structures.get(structure).copied()
    }

    pub fn has_tag(&self, tag: &Tag) -> bool {
        self.tag_tables.contains_key(tag)
    }

    pub fn tag_table(&self, tag: &Tag) -> Option<&HashMap<String, u64>> {
        self.tag_tables.get(tag)
    }

    pub fn tag_count(&self) -> usize {
        self.tag_tables.len()
    }

    /// Every terminal under any tag.
    pub fn vocabulary(&self) -> HashSet<String> {
        self.tag_tables
            .values()
            .flat_map(|table| table.keys().cloned())
            .collect()
    }

    /// The grammar's tagging rule for a word read with a given part-of-speech and sense.
    pub fn tag_for(&self, word: &str, pos: Option<&str>, sense: Option<&str>) -> Tag {
        let len = word.chars().count();
        if word.chars().all(|c| c.is_ascii_digit()) && len > 0 {
            return Tag::number(len);
        }
        if !word.chars().any(char::is_alphanumeric) {
            return Tag::new(format!("special{}", len));
        }
        if !word.chars().all(char::is_alphabetic) {
            return Tag::new(format!("char{}", len));
        }
        match (pos, sense) {
            (None, _) => Tag::new(format!("char{}", len)),
            (Some(pos), Some(sense)) if self.config.tagtype == TagGranularity::Semantic => {
                Tag::new(format!("{}_{}", pos, sense))
            }
            (Some(pos), _) => Tag::new(pos),
        }
    }
}

/// A grammar directory loaded in full: the grammar and the models its tagger needs.
pub struct GrammarBundle {
    pub grammar: Grammar,
    pub noun_model: TreeCutModel,
    pub verb_model: TreeCutModel,
    pub pos_tagger: LexiconPosTagger,
    pub senses: LexiconSenses,
}

impl GrammarBundle {
    pub fn load(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            return Err(GuesserError::invalid_grammar(format!(
                "{} is not a directory",
                dir.display()
            )));
        }

        let config = load_config(&dir.join(CONFIG_FILE))?;
        let mut grammar = Grammar::new(config);
        load_rules(&mut grammar, &dir.join(RULES_FILE))?;
        load_nonterminals(&mut grammar, &dir.join(NONTERMINALS_DIR))?;

        let noun_model = TreeCutModel::from_file(&dir.join(NOUN_TREECUT_FILE))?;
        let verb_model = TreeCutModel::from_file(&dir.join(VERB_TREECUT_FILE))?;

        let pos_path = dir.join(POS_LEXICON_FILE);
        let pos_tagger = if pos_path.exists() {
            LexiconPosTagger::from_file(&pos_path)?
        } else {
            warn!("No {} in grammar directory; words will only carry lexical-class tags", POS_LEXICON_FILE);
            LexiconPosTagger::new()
        };
        let senses_path = dir.join(SENSES_FILE);
        let senses = if senses_path.exists() {
            LexiconSenses::from_file(&senses_path)?
        } else {
            warn!("No {} in grammar directory; sense abstraction disabled", SENSES_FILE);
            LexiconSenses::new()
        };

        info!(
            "Loaded grammar from {}: {} base structures, {} tags, {:?} tags, {:?} estimator",
            dir.display(),
            grammar.base_structures().len(),
            grammar.tag_count(),
            config.tagtype,
            config.estimator
        );

        Ok(Self { grammar, noun_model, verb_model, pos_tagger, senses })
    }
}

fn load_config(path: &Path) -> Result<GrammarConfig> {
    let file = File::open(path)
        .map_err(|e| GuesserError::io(format!("opening {}", path.display()), e))?;
    serde_json::from_reader(BufReader::new(file))
        .map_err(|e| GuesserError::json(format!("reading {}", path.display()), e))
}

/// `rules.tsv`: base structure and its training count; priors are normalized counts.
fn load_rules(grammar: &mut Grammar, path: &Path) -> Result<()> {
    let mut counts: Vec<(BaseStructure, f64)> = Vec::new();
    for (line_no, fields) in read_tsv(path)? {
        let parsed = match fields.as_slice() {
            [structure, count] => BaseStructure::parse(structure)
                .zip(count.trim().parse::<f64>().ok().filter(|c| c.is_finite() && *c >= 0.0)),
            _ => None,
        };
        let (structure, count) = parsed.ok_or_else(|| malformed(path, line_no))?;
        counts.push((structure, count));
    }

    let total: f64 = counts.iter().map(|(_, c)| c).sum();
    if counts.is_empty() || total <= 0.0 {
        return Err(GuesserError::invalid_grammar(format!(
            "{} holds no base structures",
            path.display()
        )));
    }
    for (structure, count) in counts {
        grammar.insert_structure(structure, count / total);
    }
    Ok(())
}

/// `nonterminals/<tag>.tsv`: `word<TAB>count` per line.
fn load_nonterminals(grammar: &mut Grammar, dir: &Path) -> Result<()> {
    let entries = fs::read_dir(dir)
        .map_err(|e| GuesserError::io(format!("listing {}", dir.display()), e))?;
    for entry in entries {
        let path = entry
            .map_err(|e| GuesserError::io(format!("listing {}", dir.display()), e))?
            .path();
        if path.extension().and_then(|e| e.to_str()) != Some("tsv") {
            continue;
        }
        let tag = match path.file_stem().and_then(|s| s.to_str()) {
            Some(stem) if !stem.is_empty() => Tag::new(stem),
            _ => continue,
        };
        for (line_no, fields) in read_tsv(&path)? {
            let count = match fields.as_slice() {
                [_, count] => count.trim().parse::<u64>().ok(),
                _ => None,
            };
            let count = count.ok_or_else(|| malformed(&path, line_no))?;
            grammar.insert_word(tag.clone(), &fields[0], count);
        }
    }
    if grammar.tag_count() == 0 {
        return Err(GuesserError::invalid_grammar(format!(
            "{} holds no tag tables",
            dir.display()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn semantic() -> Grammar {
        Grammar::new(GrammarConfig { tagtype: TagGranularity::Semantic, estimator: EstimatorKind::Laplace })
    }

    #[test]
    fn lexical_class_tags() {
        let g = semantic();
        assert_eq!(g.tag_for("1999", Some("nn1"), None).as_str(), "number4");
        assert_eq!(g.tag_for("!!", None, None).as_str(), "special2");
        assert_eq!(g.tag_for("a1b", Some("nn1"), None).as_str(), "char3");
        assert_eq!(g.tag_for("xyz", None, None).as_str(), "char3");
    }

    #[test]
    fn sense_suffix_depends_on_granularity() {
        let g = semantic();
        assert_eq!(g.tag_for("dog", Some("nn1"), Some("animal.n.01")).as_str(), "nn1_animal.n.01");
        assert_eq!(g.tag_for("dog", Some("nn1"), None).as_str(), "nn1");

        let pos_only = Grammar::new(GrammarConfig { tagtype: TagGranularity::Pos, estimator: EstimatorKind::Mle });
        assert_eq!(pos_only.tag_for("dog", Some("nn1"), Some("animal.n.01")).as_str(), "nn1");
    }

    #[test]
    fn vocabulary_is_lowercased_union() {
        let mut g = semantic();
        g.insert_word(Tag::new("nn1"), "Dog", 2);
        g.insert_word(Tag::new("vv0"), "love", 1);
        g.insert_word(Tag::new("nn1"), "love", 1);
        let vocab = g.vocabulary();
        assert_eq!(vocab.len(), 2);
        assert!(vocab.contains("dog"));
        assert_eq!(g.tag_table(&Tag::new("nn1")).unwrap()["dog"], 2);
    }

    #[test]
    fn config_accepts_backoff_alias() {
        let config: GrammarConfig = serde_json::from_str(r#"{"tagtype": "backoff", "estimator": "mle"}"#).unwrap();
        assert_eq!(config.tagtype, TagGranularity::Semantic);
        assert_eq!(config.estimator, EstimatorKind::Mle);
    }
}
