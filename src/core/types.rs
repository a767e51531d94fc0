// src/core/types.rs
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Separator used between segments when a segmentation is printed.
pub const SEGMENT_SEPARATOR: char = '\u{3}';

/// A grammar symbol: part-of-speech, optionally suffixed with a sense cluster
/// (`nn1_dog.n.01`), or one of the lexical classes (`number4`, `special1`, `char3`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Tag(String);

impl Tag {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn number(len: usize) -> Self {
        Self(format!("number{}", len))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn tag_token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[\w\-'.]+").expect("static pattern compiles"))
}

/// An ordered tag sequence forming a password template, e.g. `(nn1)(number4)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BaseStructure {
    tags: Vec<Tag>,
}

impl BaseStructure {
    pub fn new(tags: Vec<Tag>) -> Self {
        Self { tags }
    }

    /// Parses the `(tag1)(tag2)` notation. Returns `None` when no tag token is found.
    pub fn parse(text: &str) -> Option<Self> {
        let tags: Vec<Tag> = tag_token_pattern()
            .find_iter(text)
            .map(|m| Tag::new(m.as_str()))
            .collect();
        if tags.is_empty() {
            None
        } else {
            Some(Self { tags })
        }
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

impl fmt::Display for BaseStructure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for tag in &self.tags {
            write!(f, "({})", tag)?;
        }
        Ok(())
    }
}

/// One `(tag, emission probability)` reading of a word fragment.
#[derive(Debug, Clone, PartialEq)]
pub struct TagCandidate {
    pub tag: Tag,
    pub probability: f64,
}

/// The result of scoring one password.
///
/// `probability` is `prior(base_structure) × Π emissions`, or `0` with no base
/// structure when the grammar cannot produce the password. A rejected case
/// variant keeps its segmentation for reporting.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredPassword {
    pub password: String,
    pub base_structure: Option<BaseStructure>,
    pub segmentation: Option<Vec<String>>,
    pub probability: f64,
}

impl ScoredPassword {
    pub fn unguessable(password: &str) -> Self {
        Self {
            password: password.to_string(),
            base_structure: None,
            segmentation: None,
            probability: 0.0,
        }
    }

    /// Renders the output line: `password base_structure [segments] probability`.
    pub fn to_line(&self, print_split: bool) -> String {
        let structure = self
            .base_structure
            .as_ref()
            .map(|b| b.to_string())
            .unwrap_or_else(|| "None".to_string());
        let probability = format_probability(self.probability);
        match (&self.segmentation, print_split) {
            (Some(segments), true) => {
                let joined = segments.join(&SEGMENT_SEPARATOR.to_string());
                format!("{} {} {} {}", self.password, structure, joined, probability)
            }
            _ => format!("{} {} {}", self.password, structure, probability),
        }
    }
}

/// Shortest round-tripping text; exponent notation below `1e-4`.
pub fn format_probability(p: f64) -> String {
    if p != 0.0 && p.abs() < 1e-4 {
        format!("{:e}", p)
    } else {
        format!("{}", p)
    }
}
