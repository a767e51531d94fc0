// File: src/guess_number.rs
//
// Monte Carlo guess-number estimation: a sample drawn from the grammar's own
// distribution gives, by importance sampling, the number of guesses an attacker
// emitting passwords in probability order needs to reach any given surprisal.

use crate::core::types::{BaseStructure, SEGMENT_SEPARATOR};
use crate::error::{GuesserError, Result};
use crate::input::{read_raw_line, RawLine};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::{BufRead, Write};

/// `-log2(p)`, with `p = 0` mapped to the largest finite surprisal.
pub fn surprisal(probability: f64) -> f64 {
    -probability.max(f64::MIN_POSITIVE).log2()
}

/// Parses a scored line `password structure [segments] probability`.
///
/// Passwords may hold spaces: the password is everything before the first
/// structure field (`None` or `(tag)...`) that the rest of the line agrees with,
/// i.e. nothing follows it or the segments that follow concatenate to the password.
pub fn parse_scored_line(line: &str) -> Option<(String, f64)> {
    let line = line.trim_end_matches(['\r', '\n']);
    let (rest, probability) = line.rsplit_once(' ')?;
    let probability = probability.trim().parse::<f64>().ok()?;
    if !(0.0..=1.0).contains(&probability) {
        return None;
    }

    let fields: Vec<&str> = rest.split(' ').collect();
    (1..fields.len()).find_map(|i| {
        if !is_structure_field(fields[i]) {
            return None;
        }
        let password = fields[..i].join(" ");
        let segments = fields[i + 1..].join(" ");
        let agrees = i + 1 == fields.len() || segments.replace(SEGMENT_SEPARATOR, "") == password;
        agrees.then(|| (password, probability))
    })
}

fn is_structure_field(field: &str) -> bool {
    field == "None"
        || (field.starts_with('(')
            && BaseStructure::parse(field).is_some_and(|bs| bs.to_string() == field))
}

/// Reads scored lines, skipping (and logging) malformed or undecodable ones.
pub fn read_scored<R: BufRead>(mut reader: R) -> Result<Vec<(String, f64)>> {
    let mut records = Vec::new();
    let mut skipped = 0usize;
    let mut buf = Vec::new();
    let mut line_no = 0usize;
    while let Some(line) = read_raw_line(&mut reader, &mut buf)
        .map_err(|e| GuesserError::io("reading scored passwords", e))?
    {
        line_no += 1;
        let parsed = match &line {
            RawLine::Text(text) if text.trim().is_empty() => continue,
            RawLine::Text(text) => parse_scored_line(text),
            RawLine::Undecodable(_) => None,
        };
        match parsed {
            Some(record) => records.push(record),
            None => {
                skipped += 1;
                warn!("Skipping malformed scored line {}: {:?}", line_no, line.text());
            }
        }
    }
    if skipped > 0 {
        warn!("Skipped {} malformed lines", skipped);
    }
    Ok(records)
}

/// Sorted sample surprisals and their cumulative guess positions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceSample {
    surprisals: Vec<f64>,
    positions: Vec<f64>,
}

impl ReferenceSample {
    /// `position[i] = Σ_{j≤i} 2^(s_j − log2 N)`.
    pub fn from_probabilities<I>(probabilities: I) -> Result<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        Self::from_surprisals(probabilities.into_iter().map(surprisal).collect())
    }

    pub fn from_surprisals(mut surprisals: Vec<f64>) -> Result<Self> {
        if surprisals.is_empty() {
            return Err(GuesserError::invalid_input("reference sample is empty"));
        }
        if surprisals.iter().any(|s| s.is_nan()) {
            return Err(GuesserError::invalid_input("reference sample holds NaN surprisal"));
        }
        surprisals.sort_by(f64::total_cmp);

        let log_n = (surprisals.len() as f64).log2();
        let mut total = 0.0;
        let positions: Vec<f64> = surprisals
            .iter()
            .map(|s| {
                total += (s - log_n).exp2();
                total
            })
            .collect();
        info!("Reference sample of {} passwords", surprisals.len());
        Ok(Self { surprisals, positions })
    }

    pub fn len(&self) -> usize {
        self.surprisals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.surprisals.is_empty()
    }

    pub fn positions(&self) -> &[f64] {
        &self.positions
    }

    /// Estimated guesses to reach `surprisal`: the position of the last sample
    /// entry not less likely than it, or 1 when none is.
    pub fn position_of(&self, surprisal: f64) -> f64 {
        let idx = self.surprisals.partition_point(|&s| s <= surprisal);
        if idx > 0 {
            self.positions[idx - 1]
        } else {
            1.0
        }
    }
}

/// Distinct test passwords with occurrence counts, in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct TestSet {
    entries: Vec<TestEntry>,
    index: HashMap<String, usize>,
    total: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TestEntry {
    pub password: String,
    pub surprisal: f64,
    pub count: u64,
}

impl TestSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one occurrence; a repeated password keeps its latest probability.
    pub fn add(&mut self, password: &str, probability: f64) {
        let s = surprisal(probability);
        self.total += 1;
        match self.index.get(password) {
            Some(&idx) => {
                let entry = &mut self.entries[idx];
                entry.count += 1;
                entry.surprisal = s;
            }
            None => {
                self.index.insert(password.to_string(), self.entries.len());
                self.entries.push(TestEntry { password: password.to_string(), surprisal: s, count: 1 });
            }
        }
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn distinct(&self) -> usize {
        self.entries.len()
    }
}

impl FromIterator<(String, f64)> for TestSet {
    fn from_iter<T: IntoIterator<Item = (String, f64)>>(iter: T) -> Self {
        let mut set = Self::new();
        for (password, probability) in iter {
            set.add(&password, probability);
        }
        set
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GuessEstimate {
    pub password: String,
    pub surprisal: f64,
    pub count: u64,
    pub rank: f64,
    pub cracked: u64,
    pub cracked_percent: f64,
}

impl GuessEstimate {
    pub fn to_line(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}\t{}\t{:5.2}",
            self.password, self.surprisal, self.count, self.rank, self.cracked, self.cracked_percent
        )
    }
}

/// Assigns guess numbers to a test set against a shared reference sample.
pub struct GuessNumberEstimator<'a> {
    sample: &'a ReferenceSample,
}

impl<'a> GuessNumberEstimator<'a> {
    pub fn new(sample: &'a ReferenceSample) -> Self {
        Self { sample }
    }

    /// One estimate per distinct password, in ascending surprisal. Ranks are the
    /// sample positions, pushed up where needed so they strictly increase.
    pub fn estimate(&self, test: &TestSet) -> Vec<GuessEstimate> {
        let mut order: Vec<&TestEntry> = test.entries.iter().collect();
        order.sort_by(|a, b| a.surprisal.total_cmp(&b.surprisal));

        let total = test.total.max(1) as f64;
        let mut previous_rank = 0.0_f64;
        let mut cracked = 0u64;
        order
            .into_iter()
            .map(|entry| {
                let candidate = self.sample.position_of(entry.surprisal);
                let rank = candidate.max(previous_rank + 1.0);
                previous_rank = rank;
                cracked += entry.count;
                GuessEstimate {
                    password: entry.password.clone(),
                    surprisal: entry.surprisal,
                    count: entry.count,
                    rank,
                    cracked,
                    cracked_percent: cracked as f64 / total * 100.0,
                }
            })
            .collect()
    }
}

/// Guess-crack curve points `(guesses, cracked)`, one per estimate, with ranks
/// rounded up to whole guesses.
pub fn crack_curve(estimates: &[GuessEstimate]) -> Vec<(f64, u64)> {
    estimates.iter().map(|e| (e.rank.ceil(), e.cracked)).collect()
}

pub fn write_estimates<W: Write>(mut writer: W, estimates: &[GuessEstimate]) -> Result<()> {
    for estimate in estimates {
        writeln!(writer, "{}", estimate.to_line())
            .map_err(|e| GuesserError::io("writing guess numbers", e))?;
    }
    writer.flush().map_err(|e| GuesserError::io("writing guess numbers", e))
}

pub fn write_curve<W: Write>(mut writer: W, curve: &[(f64, u64)]) -> Result<()> {
    for (guesses, cracked) in curve {
        writeln!(writer, "{}: {}", guesses, cracked)
            .map_err(|e| GuesserError::io("writing guess-crack curve", e))?;
    }
    writer.flush().map_err(|e| GuesserError::io("writing guess-crack curve", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_1_to_4() -> ReferenceSample {
        ReferenceSample::from_surprisals(vec![3.0, 1.0, 4.0, 2.0]).unwrap()
    }

    #[test]
    fn positions_accumulate_importance_weights() {
        let sample = sample_1_to_4();
        assert_eq!(sample.positions(), &[0.5, 1.5, 3.5, 7.5]);
    }

    #[test]
    fn zero_probability_has_finite_surprisal() {
        let s = surprisal(0.0);
        assert!(s.is_finite());
        assert!((s - 1022.0).abs() < 1e-9);
        assert_eq!(surprisal(0.25), 2.0);
    }

    #[test]
    fn ranks_follow_sample_and_strictly_increase() {
        let sample = sample_1_to_4();
        let test: TestSet = vec![("b".to_string(), 0.2), ("a".to_string(), 0.25)].into_iter().collect();
        let estimates = GuessNumberEstimator::new(&sample).estimate(&test);
        assert_eq!(estimates[0].password, "a");
        assert_eq!(estimates[0].surprisal, 2.0);
        // position[1]
        assert_eq!(estimates[0].rank, 1.5);
        assert_eq!(estimates[1].password, "b");
        assert!(estimates[1].rank > estimates[0].rank);
        assert_eq!(crack_curve(&estimates)[0], (2.0, 1));
    }

    #[test]
    fn more_likely_than_whole_sample_ranks_first() {
        let sample = sample_1_to_4();
        let test: TestSet = vec![("x".to_string(), 1.0)].into_iter().collect();
        let estimates = GuessNumberEstimator::new(&sample).estimate(&test);
        assert_eq!(estimates[0].rank, 1.0);
    }

    #[test]
    fn duplicates_collapse_but_count() {
        let sample = sample_1_to_4();
        let test: TestSet = vec![
            ("a".to_string(), 0.25),
            ("b".to_string(), 0.0),
            ("a".to_string(), 0.25),
            ("c".to_string(), 0.1),
        ]
        .into_iter()
        .collect();
        assert_eq!(test.total(), 4);
        assert_eq!(test.distinct(), 3);

        let estimates = GuessNumberEstimator::new(&sample).estimate(&test);
        assert_eq!(estimates[0].count, 2);
        assert_eq!(estimates.iter().map(|e| e.cracked).collect::<Vec<_>>(), vec![2, 3, 4]);
        assert_eq!(estimates[2].cracked_percent, 100.0);
        assert!(estimates.windows(2).all(|w| w[0].rank < w[1].rank));

        let curve = crack_curve(&estimates);
        assert!(curve.windows(2).all(|w| w[0].0 <= w[1].0 && w[0].1 <= w[1].1));
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let input = "dog1999 (noun)(number4) 0.01\nbroken\nx None notanumber\n\ncat None 0\n";
        let records = read_scored(input.as_bytes()).unwrap();
        assert_eq!(records, vec![("dog1999".to_string(), 0.01), ("cat".to_string(), 0.0)]);
    }

    #[test]
    fn undecodable_lines_are_skipped() {
        let input: &[u8] = b"dog1999 (noun)(number4) 0.01\n\xff\xfe None 0\ncat None 0\n";
        let records = read_scored(input).unwrap();
        assert_eq!(records, vec![("dog1999".to_string(), 0.01), ("cat".to_string(), 0.0)]);
    }

    #[test]
    fn passwords_with_spaces_keep_their_spaces() {
        assert_eq!(parse_scored_line("my dog None 0"), Some(("my dog".to_string(), 0.0)));
        assert_eq!(
            parse_scored_line("my cat (nn1)(special1)(nn1) my\u{3} \u{3}cat 0.5"),
            Some(("my cat".to_string(), 0.5))
        );
        assert_eq!(parse_scored_line("a None None 0"), Some(("a None".to_string(), 0.0)));
        // A lone segment that looks like a structure still belongs after it.
        assert_eq!(parse_scored_line("(x) (special3) (x) 0.1"), Some(("(x)".to_string(), 0.1)));

        let test: TestSet = ["my dog None 0", "my cat None 0"]
            .iter()
            .filter_map(|l| parse_scored_line(l))
            .collect();
        assert_eq!(test.distinct(), 2);
    }

    #[test]
    fn empty_sample_is_rejected() {
        assert!(ReferenceSample::from_probabilities(Vec::new()).is_err());
    }

    #[test]
    fn output_formats() {
        let estimate = GuessEstimate {
            password: "dog".into(),
            surprisal: 2.0,
            count: 1,
            rank: 2.0,
            cracked: 1,
            cracked_percent: 50.0,
        };
        assert_eq!(estimate.to_line(), "dog\t2\t1\t2\t1\t50.00");
        let mut out = Vec::new();
        write_curve(&mut out, &[(2.0, 1), (5.0, 3)]).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "2: 1\n5: 3\n");
    }
}
