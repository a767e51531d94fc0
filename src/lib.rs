// src/lib.rs

pub mod core;
pub mod error;
pub mod grammar;
pub mod guess_number;
pub mod input;
pub mod lexicon;
pub mod persistence;
pub mod session;

pub use crate::core::engine::{ScoringEngine, SearchOptions};
pub use crate::core::types::{BaseStructure, ScoredPassword, Tag};
pub use crate::error::{GuesserError, Result};
pub use crate::grammar::{Grammar, GrammarBundle};
pub use crate::guess_number::{GuessNumberEstimator, ReferenceSample, TestSet};
