// src/core/mod.rs

pub mod converter;
pub mod engine;
pub mod estimator;
pub mod splitter;
pub mod tagger;
pub mod trie;
pub mod types;
