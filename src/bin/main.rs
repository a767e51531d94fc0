use anyhow::{Context, Result};
use clap::Parser;
use crossterm::style::Stylize;
use guesser_core::core::converter::CaseOptions;
use guesser_core::core::tagger::DEFAULT_CACHE_SIZE;
use guesser_core::persistence::{checkpoint_path, load_checkpoint};
use guesser_core::session::{
    run_scoring, CheckpointGuard, FileCheckpointStore, NoCheckpoint, RunOptions, RunSummary,
    DEFAULT_CHECKPOINT_EVERY,
};
use guesser_core::{GrammarBundle, ScoringEngine};
use log::info;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter};
use std::path::PathBuf;

/// Finds whether passwords can be produced (guessed) by the grammar, and with
/// what probability. Only lowercase passwords match exactly; uppercase, camel
/// case and capitalized forms match when the corresponding flag is set.
#[derive(Debug, Parser)]
#[command(name = "semantic_score")]
struct Config {
    /// Grammar directory (config.json, rules.tsv, nonterminals/, tree-cut models)
    grammar_dir: PathBuf,

    /// Password list, one per line (default: stdin)
    passwords: Option<PathBuf>,

    /// Accept a password that is the uppercase form of a guess
    #[arg(long)]
    uppercase: bool,

    /// Accept a password obtained by capitalizing every segment of a guess
    #[arg(long)]
    camelcase: bool,

    /// Accept a password obtained by capitalizing the first letter of a guess
    #[arg(long)]
    capitalized: bool,

    /// Include the segmentation in the output
    #[arg(long)]
    print_split: bool,

    /// Session name; progress is kept in <name>.checkpoint.json and resumed
    #[arg(long)]
    session_name: Option<String>,

    /// Records between checkpoint writes
    #[arg(long, default_value_t = DEFAULT_CHECKPOINT_EVERY)]
    checkpoint_every: u64,

    /// Entries kept in each word-tagging cache
    #[arg(long, default_value_t = DEFAULT_CACHE_SIZE)]
    cache_size: usize,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let config = Config::parse();

    let mut logger_builder = env_logger::Builder::from_default_env();
    logger_builder.filter_level(config.log_level.parse().unwrap_or(log::LevelFilter::Info));
    logger_builder.init();

    let bundle = GrammarBundle::load(&config.grammar_dir)
        .with_context(|| format!("loading grammar from {}", config.grammar_dir.display()))?;
    let mut engine = ScoringEngine::from_bundle(bundle, config.cache_size);
    info!("Vocabulary of {} words", engine.vocabulary_size());

    let input: Box<dyn BufRead> = match &config.passwords {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("opening {}", path.display()))?,
        )),
        None => Box::new(io::stdin().lock()),
    };
    let output = BufWriter::new(io::stdout().lock());
    let options = RunOptions {
        case: CaseOptions {
            uppercase: config.uppercase,
            camelcase: config.camelcase,
            capitalized: config.capitalized,
        },
        print_split: config.print_split,
    };

    // An error inside either arm drops the guard, which flushes the unfinished checkpoint.
    let summary = match &config.session_name {
        Some(name) => {
            let path = checkpoint_path(name);
            let skip = load_checkpoint(&path).resume_from();
            let mut guard =
                CheckpointGuard::new(FileCheckpointStore::new(path), skip, config.checkpoint_every);
            let summary = run_scoring(&mut engine, input, output, options, &mut guard, skip)?;
            guard.finish()?;
            summary
        }
        None => {
            let mut guard = CheckpointGuard::new(NoCheckpoint, 0, 0);
            let summary = run_scoring(&mut engine, input, output, options, &mut guard, 0)?;
            guard.finish()?;
            summary
        }
    };

    print_summary(&summary);
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    eprintln!(
        "{} {} passwords: {} guessable, {} unguessable",
        "Scored".green().bold(),
        summary.processed,
        summary.guessable.to_string().green(),
        summary.unguessable.to_string().yellow()
    );
}
