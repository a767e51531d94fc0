use anyhow::{Context, Result};
use clap::Parser;
use crossterm::style::Stylize;
use guesser_core::core::converter::CaseOptions;
use guesser_core::core::tagger::DEFAULT_CACHE_SIZE;
use guesser_core::guess_number::{
    crack_curve, read_scored, write_curve, write_estimates, GuessNumberEstimator, ReferenceSample,
    TestSet,
};
use guesser_core::persistence::{load_sample, save_sample};
use guesser_core::session::{score_test_set, RunOptions};
use guesser_core::{GrammarBundle, ScoringEngine};
use log::info;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Estimates guess numbers of test passwords from a scored sample of the
/// grammar's own guesses. Test passwords come pre-scored (--test) or raw
/// (--test-file), in which case they are scored against --grammar-dir first.
#[derive(Debug, Parser)]
#[command(name = "semantic_montecarlo")]
struct Config {
    /// Scored sample drawn from the grammar (password ... probability per line)
    #[arg(long, required_unless_present = "sample_cache", conflicts_with = "sample_cache")]
    sample: Option<PathBuf>,

    /// Reference sample previously saved with --save-sample
    #[arg(long)]
    sample_cache: Option<PathBuf>,

    /// Save the reference sample built from --sample for later runs
    #[arg(long)]
    save_sample: Option<PathBuf>,

    /// Scored test passwords (output of semantic_score)
    #[arg(short, long, required_unless_present = "test_file", conflicts_with = "test_file")]
    test: Option<PathBuf>,

    /// Raw test passwords, one per line, scored here against --grammar-dir
    #[arg(long, requires = "grammar_dir")]
    test_file: Option<PathBuf>,

    /// Grammar directory used to score --test-file
    #[arg(long)]
    grammar_dir: Option<PathBuf>,

    /// Keep the scored --test-file lines in this file
    #[arg(long, requires = "test_file")]
    scored: Option<PathBuf>,

    /// Include segmentations in the --scored file
    #[arg(long, requires = "scored")]
    print_split: bool,

    /// Entries kept in each word-tagging cache
    #[arg(long, default_value_t = DEFAULT_CACHE_SIZE)]
    cache_size: usize,

    /// Per-password guess numbers
    #[arg(long)]
    result: PathBuf,

    /// Guess-crack curve (`guesses: cracked` per line)
    #[arg(long)]
    curve: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn open(path: &Path) -> Result<BufReader<File>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    Ok(BufReader::new(file))
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    Ok(BufWriter::new(file))
}

/// Test passwords either read pre-scored or scored here with every case
/// transform accepted.
fn load_test_set(config: &Config) -> Result<TestSet> {
    match (&config.test, &config.test_file, &config.grammar_dir) {
        (Some(path), _, _) => Ok(read_scored(open(path)?)?.into_iter().collect()),
        (None, Some(path), Some(grammar_dir)) => {
            let bundle = GrammarBundle::load(grammar_dir)
                .with_context(|| format!("loading grammar from {}", grammar_dir.display()))?;
            let mut engine = ScoringEngine::from_bundle(bundle, config.cache_size);
            let options = RunOptions {
                case: CaseOptions { uppercase: true, camelcase: true, capitalized: true },
                print_split: config.print_split,
            };
            let scored: Box<dyn Write> = match &config.scored {
                Some(scored_path) => Box::new(create(scored_path)?),
                None => Box::new(io::sink()),
            };
            Ok(score_test_set(&mut engine, open(path)?, scored, options)?)
        }
        _ => anyhow::bail!("either --test or --test-file with --grammar-dir is required"),
    }
}

fn main() -> Result<()> {
    let config = Config::parse();

    let mut logger_builder = env_logger::Builder::from_default_env();
    logger_builder.filter_level(config.log_level.parse().unwrap_or(log::LevelFilter::Info));
    logger_builder.init();

    let sample = match (&config.sample_cache, &config.sample) {
        (Some(cache), _) => load_sample(cache)?,
        (None, Some(path)) => {
            let records = read_scored(open(path)?)?;
            ReferenceSample::from_probabilities(records.into_iter().map(|(_, p)| p))
                .with_context(|| format!("building reference sample from {}", path.display()))?
        }
        (None, None) => anyhow::bail!("either --sample or --sample-cache is required"),
    };
    info!("Reference sample of {} guesses", sample.len());
    if let Some(path) = &config.save_sample {
        save_sample(&sample, path)?;
        info!("Saved reference sample to {}", path.display());
    }

    let test = load_test_set(&config)?;
    info!("{} test passwords, {} distinct", test.total(), test.distinct());

    let estimates = GuessNumberEstimator::new(&sample).estimate(&test);
    write_estimates(create(&config.result)?, &estimates)?;
    if let Some(path) = &config.curve {
        write_curve(create(path)?, &crack_curve(&estimates))?;
    }

    let cracked = estimates.last().map_or(0.0, |e| e.cracked_percent);
    eprintln!(
        "{} {} distinct passwords against a sample of {}; {} cracked at {} guesses",
        "Estimated".green().bold(),
        estimates.len(),
        sample.len(),
        format!("{:.2}%", cracked).green(),
        estimates.last().map_or(0.0, |e| e.rank.ceil())
    );
    Ok(())
}
