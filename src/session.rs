// File: src/session.rs
use crate::core::converter::CaseOptions;
use crate::core::engine::ScoringEngine;
use crate::core::types::ScoredPassword;
use crate::error::{GuesserError, Result};
use crate::guess_number::TestSet;
use crate::input::{read_raw_line, RawLine};
use crate::persistence::{save_checkpoint, Checkpoint};
use log::{debug, error, info, warn};
use std::io::{BufRead, Write};
use std::path::PathBuf;

pub const DEFAULT_CHECKPOINT_EVERY: u64 = 10_000;

/// Where checkpoint states go.
pub trait CheckpointStore {
    fn save(&mut self, checkpoint: &Checkpoint) -> Result<()>;
}

impl<S: CheckpointStore + ?Sized> CheckpointStore for &mut S {
    fn save(&mut self, checkpoint: &Checkpoint) -> Result<()> {
        (**self).save(checkpoint)
    }
}

/// Session-less runs keep no progress.
pub struct NoCheckpoint;

impl CheckpointStore for NoCheckpoint {
    fn save(&mut self, _checkpoint: &Checkpoint) -> Result<()> {
        Ok(())
    }
}

pub struct FileCheckpointStore {
    path: PathBuf,
}

impl FileCheckpointStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl CheckpointStore for FileCheckpointStore {
    fn save(&mut self, checkpoint: &Checkpoint) -> Result<()> {
        save_checkpoint(checkpoint, &self.path)
    }
}

/// Counts processed records and persists progress every `every` records.
/// Dropping the guard before `finish` flushes the last unfinished state. Callers
/// flush their output before `save`, so a resumed run never skips a record
/// whose result was not emitted.
pub struct CheckpointGuard<S: CheckpointStore> {
    store: S,
    state: Checkpoint,
    every: u64,
    flushed: bool,
}

impl<S: CheckpointStore> CheckpointGuard<S> {
    pub fn new(store: S, already_processed: u64, every: u64) -> Self {
        Self {
            store,
            state: Checkpoint { n_processed: already_processed, completed: false },
            every,
            flushed: false,
        }
    }

    pub fn processed(&self) -> u64 {
        self.state.n_processed
    }

    /// Counts one record; true when a checkpoint is due.
    pub fn record(&mut self) -> bool {
        self.state.n_processed += 1;
        self.every > 0 && self.state.n_processed % self.every == 0
    }

    pub fn save(&mut self) -> Result<()> {
        debug!("Checkpoint at {} records", self.state.n_processed);
        self.store.save(&self.state)
    }

    pub fn finish(mut self) -> Result<Checkpoint> {
        self.state.completed = true;
        self.flushed = true;
        self.store.save(&self.state)?;
        Ok(self.state)
    }
}

impl<S: CheckpointStore> Drop for CheckpointGuard<S> {
    fn drop(&mut self) {
        if self.flushed {
            return;
        }
        if let Err(e) = self.store.save(&self.state) {
            error!("Could not save checkpoint at {} records: {}", self.state.n_processed, e);
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    pub case: CaseOptions,
    pub print_split: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub processed: u64,
    pub guessable: u64,
    pub unguessable: u64,
}

/// Scores every password line of `input` after the first `skip`, writing one
/// result line each to `output`. Output is flushed before every checkpoint.
pub fn run_scoring<R, W, S>(
    engine: &mut ScoringEngine,
    input: R,
    output: W,
    options: RunOptions,
    guard: &mut CheckpointGuard<S>,
    skip: u64,
) -> Result<RunSummary>
where
    R: BufRead,
    W: Write,
    S: CheckpointStore,
{
    if skip > 0 {
        info!("Resuming after {} already processed passwords", skip);
    }
    let summary = score_lines(engine, input, output, options, skip, |_, output| {
        if guard.record() {
            output.flush().map_err(|e| GuesserError::io("writing scores", e))?;
            guard.save()?;
        }
        Ok(())
    })?;
    info!("Scored {} passwords ({} total processed)", summary.processed, guard.processed());
    Ok(summary)
}

/// Scores raw test passwords straight into a `TestSet`, also writing the scored
/// lines to `output`.
pub fn score_test_set<R, W>(
    engine: &mut ScoringEngine,
    input: R,
    output: W,
    options: RunOptions,
) -> Result<TestSet>
where
    R: BufRead,
    W: Write,
{
    let mut test = TestSet::new();
    let summary = score_lines(engine, input, output, options, 0, |scored, _| {
        test.add(&scored.password, scored.probability);
        Ok(())
    })?;
    info!("Scored {} test passwords, {} guessable", summary.processed, summary.guessable);
    Ok(test)
}

fn score_lines<R, W, F>(
    engine: &mut ScoringEngine,
    mut input: R,
    mut output: W,
    options: RunOptions,
    skip: u64,
    mut after_write: F,
) -> Result<RunSummary>
where
    R: BufRead,
    W: Write,
    F: FnMut(&ScoredPassword, &mut W) -> Result<()>,
{
    let mut summary = RunSummary::default();
    let mut buf = Vec::new();
    let mut line_no = 0u64;
    while let Some(line) =
        read_raw_line(&mut input, &mut buf).map_err(|e| GuesserError::io("reading passwords", e))?
    {
        line_no += 1;
        if line_no <= skip {
            continue;
        }

        let scored = match &line {
            RawLine::Text(password) => engine.evaluate(password, options.case),
            RawLine::Undecodable(lossy) => {
                warn!("Password on line {} is not valid UTF-8; reported as unguessable", line_no);
                ScoredPassword::unguessable(lossy)
            }
        };
        writeln!(output, "{}", scored.to_line(options.print_split))
            .map_err(|e| GuesserError::io("writing scores", e))?;

        if scored.probability > 0.0 {
            summary.guessable += 1;
        } else {
            summary.unguessable += 1;
        }
        summary.processed += 1;
        after_write(&scored, &mut output)?;
    }
    output.flush().map_err(|e| GuesserError::io("writing scores", e))?;
    Ok(summary)
}
