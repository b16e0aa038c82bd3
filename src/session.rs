//! One typing session: target text, viewport, edit trace, and metrics,
//! mutated strictly in input-event order by the event loop.

use crate::alignment::{AlignmentRecorder, EditOp};
use crate::config::{Config, Mode};
use crate::generator::{generate_test, GenerateError};
use crate::metrics::{FinalMetrics, MetricsSampler};
use crate::viewport::{RenderSpan, ViewportTracker};
use crate::TICK_RATE_MS;
use chrono::{DateTime, Local};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Metric samples are taken once per second; UI ticks run faster.
pub const TICKS_PER_SAMPLE: u64 = 1000 / TICK_RATE_MS;

/// A keystroke as the engine sees it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Keystroke {
    Byte(u8),
    Backspace,
}

/// Outcome of feeding one keystroke to the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Progress {
    Progressed,
    Completed,
}

/// Bytes in the accepted input alphabet. Anything else is dropped at the
/// key-event boundary; the classifier itself scores any byte it is given.
pub fn is_valid_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b' '
}

/// Persisted summary of a completed session. Created once at completion;
/// the durable copy is owned by storage from then on.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub word_list: String,
    pub mode: Mode,
    pub duration_secs: u64,
    pub test_size: usize,
    pub allow_backspace: bool,
    pub target: String,
    pub input: String,
    pub accuracy: f64,
    pub cps: f64,
    pub wpm: f64,
    pub rle: String,
    pub cps_samples: Vec<f64>,
    pub accuracy_samples: Vec<f64>,
    /// samples per second
    pub sample_rate: u32,
    pub created_at: DateTime<Local>,
}

#[derive(Debug)]
pub struct Session {
    target: String,
    viewport: ViewportTracker,
    recorder: AlignmentRecorder,
    sampler: MetricsSampler,
    input: Vec<u8>,

    word_list: String,
    mode: Mode,
    duration_secs: u64,
    test_size: usize,
    pub allow_backspace: bool,

    started: bool,
    finished: bool,
    ticks: u64,
    seconds_remaining: f64,
}

impl Session {
    /// Builds a fresh session from a config snapshot and the selected
    /// list's words. Fails fast on an empty bank or a zero test size.
    pub fn new<R: Rng>(config: &Config, words: &[String], rng: &mut R) -> Result<Self, GenerateError> {
        let size = config.effective_test_size();
        let test = generate_test(words, size, config.words_per_line, rng)?;
        let target_len = test.target.len();

        Ok(Self {
            target: test.target,
            viewport: ViewportTracker::new(target_len, test.line_offsets, config.window_size),
            recorder: AlignmentRecorder::new(),
            sampler: MetricsSampler::new(),
            input: Vec::new(),
            word_list: config.word_list.clone(),
            mode: config.mode,
            duration_secs: config.duration_secs,
            test_size: size,
            allow_backspace: config.allow_backspace,
            started: false,
            finished: false,
            ticks: 0,
            seconds_remaining: config.duration_secs as f64,
        })
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn input(&self) -> &[u8] {
        &self.input
    }

    pub fn ops(&self) -> &[EditOp] {
        self.recorder.ops()
    }

    pub fn has_started(&self) -> bool {
        self.started
    }

    pub fn has_finished(&self) -> bool {
        self.finished
    }

    pub fn seconds_remaining(&self) -> f64 {
        self.seconds_remaining
    }

    pub fn start(&mut self) {
        self.started = true;
    }

    /// Feeds one keystroke. Appending the classified op, growing the input
    /// buffer, and moving the viewport happen together so the trace length
    /// always equals the input length.
    pub fn handle_keystroke(&mut self, key: Keystroke) -> Progress {
        if self.finished {
            return Progress::Completed;
        }

        match key {
            Keystroke::Byte(b) => {
                if self.input.len() >= self.target.len() {
                    return Progress::Progressed;
                }
                let expected = self.target.as_bytes()[self.input.len()];
                self.recorder.push(AlignmentRecorder::classify(expected, b));
                self.input.push(b);
                self.viewport.advance();

                if self.input.len() == self.target.len() {
                    self.finished = true;
                }
            }
            Keystroke::Backspace => {
                if !self.allow_backspace || self.input.is_empty() {
                    return Progress::Progressed;
                }
                self.recorder.trim();
                self.input.pop();
                self.viewport.retreat();
            }
        }

        debug_assert_eq!(self.recorder.len(), self.input.len());

        if self.finished {
            Progress::Completed
        } else {
            Progress::Progressed
        }
    }

    /// Advances the session clock by one UI tick. Samples metrics once per
    /// second; in timed mode also counts the session down and flags
    /// completion when the clock runs out.
    pub fn on_tick(&mut self) -> Progress {
        if !self.started || self.finished {
            return if self.finished {
                Progress::Completed
            } else {
                Progress::Progressed
            };
        }

        self.ticks += 1;

        if self.ticks % TICKS_PER_SAMPLE == 0 {
            self.sampler.sample(
                self.input.len(),
                self.recorder.matches(),
                self.recorder.mismatches(),
            );
        }

        if self.mode == Mode::Time {
            self.seconds_remaining -= TICK_RATE_MS as f64 / 1000.0;
            if self.seconds_remaining <= 0.0 {
                self.finished = true;
                return Progress::Completed;
            }
        }

        Progress::Progressed
    }

    /// The bounded span the presentation layer should paint, together with
    /// the alignment slice covering the typed part of that span.
    pub fn render_span(&self) -> (RenderSpan, &[EditOp]) {
        let span = self.viewport.span();
        let typed_end = self.input.len().min(span.right_idx).max(span.left_idx);
        (span, &self.recorder.ops()[span.left_idx..typed_end])
    }

    pub fn line_offsets(&self) -> &[usize] {
        self.viewport.line_offsets()
    }

    pub fn final_metrics(&self) -> FinalMetrics {
        self.sampler.finalize(self.recorder.accuracy())
    }

    /// Pure summary of the final state; performs no I/O. The caller hands
    /// the record to the persistence worker and to the miner.
    pub fn finalize(&self) -> SessionRecord {
        let metrics = self.final_metrics();

        SessionRecord {
            word_list: self.word_list.clone(),
            mode: self.mode,
            duration_secs: self.duration_secs,
            test_size: self.test_size,
            allow_backspace: self.allow_backspace,
            target: self.target.clone(),
            input: self.recorder.raw_string(),
            accuracy: metrics.accuracy,
            cps: metrics.cps,
            wpm: metrics.wpm,
            rle: self.recorder.rle(),
            cps_samples: self.sampler.cps_series().to_vec(),
            accuracy_samples: self.sampler.accuracy_series().to_vec(),
            sample_rate: 1,
            created_at: Local::now(),
        }
    }
}
