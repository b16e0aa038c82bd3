//! Periodic progress sampling and final score derivation.

use crate::util::mean;

/// Average word length used to turn characters-per-second into a
/// words-per-minute figure: `wpm = cps * 60 / WPM_WORD_LENGTH`.
pub const WPM_WORD_LENGTH: f64 = 5.0;

/// One progress sample taken at a tick boundary.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MetricSample {
    pub tick: usize,
    pub cps: f64,
    pub accuracy: f64,
}

/// Final figures derived from a finished session's samples.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FinalMetrics {
    pub cps: f64,
    pub wpm: f64,
    pub accuracy: f64,
    pub cps_std_dev: f64,
}

/// Samples committed progress on a fixed cadence while a session runs.
/// Both series are append-only for the lifetime of the session.
#[derive(Clone, Debug, Default)]
pub struct MetricsSampler {
    tick: usize,
    prev_committed: usize,
    cps_series: Vec<f64>,
    accuracy_series: Vec<f64>,
}

impl MetricsSampler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one sample: cps is the number of characters committed since
    /// the previous sample, accuracy the running ratio of matches over all
    /// classified keystrokes (1.0 before anything was typed).
    pub fn sample(&mut self, committed: usize, matches: usize, mismatches: usize) -> MetricSample {
        self.tick += 1;

        let cps = committed.saturating_sub(self.prev_committed) as f64;
        self.prev_committed = committed;

        let total = matches + mismatches;
        let accuracy = if total == 0 {
            1.0
        } else {
            matches as f64 / total as f64
        };

        self.cps_series.push(cps);
        self.accuracy_series.push(accuracy);

        MetricSample {
            tick: self.tick,
            cps,
            accuracy,
        }
    }

    pub fn ticks(&self) -> usize {
        self.tick
    }

    pub fn cps_series(&self) -> &[f64] {
        &self.cps_series
    }

    pub fn accuracy_series(&self) -> &[f64] {
        &self.accuracy_series
    }

    /// Final figures: accuracy is the last sample (or `fallback_accuracy`,
    /// the cumulative value, when no tick ever fired), cps the mean of the
    /// series (0 when empty), wpm derived via [`WPM_WORD_LENGTH`].
    pub fn finalize(&self, fallback_accuracy: f64) -> FinalMetrics {
        let accuracy = self
            .accuracy_series
            .last()
            .copied()
            .unwrap_or(fallback_accuracy);
        let cps = mean(&self.cps_series).unwrap_or(0.0);
        let cps_std_dev = crate::util::std_dev(&self.cps_series).unwrap_or(0.0);

        FinalMetrics {
            cps,
            wpm: cps * 60.0 / WPM_WORD_LENGTH,
            accuracy,
            cps_std_dev,
        }
    }
}
