//! Timing series reduction and report rendering

use std::fmt;

/// Ordered per-iteration elapsed times, in milliseconds
#[derive(Clone, Debug, Default)]
pub struct TimingSeries {
    samples: Vec<f64>,
}

impl TimingSeries {
    /// Empty series with room for `capacity` samples
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: Vec::with_capacity(capacity),
        }
    }

    /// Append one iteration's elapsed milliseconds
    pub fn push(&mut self, elapsed_ms: f64) {
        self.samples.push(elapsed_ms);
    }

    /// Number of recorded iterations
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True if no iterations were recorded
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Recorded samples in iteration order
    pub fn as_slice(&self) -> &[f64] {
        &self.samples
    }
}

impl From<Vec<f64>> for TimingSeries {
    fn from(samples: Vec<f64>) -> Self {
        Self { samples }
    }
}

/// Mean and population standard deviation of a timing series
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Summary {
    /// Arithmetic mean, milliseconds
    pub mean_ms: f64,
    /// Population standard deviation (divisor N, not N-1): the timed run is
    /// the whole population of interest, not a sample of one
    pub std_dev_ms: f64,
}

impl Summary {
    /// Reduce a series; `None` for an empty one.
    pub fn of(series: &TimingSeries) -> Option<Self> {
        if series.is_empty() {
            return None;
        }
        let n = series.len() as f64;
        let mean = series.as_slice().iter().sum::<f64>() / n;
        let var = series
            .as_slice()
            .iter()
            .map(|t| (t - mean) * (t - mean))
            .sum::<f64>()
            / n;
        Some(Self {
            mean_ms: mean,
            std_dev_ms: var.sqrt(),
        })
    }
}

/// Fixed-format performance report printed at the end of a run
#[derive(Clone, Debug)]
pub struct Report {
    /// Backend label ("host" or "device")
    pub backend: &'static str,
    /// Rows of each matrix
    pub rows: usize,
    /// Columns of each matrix
    pub cols: usize,
    /// Batch size
    pub batch_count: usize,
    /// Kernel-specific lines (label, value), printed between the batch count
    /// and the warm-up summary
    pub extras: Vec<(&'static str, String)>,
    /// Configured warm-up budget in milliseconds
    pub warmup_budget_ms: u64,
    /// Warm-up iterations actually completed
    pub warmup_iterations: u32,
    /// Configured timed iteration count
    pub iterations: usize,
    /// Reduced statistics; `None` when no iterations were recorded
    pub summary: Option<Summary>,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let header = format!("===== Performance Results ({}) =====", self.backend);
        writeln!(f, "{header}")?;
        writeln!(f, "Matrix size: {} x {}", self.rows, self.cols)?;
        writeln!(f, "Batch count: {}", self.batch_count)?;
        for (label, value) in &self.extras {
            writeln!(f, "{label}: {value}")?;
        }
        writeln!(
            f,
            "Warm-up time: {} ms (completed {} iterations)",
            self.warmup_budget_ms, self.warmup_iterations
        )?;
        writeln!(f, "Timing iterations: {}", self.iterations)?;
        match self.summary {
            Some(s) => {
                writeln!(f, "Average execution time: {:.3} ms", s.mean_ms)?;
                writeln!(f, "Standard deviation: {:.3} ms", s.std_dev_ms)?;
            }
            None => {
                writeln!(f, "Average execution time: no data")?;
                writeln!(f, "Standard deviation: no data")?;
            }
        }
        write!(f, "{}", "=".repeat(header.len()))
    }
}
