use std::collections::HashMap;
use std::time::Instant;

/// Cross-cutting observer for scan events.
///
/// Lets the CLI, the job workers and tests each watch a run without the
/// use case knowing where the output goes.
pub trait PipelineLogger: Send {
    /// Report how many sampled frames have been analyzed. `expected` is
    /// `None` when the container does not report a frame count.
    fn progress(&mut self, processed: usize, expected: Option<usize>);

    /// Record how long a named stage took for one sampled frame.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Record a point-in-time metric (e.g. faces per frame).
    fn metric(&mut self, name: &str, value: f64);

    /// Log a human-readable status message.
    fn info(&mut self, message: &str);

    /// Emit an end-of-run summary. Default: no-op.
    fn summary(&self) {}
}

/// Silent logger that discards all events.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn progress(&mut self, _processed: usize, _expected: Option<usize>) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// Logger that forwards to the `log` crate and keeps per-stage timings and
/// metrics for a summary at the end of the run.
///
/// Progress lines are throttled to one every `throttle_samples` samples.
pub struct LogPipelineLogger {
    label: String,
    throttle_samples: usize,
    timings: HashMap<String, Vec<f64>>,
    metrics: HashMap<String, Vec<f64>>,
    start_time: Instant,
    processed: usize,
}

impl LogPipelineLogger {
    /// `label` prefixes every line, typically the run id.
    pub fn new(label: impl Into<String>, throttle_samples: usize) -> Self {
        Self {
            label: label.into(),
            throttle_samples: throttle_samples.max(1),
            timings: HashMap::new(),
            metrics: HashMap::new(),
            start_time: Instant::now(),
            processed: 0,
        }
    }

    /// Returns the formatted summary, or `None` if nothing was recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.timings.is_empty() && self.metrics.is_empty() {
            return None;
        }

        let elapsed_ms = self.start_time.elapsed().as_secs_f64() * 1000.0;
        let samples = self.processed;
        let mut lines = vec![format!(
            "Scan summary ({samples} sampled frames, {:.1}s total):",
            elapsed_ms / 1000.0
        )];

        let mut stages: Vec<_> = self.timings.keys().collect();
        stages.sort();
        for stage in stages {
            let durations = &self.timings[stage];
            let total_ms: f64 = durations.iter().sum();
            let avg_ms = mean(durations);
            let pct = if elapsed_ms > 0.0 {
                total_ms / elapsed_ms * 100.0
            } else {
                0.0
            };
            lines.push(format!(
                "  {stage:8}: avg {avg_ms:6.1}ms  total {total_ms:7.0}ms  ({pct:4.1}%)"
            ));
        }

        let mut names: Vec<_> = self.metrics.keys().collect();
        names.sort();
        for name in names {
            lines.push(format!("  {name}: avg {:.1}", mean(&self.metrics[name])));
        }

        if samples > 0 && elapsed_ms > 0.0 {
            let rate = samples as f64 / (elapsed_ms / 1000.0);
            lines.push(format!("  Throughput: {rate:.1} samples/s"));
        }

        Some(lines.join("\n"))
    }

}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

impl PipelineLogger for LogPipelineLogger {
    fn progress(&mut self, processed: usize, expected: Option<usize>) {
        self.processed = processed;
        let at_end = expected == Some(processed);
        if processed % self.throttle_samples != 0 && !at_end {
            return;
        }
        match expected {
            Some(total) if total > 0 => {
                let pct = processed as f64 / total as f64 * 100.0;
                log::info!(
                    "[{}] Processed {processed}/{total} sampled frames ({pct:.1}%)",
                    self.label
                );
            }
            _ => log::info!("[{}] Processed {processed} sampled frames", self.label),
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.timings
            .entry(stage.to_string())
            .or_default()
            .push(duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.metrics
            .entry(name.to_string())
            .or_default()
            .push(value);
    }

    fn info(&mut self, message: &str) {
        log::info!("[{}] {message}", self.label);
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("[{}] {text}", self.label);
        }
    }
}
