//! Periodic progress reporting for long integration loops.

use tracing::{debug, info};

/// Snapshot emitted every `every` items
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub done: usize,
    pub total: usize,
}

impl Progress {
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            self.done as f64 / self.total as f64 * 100.0
        }
    }
}

/// Best-effort progress observer, no effect on integration outcome
#[derive(Debug)]
pub struct ProgressReporter {
    label: &'static str,
    total: usize,
    every: usize,
    done: usize,
}

impl ProgressReporter {
    pub fn new(label: &'static str, total: usize, every: usize) -> Self {
        Self {
            label,
            total,
            every: every.max(1),
            done: 0,
        }
    }

    /// Call once at the start of every item; reports on items `0, every, 2*every, ...`
    pub fn update(&mut self) -> Option<Progress> {
        let report = (self.done % self.every == 0).then_some(Progress {
            done: self.done,
            total: self.total,
        });
        self.done += 1;

        if let Some(progress) = report {
            info!(
                what = self.label,
                done = progress.done,
                total = progress.total,
                "Integration progress {:.1}%",
                progress.percent()
            );
        }
        report
    }

    pub fn done(&self) -> usize {
        self.done
    }

    pub fn finish(self) {
        debug!(what = self.label, done = self.done, total = self.total, "Integration loop finished");
    }
}
