//! Run statistics and summary output.

use std::time::Duration;

use contracts::IntegrationReport;
use observability::IntegrationMetricsAggregator;

use crate::integrator::LogIntegrator;

/// Statistics from one `run` invocation
#[derive(Debug, Default)]
pub struct RunStats {
    /// Merged report of all integration paths
    pub report: IntegrationReport,

    /// Poses handed to the integrator (one per shutter line)
    pub poses_dispatched: u64,

    /// Wall-clock duration of the integration
    pub duration: Duration,

    pub metrics: IntegrationMetricsAggregator,
}

impl RunStats {
    pub fn new(report: IntegrationReport, integrator: &LogIntegrator, duration: Duration) -> Self {
        let mut metrics = IntegrationMetricsAggregator::new();
        metrics.update(&report);
        Self {
            report,
            poses_dispatched: integrator.poses,
            duration,
            metrics,
        }
    }

    /// Depth maps integrated per second
    pub fn throughput(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.report.dispatched as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                  Depth Integration Statistics                ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("📊 Overview");
        println!("   ├─ Outcome: {:?}", self.report.outcome);
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Depth maps: {}", self.report.dispatched);
        println!("   ├─ Poses: {}", self.poses_dispatched);
        println!("   └─ Throughput: {:.2} maps/s", self.throughput());

        if !self.report.sensors.is_empty() {
            println!("\n📷 Sensors ({})", self.report.sensors.len());
            let last = self.report.sensors.len() - 1;
            for (i, (sensor, stats)) in self.report.sensors.iter().enumerate() {
                let prefix = if i == last { "└─" } else { "├─" };
                println!(
                    "   {} {}: {}/{} dispatched, {} lines, {} out of range, interpolation {:.2}ms",
                    prefix,
                    sensor,
                    stats.dispatched,
                    stats.resources,
                    stats.lines_per_resource,
                    stats.skipped_out_of_range,
                    stats.interpolation_time.as_secs_f64() * 1000.0
                );
            }
        }

        println!("\n{}", self.metrics.summary());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_throughput() {
        let report = IntegrationReport {
            dispatched: 50,
            ..Default::default()
        };
        let stats = RunStats::new(report, &LogIntegrator::new(), Duration::from_secs(2));
        assert!((stats.throughput() - 25.0).abs() < 1e-9);
        assert_eq!(stats.metrics.runs, 1);

        let stats = RunStats::default();
        assert_eq!(stats.throughput(), 0.0);
    }
}
