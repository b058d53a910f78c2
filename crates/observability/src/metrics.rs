//! Depth integration 指标收集模块
//!
//! 记录分发、跳过、插值批次等运行指标，并基于 IntegrationReport 在内存中聚合统计。

use std::collections::BTreeMap;
use std::time::Duration;

use contracts::{IntegrationReport, SkipReason};
use metrics::{counter, gauge, histogram};

/// 记录一次深度图分发
///
/// `path` 为 `"frame"` 或 `"sensor"`。
pub fn record_depth_map_dispatched(path: &'static str, with_companion: bool) {
    counter!(
        "depth_integrator_depth_maps_dispatched_total",
        "path" => path,
        "companion" => if with_companion { "yes" } else { "no" }
    )
    .increment(1);
}

/// 记录资源跳过 (缺失 / 超出轨迹时间范围)
pub fn record_resource_skipped(path: &'static str, reason: SkipReason) {
    counter!(
        "depth_integrator_resources_skipped_total",
        "path" => path,
        "reason" => reason.as_str()
    )
    .increment(1);
}

/// 记录任务 (mission) 跳过
pub fn record_mission_skipped(path: &'static str, reason: SkipReason) {
    counter!(
        "depth_integrator_missions_skipped_total",
        "path" => path,
        "reason" => reason.as_str()
    )
    .increment(1);
}

/// 记录一次批量插值
pub fn record_interpolation_batch(poses: usize, elapsed: Duration) {
    counter!("depth_integrator_interpolation_batches_total").increment(1);
    histogram!("depth_integrator_interpolation_batch_size").record(poses as f64);
    histogram!("depth_integrator_interpolation_duration_ms").record(elapsed.as_secs_f64() * 1000.0);
}

/// 记录用户中止
pub fn record_integration_aborted(path: &'static str) {
    counter!("depth_integrator_aborts_total", "path" => path).increment(1);
}

/// 记录循环进度
pub fn record_progress(what: &'static str, done: usize, total: usize) {
    gauge!("depth_integrator_progress_done", "what" => what).set(done as f64);
    gauge!("depth_integrator_progress_total", "what" => what).set(total as f64);
}

/// 集成指标聚合器
///
/// 在内存中聚合多次集成调用的报告，便于输出摘要。
#[derive(Debug, Clone, Default)]
pub struct IntegrationMetricsAggregator {
    /// 聚合的报告数
    pub runs: u64,

    /// 被用户中止的调用数
    pub aborted_runs: u64,

    /// 分发总数
    pub total_dispatched: u64,

    /// 带伴随图像的分发数
    pub with_companion: u64,

    /// 处理的 mission 数
    pub missions_processed: u64,

    /// 按原因统计的跳过资源数
    pub resources_skipped: BTreeMap<SkipReason, u64>,

    /// 按原因统计的跳过 mission 数
    pub missions_skipped: BTreeMap<SkipReason, u64>,

    /// 每个传感器批次的位姿数
    pub batch_size_stats: RunningStats,

    /// 每个传感器批次的插值耗时 (毫秒)
    pub interpolation_ms_stats: RunningStats,
}

impl IntegrationMetricsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 更新聚合统计
    pub fn update(&mut self, report: &IntegrationReport) {
        self.runs += 1;
        if report.is_aborted() {
            self.aborted_runs += 1;
        }
        self.total_dispatched += report.dispatched as u64;
        self.with_companion += report.with_companion_image as u64;
        self.missions_processed += report.missions_processed as u64;

        for (reason, count) in &report.resources_skipped {
            *self.resources_skipped.entry(*reason).or_insert(0) += *count as u64;
        }
        for (reason, count) in &report.missions_skipped {
            *self.missions_skipped.entry(*reason).or_insert(0) += *count as u64;
        }

        for stats in report.sensors.values() {
            self.batch_size_stats.push(stats.poses_interpolated as f64);
            self.interpolation_ms_stats
                .push(stats.interpolation_time.as_secs_f64() * 1000.0);
        }
    }

    /// 生成摘要报告
    pub fn summary(&self) -> MetricsSummary {
        let total_skipped: u64 = self.resources_skipped.values().sum();
        let examined = self.total_dispatched + total_skipped;
        MetricsSummary {
            runs: self.runs,
            aborted_runs: self.aborted_runs,
            total_dispatched: self.total_dispatched,
            with_companion: self.with_companion,
            missions_processed: self.missions_processed,
            skip_rate: if examined > 0 {
                total_skipped as f64 / examined as f64 * 100.0
            } else {
                0.0
            },
            resources_skipped: self
                .resources_skipped
                .iter()
                .map(|(reason, count)| (reason.as_str(), *count))
                .collect(),
            missions_skipped: self
                .missions_skipped
                .iter()
                .map(|(reason, count)| (reason.as_str(), *count))
                .collect(),
            batch_size: StatsSummary::from(&self.batch_size_stats),
            interpolation_ms: StatsSummary::from(&self.interpolation_ms_stats),
        }
    }

    /// 重置统计
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// 指标摘要
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub runs: u64,
    pub aborted_runs: u64,
    pub total_dispatched: u64,
    pub with_companion: u64,
    pub missions_processed: u64,
    pub skip_rate: f64,
    pub resources_skipped: BTreeMap<&'static str, u64>,
    pub missions_skipped: BTreeMap<&'static str, u64>,
    pub batch_size: StatsSummary,
    pub interpolation_ms: StatsSummary,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Depth Integration Summary ===")?;
        writeln!(f, "Runs: {} (aborted: {})", self.runs, self.aborted_runs)?;
        writeln!(f, "Missions processed: {}", self.missions_processed)?;
        writeln!(
            f,
            "Depth maps dispatched: {} (with companion image: {})",
            self.total_dispatched, self.with_companion
        )?;
        writeln!(f, "Skipped resources: {:.2}%", self.skip_rate)?;
        for (reason, count) in &self.resources_skipped {
            writeln!(f, "  {}: {}", reason, count)?;
        }
        if !self.missions_skipped.is_empty() {
            writeln!(f, "Skipped missions:")?;
            for (reason, count) in &self.missions_skipped {
                writeln!(f, "  {}: {}", reason, count)?;
            }
        }
        writeln!(f, "Interpolation batch size: {}", self.batch_size)?;
        writeln!(f, "Interpolation time (ms): {}", self.interpolation_ms)?;

        Ok(())
    }
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计计算器 (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// 添加新值
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 样本方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{IntegrationOutcome, SensorBatchStats, SensorId};

    #[test]
    fn test_running_stats() {
        let mut stats = RunningStats::default();
        for value in [2.0, 4.0, 6.0] {
            stats.push(value);
        }

        assert_eq!(stats.count(), 3);
        assert!((stats.mean() - 4.0).abs() < 1e-10);
        assert!((stats.min() - 2.0).abs() < 1e-10);
        assert!((stats.max() - 6.0).abs() < 1e-10);
        assert!((stats.variance() - 4.0).abs() < 1e-10);
    }

    #[test]
    fn test_aggregator_update() {
        let mut report = IntegrationReport {
            outcome: IntegrationOutcome::Aborted,
            missions_processed: 1,
            dispatched: 3,
            with_companion_image: 2,
            ..Default::default()
        };
        report.record_skip(SkipReason::OutOfTimeRange);
        report.sensors.insert(
            SensorId::new("tof"),
            SensorBatchStats {
                resources: 4,
                lines_per_resource: 3,
                poses_interpolated: 12,
                interpolation_time: Duration::from_millis(5),
                dispatched: 3,
                skipped_out_of_range: 1,
            },
        );

        let mut aggregator = IntegrationMetricsAggregator::new();
        aggregator.update(&report);

        assert_eq!(aggregator.runs, 1);
        assert_eq!(aggregator.aborted_runs, 1);
        assert_eq!(aggregator.total_dispatched, 3);
        assert_eq!(aggregator.resources_skipped.get(&SkipReason::OutOfTimeRange), Some(&1));
        assert_eq!(aggregator.batch_size_stats.count(), 1);

        let summary = aggregator.summary();
        assert!((summary.skip_rate - 25.0).abs() < 1e-10);
        assert!((summary.batch_size.mean - 12.0).abs() < 1e-10);
    }

    #[test]
    fn test_summary_display() {
        let mut aggregator = IntegrationMetricsAggregator::new();
        let mut report = IntegrationReport {
            dispatched: 10,
            ..Default::default()
        };
        report.record_mission_skip(SkipReason::NoTrajectory);
        aggregator.update(&report);

        let output = format!("{}", aggregator.summary());
        assert!(output.contains("Depth maps dispatched: 10"));
        assert!(output.contains("no_trajectory: 1"));
        assert!(output.contains("0.00%"));
    }
}
