//! 事件分发指标
//!
//! Prometheus 指标记录函数，以及用于运行摘要的在线统计。

use metrics::{counter, histogram};

/// Outcome of one event at one sink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    /// Handed to the destination successfully
    Delivered,
    /// Skipped by a severity/namespace/kind filter
    Filtered,
    /// Could not be converted to the destination format
    TranslationFailed,
    /// Transport or protocol failure
    DeliveryFailed,
}

impl EventOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Delivered => "delivered",
            Self::Filtered => "filtered",
            Self::TranslationFailed => "translation_failed",
            Self::DeliveryFailed => "delivery_failed",
        }
    }
}

/// 记录单个事件在某个 sink 上的处理结果
pub fn record_event_outcome(sink_name: &str, outcome: EventOutcome) {
    counter!(
        "kube_eventer_events_total",
        "sink" => sink_name.to_string(),
        "outcome" => outcome.as_str()
    )
    .increment(1);
}

/// 记录一次批次导出 (一个 sink)
pub fn record_batch_exported(sink_name: &str, events: usize, latency_ms: f64, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "kube_eventer_batches_total",
        "sink" => sink_name.to_string(),
        "status" => status
    )
    .increment(1);

    histogram!(
        "kube_eventer_batch_export_latency_ms",
        "sink" => sink_name.to_string()
    )
    .record(latency_ms);

    histogram!(
        "kube_eventer_batch_size",
        "sink" => sink_name.to_string()
    )
    .record(events as f64);
}

/// 记录 sink 构建失败
pub fn record_sink_build_failure(type_tag: &str) {
    counter!(
        "kube_eventer_sink_build_failures_total",
        "type" => type_tag.to_string()
    )
    .increment(1);
}

/// 记录从上游接收到的批次
pub fn record_batch_received(events: usize) {
    counter!("kube_eventer_batches_received_total").increment(1);
    counter!("kube_eventer_events_received_total").increment(events as u64);
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
            return;
        }

        self.min = self.min.min(value);
        self.max = self.max.max(value);

        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
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

    #[test]
    fn test_running_stats() {
        let mut stats = RunningStats::default();
        for v in [1.0, 2.0, 3.0, 4.0, 5.0] {
            stats.push(v);
        }

        assert_eq!(stats.count(), 5);
        assert!((stats.mean() - 3.0).abs() < 1e-10);
        assert!((stats.min() - 1.0).abs() < 1e-10);
        assert!((stats.max() - 5.0).abs() < 1e-10);
        assert!((stats.variance() - 2.5).abs() < 1e-10);
    }

    #[test]
    fn test_empty_summary_display() {
        let summary = StatsSummary::from(&RunningStats::default());
        assert_eq!(summary.to_string(), "N/A");
    }

    #[test]
    fn test_outcome_labels() {
        assert_eq!(EventOutcome::Delivered.as_str(), "delivered");
        assert_eq!(EventOutcome::TranslationFailed.as_str(), "translation_failed");
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        // no global recorder installed: the facade drops the values
        record_event_outcome("LogSink", EventOutcome::Delivered);
        record_batch_exported("LogSink", 3, 1.5, true);
        record_sink_build_failure("unknown");
        record_batch_received(3);
    }
}
