//! 事件分发指标收集模块
//!
//! Prometheus 记录函数 + 内存中的分发统计聚合。

use std::collections::HashMap;

use metrics::{counter, gauge, histogram};

/// 记录一次事件分发
///
/// `handlers` 为本次快照中的 handler 数量，0 表示事件无订阅者。
pub fn record_event_dispatched(event_name: &str, handlers: usize, latency_ms: f64) {
    counter!(
        "event_manager_events_dispatched_total",
        "event" => event_name.to_string()
    )
    .increment(1);

    if handlers == 0 {
        counter!("event_manager_events_unrouted_total").increment(1);
        return;
    }

    counter!("event_manager_handler_invocations_total").increment(handlers as u64);
    histogram!("event_manager_dispatch_latency_ms").record(latency_ms);
}

/// 记录 handler panic
pub fn record_handler_panic(event_name: &str) {
    counter!(
        "event_manager_handler_panics_total",
        "event" => event_name.to_string()
    )
    .increment(1);
}

/// 记录注册表大小
pub fn record_registry_size(event_names: usize) {
    gauge!("event_manager_registered_events").set(event_names as f64);
}

/// 记录 delivery 确认结果
pub fn record_delivery_settled(queue: &str, acked: bool) {
    let status = if acked { "ack" } else { "reject" };
    counter!(
        "event_manager_deliveries_total",
        "queue" => queue.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// 分发统计聚合器
///
/// 在内存中聚合每次分发的结果，便于输出摘要。
#[derive(Debug, Clone, Default)]
pub struct DispatchAggregator {
    /// 分发事件总数
    pub total_events: u64,

    /// 无订阅者的事件数
    pub unrouted_events: u64,

    /// handler 调用总数
    pub handler_invocations: u64,

    /// handler panic 总数
    pub handler_panics: u64,

    /// 分发耗时统计 (毫秒)
    pub latency_stats: RunningStats,

    /// 各事件名分发次数
    pub per_event: HashMap<String, u64>,
}

impl DispatchAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 更新聚合统计
    pub fn update(&mut self, event_name: &str, handlers: usize, panicked: usize, latency_ms: f64) {
        self.total_events += 1;
        *self.per_event.entry(event_name.to_string()).or_insert(0) += 1;

        if handlers == 0 {
            self.unrouted_events += 1;
            return;
        }

        self.handler_invocations += handlers as u64;
        self.handler_panics += panicked as u64;
        self.latency_stats.push(latency_ms);
    }

    /// 生成摘要报告
    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            total_events: self.total_events,
            unrouted_events: self.unrouted_events,
            handler_invocations: self.handler_invocations,
            handler_panics: self.handler_panics,
            unrouted_rate: if self.total_events > 0 {
                self.unrouted_events as f64 / self.total_events as f64 * 100.0
            } else {
                0.0
            },
            latency_ms: StatsSummary::from(&self.latency_stats),
            per_event: self.per_event.clone(),
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
    pub total_events: u64,
    pub unrouted_events: u64,
    pub handler_invocations: u64,
    pub handler_panics: u64,
    pub unrouted_rate: f64,
    pub latency_ms: StatsSummary,
    pub per_event: HashMap<String, u64>,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Dispatch Metrics Summary ===")?;
        writeln!(f, "Total events: {}", self.total_events)?;
        writeln!(
            f,
            "Unrouted events: {} ({:.2}%)",
            self.unrouted_events, self.unrouted_rate
        )?;
        writeln!(f, "Handler invocations: {}", self.handler_invocations)?;
        writeln!(f, "Handler panics: {}", self.handler_panics)?;
        writeln!(f, "Dispatch latency (ms): {}", self.latency_ms)?;

        if !self.per_event.is_empty() {
            let mut names: Vec<_> = self.per_event.iter().collect();
            names.sort();
            writeln!(f, "Per event:")?;
            for (name, count) in names {
                writeln!(f, "  {}: {}", name, count)?;
            }
        }

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
