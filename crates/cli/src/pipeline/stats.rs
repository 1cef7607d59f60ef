//! Pipeline statistics and metrics.

use std::time::Duration;

use broker::BridgeStats;
use event_manager::MetricsSnapshot;

/// Statistics from a pipeline run
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// Input lines read (blank lines included)
    pub lines_read: u64,

    /// Messages published to the broker
    pub published: u64,

    /// Handler registrations made from config
    pub registrations: usize,

    /// Deliveries acknowledged by the consumer
    pub acked: u64,

    /// Deliveries rejected by the consumer
    pub rejected: u64,

    /// Total duration of the pipeline run
    pub duration: Duration,

    /// Bridge counters and per-dispatch aggregation
    pub bridge: BridgeStats,

    /// EventManager counters at shutdown
    pub dispatch: MetricsSnapshot,
}

impl PipelineStats {
    /// Dispatched events per second
    pub fn events_per_sec(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.bridge.dispatched as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Rejected deliveries as percentage of published
    pub fn reject_rate(&self) -> f64 {
        if self.published > 0 {
            (self.rejected as f64 / self.published as f64) * 100.0
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n=== Pipeline Statistics ===\n");

        println!("Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Lines read: {}", self.lines_read);
        println!("   ├─ Published: {}", self.published);
        println!("   ├─ Events/s: {:.2}", self.events_per_sec());
        println!("   └─ Registrations: {}", self.registrations);

        println!("\nBroker");
        println!("   ├─ Acked: {}", self.acked);
        println!(
            "   └─ Rejected: {} ({:.2}%)",
            self.rejected,
            self.reject_rate()
        );

        println!("\nEvent Manager");
        println!("   ├─ Dispatches: {}", self.dispatch.dispatch_count);
        println!("   ├─ Handler invocations: {}", self.dispatch.handler_invocations);
        println!("   └─ Handler panics: {}", self.dispatch.handler_panics);

        println!("\n{}", self.bridge.dispatch.summary());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rates_with_no_traffic() {
        let stats = PipelineStats::default();
        assert_eq!(stats.events_per_sec(), 0.0);
        assert_eq!(stats.reject_rate(), 0.0);
    }

    #[test]
    fn test_reject_rate() {
        let stats = PipelineStats {
            published: 8,
            rejected: 2,
            ..Default::default()
        };
        assert!((stats.reject_rate() - 25.0).abs() < f64::EPSILON);
    }
}
