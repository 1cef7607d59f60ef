//! Pipeline orchestrator - wires config, broker, bridge and EventManager.
//!
//! Producer side: every non-empty input line is published as one message on
//! the configured queue. Consumer side: the EventBridge drains the queue into
//! the EventManager. Lines that are not JSON events are rejected by the bridge.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use broker::{BrokerChannel, EventBridge, InMemoryBroker};
use bytes::Bytes;
use contracts::AppConfig;
use event_manager::EventManager;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{debug, info};

use super::PipelineStats;
use crate::error::{CliError, Result};

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Handlers, subscriptions and broker settings
    pub app: AppConfig,

    /// JSON-lines input file (None = stdin)
    pub input: Option<PathBuf>,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// Main pipeline orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a new pipeline with the given configuration
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run the pipeline until the input is exhausted and the queue drained
    pub async fn run(self) -> Result<PipelineStats> {
        match self.config.input.clone() {
            Some(path) => {
                let file = tokio::fs::File::open(&path)
                    .await
                    .map_err(|e| CliError::input(path.display().to_string(), e.to_string()))?;
                info!(input = %path.display(), "Reading events from file");
                self.run_with_reader(BufReader::new(file), path.display().to_string())
                    .await
            }
            None => {
                info!("Reading events from stdin");
                self.run_with_reader(BufReader::new(tokio::io::stdin()), "stdin".to_string())
                    .await
            }
        }
    }

    async fn run_with_reader<R>(self, reader: R, source_name: String) -> Result<PipelineStats>
    where
        R: AsyncBufRead + Unpin,
    {
        let start_time = Instant::now();
        let app = &self.config.app;

        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        // Handlers
        let manager = Arc::new(EventManager::new());
        let registrations = event_manager::register_from_config(&manager, app)?;

        // Broker
        let broker = InMemoryBroker::from_config(&app.broker);
        let connection = broker.connect();
        let channel = connection.open_channel()?;
        let queue = app.broker.queue.clone();
        let consumer = channel.consume(&queue)?;

        // Bridge
        let bridge = EventBridge::new(Arc::clone(&manager));
        let bridge_handle = tokio::spawn(async move { bridge.run(consumer).await });

        info!(
            queue = %queue,
            events = manager.len(),
            registrations,
            "Pipeline running"
        );

        let mut stats = PipelineStats {
            registrations,
            ..Default::default()
        };

        let produced = publish_lines(&channel, &queue, reader, &mut stats).await;

        // Let the bridge drain what was published, then stop.
        channel.close_queue(&queue);
        let bridge_stats = bridge_handle
            .await
            .map_err(|e| CliError::pipeline_execution(format!("bridge task failed: {e}")))?;
        produced.map_err(|e| CliError::input(source_name, e.to_string()))?;

        connection.close();

        stats.bridge = bridge_stats;
        stats.acked = broker.stats().acked();
        stats.rejected = broker.stats().rejected();
        stats.dispatch = manager.metrics().snapshot();
        stats.duration = start_time.elapsed();

        info!(
            published = stats.published,
            dispatched = stats.bridge.dispatched,
            rejected = stats.bridge.rejected,
            duration_secs = stats.duration.as_secs_f64(),
            "Pipeline shutdown complete"
        );

        Ok(stats)
    }
}

/// Publish every non-empty line as one message
async fn publish_lines<C, R>(
    channel: &C,
    queue: &str,
    reader: R,
    stats: &mut PipelineStats,
) -> Result<()>
where
    C: BrokerChannel + Sync,
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        stats.lines_read += 1;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        channel
            .publish(queue, Bytes::copy_from_slice(line.as_bytes()))
            .await?;
        stats.published += 1;
        debug!(line = stats.lines_read, "Event published");
    }
    Ok(())
}
