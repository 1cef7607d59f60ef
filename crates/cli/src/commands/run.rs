//! `run` command implementation.

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::pipeline::{Pipeline, PipelineConfig};

/// Execute the `run` command
pub async fn run_pipeline(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    if !args.config.exists() {
        return Err(CliError::config_not_found(args.config.display().to_string()).into());
    }

    let mut app = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    // Apply CLI overrides
    if let Some(ref queue) = args.queue {
        if queue.is_empty() {
            anyhow::bail!("--queue cannot be empty");
        }
        info!(queue = %queue, "Overriding broker queue from CLI");
        app.broker.queue = queue.clone();
    }

    info!(
        queue = %app.broker.queue,
        capacity = app.broker.capacity,
        handlers = app.handlers.len(),
        subscriptions = app.subscriptions.len(),
        "Configuration loaded"
    );

    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&app);
        return Ok(());
    }

    let pipeline = Pipeline::new(PipelineConfig {
        app,
        input: args.input.clone(),
        metrics_port: (args.metrics_port != 0).then_some(args.metrics_port),
    });

    info!("Starting pipeline...");

    tokio::select! {
        result = pipeline.run() => {
            let stats = result.context("Pipeline execution failed")?;
            info!(
                dispatched = stats.bridge.dispatched,
                rejected = stats.bridge.rejected,
                duration_secs = stats.duration.as_secs_f64(),
                events_per_sec = format!("{:.2}", stats.events_per_sec()),
                "Pipeline completed successfully"
            );
            stats.print_summary();
        }
        _ = shutdown_signal() => {
            warn!("Received shutdown signal, stopping pipeline...");
        }
    }

    info!("Event manager finished");
    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(app: &contracts::AppConfig) {
    println!("\n=== Configuration Summary ===\n");
    println!("Broker:");
    println!("  Queue: {}", app.broker.queue);
    println!("  Capacity: {}", app.broker.capacity);

    println!("\nHandlers ({}):", app.handlers.len());
    for handler in &app.handlers {
        println!("  - {} ({:?})", handler.name, handler.handler_type);
    }

    if !app.subscriptions.is_empty() {
        println!("\nSubscriptions ({}):", app.subscriptions.len());
        for subscription in &app.subscriptions {
            println!(
                "  - {} -> {}",
                subscription.event,
                subscription.handlers.join(", ")
            );
        }
    }

    println!();
}
