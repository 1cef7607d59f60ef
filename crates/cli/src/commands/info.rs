//! `info` command implementation.

use std::collections::{BTreeMap, HashMap};

use anyhow::{Context, Result};
use contracts::AppConfig;
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    broker: BrokerInfo,
    handlers: Vec<HandlerInfo>,
    /// Event name -> handler names, in registration order
    subscriptions: BTreeMap<String, Vec<String>>,
}

#[derive(Serialize)]
struct BrokerInfo {
    queue: String,
    capacity: usize,
}

#[derive(Serialize)]
struct HandlerInfo {
    name: String,
    handler_type: String,
    events: Vec<String>,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    params: HashMap<String, String>,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let app = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    let info = build_config_info(&app, args);
    if args.json {
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&info);
    }

    Ok(())
}

fn build_config_info(app: &AppConfig, args: &InfoArgs) -> ConfigInfo {
    let mut subscriptions: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for subscription in &app.subscriptions {
        subscriptions
            .entry(subscription.event.clone())
            .or_default()
            .extend(subscription.handlers.iter().cloned());
    }

    let handlers = app
        .handlers
        .iter()
        .map(|h| HandlerInfo {
            name: h.name.clone(),
            handler_type: format!("{:?}", h.handler_type),
            events: subscriptions
                .iter()
                .filter(|(_, names)| names.contains(&h.name))
                .map(|(event, _)| event.clone())
                .collect(),
            params: if args.params {
                h.params.clone()
            } else {
                HashMap::new()
            },
        })
        .collect();

    ConfigInfo {
        version: format!("{:?}", app.version),
        broker: BrokerInfo {
            queue: app.broker.queue.clone(),
            capacity: app.broker.capacity,
        },
        handlers,
        subscriptions,
    }
}

fn print_config_info(info: &ConfigInfo) {
    println!("=== Event Manager Configuration ===\n");

    println!("Broker");
    println!("   ├─ Version: {}", info.version);
    println!("   ├─ Queue: {}", info.broker.queue);
    println!("   └─ Capacity: {}", info.broker.capacity);

    println!("\nHandlers ({})", info.handlers.len());
    for (i, handler) in info.handlers.iter().enumerate() {
        let is_last = i == info.handlers.len() - 1;
        let prefix = if is_last { "└─" } else { "├─" };
        let child_prefix = if is_last { "   " } else { "│  " };

        println!("   {} {} ({})", prefix, handler.name, handler.handler_type);

        let mut params: Vec<_> = handler.params.iter().collect();
        params.sort();
        for (key, value) in params {
            println!("   {}  · {} = {}", child_prefix, key, value);
        }
    }

    if !info.subscriptions.is_empty() {
        println!("\nSubscriptions ({})", info.subscriptions.len());
        for (i, (event, handlers)) in info.subscriptions.iter().enumerate() {
            let is_last = i == info.subscriptions.len() - 1;
            let prefix = if is_last { "└─" } else { "├─" };
            println!("   {} {} -> {}", prefix, event, handlers.join(", "));
        }
    }

    println!();
}
