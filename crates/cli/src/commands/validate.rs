//! `validate` command implementation.

use std::collections::HashSet;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    queue: String,
    handler_count: usize,
    event_count: usize,
    registration_count: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(app) => {
            let warnings = collect_warnings(&app);
            let events: HashSet<_> = app.subscriptions.iter().map(|s| s.event.as_str()).collect();

            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: (!warnings.is_empty()).then_some(warnings),
                summary: Some(ConfigSummary {
                    version: format!("{:?}", app.version),
                    queue: app.broker.queue.clone(),
                    handler_count: app.handlers.len(),
                    event_count: events.len(),
                    registration_count: app.subscriptions.iter().map(|s| s.handlers.len()).sum(),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(app: &contracts::AppConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if app.subscriptions.is_empty() {
        warnings.push("No subscriptions configured - every event will be unrouted".to_string());
    }

    for subscription in &app.subscriptions {
        if subscription.handlers.is_empty() {
            warnings.push(format!(
                "Event '{}' has no handlers listed",
                subscription.event
            ));
        }
    }

    let subscribed: HashSet<_> = app
        .subscriptions
        .iter()
        .flat_map(|s| s.handlers.iter().map(String::as_str))
        .collect();
    for handler in &app.handlers {
        if !subscribed.contains(handler.name.as_str()) {
            warnings.push(format!(
                "Handler '{}' is not subscribed to any event",
                handler.name
            ));
        }
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Queue: {}", summary.queue);
            println!("  Handlers: {}", summary.handler_count);
            println!("  Events: {}", summary.event_count);
            println!("  Registrations: {}", summary.registration_count);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn args(config: PathBuf) -> ValidateArgs {
        ValidateArgs {
            config,
            json: true,
        }
    }

    #[test]
    fn test_missing_file_is_invalid() {
        let result = validate_config(&args(PathBuf::from("/nonexistent/events.toml")));
        assert!(!result.valid);
        assert!(result.error.unwrap().contains("File not found"));
    }

    #[test]
    fn test_valid_config_with_warnings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.toml");
        std::fs::write(
            &path,
            r#"
[[handlers]]
name = "audit"
handler_type = "log"

[[handlers]]
name = "idle"
handler_type = "log"

[[subscriptions]]
event = "order.created"
handlers = ["audit"]

[[subscriptions]]
event = "order.cancelled"
handlers = ["audit"]
"#,
        )
        .unwrap();

        let result = validate_config(&args(path));
        assert!(result.valid);
        let summary = result.summary.unwrap();
        assert_eq!(summary.queue, "events");
        assert_eq!(summary.event_count, 2);
        assert_eq!(summary.registration_count, 2);
        let warnings = result.warnings.unwrap();
        assert_eq!(warnings, vec!["Handler 'idle' is not subscribed to any event"]);
    }
}
