//! FileHandler - appends events to a JSON-lines journal

use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use contracts::{Event, EventHandler};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, error};

/// Configuration for FileHandler
#[derive(Debug, Clone)]
pub struct FileHandlerConfig {
    /// Journal file, created with its parent directories
    pub path: PathBuf,
}

impl FileHandlerConfig {
    /// Create config from params map
    pub fn from_params(params: &HashMap<String, String>) -> io::Result<Self> {
        let path = params.get("path").ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "missing 'path' parameter")
        })?;

        Ok(Self {
            path: PathBuf::from(path),
        })
    }
}

/// Handler that appends every event as one JSON line
///
/// Write failures stay inside the handler: they are logged and counted.
pub struct FileHandler {
    name: String,
    path: PathBuf,
    file: Mutex<File>,
    written: AtomicU64,
    failures: AtomicU64,
}

impl FileHandler {
    /// Open (or create) the journal in append mode
    pub fn new(name: impl Into<String>, config: FileHandlerConfig) -> io::Result<Self> {
        if let Some(parent) = config.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.path)?;

        let name = name.into();
        debug!(handler = %name, path = %config.path.display(), "FileHandler opened");

        Ok(Self {
            name,
            path: config.path,
            file: Mutex::new(File::from_std(file)),
            written: AtomicU64::new(0),
            failures: AtomicU64::new(0),
        })
    }

    /// Create from params map (for factory)
    pub fn from_params(name: impl Into<String>, params: &HashMap<String, String>) -> io::Result<Self> {
        let config = FileHandlerConfig::from_params(params)?;
        Self::new(name, config)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Events written so far
    pub fn written(&self) -> u64 {
        self.written.load(Ordering::Relaxed)
    }

    /// Failed writes so far
    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    async fn append(&self, event: &Event) -> io::Result<()> {
        let mut line = serde_json::to_vec(event)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        line.push(b'\n');

        let mut file = self.file.lock().await;
        file.write_all(&line).await?;
        file.flush().await
    }
}

#[async_trait]
impl EventHandler for FileHandler {
    fn name(&self) -> &str {
        &self.name
    }

    async fn handle(&self, event: &Event) {
        match self.append(event).await {
            Ok(()) => {
                self.written.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                self.failures.fetch_add(1, Ordering::Relaxed);
                error!(
                    handler = %self.name,
                    event = %event.name(),
                    error = %e,
                    "Journal write failed"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_file_handler_appends_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("events.jsonl");
        let params = HashMap::from([("path".to_string(), path.display().to_string())]);
        let handler = FileHandler::from_params("journal", &params).unwrap();

        handler.handle(&Event::new("a", json!(1))).await;
        handler.handle(&Event::new("b", json!({ "k": "v" }))).await;

        assert_eq!(handler.written(), 2);
        assert_eq!(handler.failures(), 0);

        let content = std::fs::read_to_string(&path).unwrap();
        let events: Vec<Event> = content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].name(), "a");
        assert_eq!(events[1].payload(), &json!({ "k": "v" }));
    }

    #[test]
    fn test_missing_path_param() {
        let result = FileHandler::from_params("journal", &HashMap::new());
        assert!(result.is_err());
    }
}
