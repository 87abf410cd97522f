// Debug logging module for asynchronous game event tracing
//
// This module provides fire-and-forget async logging so that the game loop
// never waits for the disk. Every emitted game log entry is written to a
// JSONL file, one line per entry.

use log::error;
use serde::Serialize;
use std::sync::Arc;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::game::GameLogEntry;

/// Represents a single line of the trace
#[derive(Debug, Serialize)]
struct DebugLogEntry {
    index: usize,
    event: GameLogEntry,
    timestamp: String,
}

/// Shared debug logger state
/// Uses Arc<Mutex<File>> so that entries from consecutive tasks are written in order
/// and keeps the handles of writes that may not have landed yet
#[derive(Clone)]
pub struct DebugLogger {
    file: Arc<Mutex<Option<File>>>,
    pending: Arc<parking_lot::Mutex<Vec<JoinHandle<()>>>>,
    enabled: bool,
}

impl DebugLogger {
    /// Creates a new debug logger
    /// If enabled is true, initializes the log file (truncating if it exists)
    pub async fn new(enabled: bool, log_file_path: &str) -> Self {
        if !enabled {
            return DebugLogger::disabled();
        }

        match OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(log_file_path)
            .await
        {
            Ok(file) => {
                log::info!("Debug logging enabled: {}", log_file_path);
                DebugLogger {
                    file: Arc::new(Mutex::new(Some(file))),
                    pending: Arc::new(parking_lot::Mutex::new(Vec::new())),
                    enabled: true,
                }
            }
            Err(e) => {
                error!("Failed to create debug log file '{}': {}", log_file_path, e);
                DebugLogger::disabled()
            }
        }
    }

    /// Creates a disabled debug logger (no-op)
    pub fn disabled() -> Self {
        DebugLogger {
            file: Arc::new(Mutex::new(None)),
            pending: Arc::new(parking_lot::Mutex::new(Vec::new())),
            enabled: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Logs a batch of game events asynchronously (fire-and-forget)
    ///
    /// # Arguments
    /// * `first_index` - Position of the first event in the game log
    /// * `events` - Consecutive entries of the game log
    pub fn log_events(&self, first_index: usize, events: Vec<GameLogEntry>) {
        if !self.enabled || events.is_empty() {
            return;
        }

        let file_handle = self.file.clone();
        let handle = tokio::spawn(async move {
            Self::log_events_internal(file_handle, first_index, events).await;
        });
        let mut pending = self.pending.lock();
        pending.retain(|h| !h.is_finished());
        pending.push(handle);
    }

    /// Internal async function that performs the actual file write
    async fn log_events_internal(
        file_handle: Arc<Mutex<Option<File>>>,
        first_index: usize,
        events: Vec<GameLogEntry>,
    ) {
        let mut file_guard = file_handle.lock().await;
        let Some(file) = file_guard.as_mut() else {
            return;
        };

        let timestamp = chrono::Utc::now().to_rfc3339();
        let mut lines = String::new();
        for (offset, event) in events.into_iter().enumerate() {
            let entry = DebugLogEntry {
                index: first_index + offset,
                event,
                timestamp: timestamp.clone(),
            };
            match serde_json::to_string(&entry) {
                Ok(json_line) => {
                    lines.push_str(&json_line);
                    lines.push('\n');
                }
                Err(e) => error!("Failed to serialize debug log entry: {}", e),
            }
        }

        if let Err(e) = file.write_all(lines.as_bytes()).await {
            error!("Failed to write debug log entries: {}", e);
        } else if let Err(e) = file.flush().await {
            error!("Failed to flush debug log: {}", e);
        }
    }

    /// Waits for every write issued so far and flushes the file, used before
    /// the process exits
    pub async fn sync(&self) {
        let pending = std::mem::take(&mut *self.pending.lock());
        for handle in pending {
            if let Err(e) = handle.await {
                error!("Debug log write task failed: {}", e);
            }
        }

        let mut file_guard = self.file.lock().await;
        if let Some(file) = file_guard.as_mut() {
            if let Err(e) = file.flush().await {
                error!("Failed to flush debug log: {}", e);
            }
        }
    }
}
