//! Metrics Sinks
//!
//! [`InfluxSink`] posts each line to an InfluxDB-compatible `/write`
//! endpoint. [`MemorySink`] keeps lines in memory for dry runs and tests.

use crate::domain::ports::MetricsSink;
use crate::error::{Error, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::time::Duration;
use tracing::debug;

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for the InfluxDB write endpoint
#[derive(Debug, Clone)]
pub struct InfluxConfig {
    /// Base URL, e.g. `http://influx:8086`
    pub url: String,
    /// Target database
    pub database: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for InfluxConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8086".to_string(),
            database: "capacity_metrics".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

// =============================================================================
// Influx Sink
// =============================================================================

/// HTTP sink for line-protocol records
#[derive(Debug)]
pub struct InfluxSink {
    client: reqwest::Client,
    write_url: String,
}

impl InfluxSink {
    /// Create a new sink
    pub fn new(config: &InfluxConfig) -> Result<Self> {
        if config.url.trim().is_empty() {
            return Err(Error::Configuration("influx url must not be empty".into()));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        let write_url = format!(
            "{}/write?db={}",
            config.url.trim_end_matches('/'),
            config.database
        );

        Ok(Self { client, write_url })
    }
}

#[async_trait]
impl MetricsSink for InfluxSink {
    async fn write(&self, line: &str) -> Result<()> {
        let response = self
            .client
            .post(&self.write_url)
            .header("Content-Type", "text/plain; charset=utf-8")
            .body(line.to_string())
            .send()
            .await
            .map_err(|e| Error::PublishFailure {
                endpoint: self.write_url.clone(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::PublishFailure {
                endpoint: self.write_url.clone(),
                reason: format!("HTTP {}: {}", status, body.trim()),
            });
        }

        debug!("Wrote {} bytes to {}", line.len(), self.write_url);
        Ok(())
    }

    fn endpoint(&self) -> &str {
        &self.write_url
    }
}

// =============================================================================
// Memory Sink
// =============================================================================

/// Sink that keeps every line it is given
#[derive(Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines written so far
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }
}

#[async_trait]
impl MetricsSink for MemorySink {
    async fn write(&self, line: &str) -> Result<()> {
        self.lines.lock().push(line.to_string());
        Ok(())
    }

    fn endpoint(&self) -> &str {
        "memory"
    }
}
