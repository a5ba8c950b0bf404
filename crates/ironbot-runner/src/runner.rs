//! Runner configuration and output types.

use tokio::sync::mpsc;

/// Output line from step execution.
#[derive(Debug, Clone)]
pub struct OutputLine {
    pub stream: OutputStream,
    pub content: String,
    pub line_number: u32,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Output stream type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

/// Configuration for command execution.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub timeout_seconds: Option<u64>,
    /// Extra attempts after a failed command. Defaults to none.
    pub retry_count: u32,
    pub retry_delay_ms: u64,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: Some(4 * 3600),
            retry_count: 0,
            retry_delay_ms: 1000,
        }
    }
}

/// Sender for streamed output. When absent, lines go to the log.
pub type OutputSink = Option<mpsc::Sender<OutputLine>>;
