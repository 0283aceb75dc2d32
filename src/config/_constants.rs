use std::time::Duration;

pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_millis(100); // Deadline handed to the scheduler when a set gives none
pub const DEFAULT_IDLE_DELAY: Duration = Duration::from_millis(5); // How long the tokio scheduler waits before treating the runtime as idle
pub const DEFAULT_IDLE_SLICE: Duration = Duration::from_millis(50); // Idle time reported to callbacks that did not time out
pub const DEFAULT_LOG_FILE: &str = "deferkv.log";
