//! Circuit lifecycle status.
//!
//! ```text
//!   Submitted ──→ Queued ──→ Running ──→ Completed
//!                   │           │
//!                   │           ├──→ Error(message)
//!                   └───────────┴──→ Cancelled
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stage a submitted circuit has reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusEnum {
    /// Results are ready.
    Completed,
    /// Waiting in the device queue.
    Queued,
    /// Accepted by the service.
    Submitted,
    /// Currently executing.
    Running,
    /// Cancelled by the user.
    Cancelled,
    /// Failed; see [`CircuitStatus::message`].
    Error,
}

impl StatusEnum {
    /// Human readable description.
    pub fn description(self) -> &'static str {
        match self {
            StatusEnum::Completed => "Circuit has completed. Results are ready.",
            StatusEnum::Queued => "Circuit is queued.",
            StatusEnum::Submitted => "Circuit has been submitted.",
            StatusEnum::Running => "Circuit is running.",
            StatusEnum::Cancelled => "Circuit has been cancelled.",
            StatusEnum::Error => "Circuit has errored. Check CircuitStatus.message for error message.",
        }
    }

    /// Check whether no further transition can happen.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            StatusEnum::Completed | StatusEnum::Cancelled | StatusEnum::Error
        )
    }
}

impl fmt::Display for StatusEnum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StatusEnum::Completed => "COMPLETED",
            StatusEnum::Queued => "QUEUED",
            StatusEnum::Submitted => "SUBMITTED",
            StatusEnum::Running => "RUNNING",
            StatusEnum::Cancelled => "CANCELLED",
            StatusEnum::Error => "ERROR",
        };
        f.write_str(name)
    }
}

/// Status of one circuit together with a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitStatus {
    /// Current stage.
    pub status: StatusEnum,
    /// Free-form detail, empty unless the backend has something to say.
    #[serde(default)]
    pub message: String,
}

impl CircuitStatus {
    /// Status with an empty message.
    pub fn new(status: StatusEnum) -> Self {
        Self {
            status,
            message: String::new(),
        }
    }

    /// Status with a message.
    pub fn with_message(status: StatusEnum, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl fmt::Display for CircuitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.status)
        } else {
            write!(f, "{}: {}", self.status, self.message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(StatusEnum::Completed.is_terminal());
        assert!(StatusEnum::Cancelled.is_terminal());
        assert!(StatusEnum::Error.is_terminal());
        assert!(!StatusEnum::Queued.is_terminal());
        assert!(!StatusEnum::Submitted.is_terminal());
        assert!(!StatusEnum::Running.is_terminal());
    }

    #[test]
    fn test_display() {
        assert_eq!(CircuitStatus::new(StatusEnum::Running).to_string(), "RUNNING");
        assert_eq!(
            CircuitStatus::with_message(StatusEnum::Error, "bad gate").to_string(),
            "ERROR: bad gate"
        );
    }
}
