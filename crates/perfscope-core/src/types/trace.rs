//! Trace events emitted by the instrumentation agent.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Whether an event marks the start or the end of a method invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    Enter,
    Exit,
}

impl EventKind {
    /// Parse a wire marker. Accepts the compact `S`/`E` markers written by the
    /// agent and the `ENTER`/`EXIT` spelling of already-expanded traces.
    pub fn from_marker(marker: &str) -> Option<Self> {
        match marker {
            "S" | "ENTER" => Some(Self::Enter),
            "E" | "EXIT" => Some(Self::Exit),
            _ => None,
        }
    }

    /// The compact wire marker.
    pub fn marker(&self) -> &'static str {
        match self {
            Self::Enter => "S",
            Self::Exit => "E",
        }
    }
}

/// One ENTER or EXIT event with an absolute (offset-corrected) timestamp in
/// nanoseconds and a de-hashed method signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceEvent {
    pub timestamp: i64,
    pub kind: EventKind,
    pub method: String,
}

impl TraceEvent {
    pub fn enter(timestamp: i64, method: impl Into<String>) -> Self {
        Self {
            timestamp,
            kind: EventKind::Enter,
            method: method.into(),
        }
    }

    pub fn exit(timestamp: i64, method: impl Into<String>) -> Self {
        Self {
            timestamp,
            kind: EventKind::Exit,
            method: method.into(),
        }
    }
}

impl fmt::Display for TraceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} {}", self.timestamp, self.kind.marker(), self.method)
    }
}
