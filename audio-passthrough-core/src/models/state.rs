use serde::{Deserialize, Serialize};

/// Which way audio flows through a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamDirection {
    Capture,
    Playback,
}

/// Endpoint lifecycle.
///
/// State transitions:
/// ```text
/// unconfigured → queue_allocated → format_set → started → running
///                                                  ↓         ↓
///                                                  └──→ stopped
/// ```
///
/// `Started` means the driver owns the producer/consumer side of the queue;
/// `Running` means the copy loop owns the application side. No state is
/// ever revisited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndpointState {
    Unconfigured,
    QueueAllocated,
    FormatSet,
    Started,
    Running,
    Stopped,
}

impl EndpointState {
    pub fn can_transition_to(self, next: EndpointState) -> bool {
        use EndpointState::*;
        matches!(
            (self, next),
            (Unconfigured, QueueAllocated)
                | (QueueAllocated, FormatSet)
                | (FormatSet, Started)
                | (Started, Running)
                | (Started, Stopped)
                | (Running, Stopped)
        )
    }

    /// Whether the driver is moving data through the queue.
    pub fn is_streaming(self) -> bool {
        matches!(self, Self::Started | Self::Running)
    }

    pub fn is_stopped(self) -> bool {
        matches!(self, Self::Stopped)
    }
}
