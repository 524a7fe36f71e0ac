use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::config::PassthroughConfiguration;
use super::error::PassthroughError;

/// Counters kept by the copy loop.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineDiagnostics {
    pub iterations: u64,
    /// Iterations whose capture read returned nothing.
    pub idle_polls: u64,
    pub bytes_read: u64,
    pub bytes_written: u64,
    /// Bytes read from capture that playback had no room for.
    pub bytes_dropped: u64,
    pub short_writes: u64,
    /// Peak of the most recent non-empty chunk, 0.0–1.0 of full scale.
    pub peak_level: f32,
}

/// Report produced when a passthrough session stops.
///
/// Serializable for export as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineSummary {
    pub id: String,
    pub started_at: String,
    pub stopped_at: String,
    pub duration_secs: f64,
    pub config: PassthroughConfiguration,
    pub diagnostics: PipelineDiagnostics,
}

impl PipelineSummary {
    pub fn new(
        config: PassthroughConfiguration,
        started_at: DateTime<Utc>,
        diagnostics: PipelineDiagnostics,
    ) -> Self {
        let stopped_at = Utc::now();
        let duration_secs = (stopped_at - started_at).num_milliseconds().max(0) as f64 / 1000.0;
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            started_at: started_at.to_rfc3339(),
            stopped_at: stopped_at.to_rfc3339(),
            duration_secs,
            config,
            diagnostics,
        }
    }

    pub fn to_json_pretty(&self) -> Result<String, PassthroughError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| PassthroughError::Configuration(format!("failed to serialize summary: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_round_trips_through_json() {
        let diagnostics = PipelineDiagnostics {
            iterations: 10,
            bytes_read: 4000,
            bytes_written: 3000,
            bytes_dropped: 1000,
            short_writes: 1,
            ..Default::default()
        };
        let summary = PipelineSummary::new(PassthroughConfiguration::default(), Utc::now(), diagnostics);

        let json = summary.to_json_pretty().unwrap();
        let parsed: PipelineSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, summary);
        assert_eq!(parsed.diagnostics.bytes_dropped, 1000);
    }

    #[test]
    fn summary_ids_are_unique() {
        let a = PipelineSummary::new(PassthroughConfiguration::default(), Utc::now(), Default::default());
        let b = PipelineSummary::new(PassthroughConfiguration::default(), Utc::now(), Default::default());
        assert_ne!(a.id, b.id);
        assert!(a.duration_secs >= 0.0);
    }
}
