//! Core types for the order service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Counts of ingested payloads by outcome
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestStats {
    /// Persisted and cached
    pub processed: u64,
    /// Could not be decoded
    pub malformed: u64,
    /// Decoded but rejected by validation
    pub invalid: u64,
    /// Valid, but the durable write failed
    pub failed: u64,
}

/// A cached order as listed by the cache diagnostics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CachedOrder {
    pub order_uid: String,
    pub cached_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ingest_stats_default() {
        let stats = IngestStats::default();
        assert_eq!(stats.processed, 0);
        assert_eq!(stats.malformed, 0);
        assert_eq!(stats.invalid, 0);
        assert_eq!(stats.failed, 0);
    }

    #[test]
    fn test_ingest_stats_serialization() {
        let stats = IngestStats {
            processed: 42,
            malformed: 1,
            invalid: 2,
            failed: 0,
        };
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["processed"], 42);
        assert_eq!(json["malformed"], 1);
        assert_eq!(json["invalid"], 2);
        assert_eq!(json["failed"], 0);
    }
}
