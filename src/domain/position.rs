use chrono::{DateTime, Utc};

/// Where to begin reading a shard.
///
/// Chosen once at startup and fixed for the whole session. `AtTimestamp`
/// resumes from the first record at or after the given event time; it is
/// mutually exclusive with the other two variants by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamPosition {
    /// Earliest retained position in the shard's retention window.
    TrimHorizon,
    /// Only records arriving after the session opens.
    Latest,
    /// First record at or after the given event time.
    AtTimestamp(DateTime<Utc>),
}

impl StreamPosition {
    /// Derive the position from an optional resume timestamp.
    pub fn from_resume(timestamp: Option<DateTime<Utc>>) -> Self {
        match timestamp {
            Some(t) => StreamPosition::AtTimestamp(t),
            None => StreamPosition::TrimHorizon,
        }
    }
}

/// Opaque per-shard read position token.
///
/// Returned by the transport after each page fetch and handed back to
/// request the next page. Owned by exactly one `ShardReader`; never shared
/// across shards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardCursor(String);

impl ShardCursor {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn token(&self) -> &str {
        &self.0
    }
}
