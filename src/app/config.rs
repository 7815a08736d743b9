use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use super::cli::ListenArgs;
use super::error::AppError;
use crate::domain::StreamPosition;

/// Records fetched per shard read.
pub const DEFAULT_PAGE_LIMIT: usize = 100;

/// Wall-clock cap on a listening session.
pub const DEFAULT_SESSION_DURATION: Duration = Duration::from_secs(60 * 60);

/// Rewrite the CSV export every this many observed batches.
pub const DEFAULT_CSV_FLUSH_EVERY: u64 = 50;

/// Fully validated run configuration, lowered from the CLI surface before
/// any async work starts. Invalid input (an unparseable timestamp) is fatal
/// here, not later.
#[derive(Debug, Clone)]
pub struct ListenerConfig {
    pub stream: String,
    pub schema_name: String,
    pub decode: bool,
    pub pluck: Vec<String>,
    pub position: StreamPosition,
    pub stop_at: Option<DateTime<Utc>>,
    pub csv_path: Option<PathBuf>,
    pub envelope_path: Option<PathBuf>,
    pub profile: String,
    pub region: String,
    pub outdir: PathBuf,
    pub page_limit: usize,
    pub session_duration: Duration,
    pub csv_flush_every: u64,
}

impl ListenerConfig {
    pub fn from_args(args: ListenArgs) -> Result<Self, AppError> {
        let resume = args
            .timestamp
            .as_deref()
            .map(parse_timestamp)
            .transpose()?;
        let stop_at = args
            .timestamp_stop
            .as_deref()
            .map(parse_timestamp)
            .transpose()?;

        let position = if args.latest {
            StreamPosition::Latest
        } else {
            StreamPosition::from_resume(resume)
        };

        let schema_name = args.schema.unwrap_or_else(|| args.stream.clone());

        Ok(Self {
            stream: args.stream,
            schema_name,
            decode: args.decode,
            pluck: args.pluck,
            position,
            stop_at,
            csv_path: args.to_csv,
            envelope_path: args.to_event,
            profile: args.profile,
            region: args.region,
            outdir: args.outdir,
            page_limit: DEFAULT_PAGE_LIMIT,
            session_duration: DEFAULT_SESSION_DURATION,
            csv_flush_every: DEFAULT_CSV_FLUSH_EVERY,
        })
    }
}

/// Accepts RFC 3339, `YYYY-MM-DDTHH:MM:SS`, `YYYY-MM-DD HH:MM:SS`, or a
/// bare date. Naive inputs are interpreted as UTC.
pub fn parse_timestamp(input: &str) -> Result<DateTime<Utc>, AppError> {
    if let Ok(t) = DateTime::parse_from_rfc3339(input) {
        return Ok(t.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return Ok(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(naive.and_utc());
        }
    }
    Err(AppError::InvalidTimestamp(input.to_string()))
}
