use std::future::Future;
use std::path::PathBuf;

use clap::Parser;
use tokio_util::sync::CancellationToken;

use super::error::AppError;

/// Listen to a named event stream, optionally decode payloads against a
/// registry schema, and write the results to disk.
#[derive(Parser, Debug)]
#[command(name = "streamtap", version, about)]
pub struct ListenArgs {
    /// Stream to listen to.
    #[arg(long)]
    pub stream: String,

    /// Schema registry lookup key (defaults to the stream name).
    #[arg(long)]
    pub schema: Option<String>,

    /// Decode payloads and write decoded artifacts alongside raw ones.
    #[arg(long)]
    pub decode: bool,

    /// Extra field names added to the summary projection.
    #[arg(long, value_delimiter = ',')]
    pub pluck: Vec<String>,

    /// Resume reading from this event time.
    #[arg(long, conflicts_with = "latest")]
    pub timestamp: Option<String>,

    /// Read only records arriving after startup.
    #[arg(long, conflicts_with = "timestamp")]
    pub latest: bool,

    /// Stop the whole run once a record at or after this event time is seen.
    #[arg(long = "timestampstop")]
    pub timestamp_stop: Option<String>,

    /// Aggregate decoded records into a CSV file at this path.
    #[arg(long = "tocsv")]
    pub to_csv: Option<PathBuf>,

    /// Accumulate raw records into an event notification document at this
    /// path.
    #[arg(long = "toEvent")]
    pub to_event: Option<PathBuf>,

    /// Credential profile for the stream service.
    #[arg(long, default_value = "nypl-sandbox")]
    pub profile: String,

    /// Stream service region.
    #[arg(long, default_value = "us-east-1")]
    pub region: String,

    /// Destination directory for per-record artifacts.
    #[arg(long, default_value = "data")]
    pub outdir: PathBuf,
}

/// CLI application runner that handles:
/// - Signal handling (SIGINT, SIGTERM, SIGHUP)
/// - Graceful shutdown via a shared cancellation token
/// - Exit codes (0 = success/stopped, 1 = fatal startup error, 128+n on
///   signal n)
pub struct CliApp {
    _name: String,
    cancel: CancellationToken,
}

impl CliApp {
    pub fn new(name: &str, cancel: CancellationToken) -> Self {
        Self {
            _name: name.to_string(),
            cancel,
        }
    }

    /// Run the application future, racing it against signal reception.
    ///
    /// On a signal the shared token is cancelled first, then the future is
    /// awaited to completion so pipelines can finish their in-flight batch
    /// writes and exports can flush.
    ///
    /// This function never returns - it calls std::process::exit with the
    /// appropriate code.
    pub async fn run<Fut>(self, main_fut: Fut) -> !
    where
        Fut: Future<Output = Result<(), AppError>>,
    {
        tokio::pin!(main_fut);

        tokio::select! {
            result = &mut main_fut => {
                match result {
                    Ok(()) => std::process::exit(0),
                    Err(e) => {
                        eprintln!("Error: {e}");
                        std::process::exit(1);
                    }
                }
            }
            signal_code = Self::wait_for_signal() => {
                self.cancel.cancel();
                let _ = main_fut.await;
                std::process::exit(signal_code);
            }
        }
    }

    /// Wait for any Unix signal (SIGINT, SIGTERM, SIGHUP) or Ctrl+C.
    /// Returns the exit code to use (130 for SIGINT, 143 for SIGTERM, etc.)
    async fn wait_for_signal() -> i32 {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};

            let mut sigterm =
                signal(SignalKind::terminate()).expect("Failed to setup SIGTERM handler");
            let mut sigint =
                signal(SignalKind::interrupt()).expect("Failed to setup SIGINT handler");
            let mut sighup = signal(SignalKind::hangup()).expect("Failed to setup SIGHUP handler");

            tokio::select! {
                _ = sigterm.recv() => {
                    eprintln!("Received SIGTERM");
                    143 // 128 + 15
                }
                _ = sigint.recv() => {
                    eprintln!("Received SIGINT");
                    130 // 128 + 2
                }
                _ = sighup.recv() => {
                    eprintln!("Received SIGHUP");
                    129 // 128 + 1
                }
            }
        }

        #[cfg(not(unix))]
        {
            tokio::signal::ctrl_c()
                .await
                .expect("Failed to setup Ctrl+C handler");
            eprintln!("Received Ctrl+C");
            130
        }
    }
}
