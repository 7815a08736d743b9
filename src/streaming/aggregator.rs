use std::path::PathBuf;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::domain::{DecodedRecord, RawRecord};
use crate::io::{CsvAccumulator, EnvelopeAccumulator, SinkError};

/// Work items for the aggregator task.
#[derive(Debug)]
pub enum AggregatorMsg {
    Envelope { shard: String, record: RawRecord },
    CsvRow(Option<DecodedRecord>),
    BatchEnd,
    FlushCsv,
}

/// Cheap, cloneable sender handed to every shard pipeline.
///
/// Send failures are ignored: they only happen while the run is shutting
/// down and the aggregator has already drained.
#[derive(Clone)]
pub struct AggregatorHandle {
    tx: mpsc::Sender<AggregatorMsg>,
    csv_enabled: bool,
    envelope_enabled: bool,
}

impl AggregatorHandle {
    pub fn new(tx: mpsc::Sender<AggregatorMsg>, csv_enabled: bool, envelope_enabled: bool) -> Self {
        Self {
            tx,
            csv_enabled,
            envelope_enabled,
        }
    }

    pub fn csv_enabled(&self) -> bool {
        self.csv_enabled
    }

    pub fn envelope_enabled(&self) -> bool {
        self.envelope_enabled
    }

    pub async fn envelope(&self, shard: &str, record: RawRecord) {
        let _ = self
            .tx
            .send(AggregatorMsg::Envelope {
                shard: shard.to_string(),
                record,
            })
            .await;
    }

    pub async fn csv_row(&self, row: Option<DecodedRecord>) {
        let _ = self.tx.send(AggregatorMsg::CsvRow(row)).await;
    }

    pub async fn batch_end(&self) {
        let _ = self.tx.send(AggregatorMsg::BatchEnd).await;
    }

    pub async fn flush_csv(&self) {
        let _ = self.tx.send(AggregatorMsg::FlushCsv).await;
    }
}

#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    pub stream: String,
    pub region: String,
    pub envelope_path: Option<PathBuf>,
    pub csv_path: Option<PathBuf>,
    /// Rewrite the CSV export every this many observed batches.
    pub csv_flush_every: u64,
}

/// Single writer for the two run-wide accumulations (envelope document and
/// CSV export). All shard pipelines feed it through a channel, so no lock
/// sits inside record-processing code.
///
/// The envelope file is rewritten in full after every non-empty batch; the
/// CSV file every `csv_flush_every` batches, on request, and once when the
/// channel closes at end of run.
pub struct Aggregator {
    config: AggregatorConfig,
    rx: mpsc::Receiver<AggregatorMsg>,
    cancel: CancellationToken,
    envelope: EnvelopeAccumulator,
    csv: CsvAccumulator,
    batches_seen: u64,
}

impl Aggregator {
    pub fn spawn(
        config: AggregatorConfig,
        cancel: CancellationToken,
    ) -> (AggregatorHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(1024);
        let handle = AggregatorHandle::new(
            tx,
            config.csv_path.is_some(),
            config.envelope_path.is_some(),
        );
        let envelope = EnvelopeAccumulator::new(&config.stream, &config.region);
        let aggregator = Self {
            config,
            rx,
            cancel,
            envelope,
            csv: CsvAccumulator::new(),
            batches_seen: 0,
        };
        (handle, tokio::spawn(aggregator.run()))
    }

    async fn run(mut self) {
        while let Some(msg) = self.rx.recv().await {
            if let Err(e) = self.handle(msg).await {
                // A failed export write poisons the run: no point reading
                // records whose aggregation can no longer be persisted.
                error!(error = %e, "export write failed, stopping run");
                self.cancel.cancel();
                return;
            }
        }

        if let Err(e) = self.flush_csv().await {
            error!(error = %e, "final CSV flush failed");
        }
    }

    async fn handle(&mut self, msg: AggregatorMsg) -> Result<(), SinkError> {
        match msg {
            AggregatorMsg::Envelope { shard, record } => {
                self.envelope.push(shard, record);
            }
            AggregatorMsg::CsvRow(row) => {
                self.csv.push(row);
            }
            AggregatorMsg::BatchEnd => {
                self.batches_seen += 1;
                self.write_envelope().await?;
                if self.batches_seen % self.config.csv_flush_every == 0 {
                    self.flush_csv().await?;
                }
            }
            AggregatorMsg::FlushCsv => {
                self.flush_csv().await?;
            }
        }
        Ok(())
    }

    async fn write_envelope(&self) -> Result<(), SinkError> {
        let Some(path) = &self.config.envelope_path else {
            return Ok(());
        };
        let body = self.envelope.render()?;
        tokio::fs::write(path, body)
            .await
            .map_err(|e| SinkError::write(path.clone(), e))?;
        debug!(path = %path.display(), records = self.envelope.len(), "rewrote envelope");
        Ok(())
    }

    async fn flush_csv(&self) -> Result<(), SinkError> {
        let Some(path) = &self.config.csv_path else {
            return Ok(());
        };
        let body = self.csv.render()?;
        tokio::fs::write(path, body)
            .await
            .map_err(|e| SinkError::write(path.clone(), e))?;
        info!(path = %path.display(), rows = self.csv.len(), "flushed CSV export");
        Ok(())
    }
}
