use std::sync::Arc;

use futures::future::join_all;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::aggregator::{Aggregator, AggregatorConfig};
use super::pipeline::{PipelineEnd, ShardPipeline};
use crate::app::{AppError, ListenerConfig};
use crate::engine::RecordProcessor;
use crate::io::RecordSink;
use crate::schema::{SchemaRegistry, SchemaResolver};
use crate::transport::{ShardReader, StreamTransport};

/// How the run as a whole finished.
#[derive(Debug)]
pub struct RunSummary {
    pub shards: Vec<(String, PipelineEnd)>,
}

impl RunSummary {
    /// True when any pipeline observed the global stop.
    pub fn stopped(&self) -> bool {
        self.shards
            .iter()
            .any(|(_, end)| *end == PipelineEnd::Stopped)
    }

    /// Shards that ended with a persistent failure.
    pub fn fatal_shards(&self) -> Vec<&str> {
        self.shards
            .iter()
            .filter(|(_, end)| *end == PipelineEnd::Fatal)
            .map(|(shard, _)| shard.as_str())
            .collect()
    }
}

/// Top-level driver: resolves the schema once, enumerates shards once, then
/// fans out to one independently-advancing pipeline per shard, all feeding a
/// single aggregator task.
///
/// Startup failures (schema fetch, stream not found) abort before any
/// pipeline starts. After startup, a pipeline failure is isolated to its
/// shard; the run ends when every pipeline has ended or immediately on the
/// global stop.
pub struct StreamOrchestrator<T: StreamTransport + 'static> {
    transport: Arc<T>,
    config: ListenerConfig,
}

impl<T: StreamTransport + 'static> StreamOrchestrator<T> {
    pub fn new(transport: Arc<T>, config: ListenerConfig) -> Self {
        Self { transport, config }
    }

    pub async fn run<R: SchemaRegistry>(
        self,
        registry: R,
        cancel: CancellationToken,
    ) -> Result<RunSummary, AppError> {
        let decoder = if self.config.decode {
            Some(
                SchemaResolver::new(registry)
                    .resolve(&self.config.schema_name)
                    .await?,
            )
        } else {
            None
        };

        let shards = self.transport.list_shards(&self.config.stream).await?;
        info!(
            stream = %self.config.stream,
            shards = shards.len(),
            decode = self.config.decode,
            "starting shard pipelines"
        );

        let sink = RecordSink::new(&self.config.outdir, &self.config.stream);
        sink.ensure_dir().await?;

        let (aggregator, aggregator_task) = Aggregator::spawn(
            AggregatorConfig {
                stream: self.config.stream.clone(),
                region: self.config.region.clone(),
                envelope_path: self.config.envelope_path.clone(),
                csv_path: self.config.csv_path.clone(),
                csv_flush_every: self.config.csv_flush_every,
            },
            cancel.clone(),
        );

        // Safety valve against an indefinitely long-lived consumer: the
        // session deadline cancels every pipeline.
        let deadline = self.config.session_duration;
        let deadline_cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(deadline) => {
                    info!("session deadline reached, stopping all pipelines");
                    deadline_cancel.cancel();
                }
                _ = deadline_cancel.cancelled() => {}
            }
        });

        let mut handles = Vec::with_capacity(shards.len());
        for shard in &shards {
            let reader = ShardReader::new(
                Arc::clone(&self.transport),
                &self.config.stream,
                shard,
                self.config.position,
                self.config.page_limit,
            );
            let processor = RecordProcessor::new(
                self.config.schema_name.clone(),
                decoder.clone(),
                self.config.pluck.clone(),
                self.config.stop_at,
                sink.clone(),
                aggregator.clone(),
                cancel.clone(),
            );
            let pipeline = ShardPipeline::new(reader, processor, cancel.clone());
            handles.push((shard.clone(), tokio::spawn(pipeline.run())));
        }

        let (shards, tasks): (Vec<_>, Vec<_>) = handles.into_iter().unzip();
        let ends: Vec<(String, PipelineEnd)> = shards
            .into_iter()
            .zip(join_all(tasks).await)
            .map(|(shard, end)| {
                let end = end.unwrap_or(PipelineEnd::Fatal);
                info!(shard = %shard, end = ?end, "pipeline ended");
                (shard, end)
            })
            .collect();

        // Closing the channel lets the aggregator drain and run its final
        // CSV flush.
        drop(aggregator);
        let _ = aggregator_task.await;

        Ok(RunSummary { shards: ends })
    }
}
