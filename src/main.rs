use std::sync::Arc;

use aws_config::{BehaviorVersion, Region};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use streamtap::prelude::*;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = ListenArgs::parse();
    let cancel = CancellationToken::new();

    CliApp::new("streamtap", cancel.clone())
        .run(listen(args, cancel))
        .await
}

/// Main application logic - validates configuration, wires the external
/// collaborators, and drives the orchestrator to completion.
async fn listen(args: ListenArgs, cancel: CancellationToken) -> Result<(), AppError> {
    let config = ListenerConfig::from_args(args)?;

    let aws_config = aws_config::defaults(BehaviorVersion::latest())
        .profile_name(&config.profile)
        .region(Region::new(config.region.clone()))
        .load()
        .await;
    let transport = Arc::new(KinesisTransport::new(aws_sdk_kinesis::Client::new(
        &aws_config,
    )));
    let registry = HttpSchemaRegistry::default();

    let summary = StreamOrchestrator::new(transport, config)
        .run(registry, cancel)
        .await?;

    if summary.stopped() {
        info!("run stopped at boundary");
    }
    for shard in summary.fatal_shards() {
        info!(shard, "shard ended with a persistent failure");
    }
    info!("all done");
    Ok(())
}
