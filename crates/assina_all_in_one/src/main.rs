mod config;
mod telemetry;

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use assina_api::{api_router, ApiState};
use assina_domain::{
    ArtifactStore, CompletionNotifier, CreateEnvelopeService, EnvelopeRepository, EvidenceService,
    PdfComposer, ReconcileService, SignerRepository, SigningProvider, StampService, SweepService,
};
use assina_nats::{CompletionEventProducer, NatsArtifactStore, NatsClient};
use assina_pdf::LopdfComposer;
use assina_postgres::{PostgresClient, PostgresEnvelopeRepository, PostgresSignerRepository};
use assina_provider::BryProviderClient;
use config::ServiceConfig;
use sweep_worker::SweepWorker;

#[tokio::main]
async fn main() {
    let config = match ServiceConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    telemetry::init_telemetry(&config.log_level);

    info!(
        http_port = config.http_port,
        sweep_interval_secs = config.sweep_interval_secs,
        "Starting assina-all-in-one service"
    );

    if let Err(e) = run(config).await {
        error!("Service failed: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(config: ServiceConfig) -> anyhow::Result<()> {
    // Postgres
    let postgres = PostgresClient::connect(&config.postgres()).await?;
    postgres.ensure_schema().await?;

    // NATS: artifact bucket + completion stream
    let nats = NatsClient::connect(
        &config.nats_url,
        Duration::from_secs(config.nats_timeout_secs),
    )
    .await?;
    nats.ensure_stream(&config.completion_stream).await?;

    let artifact_store: Arc<dyn ArtifactStore> =
        Arc::new(NatsArtifactStore::new(nats.jetstream(), &config.artifact_bucket).await?);
    let notifier: Arc<dyn CompletionNotifier> = Arc::new(CompletionEventProducer::new(
        nats.jetstream().clone(),
        config.completion_stream.clone(),
    ));

    // Ports
    let envelope_repository: Arc<dyn EnvelopeRepository> =
        Arc::new(PostgresEnvelopeRepository::new(postgres.clone()));
    let signer_repository: Arc<dyn SignerRepository> =
        Arc::new(PostgresSignerRepository::new(postgres));
    let provider: Arc<dyn SigningProvider> = Arc::new(BryProviderClient::new(config.provider())?);
    let pdf: Arc<dyn PdfComposer> = Arc::new(LopdfComposer::new());

    // Services
    let reconcile = Arc::new(ReconcileService::new(
        envelope_repository.clone(),
        signer_repository.clone(),
        provider.clone(),
        artifact_store.clone(),
        notifier.clone(),
    ));
    let evidence = Arc::new(EvidenceService::new(
        envelope_repository.clone(),
        signer_repository.clone(),
        provider.clone(),
        artifact_store.clone(),
        pdf.clone(),
        config.verification_base_url.clone(),
    ));
    let stamp = Arc::new(StampService::new(
        envelope_repository.clone(),
        signer_repository.clone(),
        artifact_store.clone(),
        pdf,
        notifier,
        config.verification_base_url.clone(),
    ));
    let create = Arc::new(CreateEnvelopeService::new(
        envelope_repository.clone(),
        provider,
        artifact_store,
    ));
    let sweep = Arc::new(SweepService::new(
        envelope_repository,
        reconcile.clone(),
        config.sweep_batch_limit,
        Duration::from_millis(config.sweep_delay_ms),
    ));

    // Shutdown coordination
    let cancellation_token = CancellationToken::new();
    spawn_signal_handler(cancellation_token.clone());

    // HTTP server
    let router = api_router(ApiState::new(reconcile, evidence, stamp, create));
    let bind_addr = format!("{}:{}", config.http_host, config.http_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(addr = %bind_addr, "HTTP server listening");

    let http_token = cancellation_token.clone();
    let server = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async move { http_token.cancelled().await })
            .await
    });

    // Sweep worker
    let worker = SweepWorker::new(sweep, Duration::from_secs(config.sweep_interval_secs));
    let sweeper = tokio::spawn(worker.run(cancellation_token.clone()));

    let (server_result, sweeper_result) = tokio::join!(server, sweeper);
    server_result??;
    sweeper_result??;

    info!("Service stopped");
    Ok(())
}

fn spawn_signal_handler(cancellation_token: CancellationToken) {
    tokio::spawn(async move {
        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for SIGINT: {}", e);
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut signal) => {
                    signal.recv().await;
                }
                Err(e) => error!("Failed to listen for SIGTERM: {}", e),
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => info!("Received SIGINT, shutting down"),
            _ = terminate => info!("Received SIGTERM, shutting down"),
        }

        cancellation_token.cancel();
    });
}
