use civic_reports_core::core::config::Config;
use civic_reports_core::core::database;
use civic_reports_core::features::notifications::{
    NotificationService, NotificationSink, PgNotificationRepository,
};
use civic_reports_core::features::reports::{
    CapabilityReconciler, CapabilityReconcilerWorker, LifecycleEngine, PgReportStore, ReportStore,
};
use civic_reports_core::features::staff::{CapabilityListener, Directory, PgDirectory};
use civic_reports_core::modules::mail::{HttpMailer, Mailer};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    // Build Tokio runtime with configurable worker threads
    let worker_threads = std::env::var("TOKIO_WORKER_THREADS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(4)
        });

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(worker_threads)
        .enable_all()
        .build()?;

    runtime.block_on(async_main(worker_threads))
}

async fn async_main(worker_threads: usize) -> anyhow::Result<()> {
    // Load .env file BEFORE initializing logger so RUST_LOG is available
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;

    tracing::info!(
        "Starting civic reports engine: tokio_worker_threads={}, pid={}",
        worker_threads,
        std::process::id()
    );

    let pool = database::create_pool(&config.database).await?;
    database::run_migrations(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("Migration failed: {}", e))?;

    let store: Arc<dyn ReportStore> = Arc::new(PgReportStore::new(pool.clone()));
    let directory: Arc<dyn Directory> = Arc::new(PgDirectory::new(pool.clone()));

    let mailer: Option<Arc<dyn Mailer>> = match HttpMailer::from_config(&config.mail)? {
        Some(mailer) => {
            tracing::info!("E-mail notifications enabled");
            Some(Arc::new(mailer) as Arc<dyn Mailer>)
        }
        None => {
            tracing::info!("MAIL_API_URL not set; e-mail notifications disabled");
            None
        }
    };

    let sink: Arc<dyn NotificationSink> = Arc::new(NotificationService::new(
        Arc::new(PgNotificationRepository::new(pool.clone())),
        mailer,
        config.notifications.clone(),
    ));

    let engine = Arc::new(LifecycleEngine::new(
        Arc::clone(&store),
        Arc::clone(&directory),
        sink,
    ));
    let reconciler = Arc::new(CapabilityReconciler::new(
        engine,
        Arc::clone(&store),
        Arc::clone(&directory),
    ));
    tracing::info!("Lifecycle engine and reconciler initialized");

    let (events_tx, events_rx) = mpsc::unbounded_channel();

    let listener = CapabilityListener::new(pool.clone(), config.reconciler.channel.clone(), events_tx);
    let listener_handle = tokio::spawn(listener.run());

    let worker = CapabilityReconcilerWorker::new(
        reconciler,
        events_rx,
        config.reconciler.sweep_interval,
    );
    let worker_handle = tokio::spawn(worker.run());
    tracing::info!("Capability reconciler worker spawned");

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");

    listener_handle.abort();
    worker_handle.abort();
    pool.close().await;

    tracing::info!("Shutdown complete");
    Ok(())
}
