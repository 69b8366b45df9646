//! Transaction Sentinel - Main Entry Point
//!
//! Runs the simulated ingestion pipeline. With NATS enabled, cycle reports
//! are published for the dashboard and control commands are accepted on
//! the control subject.

use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};
use transaction_sentinel::{
    classifier::{ClassifierOrchestrator, HttpClassifier, OfflineClassifier, RiskClassifier},
    config::{AppConfig, LoggingConfig},
    consumer::ControlConsumer,
    metrics::{MetricsReporter, PipelineMetrics},
    pipeline::Pipeline,
    producer::ReportProducer,
    scheduler::IngestionScheduler,
};

fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| {
            tracing_subscriber::EnvFilter::try_new(format!(
                "transaction_sentinel={}",
                logging.level
            ))
        })?;

    if logging.format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = AppConfig::load()?;
    init_logging(&config.logging)?;

    info!("Starting Transaction Sentinel");
    info!(
        fraud_probability = config.simulation.fraud_probability,
        rate_per_second = config.simulation.rate_per_second,
        rules = config.rules.len(),
        "Configuration loaded"
    );

    // Initialize metrics
    let metrics = Arc::new(PipelineMetrics::new());

    // External classifier, or the offline stand-in
    let classifier: Arc<dyn RiskClassifier> = match &config.classifier.endpoint {
        Some(endpoint) => {
            let classifier = HttpClassifier::new(
                endpoint,
                config.classifier.api_key(),
                config.classifier.timeout(),
            )?;
            info!(endpoint = %classifier.endpoint(), "Using HTTP risk classifier");
            Arc::new(classifier)
        }
        None => {
            warn!("No classifier endpoint configured; escalations will use the fallback verdict");
            Arc::new(OfflineClassifier)
        }
    };
    let orchestrator = ClassifierOrchestrator::new(classifier, config.classifier.timeout());

    let pipeline = Arc::new(Pipeline::new(
        config.shared_settings()?,
        orchestrator,
        metrics.clone(),
        config.simulation.seed,
    ));
    let scheduler = Arc::new(IngestionScheduler::new(
        pipeline.clone(),
        config.simulation.rate_per_second,
    )?);

    // Start metrics reporter
    let reporter = MetricsReporter::new(metrics.clone(), config.metrics.report_interval_secs);
    tokio::spawn(reporter.start());

    // Presentation boundary over NATS
    if config.nats.enabled {
        match async_nats::connect(&config.nats.url).await {
            Ok(client) => {
                info!("Connected to NATS at {}", config.nats.url);

                let producer = ReportProducer::new(client.clone(), &config.nats.report_subject);
                tokio::spawn(producer.run(scheduler.subscribe()));

                let consumer = ControlConsumer::new(client, &config.nats.control_subject);
                let control_scheduler = scheduler.clone();
                tokio::spawn(async move {
                    if let Err(e) = consumer.run(control_scheduler).await {
                        warn!(error = %e, "Control consumer stopped");
                    }
                });
            }
            Err(e) => {
                warn!(error = %e, "Failed to connect to NATS, running without presentation boundary");
            }
        }
    }

    if config.simulation.autostart {
        scheduler.start(scheduler.rate())?;
    } else {
        info!("Autostart disabled, waiting for a start command");
    }

    tokio::signal::ctrl_c().await?;

    info!("Pipeline shutting down...");
    scheduler.stop().await;

    let stats = pipeline.stats();
    info!(
        total_volume = stats.total_volume,
        fraud_rate = stats.fraud_rate,
        blocked_attempts = stats.blocked_attempts,
        active_alerts = stats.active_alerts,
        "Final dashboard statistics"
    );
    metrics.print_summary();

    Ok(())
}
