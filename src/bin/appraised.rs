//! appraised: Appraise daemon.
//!
//! Loads one performance model at startup and serves it over gRPC, so that
//! form front ends share a single loaded model.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tonic::transport::Server;
use tracing::{error, info};

use appraise::server::AppraiseService;
use appraise::server::config::Config;
use appraise::server::proto::appraisal_server::AppraisalServer;
use appraise::{Appraise, AppraiseError, ModelManager, ModelManagerConfig, ModelSource};

/// Appraise daemon: performance rating inference service.
#[derive(Parser)]
#[command(name = "appraised")]
#[command(version = appraise::PKG_VERSION)]
#[command(about = "Appraise performance rating daemon")]
struct Args {
    /// Path to configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Model artifact path or http(s) URL; overrides `[model]` in the config.
    #[arg(short, long, env = "APPRAISE_MODEL")]
    model: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    // A model on the command line is enough to run without a config file.
    let config = match args.model {
        Some(_) => Config::load_or_default(args.config.as_deref())?,
        None => Config::load(args.config.as_deref())?,
    };

    let source = match args.model.as_deref() {
        Some(model) => source_from_arg(model),
        None => config.model.source()?,
    };

    let mut manager_config = ModelManagerConfig::default();
    if let Some(dir) = &config.model.cache_dir {
        manager_config.cache_dir = dir.clone();
    }
    let manager = ModelManager::new(manager_config);

    // Fail before binding when the model cannot be loaded.
    let handle = manager.load_source(&source).await.inspect_err(|e| {
        error!(error = %e, ?source, "failed to load model");
    })?;

    let mut builder = Appraise::builder().handle(handle);
    if let Some(cache) = config.cache.to_cache_config() {
        builder = builder.prediction_cache(cache);
    }
    let predictor = builder.build()?;

    let addr: SocketAddr = config
        .server
        .address
        .parse()
        .map_err(|e| AppraiseError::Configuration(format!("Invalid address: {e}")))?;

    info!(
        version = appraise::version_string(),
        model = predictor.handle().id(),
        %addr,
        "appraised starting"
    );

    let limits = &config.server.limits;
    let service = AppraiseService::new(Arc::new(predictor));

    Server::builder()
        .concurrency_limit_per_connection(limits.max_concurrent_requests)
        .timeout(Duration::from_secs(limits.request_timeout_secs))
        .add_service(AppraisalServer::new(service))
        .serve_with_shutdown(addr, async {
            let _ = tokio::signal::ctrl_c().await;
            info!("appraised shutting down");
        })
        .await?;

    Ok(())
}

fn source_from_arg(model: &str) -> ModelSource {
    if model.starts_with("http://") || model.starts_with("https://") {
        ModelSource::remote(model)
    } else {
        ModelSource::local(model)
    }
}
