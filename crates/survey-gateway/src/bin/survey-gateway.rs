//! Survey Gateway Binary
//!
//! Serves the survey submission endpoint.
//!
//! # Usage
//! ```bash
//! BUCKET_NAME=survey-answers RECAPTCHA_PRIVATE_KEY=... survey-gateway [--port 8080] [--verbose]
//! ```

use anyhow::Context;
use clap::Parser;
use survey_gateway::{Gateway, GatewayConfig, StorageBackend};
use tracing_subscriber::EnvFilter;

/// Survey Gateway - verifies and stores survey submissions
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Bucket the answers are written to
    #[arg(long, env = "BUCKET_NAME")]
    bucket: String,

    /// reCAPTCHA site secret (empty disables verification)
    #[arg(long, env = "RECAPTCHA_PRIVATE_KEY", default_value = "", hide_env_values = true)]
    recaptcha_private_key: String,

    /// Token value that skips verification
    #[arg(long, env = "RECAPTCHA_BYPASS", default_value = "", hide_env_values = true)]
    recaptcha_bypass: String,

    /// Origin allowed to call the endpoint
    #[arg(long, env = "ALLOWED_ORIGIN", default_value = survey_gateway::DEFAULT_ORIGIN)]
    allowed_origin: String,

    /// Host to bind to
    #[arg(long, env = "HOST", default_value = survey_gateway::DEFAULT_HOST)]
    host: String,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = survey_gateway::DEFAULT_PORT)]
    port: u16,

    /// Storage backend
    #[arg(long, env = "STORAGE_BACKEND", value_enum, default_value_t = StorageBackend::Gcs)]
    storage: StorageBackend,

    /// Root directory for the local storage backend
    #[arg(long, env = "STORAGE_ROOT", default_value = "./data")]
    storage_root: String,

    /// Cloud Storage emulator `host:port`
    #[arg(long, env = "STORAGE_EMULATOR_HOST")]
    storage_emulator_host: Option<String>,

    /// Static bearer token for Cloud Storage (metadata server otherwise)
    #[arg(long, env = "STORAGE_ACCESS_TOKEN", hide_env_values = true)]
    storage_access_token: Option<String>,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn into_config(self) -> GatewayConfig {
        let mut config = GatewayConfig::new()
            .with_host(self.host)
            .with_port(self.port)
            .with_allowed_origin(self.allowed_origin)
            .with_bucket(self.bucket)
            .with_storage_backend(self.storage)
            .with_private_key(self.recaptcha_private_key)
            .with_bypass(self.recaptcha_bypass);

        config.storage.local_root = self.storage_root;
        config.storage.emulator_host = self.storage_emulator_host.filter(|h| !h.is_empty());
        config.storage.access_token = self.storage_access_token.filter(|t| !t.is_empty());
        config
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    // Initialize logging
    let default_level = if args.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    if args.verbose {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }

    let config = args.into_config();
    let gateway = Gateway::new(config.clone()).context("failed to initialise gateway")?;

    print_banner(&config);

    let signals = gateway.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        signals.shutdown();
    });

    gateway.start().await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

fn print_banner(config: &GatewayConfig) {
    println!();
    println!("Survey Gateway v{}", survey_gateway::VERSION);
    println!("─────────────────────────────────────────────");
    println!("  Endpoint       http://{}:{}/", config.host, config.port);
    println!("  Allowed origin {}", config.allowed_origin);
    println!(
        "  Storage        {} bucket {:?}",
        config.storage.backend, config.storage.bucket
    );
    println!(
        "  reCAPTCHA      {}{}",
        if config.recaptcha.enabled() { "enabled" } else { "disabled" },
        if config.recaptcha.bypass.is_some() { " (bypass token set)" } else { "" }
    );
    println!("─────────────────────────────────────────────");
    println!("Press Ctrl+C to stop the gateway");
    println!();
}
