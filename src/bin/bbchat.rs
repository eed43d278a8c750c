use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use bbchat::config::RelayConfig;
use bbchat::relay::RelayContext;
use bbchat::server::{create_app, ServerState};

#[derive(clap::Parser)]
struct Opts {
    /// Path to the relay configuration file. Defaults apply when omitted.
    #[arg(long, env = "BBCHAT_CONFIG")]
    config: Option<PathBuf>,

    /// Port on which the webhook server listens.
    #[arg(long, env = "PORT", default_value_t = 8080)]
    port: u16,
}

async fn server(state: ServerState, port: u16) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Cannot bind to {addr}"))?;
    tracing::info!("Listening on {addr}");
    axum::serve(listener, create_app(state)).await?;
    Ok(())
}

fn try_main(opts: Opts) -> anyhow::Result<()> {
    let config = match &opts.config {
        Some(path) => RelayConfig::load(path)
            .with_context(|| format!("Cannot load configuration from {}", path.display()))?,
        None => RelayConfig::default(),
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Cannot build tokio runtime")?;

    let state = ServerState::new(RelayContext::new(config));
    runtime.block_on(server(state, opts.port))
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let opts = Opts::parse();
    if let Err(error) = try_main(opts) {
        eprintln!("Error: {error:?}");
        std::process::exit(1);
    }
}
