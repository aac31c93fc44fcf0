use std::io;
use std::net::SocketAddr;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use roster::api;
use roster::cli;
use roster::directory::{load_directory_file, Directory};
use roster::node::MembershipNode;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "roster=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Parse args and env vars
    let args = cli::Cli::parse();

    let directory = Directory::from_entries(load_directory_file(&args.nodes_file)?);
    if directory.is_empty() {
        anyhow::bail!("No nodes found in {}", args.nodes_file.display());
    }

    // Node identity comes from the command line or the operator
    let node_id = match args.node_id {
        Some(node_id) => node_id,
        None => cli::prompt_for_node_id(&directory, io::stdin().lock(), io::stdout())?,
    };
    let settings = args.into_settings(node_id);
    settings.validate()?;

    let node = MembershipNode::start(&settings, directory).await?;

    if let Some(status_port) = settings.status_port {
        let socket_address = SocketAddr::new(settings.listen_address, status_port);
        let app = api::api(api::AppState::from_node(&node));
        let shutdown = node.shutdown_token();
        let builder = axum::Server::try_bind(&socket_address)?;
        info!("Starting status API on {}", socket_address);
        tokio::spawn(async move {
            let server = builder
                .serve(app.into_make_service())
                .with_graceful_shutdown(async move { shutdown.cancelled().await });
            if let Err(e) = server.await {
                error!("Status API failed: {}", e);
            }
        });
    }

    tokio::signal::ctrl_c().await?;
    info!("Received interrupt");
    node.shutdown().await?;

    Ok(())
}
