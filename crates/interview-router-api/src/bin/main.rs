//! Interview Router entry point
//!
//! Serves model resolution for interview simulations while a background
//! monitor keeps model health fresh.

use clap::{Parser, Subcommand, ValueEnum};
use interview_router_api::build_components;
use interview_router_api::handler::{create_router, AppState};
use interview_router_core::RouterSettings;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "interview-router")]
#[command(about = "Interview Router - health-aware model selection for interview simulations")]
#[command(version)]
struct Cli {
    /// Settings file (YAML, TOML or JSON); built-in catalog when omitted
    #[arg(short, long, global = true, env = "ROUTER_CONFIG")]
    config: Option<PathBuf>,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value = "json")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Json,
    Pretty,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080", env = "PORT")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "0.0.0.0")]
        host: String,
    },

    /// Run one probe cycle and print the health table
    Check,

    /// Run one probe cycle and resolve a simulation
    Resolve {
        /// Simulation identifier
        simulation_id: String,
    },
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
    );

    match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let settings = RouterSettings::load(cli.config.as_deref())?;
    let (resolver, monitor) = build_components(&settings)?;

    match cli.command {
        Commands::Serve { port, host } => {
            let addr: SocketAddr = format!("{}:{}", host, port).parse()?;

            let handle = Arc::clone(&monitor).start().await;

            let state = Arc::new(AppState::new(resolver, monitor));
            let router = create_router(state);

            tracing::info!(
                %addr,
                simulations = settings.simulations.len(),
                "starting interview router"
            );

            let listener = tokio::net::TcpListener::bind(addr).await?;
            let served = axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_signal())
                .await;

            handle.stop().await;
            served?;
        }

        Commands::Check => {
            monitor.run_probe_cycle().await;
            println!(
                "{}",
                serde_json::to_string_pretty(&resolver.table().snapshot())?
            );
        }

        Commands::Resolve { simulation_id } => {
            monitor.run_probe_cycle().await;
            match resolver.resolve(&simulation_id) {
                Ok(result) => println!("{}", serde_json::to_string_pretty(&result)?),
                Err(e) => {
                    eprintln!("{}", e);
                    std::process::exit(if e.is_user_error() { 2 } else { 1 });
                }
            }
        }
    }

    Ok(())
}
