use std::sync::Arc;

use actix_cors::Cors;
use actix_web::middleware::Compress;
use actix_web::{http::header, web, App, HttpServer};
use actix_web_prometheus::PrometheusMetricsBuilder;
use clap::Parser;

pub mod client;
pub mod config;
pub mod error;
pub mod mcp;
pub mod poller;

use crate::client::{HttpNotebookClient, Session, SharedClient};
use crate::config::{Cli, Command, Config, Transport};
use crate::mcp::tools::{ToolContext, ToolRegistry};
use crate::mcp::{McpService, McpState};
use crate::poller::JobPoller;

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // stdout belongs to the stdio transport
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let config = Config::from_cli(Cli::parse())?;
    if config.command == Some(Command::Status) {
        return report_status(&config).await;
    }

    let client: SharedClient = Arc::new(HttpNotebookClient::new(config.client_config())?);
    let context = ToolContext::new(
        client.clone(),
        JobPoller::default(),
        config.download_dir.clone(),
    );
    let service = McpService::new(ToolRegistry::new(context));
    log::info!(
        "{} tools registered, bridge at {}, session file {}",
        service.registry().list_tools().len(),
        config.api_url,
        config.storage_path.display()
    );

    let served = match config.transport {
        Transport::Stdio => {
            log::info!("Serving MCP over stdio");
            mcp::stdio::serve(service, tokio::io::stdin(), tokio::io::stdout())
                .await
                .map_err(anyhow::Error::from)
        }
        Transport::Http => serve_http(&config, service).await,
    };

    client.close().await;
    served
}

async fn serve_http(config: &Config, service: McpService) -> anyhow::Result<()> {
    let state = web::Data::new(McpState::new(service));

    let prometheus = PrometheusMetricsBuilder::new("notebooklm_mcp")
        .endpoint("/metrics")
        .build()
        .map_err(|err| anyhow::anyhow!("failed to create Prometheus metrics middleware: {err}"))?;

    if config.allowed_origins.is_empty() {
        log::info!("No CORS origins configured; cross-origin requests will be refused");
    }
    let origins = config.allowed_origins.clone();

    log::info!("Starting MCP server at http://{}:{}", config.host, config.port);

    HttpServer::new(move || {
        let cors = origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
            .allowed_methods(vec!["GET", "POST", "OPTIONS"])
            .allowed_headers(vec![header::ACCEPT, header::CONTENT_TYPE])
            .max_age(3600);

        App::new()
            .wrap(Compress::default())
            .wrap(prometheus.clone())
            .wrap(cors)
            .app_data(state.clone())
            .configure(mcp::config)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await?;

    Ok(())
}

async fn report_status(config: &Config) -> anyhow::Result<()> {
    println!("Session file: {}", config.storage_path.display());
    match Session::load(&config.storage_path).await {
        Ok(session) => {
            println!("Status: valid ({} Google cookies)", session.cookie_count());
            Ok(())
        }
        Err(err) => {
            println!("Status: not usable\nError: [{}] {}", err.kind(), err);
            anyhow::bail!("NotebookLM session is not usable")
        }
    }
}
