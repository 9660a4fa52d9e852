//! mcp-context CLI entry point.

use anyhow::Result;
use clap::Parser;

use mcp_context::adapters::http::HttpConfig;
use mcp_context::application;
use mcp_context::cli::commands::{config, domain, resolve, serve, traces};
use mcp_context::cli::{handle_error, Cli, Commands};
use mcp_context::infrastructure::config::ResolvedConfig;
use mcp_context::infrastructure::logging::{LogConfig, LoggerImpl};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let resolved = cli.resolver().resolve();

    let log_config = resolved
        .as_ref()
        .map_or_else(|_| LogConfig::default(), |r| LogConfig::from(&r.mcp.logging));
    let _logger = match LoggerImpl::init(&log_config) {
        Ok(logger) => Some(logger),
        Err(e) => {
            eprintln!("Warning: logging disabled: {e}");
            None
        }
    };

    let json = cli.json;
    let result = match resolved {
        Ok(resolved) => run(cli.command, resolved, json).await,
        Err(e) => Err(e.into()),
    };

    if let Err(err) = result {
        handle_error(err, json);
    }
}

async fn run(command: Commands, resolved: ResolvedConfig, json: bool) -> Result<()> {
    match command {
        Commands::Config => config::handle_config(&resolved, json),
        Commands::Validate { paths } => {
            domain::handle_validate(&resolved.registry, &paths, json).await
        }
        Commands::List => {
            let service = application::start(&resolved).await?;
            domain::handle_list(&service, json).await?;
            application::shutdown(&service).await?;
            Ok(())
        }
        Commands::Show { id } => {
            let service = application::start(&resolved).await?;
            domain::handle_show(&service, &id, json).await?;
            application::shutdown(&service).await?;
            Ok(())
        }
        Commands::Resolve {
            domains,
            keywords,
            request_id,
        } => {
            let service = application::start(&resolved).await?;
            let result =
                resolve::handle_resolve(&service, domains, keywords, request_id, json).await;
            application::shutdown(&service).await?;
            result
        }
        Commands::Traces { limit } => {
            let service = application::start(&resolved).await?;
            let result = traces::handle_traces(&service, limit, json).await;
            application::shutdown(&service).await?;
            result
        }
        Commands::Serve {
            host,
            port,
            no_cors,
        } => {
            let service = application::start(&resolved).await?;
            let config = HttpConfig {
                host,
                port,
                enable_cors: !no_cors,
            };
            serve::handle_serve(service, resolved.mcp.servers.clone(), config).await
        }
    }
}
