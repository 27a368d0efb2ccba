use crate::{
    commands::{Commands, DatasourceCommand, EndpointCommand, ModelCommand},
    error::CliError,
};
use clap::Parser;
use connectors::{DataSourceSpec, EndpointSpec, ModelSpec};
use model::request::{QueryContext, RequestStatus};
use runtime::{Config, QueryService};
use std::{path::Path, process, sync::Arc, time::Duration};
use tracing::Level;

mod commands;
mod error;
mod output;

#[derive(Parser)]
#[command(name = "trellis", version, about = "Data virtualization query engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let exit_code = match run_cli().await {
        Ok(()) => 0,
        Err(e) => {
            tracing::error!("command failed: {e}");
            1
        }
    };
    process::exit(exit_code);
}

async fn run_cli() -> Result<(), CliError> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Query {
            config,
            sql,
            username,
        } => {
            let service = open_service(&config)?;
            let ctx = QueryContext::new(username);
            let id = service.submit_query(&sql, &ctx).await?;

            let meta = loop {
                match service.poll(id).await {
                    Some(meta) if meta.status != RequestStatus::InProgress => break meta,
                    _ => tokio::time::sleep(Duration::from_millis(50)).await,
                }
            };

            match meta.status {
                RequestStatus::Completed => {
                    let bytes = service.get_result(id).await?;
                    output::print_result(&bytes)?;
                    Ok(())
                }
                _ => Err(CliError::RequestFailed(
                    meta.error.unwrap_or_else(|| "unknown failure".into()),
                )),
            }
        }
        Commands::Ast { sql } => {
            let query = sql_syntax::parse(&sql)?;
            output::print_json(&query)
        }
        Commands::Datasource {
            command:
                DatasourceCommand::Add {
                    config,
                    name,
                    source_type,
                    version,
                    properties,
                },
        } => {
            let service = open_service(&config)?;
            let mut spec = DataSourceSpec::new(name, source_type, version);
            if let Some(raw) = properties {
                spec = spec.with_properties(serde_json::from_str(&raw)?);
            }
            service.store().put_data_source(&spec).map_err(runtime::RuntimeError::from)?;
            println!("data source '{}' saved", spec.name);
            Ok(())
        }
        Commands::Model {
            command: ModelCommand::Add { config, name, sql },
        } => {
            // Validate before saving so a broken model never lands.
            sql_syntax::parse(&sql)?;
            let service = open_service(&config)?;
            let model = ModelSpec { name, query: sql };
            service.store().put_model(&model).map_err(runtime::RuntimeError::from)?;
            println!("model '{}' saved", model.name);
            Ok(())
        }
        Commands::Endpoint {
            command: EndpointCommand::Add {
                config,
                name,
                model,
            },
        } => {
            let service = open_service(&config)?;
            let endpoint = EndpointSpec { name, model };
            service
                .store()
                .put_endpoint(&endpoint)
                .map_err(runtime::RuntimeError::from)?;
            println!("endpoint '{}' saved", endpoint.name);
            Ok(())
        }
    }
}

fn open_service(config_path: &str) -> Result<Arc<QueryService>, CliError> {
    let config = Config::load(Path::new(config_path))?;
    Ok(QueryService::open(config)?)
}
