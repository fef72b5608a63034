//! Auditsearch index lifecycle tool.

#![forbid(unsafe_code)]

use std::env;
use std::process::ExitCode;
use std::sync::Arc;

use auditsearch_application::{AuditIndexConfig, IndexSchemaService};
use auditsearch_core::{AppError, AppResult};
use auditsearch_infrastructure::ElasticsearchAuditIndex;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: auditsearch-admin <setup|create|mapping|aliases|exists|delete>";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AdminCommand {
    Setup,
    Create,
    Mapping,
    Aliases,
    Exists,
    Delete,
}

impl AdminCommand {
    fn parse(value: Option<&str>) -> AppResult<Self> {
        match value.map(str::trim) {
            Some("setup") => Ok(Self::Setup),
            Some("create") => Ok(Self::Create),
            Some("mapping") => Ok(Self::Mapping),
            Some("aliases") => Ok(Self::Aliases),
            Some("exists") => Ok(Self::Exists),
            Some("delete") => Ok(Self::Delete),
            Some(other) => Err(AppError::Validation(format!(
                "unknown command '{other}'; {USAGE}"
            ))),
            None => Err(AppError::Validation(USAGE.to_owned())),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    init_tracing();

    match run(env::args().nth(1).as_deref()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            error!(error = %error, "auditsearch-admin failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(argument: Option<&str>) -> AppResult<()> {
    let command = AdminCommand::parse(argument)?;
    let config = AuditIndexConfig::from_lookup(|name| env::var(name).ok())?;
    let adapter = Arc::new(ElasticsearchAuditIndex::from_config(&config)?);
    let schema = IndexSchemaService::new(adapter, config.index.clone());

    match command {
        AdminCommand::Setup => {
            let report = schema.setup_index().await?;
            info!(index = %schema.index(), created = report.created, "audit index ready");
        }
        AdminCommand::Create => schema.create_index().await?,
        AdminCommand::Mapping => schema.put_mapping().await?,
        AdminCommand::Aliases => schema.update_aliases().await?,
        AdminCommand::Exists => {
            let exists = schema.exists_index().await?;
            info!(index = %schema.index(), exists, "checked audit index");
            println!("{exists}");
        }
        AdminCommand::Delete => schema.delete_index().await?,
    }

    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}
