use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::collections::HashMap;
use tracing::info;
use tracing_subscriber::EnvFilter;

use churn_analytics::{DataArgs, DataConfig, QueryService};

#[derive(Debug, Parser)]
#[command(name = "churn-analytics")]
#[command(about = "Query the customer churn dataset from the command line", version)]
struct Cli {
    #[command(flatten)]
    data: DataArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List customers, optionally filtered
    Customers {
        #[arg(long)]
        geography: Option<String>,
        /// 0 or 1
        #[arg(long)]
        exited: Option<String>,
        #[arg(long)]
        page: Option<String>,
        #[arg(long)]
        per_page: Option<String>,
    },
    /// Show one customer with all details
    Customer { id: i64 },
    /// List available reports
    Reports,
    /// Run one report (1-5)
    Report { id: i64 },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = DataConfig::from(&cli.data);

    let service = config
        .load_service()
        .with_context(|| format!("Failed to load dataset from {}", config.data_path.display()))?;
    info!(customers = service.store().len(), "Dataset ready");

    run(&service, cli.command)
}

fn run(service: &QueryService, command: Command) -> Result<()> {
    match command {
        Command::Customers {
            geography,
            exited,
            page,
            per_page,
        } => {
            let params: HashMap<String, String> = [
                ("geography", geography),
                ("exited", exited),
                ("page", page),
                ("per_page", per_page),
            ]
            .into_iter()
            .filter_map(|(k, v)| v.map(|v| (k.to_string(), v)))
            .collect();

            print_json(&service.list_customers(&params)?)
        }
        Command::Customer { id } => print_json(&service.get_customer(id)?),
        Command::Reports => print_json(&service.list_reports()),
        Command::Report { id } => print_json(&service.run_report(id)?),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
