use anyhow::{Context, Result};
use antigravirt::connections::{ConnectionEntry, ConnectionRegistry, ConnectionType};
use antigravirt::execution::QueryGateway;
use antigravirt::llm::LlmClient;
use antigravirt::observability::ExecutionLogger;
use antigravirt::workflow::{StepEvent, WorkflowConfig, WorkflowContext, WorkflowEngine, WorkflowState};
use antigravirt::Settings;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "antigravirt")]
#[command(about = "Agentic natural-language to SQL assistant")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer a natural-language question about the connected data
    Ask {
        question: String,

        /// Print each workflow step as it completes
        #[arg(long)]
        stream: bool,
    },

    /// Print the schema of every configured connection
    Schema,

    /// Manage configured connections
    Connections {
        #[command(subcommand)]
        action: ConnectionAction,
    },
}

#[derive(Subcommand)]
enum ConnectionAction {
    List,
    Add {
        #[arg(long)]
        id: String,

        /// postgres, sqlite or filesystem
        #[arg(long = "type")]
        kind: String,

        /// Display name
        #[arg(long)]
        name: String,

        /// Connection parameter as key=value (repeatable)
        #[arg(long = "param", value_parser = parse_param)]
        params: Vec<(String, String)>,
    },
    Remove {
        id: String,
    },
}

fn parse_param(raw: &str) -> std::result::Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let settings = Settings::from_env().context("invalid configuration")?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.log_level.clone()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();

    let registry = Arc::new(
        ConnectionRegistry::from_settings(&settings).context("failed to load connections")?,
    );
    registry.ensure_default_connection()?;
    let gateway = QueryGateway::new(Arc::clone(&registry), settings.step_timeout);

    match cli.command {
        Commands::Ask { question, stream } => {
            let ctx = WorkflowContext::new(
                Arc::new(LlmClient::from_settings(&settings)),
                gateway,
                WorkflowConfig::from_settings(&settings),
            );
            let logger = Arc::new(ExecutionLogger::new(settings.run_log_file.clone(), 1000));
            let engine = WorkflowEngine::new(ctx).with_logger(logger);

            info!("Question: {}", question);
            let state = if stream {
                let (tx, rx) = mpsc::unbounded_channel();
                let (state, ()) = tokio::join!(engine.run_streaming(&question, tx), print_events(rx));
                state
            } else {
                engine.run(&question).await
            };
            print_answer(&state);
        }
        Commands::Schema => {
            println!("{}", gateway.get_schema(None).await);
        }
        Commands::Connections { action } => match action {
            ConnectionAction::List => {
                for entry in registry.list() {
                    println!("{}\t{}\t{}", entry.id, entry.kind.as_str(), entry.display_name);
                }
            }
            ConnectionAction::Add { id, kind, name, params } => {
                let mut entry = ConnectionEntry::new(id.clone(), kind.parse::<ConnectionType>()?, name);
                for (key, value) in params {
                    entry = entry.with_param(&key, value);
                }
                registry.add(entry)?;
                println!("Added connection: {}", id);
            }
            ConnectionAction::Remove { id } => {
                registry.remove(&id)?;
                println!("Removed connection: {}", id);
            }
        },
    }

    Ok(())
}

async fn print_events(mut rx: mpsc::UnboundedReceiver<StepEvent>) {
    while let Some(event) = rx.recv().await {
        println!("[{}] {} finished processing.", event.at.format("%H:%M:%S"), event.step);
    }
}

fn print_answer(state: &WorkflowState) {
    if let Some(sql) = &state.sql_query {
        println!("\n=== SQL ===\n{}", sql);
    }
    println!(
        "\n=== Answer ===\n{}",
        state.final_response.as_deref().unwrap_or("No response generated.")
    );
    if let Some(chart) = &state.visualization_code {
        println!("\n=== Chart (Plotly JSON) ===\n{}", chart);
    }
}
