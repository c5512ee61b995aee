use clap::{Args as ClapArgs, Parser, Subcommand};
use dotenv::dotenv;
use futures::StreamExt;
use kaizen_rs::kaizen::{EngineFactory, RouterConfig};

use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Optional YAML config file (environment variables override it)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(ClapArgs, Debug)]
struct QueryArgs {
    /// The question to route
    #[arg(short, long)]
    query: String,

    /// Pre-rendered conversation history
    #[arg(long, default_value = "")]
    history: String,

    /// Pre-rendered attachment text
    #[arg(long, default_value = "")]
    file_context: String,

    /// Correlation id for logs and checkpoints (generated when omitted)
    #[arg(long)]
    correlation_id: Option<String>,
}

impl QueryArgs {
    fn correlation_id(&self) -> String {
        self.correlation_id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Answer a single query
    Ask {
        #[command(flatten)]
        query: QueryArgs,

        /// Record the decision trace and print the debug header
        #[arg(short, long)]
        debug: bool,
    },
    /// Print sanitized progress events as JSON lines
    Stream {
        #[command(flatten)]
        query: QueryArgs,
    },
    /// Print the workflow graph as Mermaid
    Graph {
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenv().ok();
    env_logger::init();

    let args = Args::parse();
    let config = RouterConfig::load(args.config.as_deref())?;
    let factory = EngineFactory::new(&config);

    match args.command {
        Commands::Ask { query, debug } => {
            let cid = query.correlation_id();
            log::info!("Handling query [cid={}]", cid);

            let durable = factory.build_durable().await;
            let result = durable
                .run_detailed(
                    &query.query,
                    &query.history,
                    &query.file_context,
                    Some(&cid),
                    debug,
                )
                .await;

            let response = &result.outcome.response;
            match &result.outcome.debug_summary {
                Some(summary) => println!("{}", summary.decorate(response)),
                None => println!("{}", response),
            }
        }
        Commands::Stream { query } => {
            let cid = query.correlation_id();
            let engine = factory.build_engine().await;
            let mut events = Box::pin(engine.run_streaming(
                &query.query,
                &query.history,
                &query.file_context,
                Some(&cid),
            ));

            while let Some(event) = events.next().await {
                println!("{}", serde_json::to_string(&event)?);
            }
        }
        Commands::Graph { output } => {
            let engine = factory.build_engine().await;
            let mermaid = engine.export_mermaid();
            match output {
                Some(path) => {
                    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(&path, &mermaid)?;
                    println!(
                        "Wrote Mermaid diagram to {} ({} bytes)",
                        path.display(),
                        mermaid.len()
                    );
                }
                None => println!("{}", mermaid),
            }
        }
    }

    Ok(())
}
