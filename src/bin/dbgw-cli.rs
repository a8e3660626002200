use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::{json, Value};

use db_gateway::database::Engine;
use db_gateway::security::X_API_KEY;

#[derive(Parser)]
#[command(name = "dbgw-cli")]
#[command(about = "Command line client for db-gateway", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[arg(short, long, env = "API_KEY")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show host metrics
    ServerInfo,
    /// Create a database and its owner
    Create { engine: Engine, name: String },
    /// Replace the credentials of a database
    ResetCredentials { engine: Engine, name: String },
    /// Rename a database
    Rename {
        engine: Engine,
        name: String,
        new_name: String,
    },
    /// Delete a database
    Delete { engine: Engine, name: String },
    /// Show storage statistics of a database
    Stats { engine: Engine, name: String },
    /// Show per-user query totals (postgres)
    Queries,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut headers = HeaderMap::new();
    headers.insert(X_API_KEY, HeaderValue::from_str(&cli.key)?);
    let client = reqwest::Client::builder().default_headers(headers).build()?;
    let base = cli.url.trim_end_matches('/');

    let request = match cli.command {
        Commands::ServerInfo => client.get(format!("{base}/server-info")),
        Commands::Create { engine, name } => client
            .post(format!("{base}/{engine}/databases"))
            .json(&json!({ "database_name": name })),
        Commands::ResetCredentials { engine, name } => {
            client.patch(format!("{base}/{engine}/databases/{name}/credentials"))
        }
        Commands::Rename {
            engine,
            name,
            new_name,
        } => client
            .patch(format!("{base}/{engine}/databases/{name}"))
            .json(&json!({ "new_database_name": new_name })),
        Commands::Delete { engine, name } => {
            client.delete(format!("{base}/{engine}/databases/{name}"))
        }
        Commands::Stats { engine, name } => {
            client.get(format!("{base}/{engine}/databases/{name}/stats"))
        }
        Commands::Queries => client.get(format!("{base}/postgres/databases/queries")),
    };

    print_response(request.send().await?).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;

    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", text),
    }

    if !status.is_success() {
        eprintln!("Error: gateway returned status {}", status);
        std::process::exit(1);
    }
    Ok(())
}
