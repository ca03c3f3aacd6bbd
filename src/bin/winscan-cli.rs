use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "winscan-cli")]
#[command(about = "Management CLI for the WinScan gateway", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[arg(short, long, default_value = "")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check gateway status
    Status,
    /// Inspect cache and in-flight request counts
    Cache,
    /// Drop every cached response
    ClearCache,
    /// List backend endpoints in attempt order
    Endpoints,
    /// Fetch an API route through the gateway
    Get {
        /// Route path, e.g. /api/blocks
        path: String,

        /// Query parameter as name=value (repeatable)
        #[arg(short, long = "param")]
        params: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", cli.key))?,
    );

    let res = match cli.command {
        Commands::Status => {
            client.get(format!("{}/admin/status", cli.url))
                .headers(headers)
                .send()
                .await?
        }
        Commands::Cache => {
            client.get(format!("{}/admin/cache", cli.url))
                .headers(headers)
                .send()
                .await?
        }
        Commands::ClearCache => {
            client.delete(format!("{}/admin/cache", cli.url))
                .headers(headers)
                .send()
                .await?
        }
        Commands::Endpoints => {
            client.get(format!("{}/admin/endpoints", cli.url))
                .headers(headers)
                .send()
                .await?
        }
        Commands::Get { path, params } => {
            let query: Vec<(&str, &str)> = params
                .iter()
                .filter_map(|p| p.split_once('='))
                .collect();
            let res = client.get(format!("{}{}", cli.url, path))
                .query(&query)
                .send()
                .await?;
            if let Some(cache) = res.headers().get("x-cache") {
                eprintln!("x-cache: {}", cache.to_str().unwrap_or("?"));
            }
            res
        }
    };

    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: gateway returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
