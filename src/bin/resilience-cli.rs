use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "resilience-cli")]
#[command(about = "Operator CLI for the lending resilience service", long_about = None)]
struct Cli {
    #[arg(short, long, env = "RESILIENCE_ADMIN_URL", default_value = "http://localhost:8080")]
    url: String,

    #[arg(short, long, env = "RESILIENCE_ADMIN_KEY")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Demo mode, breakers and session counts
    Status,
    /// Circuit breaker states
    Breakers,
    /// Demo session counts
    Sessions,
    /// Switch to demo mode
    Activate {
        #[arg(short, long)]
        reason: String,
    },
    /// Return to live mode
    Deactivate,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", cli.key))?,
    );

    let request = match cli.command {
        Commands::Status => client.get(format!("{base}/admin/status")),
        Commands::Breakers => client.get(format!("{base}/admin/breakers")),
        Commands::Sessions => client.get(format!("{base}/admin/sessions")),
        Commands::Activate { reason } => client
            .post(format!("{base}/admin/resilience/activate"))
            .json(&json!({ "reason": reason })),
        Commands::Deactivate => client.post(format!("{base}/admin/resilience/deactivate")),
    };

    let res = request.headers(headers).send().await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        std::process::exit(1);
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
