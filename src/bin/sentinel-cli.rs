//! Operator CLI for the auth sentinel admin API.

use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "sentinel-cli")]
#[command(about = "Management CLI for the Auth Sentinel", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8081")]
    url: String,

    #[arg(short, long, default_value = "CHANGE_ME_IN_PRODUCTION")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show combined breaker, stop, and monitor state
    Status,
    /// Trip the breaker, wipe the session, and engage the kill-switch
    EmergencyStop {
        /// Reason recorded against the stop
        #[arg(short, long, default_value = "manual")]
        reason: String,
    },
    /// Clear both protection gates back to their initial state
    Reset,
    /// Start or stop the background monitor
    Monitor {
        #[command(subcommand)]
        action: MonitorAction,
    },
}

#[derive(Subcommand)]
enum MonitorAction {
    Start,
    Stop,
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

    match cli.command {
        Commands::Status => {
            let res = client
                .get(format!("{}/admin/status", cli.url))
                .headers(headers)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::EmergencyStop { reason } => {
            let res = client
                .post(format!("{}/admin/emergency-stop", cli.url))
                .headers(headers)
                .json(&serde_json::json!({ "reason": reason }))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Reset => {
            let res = client
                .post(format!("{}/admin/reset", cli.url))
                .headers(headers)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Monitor { action } => {
            let suffix = match action {
                MonitorAction::Start => "start",
                MonitorAction::Stop => "stop",
            };
            let res = client
                .post(format!("{}/admin/monitor/{}", cli.url, suffix))
                .headers(headers)
                .send()
                .await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
