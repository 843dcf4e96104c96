use clap::{Parser, Subcommand};
use equipment_gateway::config::load_config;
use equipment_gateway::lifecycle::open_token_service;
use serde_json::Value;

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Operator CLI for the equipment gateway", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Token maintenance against the configured secret and database
    Token {
        #[command(subcommand)]
        command: TokenCommands,
    },
    /// Probe a running gateway's liveness endpoint
    Health {
        #[arg(short, long, default_value = "http://localhost:8000")]
        url: String,
    },
}

#[derive(Subcommand)]
enum TokenCommands {
    /// Issue an access/refresh pair for a user
    Issue {
        #[arg(long)]
        user_id: String,
    },
    /// Blacklist a refresh token
    Revoke { refresh: String },
    /// Check a token and print its claims
    Inspect { token: String },
    /// Remove blacklist entries for tokens that have expired anyway
    Purge,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Token { command } => {
            let config = load_config()?;
            let tokens = open_token_service(&config)?;
            match command {
                TokenCommands::Issue { user_id } => {
                    let pair = tokens.issue_pair(&user_id)?;
                    println!("{}", serde_json::to_string_pretty(&pair)?);
                }
                TokenCommands::Revoke { refresh } => {
                    let claims = tokens.revoke(&refresh).await?;
                    println!("Revoked refresh token {} for user {}", claims.jti, claims.user_id);
                }
                TokenCommands::Inspect { token } => match tokens.validate_any(&token).await {
                    Ok(claims) => {
                        println!("valid {} token", claims.token_type.as_str());
                        println!("{}", serde_json::to_string_pretty(&claims)?);
                    }
                    Err(e) => {
                        eprintln!("invalid token: {e}");
                        std::process::exit(1);
                    }
                },
                TokenCommands::Purge => {
                    let now = chrono::Utc::now().timestamp();
                    let removed = tokens.blacklist().purge_expired(now)?;
                    println!("Removed {removed} expired blacklist entries");
                }
            }
        }
        Commands::Health { url } => {
            let res = reqwest::Client::new()
                .get(format!("{}/health/", url.trim_end_matches('/')))
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
        eprintln!("Error: gateway returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        std::process::exit(1);
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
