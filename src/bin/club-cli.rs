use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "club-cli")]
#[command(about = "Management CLI for the club-core daemon", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8081")]
    url: String,

    /// Admin API key
    #[arg(short, long)]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check daemon status
    Status,
    /// Show per-category cache statistics
    Cache,
    /// Drop cached entries, optionally for one category only
    ClearCache {
        #[arg(long)]
        category: Option<String>,
    },
    /// Show Horizon and Soroban reachability
    Network,
    /// Issue a membership token
    IssueMembership {
        recipient: String,
        #[arg(long)]
        signer: Option<String>,
        #[arg(long)]
        tier: Option<String>,
        #[arg(long)]
        rarity: Option<String>,
        #[arg(long)]
        category: Option<String>,
    },
    /// Create a badge held by the recipient
    IssueBadge {
        recipient: String,
        badge_id: String,
        name: String,
        description: String,
        #[arg(long)]
        signer: Option<String>,
    },
    /// Award an existing badge
    AwardBadge {
        recipient: String,
        badge_id: String,
        #[arg(long)]
        reason: Option<String>,
        #[arg(long)]
        signer: Option<String>,
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

    let request = match cli.command {
        Commands::Status => client.get(format!("{}/admin/status", cli.url)),
        Commands::Cache => client.get(format!("{}/admin/cache", cli.url)),
        Commands::ClearCache { category: None } => client.delete(format!("{}/admin/cache", cli.url)),
        Commands::ClearCache {
            category: Some(category),
        } => client.delete(format!("{}/admin/cache/{}", cli.url, category)),
        Commands::Network => client.get(format!("{}/admin/network", cli.url)),
        Commands::IssueMembership {
            recipient,
            signer,
            tier,
            rarity,
            category,
        } => client
            .post(format!("{}/admin/memberships", cli.url))
            .json(&json!({
                "recipient": recipient,
                "signer": signer,
                "tier": tier,
                "rarity": rarity,
                "category": category,
            })),
        Commands::IssueBadge {
            recipient,
            badge_id,
            name,
            description,
            signer,
        } => client
            .post(format!("{}/admin/badges", cli.url))
            .json(&json!({
                "recipient": recipient,
                "badge_id": badge_id,
                "name": name,
                "description": description,
                "signer": signer,
            })),
        Commands::AwardBadge {
            recipient,
            badge_id,
            reason,
            signer,
        } => client
            .post(format!("{}/admin/awards", cli.url))
            .json(&json!({
                "recipient": recipient,
                "badge_id": badge_id,
                "reason": reason,
                "signer": signer,
            })),
    };

    let res = request.headers(headers).send().await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;

    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
    }
    if text.is_empty() {
        if status.is_success() {
            println!("OK ({})", status);
        }
        return Ok(());
    }

    // Failed transactions still carry a state document worth printing.
    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => eprintln!("Response: {}", text),
    }
    Ok(())
}
