use clap::{Args, Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;

use dev_proxy::payload::EmailPayload;

#[derive(Parser)]
#[command(name = "dev-proxy-cli")]
#[command(about = "Client for the dev proxy and its admin API", long_about = None)]
struct Cli {
    /// Admin API base URL.
    #[arg(short, long, default_value = "http://127.0.0.1:5174")]
    url: String,

    /// Admin API key, sent as a Bearer token.
    #[arg(short, long)]
    key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check proxy status
    Status,
    /// List forwarding rules in match order
    Rules,
    /// POST an email payload through the proxy
    SendEmail(SendEmailArgs),
}

#[derive(Args)]
struct SendEmailArgs {
    /// Proxy base URL.
    #[arg(long, default_value = "http://127.0.0.1:5173")]
    proxy: String,

    /// Local path routed to the webhook.
    #[arg(long, default_value = "/api/send-email")]
    path: String,

    /// Send the built-in sample payload.
    #[arg(long, conflicts_with_all = ["to", "cc", "subject", "body"])]
    sample: bool,

    #[arg(long)]
    to: Vec<String>,

    #[arg(long)]
    cc: Vec<String>,

    #[arg(long)]
    subject: Option<String>,

    #[arg(long)]
    body: Option<String>,
}

impl SendEmailArgs {
    fn payload(&self) -> Result<EmailPayload, String> {
        if self.sample {
            return Ok(EmailPayload::sample());
        }
        if self.to.is_empty() {
            return Err("at least one --to recipient is required (or pass --sample)".into());
        }
        Ok(EmailPayload {
            to: self.to.clone(),
            cc: self.cc.clone(),
            subject: self.subject.clone().ok_or("--subject is required")?,
            body: self.body.clone().ok_or("--body is required")?,
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    if let Some(key) = &cli.key {
        headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {}", key))?);
    }

    match cli.command {
        Commands::Status => {
            let res = client
                .get(format!("{}/admin/status", cli.url))
                .headers(headers)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Rules => {
            let res = client
                .get(format!("{}/admin/rules", cli.url))
                .headers(headers)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::SendEmail(args) => {
            let payload = args.payload()?;
            let res = client
                .post(format!("{}{}", args.proxy.trim_end_matches('/'), args.path))
                .json(&payload)
                .send()
                .await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    println!("{}", render_response(status, &text)?);
    Ok(())
}

/// Pretty-print a successful body; non-2xx statuses become an error.
fn render_response(status: reqwest::StatusCode, text: &str) -> Result<String, String> {
    if !status.is_success() {
        let mut message = format!("server returned status {}", status);
        if !text.is_empty() {
            message.push_str(&format!(": {}", text));
        }
        return Err(message);
    }

    Ok(match serde_json::from_str::<Value>(text) {
        Ok(json) => serde_json::to_string_pretty(&json).unwrap_or_else(|_| text.to_string()),
        Err(_) => text.to_string(),
    })
}
