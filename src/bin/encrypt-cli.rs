use std::process::ExitCode;

use clap::{Parser, Subcommand};
use uuid::Uuid;

use encrypt_relay::client::{ClientError, RelayClient};
use encrypt_relay::config::UpstreamConfig;
use encrypt_relay::forwarder::{EncryptRequest, Forwarder};

#[derive(Parser)]
#[command(name = "encrypt-cli")]
#[command(about = "Encrypt usr/p29 through the relay or straight against the gateway", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encrypt through a running relay
    Encrypt {
        #[arg(long)]
        usr: String,
        #[arg(long)]
        p29: String,
        #[arg(short, long, default_value = "http://localhost:3001")]
        url: String,
    },
    /// Encrypt by calling the gateway directly, without a relay
    Direct {
        #[arg(long)]
        usr: String,
        #[arg(long)]
        p29: String,
        /// Gateway base URL, e.g. https://gateway.example.com
        #[arg(long)]
        upstream: String,
        #[arg(long, default_value_t = 10_000)]
        timeout_ms: u64,
    },
    /// Check relay health
    Health {
        #[arg(short, long, default_value = "http://localhost:3001")]
        url: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Encrypt { usr, p29, url } => encrypt_via_relay(&url, &usr, &p29).await,
        Commands::Direct { usr, p29, upstream, timeout_ms } => {
            encrypt_direct(&upstream, timeout_ms, &usr, &p29).await
        }
        Commands::Health { url } => health(&url).await,
    };

    match result {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err((kind, message)) => {
            eprintln!("Error [{}]: {}", kind, message);
            ExitCode::FAILURE
        }
    }
}

type CliResult = Result<String, (String, String)>;

fn client_failure(e: ClientError) -> (String, String) {
    (e.kind(), e.to_string())
}

async fn encrypt_via_relay(url: &str, usr: &str, p29: &str) -> CliResult {
    let client = RelayClient::new(url).map_err(client_failure)?;
    client.encrypt(usr, p29).await.map_err(client_failure)
}

async fn encrypt_direct(upstream: &str, timeout_ms: u64, usr: &str, p29: &str) -> CliResult {
    let config = UpstreamConfig {
        base_url: upstream.to_string(),
        timeout_ms,
        ..UpstreamConfig::default()
    };
    let forwarder = Forwarder::new(&config).map_err(|e| ("setup".to_string(), e.to_string()))?;
    let failure = |e: encrypt_relay::ForwardError| (e.kind().to_string(), e.to_string());

    let request = EncryptRequest::new(usr, p29).map_err(failure)?;
    let request_id = Uuid::new_v4().to_string();
    forwarder.forward(&request, Some(&request_id)).await.map_err(failure)
}

async fn health(url: &str) -> CliResult {
    let client = RelayClient::new(url).map_err(client_failure)?;
    let json = client.health().await.map_err(client_failure)?;
    serde_json::to_string_pretty(&json).map_err(|e| ("client".to_string(), e.to_string()))
}
