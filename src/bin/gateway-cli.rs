use clap::{Parser, Subcommand};
use gatekeeper_sdk::{Credentials, GatekeeperClient, GatewayError, SignedHeaders};
use reqwest::Method;
use serde_json::Value;

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Sign and send requests through the gatekeeper", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8090")]
    url: String,

    #[arg(long, default_value = "testAccessKey")]
    access_key: String,

    #[arg(long, default_value = "testSecretKey")]
    secret_key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the signed headers for a request body
    Sign {
        #[arg(short, long)]
        body: Option<String>,
    },
    /// Send a signed request through the gateway
    Call {
        #[arg(short, long, default_value = "GET")]
        method: String,
        path: String,
        #[arg(short, long)]
        body: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let credentials = Credentials {
        access_key: cli.access_key,
        secret_key: cli.secret_key,
    };

    match cli.command {
        Commands::Sign { body } => {
            let headers = SignedHeaders::new(&credentials, body.as_deref()).to_header_map()?;
            for (name, value) in headers.iter() {
                println!("{}: {}", name, value.to_str()?);
            }
        }
        Commands::Call { method, path, body } => {
            let method = Method::from_bytes(method.to_uppercase().as_bytes())?;
            let client = GatekeeperClient::new(&cli.url, credentials);
            let res = client.call(method, &path, body.as_deref()).await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let body = res.bytes().await?;
    if !status.is_success() {
        eprintln!("Error: gateway returned status {}", status);
        if let Some(err) = GatewayError::from_body(&body) {
            eprintln!("Code: {}", err.code);
            eprintln!("Message: {}", err.message);
            eprintln!("Timestamp: {}", err.timestamp);
            return Ok(());
        }
    }
    match serde_json::from_slice::<Value>(&body) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", String::from_utf8_lossy(&body)),
    }
    Ok(())
}
