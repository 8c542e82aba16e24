//! Gatekeeper API gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌───────────────────────────────────────────────────────┐
//!                     │                      GATEKEEPER                        │
//!                     │                                                        │
//!  Client Request     │  ┌───────────┐   ┌──────────────┐   ┌──────────────┐  │
//!  ───────────────────┼─▶│ request id│──▶│  admission   │──▶│   metering   │  │
//!                     │  │ trace     │   │  7 checks    │   │  decorator   │  │
//!                     │  │ timeout   │   │  (403)       │   └──────┬───────┘  │
//!                     │  └───────────┘   └──────┬───────┘          │          │
//!                     │                         │                  ▼          │
//!                     │                         │          ┌──────────────┐   │
//!  Client Response    │                         │          │   forward    │───┼──▶ Upstream
//!  ◀──────────────────┼── buffered body ◀───────┼──────────│   handler    │◀──┼─── Interface
//!                     │    + 1 usage event      │          └──────────────┘   │    Service
//!                     │                         ▼                             │
//!                     │  ┌───────────────────────────────────────────────┐   │
//!                     │  │ identity store · nonce cache · registry ·      │   │
//!                     │  │ usage counter (trait objects, in-memory impls) │   │
//!                     │  └───────────────────────────────────────────────┘   │
//!                     └───────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use gatekeeper::lifecycle;

#[derive(Parser)]
#[command(name = "gatekeeper")]
#[command(about = "Signed-request admission and usage metering in front of an interface service", long_about = None)]
struct Args {
    /// Path to a TOML config file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = lifecycle::resolve_config(args.config.as_deref())?;
    lifecycle::run(config).await?;
    Ok(())
}
