//! Demo Binary
//!
//! Runs a three-signer confirmation session end to end: create, two
//! signatures in block 1, the last signature in block 2, then verifies the
//! chain.

use akin_apps::{DemoSession, DEMO_SESSION};
use akin_ledger::{spawn_ledger_actor, AppRegistry, Ledger, LedgerHandle, Outcome, Transaction};
use serde_json::json;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const CHAIN_ID: &str = "AKIN:CHAIN:DEMO";
const VALIDATOR: &str = "AKIN:VALIDATOR:1";
const SERVICE_ID: &str = "SESSION-1";
const REQUIRED: [&str; 3] = ["AKIN:USER:1", "AKIN:ORG:AT", "AKIN:SYS:PAY"];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let apps = AppRegistry::new().register(DemoSession::new())?;
    let ledger = Ledger::new(CHAIN_ID, [VALIDATOR], apps)?;
    let handle = spawn_ledger_actor(ledger, 64);
    info!(chain_id = CHAIN_ID, "Demo ledger started");

    // 1. Create session
    let create = Transaction::builder(CHAIN_ID, DEMO_SESSION, REQUIRED[0])
        .payload(json!({
            "action": "create",
            "service_id": SERVICE_ID,
            "participants": REQUIRED,
            "required_signers": REQUIRED,
        }))
        .signed_by(REQUIRED[0])
        .build()?;
    println!("ADD create: {}", Outcome::intake(&handle.add_transaction(create).await));

    // 2. First two signers
    for signer in &REQUIRED[..2] {
        let outcome = Outcome::intake(&handle.add_transaction(sign(signer)?).await);
        println!("ADD sign from {}: {}", signer, outcome);
    }

    let proposal = Outcome::proposal(&handle.propose_block(VALIDATOR).await);
    println!("PROPOSE block 1: {}", proposal);
    print_state("STATE after block 1", &handle).await?;

    // 3. Last signer
    let outcome = Outcome::intake(&handle.add_transaction(sign(REQUIRED[2])?).await);
    println!("ADD sign from last: {}", outcome);

    let proposal = Outcome::proposal(&handle.propose_block(VALIDATOR).await);
    println!("PROPOSE block 2: {}", proposal);
    print_state("STATE final", &handle).await?;

    let verification = Outcome::verification(&handle.is_valid_chain().await);
    println!("CHAIN valid?: {}", verification);

    handle.shutdown().await?;
    Ok(())
}

fn sign(signer: &str) -> akin_ledger::Result<Transaction> {
    Transaction::builder(CHAIN_ID, DEMO_SESSION, signer)
        .payload(json!({"action": "sign", "service_id": SERVICE_ID}))
        .signed_by(signer)
        .build()
}

async fn print_state(label: &str, handle: &LedgerHandle) -> anyhow::Result<()> {
    let state = handle
        .app_state(DEMO_SESSION)
        .await?
        .ok_or_else(|| anyhow::anyhow!("app {} not registered", DEMO_SESSION))?;
    println!("{}: {}", label, serde_json::to_string_pretty(&state)?);
    Ok(())
}
