//! Connects to a match server, greets, and prints its match list.
//!
//! ```text
//! lobby-watch [ADDR] [--json]
//! ```
//!
//! Set `RUST_LOG=fivedc_session=debug` to watch the session transitions.

use std::time::Duration;

use fivedc::prelude::*;
use tracing_subscriber::EnvFilter;

const DEFAULT_ADDR: &str = "127.0.0.1:39005";

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

fn print_list(list: &MatchList) {
    match &list.host {
        Some(host) => println!(
            "hosting: {} {:?} {:?} passcode {}",
            host.variant, host.clock, host.color, host.passcode
        ),
        None => println!("hosting: nothing"),
    }

    println!("open matches ({}):", list.public_matches.len());
    for m in &list.public_matches {
        println!(
            "  {:<12} {:<8} host plays {:<7} join with {}",
            m.variant.to_string(),
            format!("{:?}", m.clock),
            format!("{:?}", m.color),
            m.passcode
        );
    }

    println!("recent matches ({}):", list.history.len());
    for h in &list.history {
        println!(
            "  {:<12} {:<8} {:<8} {:?}, {}s",
            h.variant.to_string(),
            format!("{:?}", h.clock),
            format!("{:?}", h.visibility),
            h.status,
            h.seconds_passed
        );
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut addr = DEFAULT_ADDR.to_string();
    let mut json = false;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--json" => json = true,
            other => addr = other.to_string(),
        }
    }

    tracing::info!(%addr, "connecting");
    let (client, mut events) = Client::builder().connect(&addr).await?;
    client.greet().await?;

    let wait = tokio::time::timeout(Duration::from_secs(10), async {
        while let Some(event) = events.recv().await {
            match event {
                SessionEvent::Greeted(_) => client.request_match_list().await?,
                SessionEvent::MatchListReceived(list) => return Ok(Some(list)),
                SessionEvent::MatchEnded { reason } => {
                    tracing::error!(%reason, "session ended early");
                    return Ok(None);
                }
                other => tracing::debug!(?other, "ignoring event"),
            }
        }
        Ok::<_, FivedcError>(None)
    });

    let list = match wait.await {
        Ok(result) => result?,
        Err(_) => {
            tracing::error!("server did not answer in time");
            None
        }
    };
    client.shutdown().await?;

    match list {
        Some(list) if json => println!("{}", serde_json::to_string_pretty(&list)?),
        Some(list) => print_list(&list),
        None => std::process::exit(1),
    }
    Ok(())
}
