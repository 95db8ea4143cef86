//! Demo 2: Retry Monitor
//!
//! Showcases: signed GET, retry hooks, Retry-After handling, Ctrl+C cancellation
//!
//! Run: ONEMONEY_ACCESS_KEY=... ONEMONEY_SECRET_KEY=... cargo run --bin retry_monitor
//!
//! Set RUST_LOG=onemoney_rest=debug to see per-attempt transport logs.

use std::time::Duration;

use colored::*;
use onemoney_rest::hooks::TransportHooks;
use onemoney_rest::{ClientConfig, OneMoneyClient, Request, RestError, RetryConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let path = std::env::args().nth(1).unwrap_or_else(|| "/v1/assets".to_string());

    println!("{}", "═".repeat(65).cyan());
    println!("{}", "  RETRY MONITOR".cyan().bold());
    println!("{}", "  1Money SDK Demo - Signed Transport with Backoff".cyan());
    println!("{}", "═".repeat(65).cyan());
    println!();

    let hooks = TransportHooks::new()
        .on_request(|info| {
            println!(
                "  {} {} {} (attempt {})",
                "→".blue(),
                info.method,
                info.path,
                info.attempt
            );
        })
        .on_retry(|info| {
            let source = if info.server_hint { "server hint" } else { "backoff" };
            println!(
                "  {} retry {} in {:?} ({}): {}",
                "↻".yellow(),
                info.attempt,
                info.delay,
                source,
                info.reason
            );
        });

    let config = ClientConfig::from_env()?
        .with_retry(RetryConfig::new().with_max_retries(4))
        .with_timeout(Duration::from_secs(15))
        .with_hooks(hooks);
    let client = OneMoneyClient::new(config)?;

    println!("{} Client ready at {}", "✓".green(), client.transport().base_url());
    println!("{} Press Ctrl+C to cancel\n", "✓".green());
    info!(path = %path, "sending signed request");

    let cancel = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    match client.transport().send_until(&Request::get(path), cancel).await {
        Ok(response) => {
            println!("\n{} {} {}", "✓".green(), response.status_code, response.status_text);
            match response.json::<serde_json::Value>() {
                Ok(value) => println!("{}", serde_json::to_string_pretty(&value)?),
                Err(_) => println!("{}", response.text()),
            }
        }
        Err(RestError::Cancelled) => {
            warn!("request cancelled by user");
            println!("\n{} Cancelled", "✗".yellow());
        }
        Err(err) => {
            warn!(error = %err, retryable = err.is_retryable(), "request failed");
            println!("\n{} {}", "✗".red(), err);
            if let Some(api) = err.api_error() {
                if let Some(ref request_id) = api.request_id {
                    println!("  {} {}", "request id".dimmed(), request_id);
                }
                if let Some(retry_after) = api.retry_after {
                    println!("  {} {:?}", "retry after".dimmed(), retry_after);
                }
            }
        }
    }

    Ok(())
}
