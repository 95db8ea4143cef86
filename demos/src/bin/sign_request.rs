//! Demo 1: Request Signing
//!
//! Showcases: canonical string layout, body hashing, Authorization header
//!
//! Run: cargo run --bin sign_request -- POST /v1/conversions '{"amount":"10"}'
//!
//! Uses ONEMONEY_ACCESS_KEY / ONEMONEY_SECRET_KEY when set, otherwise a
//! throwaway demo key pair.

use chrono::{TimeZone, Utc};
use colored::*;
use onemoney_auth::{Credentials, FixedClock, Signer, TIMESTAMP_FORMAT};

const DEMO_ACCESS_KEY: &str = "AK_DEMO";
const DEMO_SECRET_KEY: &str = "ZGVtby1zZWNyZXQta2V5";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let method = args.next().unwrap_or_else(|| "GET".to_string());
    let path = args.next().unwrap_or_else(|| "/v1/assets".to_string());
    let body = args.next().unwrap_or_default();

    println!("{}", "═".repeat(65).cyan());
    println!("{}", "  REQUEST SIGNING".cyan().bold());
    println!("{}", "  1Money SDK Demo - HMAC-SHA256 Authorization".cyan());
    println!("{}", "═".repeat(65).cyan());
    println!();

    let credentials = match Credentials::from_env() {
        Ok(creds) => {
            println!("{} Using credentials from environment", "✓".green());
            creds
        }
        Err(_) => {
            println!("{} No credentials in environment, using demo keys", "!".yellow());
            Credentials::new(DEMO_ACCESS_KEY, DEMO_SECRET_KEY)?
        }
    };
    credentials.validate()?;

    // Frozen clock so repeated runs print the same signature
    let at = Utc.with_ymd_and_hms(2024, 3, 5, 7, 9, 2).single().ok_or("invalid demo time")?;
    let signer = Signer::new(credentials).with_clock(FixedClock(at));
    let signature = signer.sign(&method, &path, body.as_bytes())?;

    println!();
    println!("  {:<14} {}", "Method".white().bold(), method.to_uppercase());
    println!("  {:<14} {}", "Path".white().bold(), path);
    println!("  {:<14} {} bytes", "Body".white().bold(), body.len());
    println!("  {:<14} {}", "Time format".white().bold(), TIMESTAMP_FORMAT);
    println!("  {}", "─".repeat(52));
    println!();
    println!("{}", "  Canonical string".white().bold());
    let canonical =
        signer.canonical_string(&method, &path, &signature.timestamp, &signature.body_hash);
    for line in canonical.lines() {
        println!("    {}", line.dimmed());
    }
    println!();
    println!("  {:<14} {}", "X-OM-Date".white().bold(), signature.timestamp.green());
    println!("  {:<14} {}", "Authorization".white().bold(), signature.authorization.green());
    println!();

    Ok(())
}
