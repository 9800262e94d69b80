//! Navigation, script evaluation and console logging over a live session.
//!
//! Demonstrates:
//! - Connecting to a browser's BiDi endpoint and creating a session
//! - Opening a tab and navigating it
//! - Evaluating script and receiving console log entries
//! - Typing, pressing Enter and taking a screenshot
//!
//! Start a browser with BiDi enabled first, e.g.
//! `firefox --remote-debugging-port 9222 --headless`.
//!
//! Usage:
//!   cargo run --example navigate
//!   cargo run --example navigate -- ws://127.0.0.1:9222/session
//!   cargo run --example navigate -- --debug

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;
use webdriver_bidi::{BidiClient, Key};

// ============================================================================
// Constants
// ============================================================================

const DEFAULT_ENDPOINT: &str = "ws://127.0.0.1:9222/session";
const TARGET_URL: &str = "https://example.com/";
const SCREENSHOT_PATH: &str = "navigate.png";

// ============================================================================
// Arguments
// ============================================================================

struct Args {
    endpoint: String,
    debug: bool,
}

impl Args {
    fn parse() -> Self {
        let mut endpoint = DEFAULT_ENDPOINT.to_string();
        let mut debug = false;
        for arg in std::env::args().skip(1) {
            match arg.as_str() {
                "--debug" => debug = true,
                other => endpoint = other.to_string(),
            }
        }
        Self { endpoint, debug }
    }
}

fn init_logging(debug: bool) {
    let filter = if debug {
        "webdriver_bidi=trace"
    } else {
        "webdriver_bidi=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(args.debug);

    if let Err(e) = run(args).await {
        eprintln!("\n[ERROR] {e:#}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    println!("=== Navigate ===\n");

    // ========================================================================
    // Connect
    // ========================================================================

    println!("[1] Connecting to {}...", args.endpoint);

    let client = BidiClient::builder()
        .endpoint(&args.endpoint)
        .command_timeout(Duration::from_secs(15))
        .connect()
        .await
        .context("could not start a session")?;

    println!("    ✓ Session {:?}\n", client.session_id());

    client
        .on_log_entry(|entry| println!("    [console] {}", entry.text().unwrap_or_default()))
        .await?;

    // ========================================================================
    // Navigate
    // ========================================================================

    println!("[2] Opening a tab and navigating to {TARGET_URL}...");

    let tab = client.new_tab().await?;
    let result = client.navigate(&tab, TARGET_URL).await?;

    println!("    ✓ Loaded {}\n", result.url);

    // ========================================================================
    // Script
    // ========================================================================

    println!("[3] Evaluating script...");

    let title = client.evaluate(&tab, "document.title").await?;
    client
        .evaluate(&tab, "console.log('hello from the page')")
        .await?;

    println!("    ✓ Title: {title}\n");

    // ========================================================================
    // Input
    // ========================================================================

    println!("[4] Typing into a fresh input...");

    client
        .evaluate(
            &tab,
            "(() => { const i = document.createElement('input'); \
             document.body.append(i); i.focus(); })()",
        )
        .await?;
    client.type_text(&tab, "webdriver bidi").await?;
    client.press_key(&tab, Key::Enter).await?;

    let typed = client
        .evaluate(&tab, "document.activeElement.value")
        .await?;
    println!("    ✓ Input value: {typed}\n");

    // ========================================================================
    // Screenshot
    // ========================================================================

    println!("[5] Capturing a screenshot...");

    let png = client.screenshot(&tab).await?;
    tokio::fs::write(SCREENSHOT_PATH, &png).await?;

    println!("    ✓ Wrote {} bytes to {SCREENSHOT_PATH}\n", png.len());

    // ========================================================================
    // Cleanup
    // ========================================================================

    client.close_context(&tab).await?;
    client.end().await?;

    println!("=== Done ===");
    Ok(())
}
