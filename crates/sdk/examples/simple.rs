//! Simple SDK Example
//!
//! Submits one job, waits for it, then streams a list run.
//!
//! # Usage
//!
//! 1. Start the daemon:
//!    ```bash
//!    cargo run --package extracta-daemon
//!    ```
//!
//! 2. Run this example:
//!    ```bash
//!    cargo run --package extracta-sdk --example simple -- https://example.com
//!    ```

use extracta_sdk::{ExtractaClient, ExtractionRequest, FetchMode, RunEvent};
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "https://example.com".to_string());

    println!("Extracta SDK - Simple Example");
    println!("=============================\n");

    // 1. Connect to daemon
    println!("1. Connecting to daemon...");
    let client = ExtractaClient::connect("http://127.0.0.1:9630").await?;
    println!("   ✓ Connected\n");

    // 2. Submit a job and poll it
    println!("2. Submitting a job for {}...", url);
    let job = client
        .submit(ExtractionRequest::new("web", "generic", &url), FetchMode::One)
        .await?;
    println!("   ✓ Job {} queued", job.job_id);

    let status = client.wait(&job.job_id, Duration::from_millis(250)).await?;
    println!("   ✓ Job finished: {:?} ({})\n", status.status, status.current_step);

    let result = client.result(&job.job_id).await?;
    match (result.payload, result.error_message) {
        (Some(payload), _) => println!("   {}\n", serde_json::to_string_pretty(&payload)?),
        (None, Some(message)) => println!("   ✗ {}\n", message),
        (None, None) => println!("   (no payload)\n"),
    }

    // 3. Stream a list run
    println!("3. Streaming a list run...");
    let mut events = client
        .stream(ExtractionRequest::new("web", "generic", &url), FetchMode::List)
        .await?;
    while let Some(frame) = events.next().await {
        match frame?.event {
            RunEvent::Progress { message, percent } => println!("   {:>3}% {}", percent, message),
            RunEvent::Data { index, total, .. } => {
                println!("   item {}/{}", index.map_or(1, |i| i + 1), total.unwrap_or(1))
            }
            RunEvent::Complete { item_count, duration_ms } => println!(
                "   ✓ {} items in {} ms",
                item_count.unwrap_or(0),
                duration_ms.unwrap_or(0)
            ),
            RunEvent::Error { message } => println!("   ✗ {}", message),
        }
    }

    // 4. Stats
    let stats = client.stats().await?;
    println!("\n4. Daemon has seen {} jobs", stats.total_jobs);

    Ok(())
}
