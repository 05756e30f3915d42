//! Extracta CLI - Command-line interface for the Extracta daemon

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tabled::{Table, Tabled};

const DEFAULT_RPC_URL: &str = "http://127.0.0.1:9630";

#[derive(Parser)]
#[command(name = "extracta")]
#[command(about = "Extracta CLI", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// RPC server URL
    #[arg(long, env = "EXTRACTA_RPC_URL", default_value = DEFAULT_RPC_URL)]
    rpc_url: String,
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    One,
    List,
    Detail,
}

impl Mode {
    fn as_str(self) -> &'static str {
        match self {
            Mode::One => "one",
            Mode::List => "list",
            Mode::Detail => "detail",
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Submit an extraction job
    Submit {
        /// Category (e.g., web)
        #[arg(short, long, default_value = "web")]
        category: String,

        /// Source identifier within the category
        #[arg(short, long, default_value = "generic")]
        source: String,

        /// Target URL
        url: String,

        /// Fetch mode
        #[arg(short, long, value_enum, default_value = "one")]
        mode: Mode,

        /// Run timeout in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Upper bound on list items
        #[arg(long)]
        max_pages: Option<u32>,

        /// Language tag sent with navigation (e.g., en-US)
        #[arg(long)]
        locale: Option<String>,

        /// Poll until the job finishes
        #[arg(short, long)]
        wait: bool,
    },

    /// Show a job's status
    Status {
        /// Job ID
        job_id: String,
    },

    /// Print a job's result payload
    #[command(name = "result")]
    Output {
        /// Job ID
        job_id: String,
    },

    /// Poll a job until it reaches done or error
    Watch {
        /// Job ID
        job_id: String,

        /// Poll interval in milliseconds
        #[arg(short, long, default_value = "500")]
        interval_ms: u64,
    },

    /// Show system status
    Stats,
}

#[derive(Serialize)]
struct JsonRpcRequest {
    jsonrpc: String,
    method: String,
    params: serde_json::Value,
    id: u64,
}

#[derive(Deserialize)]
struct JsonRpcResponse {
    #[allow(dead_code)]
    jsonrpc: String,
    #[allow(dead_code)]
    id: u64,
    result: Option<serde_json::Value>,
    error: Option<JsonRpcError>,
}

#[derive(Deserialize)]
struct JsonRpcError {
    code: i32,
    message: String,
}

#[derive(Deserialize, Tabled)]
#[serde(rename_all = "camelCase")]
struct SubmitResult {
    job_id: String,
    status: String,
    progress: u8,
}

#[derive(Deserialize, Tabled)]
#[serde(rename_all = "camelCase")]
struct JobRow {
    id: String,
    mode: String,
    status: String,
    progress: u8,
    current_step: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct JobStatus {
    #[serde(flatten)]
    row: JobRow,
    error_message: Option<String>,
}

impl JobStatus {
    fn is_terminal(&self) -> bool {
        matches!(self.row.status.as_str(), "done" | "error")
    }
}

async fn call_rpc(url: &str, method: &str, params: serde_json::Value) -> Result<serde_json::Value> {
    let request = JsonRpcRequest {
        jsonrpc: "2.0".to_string(),
        method: method.to_string(),
        params,
        id: 1,
    };

    let client = reqwest::Client::new();
    let response: JsonRpcResponse = client
        .post(url)
        .json(&request)
        .send()
        .await
        .context("Failed to connect to daemon")?
        .json()
        .await
        .context("Failed to parse response")?;

    if let Some(error) = response.error {
        anyhow::bail!("RPC error ({}): {}", error.code, error.message);
    }

    response
        .result
        .ok_or_else(|| anyhow::anyhow!("No result in response"))
}

fn submit_params(
    category: &str,
    source: &str,
    url: &str,
    mode: Mode,
    timeout_ms: Option<u64>,
    max_pages: Option<u32>,
    locale: Option<String>,
) -> serde_json::Value {
    let mut options = serde_json::Map::new();
    if let Some(ms) = timeout_ms {
        options.insert("timeoutMs".into(), json!(ms));
    }
    if let Some(n) = max_pages {
        options.insert("maxPages".into(), json!(n));
    }
    if let Some(locale) = locale {
        options.insert("locale".into(), json!(locale));
    }

    json!({
        "mode": mode.as_str(),
        "request": {
            "category": category,
            "source": source,
            "url": url,
            "options": options,
        }
    })
}

async fn fetch_status(rpc_url: &str, job_id: &str) -> Result<JobStatus> {
    let result = call_rpc(rpc_url, "extract.status.v1", json!({ "jobId": job_id })).await?;
    serde_json::from_value(result).context("Unexpected status shape")
}

async fn print_result(rpc_url: &str, job_id: &str) -> Result<()> {
    let result = call_rpc(rpc_url, "extract.result.v1", json!({ "jobId": job_id })).await?;

    if result["pending"].as_bool().unwrap_or(false) {
        println!(
            "{}",
            format!("Job {} is still {}", job_id, result["status"].as_str().unwrap_or("pending"))
                .yellow()
        );
    } else if let Some(message) = result["errorMessage"].as_str() {
        println!("{} {}", "✗ Job failed:".red().bold(), message);
    } else {
        println!("{}", serde_json::to_string_pretty(&result["payload"])?);
    }
    Ok(())
}

async fn watch(rpc_url: &str, job_id: &str, interval: Duration) -> Result<()> {
    let mut last_step = String::new();
    loop {
        let status = fetch_status(rpc_url, job_id).await?;
        if status.row.current_step != last_step {
            println!(
                "  {:>3}% {}",
                status.row.progress,
                status.row.current_step.dimmed()
            );
            last_step = status.row.current_step.clone();
        }

        if status.is_terminal() {
            println!();
            if status.row.status == "done" {
                println!("{}", format!("✓ Job {} done", job_id).green().bold());
                print_result(rpc_url, job_id).await?;
            } else {
                println!(
                    "{} {}",
                    format!("✗ Job {} failed:", job_id).red().bold(),
                    status.error_message.unwrap_or_default()
                );
            }
            return Ok(());
        }
        tokio::time::sleep(interval).await;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Submit {
            category,
            source,
            url,
            mode,
            timeout_ms,
            max_pages,
            locale,
            wait,
        } => {
            let params = submit_params(&category, &source, &url, mode, timeout_ms, max_pages, locale);

            let result = call_rpc(&cli.rpc_url, "extract.submit.v1", params).await?;
            let submitted: SubmitResult = serde_json::from_value(result)?;
            let job_id = submitted.job_id.clone();

            println!("{}", "✓ Job submitted successfully".green().bold());
            println!();
            println!("{}", Table::new(vec![submitted]));

            if wait {
                println!();
                watch(&cli.rpc_url, &job_id, Duration::from_millis(500)).await?;
            }
        }

        Commands::Status { job_id } => {
            let status = fetch_status(&cli.rpc_url, &job_id).await?;
            let error = status.error_message.clone();
            println!("{}", Table::new(vec![status.row]));
            if let Some(error) = error {
                println!("  {} {}", "Error:".red().bold(), error);
            }
        }

        Commands::Output { job_id } => {
            print_result(&cli.rpc_url, &job_id).await?;
        }

        Commands::Watch {
            job_id,
            interval_ms,
        } => {
            println!("{}", format!("Watching job {}", job_id).cyan().bold());
            watch(&cli.rpc_url, &job_id, Duration::from_millis(interval_ms.max(50))).await?;
        }

        Commands::Stats => {
            println!("{}", "System Status".cyan().bold());
            println!();

            match call_rpc(&cli.rpc_url, "admin.stats.v1", json!({})).await {
                Ok(stats) => {
                    println!("  {} {}", "RPC URL:".bold(), cli.rpc_url);
                    println!("  {} {}", "Status:".bold(), "ONLINE".green());
                    println!();
                    println!("  {} {}", "Total Jobs:".bold(), stats["totalJobs"]);
                    println!("  {} {}", "Queued:".bold(), stats["queuedJobs"]);
                    println!("  {} {}", "Running:".bold(), stats["runningJobs"]);
                    println!("  {} {}", "Done:".bold(), stats["doneJobs"]);
                    println!("  {} {}", "Failed:".bold(), stats["errorJobs"]);
                    println!("  {} {}", "Queue Depth:".bold(), stats["queueDepth"]);
                    println!("  {} {} seconds", "Uptime:".bold(), stats["uptimeSeconds"]);
                    if let Some(extractors) = stats["extractors"].as_array() {
                        println!();
                        println!("  {}", "Extractors:".bold());
                        for name in extractors.iter().filter_map(|v| v.as_str()) {
                            println!("    • {}", name);
                        }
                    }
                }
                Err(e) => {
                    println!("  {} {}", "Status:".bold(), "ERROR".red());
                    println!("  {} {}", "Error:".bold(), e);
                }
            }
        }
    }

    Ok(())
}
