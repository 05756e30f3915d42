//! Extracta SDK - Rust Client Library
//!
//! Submit extraction jobs and poll them, or stream a run's events live.
//!
//! # Example
//!
//! ```no_run
//! use extracta_sdk::{ExtractaClient, ExtractionRequest, FetchMode};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ExtractaClient::connect("http://127.0.0.1:9630").await?;
//!
//!     let request = ExtractionRequest::new("web", "generic", "https://example.com");
//!     let job = client.submit(request, FetchMode::One).await?;
//!     client.wait(&job.job_id, Duration::from_millis(250)).await?;
//!
//!     let result = client.result(&job.job_id).await?;
//!     println!("{:?}", result.payload);
//!     Ok(())
//! }
//! ```

mod client;
mod error;
mod types;

pub use client::{EventStream, ExtractaClient};
pub use error::{Result, SdkError};
pub use types::{
    ExtractionOptions, ExtractionRequest, FetchMode, JobStatus, JobStatusResponse,
    ResultResponse, RunEvent, RunFrame, StatsResponse, SubmitResponse,
};
