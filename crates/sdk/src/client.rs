//! Extracta Client Implementation

use crate::error::{Result, SdkError};
use crate::types::{
    ExtractionRequest, FetchMode, JobStatusResponse, ResultResponse, RunFrame,
    StatsResponse, SubmitResponse,
};
use jsonrpsee::core::client::{ClientT, Subscription, SubscriptionClientT};
use jsonrpsee::core::params::ObjectParams;
use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use jsonrpsee::ws_client::{WsClient, WsClientBuilder};
use std::time::Duration;

const SUBMIT: &str = "extract.submit.v1";
const STATUS: &str = "extract.status.v1";
const RESULT: &str = "extract.result.v1";
const STATS: &str = "admin.stats.v1";
const SUBSCRIBE: &str = "extract.subscribe.v1";
const UNSUBSCRIBE: &str = "extract.unsubscribe.v1";

/// Extracta daemon client
///
/// Poll methods go over HTTP. [`ExtractaClient::stream`] opens a WebSocket
/// connection per run.
///
/// # Example
///
/// ```no_run
/// use extracta_sdk::ExtractaClient;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = ExtractaClient::connect("http://127.0.0.1:9630").await?;
/// # Ok(())
/// # }
/// ```
pub struct ExtractaClient {
    client: HttpClient,
    ws_url: String,
}

impl ExtractaClient {
    /// Connect to the daemon
    ///
    /// # Arguments
    ///
    /// * `url` - RPC endpoint URL (e.g., `http://127.0.0.1:9630`)
    pub async fn connect(url: impl AsRef<str>) -> Result<Self> {
        let url = url.as_ref();
        let ws_url = ws_url(url)?;

        let client = HttpClientBuilder::default()
            .request_timeout(Duration::from_secs(30))
            .build(url)
            .map_err(|e| SdkError::Connection(format!("Failed to create client: {}", e)))?;

        Ok(Self { client, ws_url })
    }

    /// Submit a job; returns as soon as it is queued
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use extracta_sdk::{ExtractaClient, ExtractionRequest, FetchMode};
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// # let client = ExtractaClient::connect("http://127.0.0.1:9630").await?;
    /// let request = ExtractionRequest::new("web", "generic", "https://example.com");
    /// let response = client.submit(request, FetchMode::One).await?;
    /// println!("Job ID: {}", response.job_id);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn submit(
        &self,
        request: ExtractionRequest,
        mode: FetchMode,
    ) -> Result<SubmitResponse> {
        let params = request_params(request, mode)?;
        let response: SubmitResponse = self.client.request(SUBMIT, params).await?;
        Ok(response)
    }

    pub async fn status(&self, job_id: impl Into<String>) -> Result<JobStatusResponse> {
        let response: JobStatusResponse = self.client.request(STATUS, job_params(job_id)?).await?;
        Ok(response)
    }

    /// Fetch a job's result, `pending` while it is queued or running
    pub async fn result(&self, job_id: impl Into<String>) -> Result<ResultResponse> {
        let response: ResultResponse = self.client.request(RESULT, job_params(job_id)?).await?;
        Ok(response)
    }

    pub async fn stats(&self) -> Result<StatsResponse> {
        let response: StatsResponse = self.client.request(STATS, ObjectParams::new()).await?;
        Ok(response)
    }

    /// Poll status until the job is done or failed
    pub async fn wait(
        &self,
        job_id: impl Into<String>,
        interval: Duration,
    ) -> Result<JobStatusResponse> {
        let job_id = job_id.into();
        loop {
            let status = self.status(job_id.clone()).await?;
            if status.status.is_terminal() {
                return Ok(status);
            }
            tokio::time::sleep(interval).await;
        }
    }

    /// Open a run and receive its events as they happen
    ///
    /// The run is not registered as a job; it is bound to this stream.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use extracta_sdk::{ExtractaClient, ExtractionRequest, FetchMode};
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// # let client = ExtractaClient::connect("http://127.0.0.1:9630").await?;
    /// let request = ExtractionRequest::new("web", "generic", "https://example.com");
    /// let mut events = client.stream(request, FetchMode::List).await?;
    /// while let Some(frame) = events.next().await {
    ///     println!("{:?}", frame?.event);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn stream(&self, request: ExtractionRequest, mode: FetchMode) -> Result<EventStream> {
        let ws = WsClientBuilder::default()
            .build(&self.ws_url)
            .await
            .map_err(|e| SdkError::Connection(format!("WebSocket connect failed: {}", e)))?;

        let params = request_params(request, mode)?;
        let subscription: Subscription<RunFrame> =
            ws.subscribe(SUBSCRIBE, params, UNSUBSCRIBE).await?;

        Ok(EventStream {
            subscription,
            _client: ws,
            finished: false,
        })
    }
}

/// Frames of one streamed run, ending after its terminal frame
pub struct EventStream {
    subscription: Subscription<RunFrame>,
    // Dropping the client closes the connection
    _client: WsClient,
    finished: bool,
}

impl EventStream {
    /// Next frame, or `None` once the terminal frame was yielded or the server went away
    pub async fn next(&mut self) -> Option<Result<RunFrame>> {
        if self.finished {
            return None;
        }
        match self.subscription.next().await {
            Some(Ok(frame)) => {
                self.finished = frame.is_terminal();
                Some(Ok(frame))
            }
            Some(Err(e)) => {
                self.finished = true;
                Some(Err(SdkError::Serialization(e)))
            }
            None => {
                self.finished = true;
                None
            }
        }
    }

    /// Drain the stream
    pub async fn collect(mut self) -> Result<Vec<RunFrame>> {
        let mut frames = Vec::new();
        while let Some(frame) = self.next().await {
            frames.push(frame?);
        }
        Ok(frames)
    }
}

fn request_params(request: ExtractionRequest, mode: FetchMode) -> Result<ObjectParams> {
    let mut params = ObjectParams::new();
    params
        .insert("request", request)
        .map_err(SdkError::Serialization)?;
    params.insert("mode", mode).map_err(SdkError::Serialization)?;
    Ok(params)
}

fn job_params(job_id: impl Into<String>) -> Result<ObjectParams> {
    let mut params = ObjectParams::new();
    params
        .insert("jobId", job_id.into())
        .map_err(SdkError::Serialization)?;
    Ok(params)
}

/// Same host and port, WebSocket scheme
fn ws_url(url: &str) -> Result<String> {
    if let Some(rest) = url.strip_prefix("http://") {
        Ok(format!("ws://{}", rest))
    } else if let Some(rest) = url.strip_prefix("https://") {
        Ok(format!("wss://{}", rest))
    } else if url.starts_with("ws://") || url.starts_with("wss://") {
        Ok(url.to_string())
    } else {
        Err(SdkError::InvalidUrl(url.to_string()))
    }
}
