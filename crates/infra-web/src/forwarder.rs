// HTTP result forwarder
//
// POSTs `{"request": ..., "result": ...}` to a downstream storage endpoint.

use async_trait::async_trait;
use extracta_core::domain::{ExtractedPayload, ExtractionRequest};
use extracta_core::port::{PersistError, ResultPersister};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Serialize)]
struct ForwardBody<'a> {
    request: &'a ExtractionRequest,
    result: &'a ExtractedPayload,
}

pub struct HttpResultForwarder {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpResultForwarder {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, PersistError> {
        let endpoint = endpoint.into();
        url::Url::parse(&endpoint)
            .map_err(|e| PersistError::Unreachable(format!("invalid endpoint {}: {}", endpoint, e)))?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PersistError::Unreachable(e.to_string()))?;

        info!(endpoint = %endpoint, "Result forwarding enabled");
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ResultPersister for HttpResultForwarder {
    async fn persist(
        &self,
        request: &ExtractionRequest,
        payload: &ExtractedPayload,
    ) -> Result<(), PersistError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&ForwardBody {
                request,
                result: payload,
            })
            .send()
            .await
            .map_err(|e| PersistError::Unreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PersistError::Rejected(status.as_u16()));
        }
        debug!(endpoint = %self.endpoint, items = payload.item_count(), "Result forwarded");
        Ok(())
    }
}
