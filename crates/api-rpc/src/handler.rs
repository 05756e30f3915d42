//! RPC Method Handlers
//!
//! Poll-style consumers talk to the Job Registry only; they never see the
//! orchestrator.

use crate::error::{job_not_found, to_rpc_error};
use crate::types::{
    JobIdRequest, JobStatusResponse, ResultResponse, StatsResponse, SubmitRequest, SubmitResponse,
};
use extracta_core::application::JobRegistry;
use jsonrpsee::types::ErrorObjectOwned;
use std::sync::Arc;
use tracing::debug;

/// RPC Handler with injected dependencies
pub struct RpcHandler {
    registry: Arc<JobRegistry>,
    /// Registered handler labels, reported by stats
    extractors: Vec<String>,
}

impl RpcHandler {
    pub fn new(registry: Arc<JobRegistry>, extractors: Vec<String>) -> Self {
        Self {
            registry,
            extractors,
        }
    }

    /// extract.submit.v1
    pub async fn submit(&self, params: SubmitRequest) -> Result<SubmitResponse, ErrorObjectOwned> {
        let job = self
            .registry
            .submit_with_mode(params.request, params.mode)
            .await
            .map_err(to_rpc_error)?;

        Ok(SubmitResponse {
            job_id: job.id,
            status: job.status,
            progress: job.progress,
        })
    }

    /// extract.status.v1
    pub async fn status(&self, params: JobIdRequest) -> Result<JobStatusResponse, ErrorObjectOwned> {
        let job = self
            .registry
            .get_job(&params.job_id)
            .await
            .map_err(to_rpc_error)?
            .ok_or_else(|| job_not_found(&params.job_id))?;
        debug!(job_id = %job.id, status = %job.status, "Status polled");
        Ok(job.into())
    }

    /// extract.result.v1
    pub async fn result(&self, params: JobIdRequest) -> Result<ResultResponse, ErrorObjectOwned> {
        let lookup = self
            .registry
            .lookup_result(&params.job_id)
            .await
            .map_err(to_rpc_error)?;
        ResultResponse::from_lookup(params.job_id.clone(), lookup)
            .ok_or_else(|| job_not_found(&params.job_id))
    }

    /// admin.stats.v1
    pub async fn stats(&self) -> Result<StatsResponse, ErrorObjectOwned> {
        let stats = self.registry.stats().await.map_err(to_rpc_error)?;
        Ok(StatsResponse::new(stats, self.extractors.clone()))
    }
}
