// Submit Use Case

use crate::domain::{ExtractionRequest, FetchMode, Job};
use crate::error::{AppError, Result};
use crate::port::{IdProvider, JobStore, TimeProvider};
use tracing::{info, warn};

use super::queue::QueueSender;

const MAX_KEY_LEN: usize = 64;
const TIMEOUT_MS_RANGE: std::ops::RangeInclusive<u64> = 1_000..=600_000;
const MAX_PAGES_RANGE: std::ops::RangeInclusive<u32> = 1..=100;
const LOCALE_LEN_RANGE: std::ops::RangeInclusive<usize> = 2..=16;

fn validate_key(field: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(AppError::Validation(format!("{} cannot be empty", field)));
    }
    if value.len() > MAX_KEY_LEN {
        return Err(AppError::Validation(format!(
            "{} too long (max {} chars)",
            field, MAX_KEY_LEN
        )));
    }
    if !value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(AppError::Validation(format!(
            "{} must be alphanumeric (with '_' or '-')",
            field
        )));
    }
    Ok(())
}

/// Reject malformed requests before any job record exists
pub fn validate_request(req: &ExtractionRequest) -> Result<()> {
    validate_key("category", req.category.as_str())?;
    validate_key("source", req.source.as_str())?;

    let url = url::Url::parse(&req.url)
        .map_err(|e| AppError::Validation(format!("url is not valid: {}", e)))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(AppError::Validation(format!(
            "url scheme must be http or https, got {}",
            url.scheme()
        )));
    }
    if url.host_str().is_none() {
        return Err(AppError::Validation("url must have a host".to_string()));
    }

    let options = &req.options;
    if let Some(timeout_ms) = options.timeout_ms {
        if !TIMEOUT_MS_RANGE.contains(&timeout_ms) {
            return Err(AppError::Validation(format!(
                "timeoutMs out of range ({}..={})",
                TIMEOUT_MS_RANGE.start(),
                TIMEOUT_MS_RANGE.end()
            )));
        }
    }
    if let Some(max_pages) = options.max_pages {
        if !MAX_PAGES_RANGE.contains(&max_pages) {
            return Err(AppError::Validation(format!(
                "maxPages out of range ({}..={})",
                MAX_PAGES_RANGE.start(),
                MAX_PAGES_RANGE.end()
            )));
        }
    }
    if let Some(locale) = &options.locale {
        if !LOCALE_LEN_RANGE.contains(&locale.len())
            || !locale
                .chars()
                .all(|c| c.is_ascii_alphabetic() || c == '-' || c == '_')
        {
            return Err(AppError::Validation(format!(
                "locale '{}' is not a valid language tag",
                locale
            )));
        }
    }
    Ok(())
}

/// Execute submit use case
///
/// # Arguments
///
/// * `store` - Job store
/// * `queue` - Worker queue
/// * `id_provider` - ID generator (injected for determinism)
/// * `time_provider` - Time provider (injected for determinism)
/// * `req` - Extraction request
/// * `mode` - Handler table the run will be dispatched through
pub async fn execute(
    store: &dyn JobStore,
    queue: &QueueSender,
    id_provider: &dyn IdProvider,
    time_provider: &dyn TimeProvider,
    req: ExtractionRequest,
    mode: FetchMode,
) -> Result<Job> {
    validate_request(&req)?;

    let job = Job::new(id_provider.generate_id(), time_provider.now_millis(), req).with_mode(mode);
    store.insert(&job).await?;

    if let Err(e) = queue.enqueue(job.id.clone()) {
        // The record exists but will never run: close it out
        let mut orphan = job.clone();
        orphan.fail(time_provider.now_millis(), e.to_string())?;
        if let Err(update_err) = store.update(&orphan).await {
            warn!(job_id = %job.id, error = %update_err, "Failed to close unscheduled job");
        }
        return Err(e);
    }

    info!(
        job_id = %job.id,
        mode = %mode,
        category = %job.params.category,
        source = %job.params.source,
        queue_depth = queue.depth(),
        "Job submitted"
    );
    Ok(job)
}
