// FIFO job queue feeding the worker supervisor

use crate::domain::JobId;
use crate::error::{AppError, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Create the submission queue. The receiver is owned by the single worker.
pub fn job_queue() -> (QueueSender, QueueReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    let depth = Arc::new(AtomicUsize::new(0));
    (
        QueueSender {
            tx,
            depth: Arc::clone(&depth),
        },
        QueueReceiver { rx, depth },
    )
}

/// Submission side, cloned into every registry handle
#[derive(Clone)]
pub struct QueueSender {
    tx: mpsc::UnboundedSender<JobId>,
    depth: Arc<AtomicUsize>,
}

impl QueueSender {
    /// Append a job id. Never blocks; fails only once the worker is gone.
    pub fn enqueue(&self, job_id: JobId) -> Result<()> {
        self.depth.fetch_add(1, Ordering::SeqCst);
        self.tx.send(job_id).map_err(|e| {
            self.depth.fetch_sub(1, Ordering::SeqCst);
            AppError::Unavailable(format!("worker queue closed, job {} not scheduled", e.0))
        })
    }

    /// Ids waiting to be pulled by the worker
    pub fn depth(&self) -> usize {
        self.depth.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Worker side
pub struct QueueReceiver {
    rx: mpsc::UnboundedReceiver<JobId>,
    depth: Arc<AtomicUsize>,
}

impl QueueReceiver {
    /// Next id in submission order, or `None` once every sender is dropped
    pub async fn next(&mut self) -> Option<JobId> {
        let id = self.rx.recv().await?;
        self.depth.fetch_sub(1, Ordering::SeqCst);
        Some(id)
    }

    pub fn depth(&self) -> usize {
        self.depth.load(Ordering::SeqCst)
    }
}
