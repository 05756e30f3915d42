//! Daemon wiring with the real web adapters: HTTP contexts, the built-in
//! extractor and the result forwarder, all against a local listener.

use extracta_core::application::{
    job_queue, shutdown_channel, ExtractorRegistry, InMemoryJobStore, JobRegistry,
    OrchestratorConfig, RunOrchestrator, Worker,
};
use extracta_core::domain::{ExtractionRequest, FetchMode, JobStatus};
use extracta_core::port::id_provider::UuidProvider;
use extracta_core::port::time_provider::SystemTimeProvider;
use extracta_infra_web::{register_builtin, HttpContextProvider, HttpResultForwarder};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

const PAGE: &str = r#"<html><head><title>Harbour Notes</title></head>
<body><h1>Tides</h1><a href="/tides/monday">Monday</a></body></html>"#;

/// Serves `PAGE` on GET and records the body of every POST
async fn local_site() -> (String, Arc<Mutex<Vec<String>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let posts = Arc::new(Mutex::new(Vec::new()));

    let log = posts.clone();
    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            let log = log.clone();
            tokio::spawn(async move {
                let mut raw = Vec::new();
                let mut chunk = [0u8; 4096];
                loop {
                    let n = stream.read(&mut chunk).await.unwrap_or(0);
                    if n == 0 {
                        return;
                    }
                    raw.extend_from_slice(&chunk[..n]);
                    let text = String::from_utf8_lossy(&raw).to_string();
                    let Some((head, body)) = text.split_once("\r\n\r\n") else {
                        continue;
                    };
                    let length: usize = head
                        .lines()
                        .filter_map(|l| l.split_once(':'))
                        .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
                        .and_then(|(_, v)| v.trim().parse().ok())
                        .unwrap_or(0);
                    if body.len() < length {
                        continue;
                    }
                    let reply = if head.starts_with("POST") {
                        log.lock().unwrap().push(body.to_string());
                        String::new()
                    } else {
                        PAGE.to_string()
                    };
                    let response = format!(
                        "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        reply.len(),
                        reply
                    );
                    let _ = stream.write_all(response.as_bytes()).await;
                    return;
                }
            });
        }
    });

    (base, posts)
}

#[tokio::test]
async fn test_job_runs_over_http_and_is_forwarded() {
    let (base, posts) = local_site().await;

    let mut extractors = ExtractorRegistry::new();
    register_builtin(&mut extractors);
    let store = Arc::new(InMemoryJobStore::new());
    let (queue_tx, queue_rx) = job_queue();
    let orchestrator = Arc::new(RunOrchestrator::new(
        Arc::new(extractors),
        Arc::new(HttpContextProvider::default()),
        Arc::new(UuidProvider),
        Arc::new(SystemTimeProvider),
        OrchestratorConfig {
            settle_delay: Duration::ZERO,
            ..OrchestratorConfig::default()
        },
    ));
    let registry = JobRegistry::new(
        store.clone(),
        queue_tx,
        Arc::new(UuidProvider),
        Arc::new(SystemTimeProvider),
    );
    let forwarder =
        HttpResultForwarder::new(format!("{}/ingest", base), Duration::from_secs(5)).unwrap();

    let (shutdown_tx, shutdown_rx) = shutdown_channel();
    let worker = Worker::new(
        queue_rx,
        store,
        orchestrator,
        Arc::new(forwarder),
        Arc::new(SystemTimeProvider),
    );
    let worker = tokio::spawn(async move {
        let _ = worker.run(shutdown_rx).await;
    });

    let job = registry
        .submit(ExtractionRequest::new("web", "generic", format!("{}/notes", base)))
        .await
        .unwrap();
    assert_eq!(job.mode, FetchMode::One);

    let job = tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            let job = registry.get_job(&job.id).await.unwrap().unwrap();
            if job.status.is_terminal() {
                return job;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("job never finished");
    assert_eq!(job.status, JobStatus::Done, "error: {:?}", job.error_message);

    let result = registry.get_result(&job.id).await.unwrap().unwrap();
    let value = result.payload.into_value();
    assert_eq!(value["title"], "Harbour Notes");
    assert_eq!(value["heading"], "Tides");

    // Forwarding happens after the commit; give it a moment
    tokio::time::timeout(Duration::from_secs(5), async {
        while posts.lock().unwrap().is_empty() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("result was never forwarded");
    let forwarded: serde_json::Value =
        serde_json::from_str(&posts.lock().unwrap()[0]).unwrap();
    assert_eq!(forwarded["request"]["source"], "generic");
    assert_eq!(forwarded["result"]["title"], "Harbour Notes");

    shutdown_tx.raise();
    let _ = tokio::time::timeout(Duration::from_secs(5), worker).await;
}
