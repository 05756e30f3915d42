//! Registry and orchestrator invariants observed from outside

mod common;

use common::{item, request, request_for, single, Stack, CATEGORY, SOURCE};
use extracta_core::application::{ExtractorRegistry, ResultLookup};
use extracta_core::domain::{FetchMode, Job, JobStatus};
use extracta_core::port::event_sink::mocks::RecordingSink;
use extracta_core::port::extractor::mocks::{MockBehavior, MockExtractor};
use futures::future::join_all;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

fn rank(status: JobStatus) -> u8 {
    match status {
        JobStatus::Queued => 0,
        JobStatus::Running => 1,
        JobStatus::Done | JobStatus::Error => 2,
    }
}

#[tokio::test]
async fn test_submitted_ids_unique_and_queued() {
    let stack = Stack::idle(single(MockBehavior::Return(item())));

    let submissions = (0..50).map(|i| {
        let registry = stack.registry.clone();
        async move {
            registry
                .submit(request_for(&format!("https://example.com/{}", i)))
                .await
                .unwrap()
        }
    });
    let jobs: Vec<Job> = join_all(submissions).await;

    let ids: HashSet<_> = jobs.iter().map(|j| j.id.clone()).collect();
    assert_eq!(ids.len(), 50);

    for job in &jobs {
        assert_eq!(job.status, JobStatus::Queued);
        assert_eq!(job.progress, 0);
        let stored = stack.job(&job.id).await;
        assert_eq!(stored.status, JobStatus::Queued);
        assert_eq!(stored.progress, 0);
    }

    let stats = stack.registry.stats().await.unwrap();
    assert_eq!(stats.queued, 50);
    assert_eq!(stats.queue_depth, 50);
}

#[tokio::test]
async fn test_at_most_one_job_running() {
    let stack = Stack::start(single(MockBehavior::Slow(Duration::from_millis(20), item())));

    let submissions = (0..8).map(|_| {
        let registry = stack.registry.clone();
        async move { registry.submit(request(SOURCE)).await.unwrap() }
    });
    let jobs = join_all(submissions).await;

    let mut max_running = 0;
    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    loop {
        let stats = stack.registry.stats().await.unwrap();
        max_running = max_running.max(stats.running);
        assert!(stats.running <= 1, "single-flight violated: {}", stats.running);
        if stats.done + stats.error == jobs.len() as i64 {
            break;
        }
        assert!(tokio::time::Instant::now() < deadline, "jobs never drained");
        tokio::time::sleep(Duration::from_millis(2)).await;
    }

    assert_eq!(max_running, 1);
    assert_eq!(stack.contexts.max_open(), 1);
    assert_eq!(stack.contexts.acquired(), jobs.len());
    stack.stop().await;
}

#[tokio::test]
async fn test_jobs_run_in_submission_order() {
    let stack = Stack::start(single(MockBehavior::Return(item())));

    let urls: Vec<String> = (0..6).map(|i| format!("https://example.com/page/{}", i)).collect();
    let mut ids = Vec::new();
    for url in &urls {
        ids.push(stack.registry.submit(request_for(url)).await.unwrap().id);
    }
    for id in &ids {
        stack.wait_terminal(id).await;
    }

    assert_eq!(stack.contexts.visited(), urls);

    let started: Vec<i64> = {
        let mut started = Vec::new();
        for id in &ids {
            started.push(stack.job(id).await.started_at.unwrap());
        }
        started
    };
    assert!(started.windows(2).all(|w| w[0] <= w[1]));
    stack.stop().await;
}

#[tokio::test]
async fn test_result_exists_iff_done() {
    let extractors = single(MockBehavior::Slow(Duration::from_millis(10), item())).with(
        FetchMode::One,
        CATEGORY,
        "broken",
        Arc::new(MockExtractor::failing("no title")),
    );
    let stack = Stack::start(extractors);

    let mut ids = Vec::new();
    for i in 0..6 {
        let source = if i % 2 == 0 { SOURCE } else { "broken" };
        ids.push(stack.registry.submit(request(source)).await.unwrap().id);
    }

    // While in flight, lookups never return a payload for an unfinished job
    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    loop {
        let mut all_terminal = true;
        for id in &ids {
            let lookup = stack.registry.lookup_result(id).await.unwrap();
            let job = stack.job(id).await;
            match lookup {
                ResultLookup::Ready(_) => assert_eq!(job.status, JobStatus::Done),
                ResultLookup::Pending(_) => all_terminal = false,
                ResultLookup::Failed(_) => assert_eq!(job.status, JobStatus::Error),
                ResultLookup::NotFound => panic!("job {} vanished", id),
            }
        }
        if all_terminal {
            break;
        }
        assert!(tokio::time::Instant::now() < deadline);
        tokio::time::sleep(Duration::from_millis(3)).await;
    }

    for (i, id) in ids.iter().enumerate() {
        let job = stack.job(id).await;
        let result = stack.registry.get_result(id).await.unwrap();
        assert_eq!(result.is_some(), job.status == JobStatus::Done);
        assert_eq!(job.status == JobStatus::Done, i % 2 == 0);
        if job.status == JobStatus::Error {
            assert!(job.error_message.is_some());
        }
    }
    stack.stop().await;
}

#[tokio::test]
async fn test_status_never_moves_backwards() {
    let extractors = single(MockBehavior::Slow(Duration::from_millis(15), item())).with(
        FetchMode::One,
        CATEGORY,
        "broken",
        Arc::new(MockExtractor::failing("layout changed")),
    );
    let stack = Stack::start(extractors);

    let mut ids = Vec::new();
    for i in 0..5 {
        let source = if i == 2 { "broken" } else { SOURCE };
        ids.push(stack.registry.submit(request(source)).await.unwrap().id);
    }

    let mut history: HashMap<String, Vec<Job>> = HashMap::new();
    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    loop {
        let mut all_terminal = true;
        for id in &ids {
            let job = stack.job(id).await;
            all_terminal &= job.status.is_terminal();
            history.entry(id.clone()).or_default().push(job);
        }
        if all_terminal {
            break;
        }
        assert!(tokio::time::Instant::now() < deadline);
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    // One more sample after everything settled
    for id in &ids {
        history.get_mut(id).unwrap().push(stack.job(id).await);
    }

    for (id, snapshots) in history {
        for pair in snapshots.windows(2) {
            let (before, after) = (&pair[0], &pair[1]);
            assert!(
                rank(before.status) <= rank(after.status),
                "job {} went {:?} -> {:?}",
                id,
                before.status,
                after.status
            );
            assert!(before.progress <= after.progress || after.status == JobStatus::Error);
            if before.status.is_terminal() {
                assert_eq!(before, after, "job {} mutated after terminal status", id);
            }
        }
    }
    stack.stop().await;
}

#[tokio::test]
async fn test_every_event_of_a_run_shares_its_run_id() {
    let extractors = ExtractorRegistry::new().with(
        FetchMode::List,
        CATEGORY,
        SOURCE,
        Arc::new(MockExtractor::new(MockBehavior::Stream(vec![
            serde_json::json!({"n": 1}),
            serde_json::json!({"n": 2}),
            serde_json::json!({"n": 3}),
        ]))),
    );
    let stack = Stack::idle(extractors);

    let first = Arc::new(RecordingSink::new());
    let second = Arc::new(RecordingSink::new());
    let (first_request, second_request) = (request(SOURCE), request(SOURCE));
    let (a, b) = tokio::join!(
        stack.orchestrator.fetch_list(&first_request, first.clone()),
        stack.orchestrator.fetch_list(&second_request, second.clone()),
    );
    assert_eq!(a.unwrap().item_count(), 3);
    assert_eq!(b.unwrap().item_count(), 3);

    let run_ids = |sink: &RecordingSink| -> HashSet<String> {
        sink.envelopes()
            .iter()
            .map(|e| e.run_id.as_str().to_string())
            .collect()
    };
    let first_ids = run_ids(&first);
    let second_ids = run_ids(&second);
    assert_eq!(first_ids.len(), 1);
    assert_eq!(second_ids.len(), 1);
    assert_ne!(first_ids, second_ids);

    // Streamed items are not re-emitted at completion
    let data = first.kinds().iter().filter(|k| **k == "data").count();
    assert_eq!(data, 3);
    assert_eq!(first.kinds().last(), Some(&"complete"));
}

#[tokio::test]
async fn test_unknown_job_lookups() {
    let stack = Stack::idle(single(MockBehavior::Return(item())));
    let missing = "does-not-exist".to_string();

    assert!(stack.registry.get_job(&missing).await.unwrap().is_none());
    assert_eq!(
        stack.registry.lookup_result(&missing).await.unwrap(),
        ResultLookup::NotFound
    );
}
