mod common;

use serde_json::{json, Value};
use std::time::Duration;

use common::Harness;
use jobctl::{JobError, MonitorOptions};

fn job(status: &str, failed: bool) -> Value {
    json!({"elapsed": 1335024000.0, "failed": failed, "status": status})
}

fn min_interval(ms: u64) -> MonitorOptions {
    MonitorOptions::default().with_min_interval(Duration::from_millis(ms))
}

#[tokio::test]
async fn test_already_successful() {
    let h = Harness::new(true);
    h.transport
        .register_json("GET", "/jobs/42/", job("successful", false))
        .await;

    let result = h.jobs.monitor(42, MonitorOptions::default()).await.unwrap();

    assert_eq!(result.status, "successful");
    assert!(!result.failed);
    assert!(h.sleeper.sleeps().is_empty());
    assert_eq!(h.transport.request_count().await, 1);
}

#[tokio::test]
async fn test_failure() {
    let h = Harness::new(true);
    h.transport
        .register_json("GET", "/jobs/42/", job("failed", true))
        .await;

    let err = h
        .jobs
        .monitor(42, MonitorOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        JobError::JobFailure { job_id: 42, ref status } if status == "failed"
    ));
    let output = h.output.contents();
    assert!(output.contains("Current status: failed"));
    assert!(output.contains("Job 42 failed"));
}

#[tokio::test]
async fn test_failure_non_tty() {
    let h = Harness::new(false);
    h.transport
        .register_json("GET", "/jobs/42/", job("failed", true))
        .await;

    let err = h
        .jobs
        .monitor(42, MonitorOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, JobError::JobFailure { .. }));
    let output = h.output.contents();
    assert!(!output.contains('\r'));
    assert_eq!(
        output.lines().collect::<Vec<_>>(),
        vec![
            "Job 42: failed (elapsed 1335024000.00s)",
            "Job 42 failed (status: failed)."
        ]
    );
}

#[tokio::test]
async fn test_monitoring() {
    let h = Harness::new(true);
    h.transport
        .register_sequence(
            "GET",
            "/jobs/42/",
            vec![job("pending", false), job("successful", false)],
        )
        .await;

    let result = h.jobs.monitor(42, min_interval(210)).await.unwrap();

    assert_eq!(result.status, "successful");
    let requests = h.transport.requests().await;
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].path, requests[1].path);
    assert_eq!(h.sleeper.sleeps(), vec![Duration::from_millis(210)]);
    assert!(h.output.contents().contains("Current status: pending"));
}

#[tokio::test]
async fn test_timeout() {
    let h = Harness::new(true);
    h.transport
        .register_json("GET", "/jobs/42/", job("pending", false))
        .await;

    let options = min_interval(210).with_timeout(Some(Duration::from_millis(100)));
    let err = h.jobs.monitor(42, options).await.unwrap_err();

    match err {
        JobError::Timeout { job_id, seconds } => {
            assert_eq!(job_id, 42);
            assert!((seconds - 0.1).abs() < 1e-9);
        }
        other => panic!("expected timeout, got {:?}", other),
    }
    assert!(h.output.contents().contains("Current status: pending"));
    assert_eq!(h.sleeper.sleeps(), vec![Duration::from_millis(100)]);
    assert_eq!(h.transport.request_count().await, 2);
}

#[tokio::test]
async fn test_timeout_after_several_polls() {
    let h = Harness::new(false);
    h.transport
        .register_json("GET", "/jobs/42/", job("running", false))
        .await;

    let options = MonitorOptions::default().with_timeout(Some(Duration::from_secs(4)));
    let err = h.jobs.monitor(42, options).await.unwrap_err();

    assert!(matches!(err, JobError::Timeout { .. }));
    assert_eq!(
        h.sleeper.sleeps(),
        vec![
            Duration::from_secs(1),
            Duration::from_secs(2),
            Duration::from_secs(1)
        ]
    );
    assert_eq!(h.transport.request_count().await, 4);
    assert_eq!(h.output.contents().lines().count(), 4);
}

#[tokio::test]
async fn test_timeout_waits_out_the_full_limit() {
    let h = Harness::new(false);
    h.transport
        .register_json("GET", "/jobs/42/", job("running", false))
        .await;

    let options = MonitorOptions::default().with_timeout(Some(Duration::from_secs(10)));
    let err = h.jobs.monitor(42, options).await.unwrap_err();

    let sleeps = h.sleeper.sleeps();
    assert_eq!(
        sleeps,
        vec![
            Duration::from_secs(1),
            Duration::from_secs(2),
            Duration::from_secs(4),
            Duration::from_secs(3)
        ]
    );
    assert_eq!(sleeps.iter().sum::<Duration>(), Duration::from_secs(10));
    assert_eq!(h.transport.request_count().await, 5);
    assert_eq!(
        err.to_string(),
        "Monitoring job 42 aborted due to timeout after 10.00s"
    );
}

#[tokio::test]
async fn test_job_finishing_at_the_deadline_is_returned() {
    let h = Harness::new(false);
    h.transport
        .register_sequence(
            "GET",
            "/jobs/42/",
            vec![job("running", false), job("successful", false)],
        )
        .await;

    let options = min_interval(210).with_timeout(Some(Duration::from_millis(100)));
    let result = h.jobs.monitor(42, options).await.unwrap();

    assert_eq!(result.status, "successful");
    assert_eq!(h.sleeper.sleeps(), vec![Duration::from_millis(100)]);
    assert_eq!(h.transport.request_count().await, 2);
}

#[tokio::test]
async fn test_payload_without_status_is_rejected() {
    let h = Harness::new(false);
    h.transport
        .register_json("GET", "/jobs/42/", json!({"elapsed": 1.0, "failed": false}))
        .await;

    let err = h
        .jobs
        .monitor(42, MonitorOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, JobError::Json(_)));
    assert!(h.sleeper.sleeps().is_empty());
}

#[tokio::test]
async fn test_backoff_doubles_to_ceiling() {
    let h = Harness::new(false);
    let mut replies = vec![job("pending", false); 2];
    replies.extend(vec![job("running", false); 3]);
    replies.push(job("successful", false));
    h.transport
        .register_sequence("GET", "/jobs/42/", replies)
        .await;

    h.jobs.monitor(42, MonitorOptions::default()).await.unwrap();

    let secs: Vec<u64> = h.sleeper.sleeps().iter().map(|d| d.as_secs()).collect();
    assert_eq!(secs, vec![1, 2, 4, 5, 5]);
    assert_eq!(h.transport.request_count().await, 6);
}

#[tokio::test]
async fn test_monitoring_not_tty() {
    let h = Harness::new(false);
    h.transport
        .register_sequence(
            "GET",
            "/jobs/42/",
            vec![job("pending", false), job("successful", false)],
        )
        .await;

    let result = h.jobs.monitor(42, min_interval(210)).await.unwrap();

    assert_eq!(result.status, "successful");
    let requests = h.transport.requests().await;
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].path, requests[1].path);

    let output = h.output.contents();
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains("pending"));
    assert!(lines[1].contains("successful"));
}

#[tokio::test]
async fn test_canceled_job_ends_monitoring() {
    let h = Harness::new(false);
    h.transport
        .register_json("GET", "/jobs/42/", job("canceled", false))
        .await;

    let result = h.jobs.monitor(42, MonitorOptions::default()).await.unwrap();

    assert_eq!(result.status, "canceled");
    assert!(h.sleeper.sleeps().is_empty());
}

#[tokio::test]
async fn test_result_is_filtered_snapshot() {
    let h = Harness::new(false);
    h.transport
        .register_json(
            "GET",
            "/jobs/42/",
            json!({"elapsed": 2.0, "failed": false, "status": "successful", "extra": "ignored"}),
        )
        .await;

    let result = h.jobs.monitor(42, MonitorOptions::default()).await.unwrap();

    assert_eq!(
        serde_json::to_value(result).unwrap(),
        json!({"elapsed": 2.0, "failed": false, "status": "successful"})
    );
}

#[tokio::test]
async fn test_missing_job_is_not_found() {
    let h = Harness::new(false);

    let err = h
        .jobs
        .monitor(7, MonitorOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, JobError::NotFound(ref msg) if msg.contains("job 7")));
}

#[tokio::test]
async fn test_transport_error_during_polling_is_fatal() {
    let h = Harness::new(false);
    h.transport.register_status("GET", "/jobs/42/", 502).await;

    let err = h
        .jobs
        .monitor(42, MonitorOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, JobError::Server { status: 502, .. }));
    assert!(h.sleeper.sleeps().is_empty());
    assert_eq!(h.transport.request_count().await, 1);
}
