//! Tests for the backoff module

use super::*;
use crate::client::{QueryClient, ScriptStep, ScriptedClient};
use crate::error::Error;
use crate::limit::{PermitSource, Unlimited};
use crate::query::{QueryPage, QueryRequest};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Records every acquisition instead of limiting
#[derive(Default)]
struct CountingLimiter {
    acquired: Mutex<Vec<(String, u32)>>,
}

#[async_trait]
impl PermitSource for CountingLimiter {
    async fn acquire(&self, resource: &str, permits: u32) {
        self.acquired
            .lock()
            .unwrap()
            .push((resource.to_string(), permits));
    }
}

fn steady_policy(max_attempts: u32) -> BackoffPolicy {
    BackoffPolicy::new(Duration::from_millis(10), Duration::from_millis(50))
        .with_multiplier(2.0)
        .with_max_attempts(max_attempts)
        .with_jitter(false)
}

fn executor(policy: BackoffPolicy, sleeper: &Arc<RecordingSleeper>) -> BackoffExecutor {
    BackoffExecutor::new(Arc::new(Unlimited), policy).with_sleeper(sleeper.clone())
}

async fn run_query(
    executor: &BackoffExecutor,
    client: &ScriptedClient,
    permits: u32,
) -> crate::Result<QueryPage> {
    let request = QueryRequest::new("edgestore", "hk = :hk");
    let request = &request;
    executor
        .run("Query", "edgestore", permits, move || client.query(request))
        .await
}

fn throttles_then_page(failures: usize) -> ScriptedClient {
    let mut steps = vec![ScriptStep::Throttle; failures];
    steps.push(ScriptStep::page(QueryPage::default().with_scanned(7)));
    ScriptedClient::new(steps)
}

// ============================================================================
// BackoffPolicy / BackoffState Tests
// ============================================================================

#[test]
fn test_policy_default() {
    let policy = BackoffPolicy::default();
    assert_eq!(policy.base_delay, Duration::from_millis(25));
    assert_eq!(policy.max_delay, Duration::from_secs(10));
    assert!((policy.multiplier - 2.0).abs() < f64::EPSILON);
    assert_eq!(policy.max_attempts, 10);
    assert!(policy.jitter);
}

#[test]
fn test_delay_sequence_grows_and_caps() {
    let mut state = steady_policy(10).state();
    let delays: Vec<u64> = (0..6)
        .map(|_| state.next_delay().as_millis() as u64)
        .collect();
    assert_eq!(delays, vec![10, 20, 40, 50, 50, 50]);
}

#[test]
fn test_base_above_cap_starts_at_cap() {
    let policy = BackoffPolicy::new(Duration::from_secs(5), Duration::from_secs(1)).with_jitter(false);
    let mut state = policy.state();
    assert_eq!(state.next_delay(), Duration::from_secs(1));
    assert_eq!(state.next_delay(), Duration::from_secs(1));
}

#[test]
fn test_jitter_stays_within_interval() {
    let policy = steady_policy(10).with_jitter(true);
    let mut state = policy.state();
    for _ in 0..20 {
        let expected = state.current_delay();
        let actual = state.next_delay();
        assert!(actual <= expected);
        assert!(actual >= expected / 2);
    }
}

#[test]
fn test_jittered_delays_never_decrease_at_cap() {
    let policy = steady_policy(20).with_jitter(true);
    for _ in 0..50 {
        let mut state = policy.state();
        let delays: Vec<Duration> = (0..15).map(|_| state.next_delay()).collect();
        assert!(delays.windows(2).all(|w| w[0] <= w[1]), "{delays:?}");
        assert!(delays.iter().all(|d| *d <= Duration::from_millis(50)));
    }
}

#[test]
fn test_shrinking_multiplier_keeps_delay_constant() {
    for multiplier in [0.5, 0.0, -2.0, f64::NAN, f64::INFINITY] {
        let mut state = steady_policy(10).with_multiplier(multiplier).state();
        let delays: Vec<u64> = (0..4)
            .map(|_| state.next_delay().as_millis() as u64)
            .collect();
        assert_eq!(delays, vec![10, 10, 10, 10], "multiplier {multiplier}");
    }
}

#[test]
fn test_state_attempt_budget() {
    let mut state = steady_policy(2).state();
    assert!(!state.exhausted());
    state.record_attempt();
    assert!(!state.exhausted());
    state.record_attempt();
    assert!(state.exhausted());
    assert_eq!(state.attempts(), 2);
}

#[test]
fn test_zero_attempt_budget_still_allows_one_call() {
    let mut state = steady_policy(0).state();
    state.record_attempt();
    assert!(state.exhausted());
}

// ============================================================================
// BackoffExecutor Tests
// ============================================================================

#[tokio::test]
async fn test_succeeds_after_recoverable_failures() {
    let sleeper = Arc::new(RecordingSleeper::new());
    let executor = executor(steady_policy(5), &sleeper);
    let client = throttles_then_page(4);

    let page = run_query(&executor, &client, 1).await.unwrap();

    assert_eq!(page.scanned_count, 7);
    assert_eq!(client.calls(), 5);

    let delays = sleeper.delays();
    assert_eq!(delays.len(), 4);
    assert!(delays.windows(2).all(|w| w[0] <= w[1]));
    assert!(delays.iter().all(|d| *d <= Duration::from_millis(50)));
}

#[tokio::test]
async fn test_gives_up_after_max_attempts() {
    let sleeper = Arc::new(RecordingSleeper::new());
    let executor = executor(steady_policy(3), &sleeper);
    let client = throttles_then_page(5);

    let err = run_query(&executor, &client, 1).await.unwrap_err();

    assert_eq!(client.calls(), 3);
    assert_eq!(sleeper.delays().len(), 2);
    match err {
        Error::RetriesExhausted {
            operation,
            resource,
            attempts,
            source,
        } => {
            assert_eq!(operation, "Query");
            assert_eq!(resource, "edgestore");
            assert_eq!(attempts, 3);
            assert!(matches!(*source, Error::Throttled { .. }));
        }
        other => panic!("Expected RetriesExhausted, got {other:?}"),
    }
}

#[tokio::test]
async fn test_failures_equal_to_budget_exhaust() {
    let sleeper = Arc::new(RecordingSleeper::new());
    let executor = executor(steady_policy(3), &sleeper);
    let client = throttles_then_page(3);

    let err = run_query(&executor, &client, 1).await.unwrap_err();

    assert!(err.is_exhausted());
    assert_eq!(client.calls(), 3);
    assert_eq!(client.remaining(), 1);
}

#[tokio::test]
async fn test_fatal_error_is_not_retried() {
    let sleeper = Arc::new(RecordingSleeper::new());
    let executor = executor(steady_policy(5), &sleeper);
    let client = ScriptedClient::new([
        ScriptStep::Validation {
            message: "Query condition missed key schema element".to_string(),
        },
        ScriptStep::page(QueryPage::default()),
    ]);

    let err = run_query(&executor, &client, 1).await.unwrap_err();

    assert_eq!(client.calls(), 1);
    assert!(sleeper.delays().is_empty());
    match err {
        Error::Validation { code, message } => {
            assert_eq!(code, "ValidationException");
            assert_eq!(message, "Query condition missed key schema element");
        }
        other => panic!("Expected Validation, got {other:?}"),
    }
}

#[tokio::test]
async fn test_server_errors_are_retried() {
    let sleeper = Arc::new(RecordingSleeper::new());
    let executor = executor(steady_policy(5), &sleeper);
    let client = ScriptedClient::new([
        ScriptStep::ServerError,
        ScriptStep::Throttle,
        ScriptStep::page(QueryPage::default()),
    ]);

    assert!(run_query(&executor, &client, 1).await.is_ok());
    assert_eq!(
        sleeper.delays(),
        vec![Duration::from_millis(10), Duration::from_millis(20)]
    );
}

#[tokio::test]
async fn test_fatal_after_retries_is_surfaced_unchanged() {
    let sleeper = Arc::new(RecordingSleeper::new());
    let executor = executor(steady_policy(5), &sleeper);
    let client = ScriptedClient::new([ScriptStep::Throttle, ScriptStep::NotFound]);

    let err = run_query(&executor, &client, 1).await.unwrap_err();
    assert!(matches!(err, Error::ResourceNotFound { .. }));
    assert_eq!(client.calls(), 2);
}

#[tokio::test]
async fn test_permits_acquired_before_every_attempt() {
    let limiter = Arc::new(CountingLimiter::default());
    let sleeper = Arc::new(RecordingSleeper::new());
    let executor =
        BackoffExecutor::new(limiter.clone(), steady_policy(5)).with_sleeper(sleeper.clone());
    let client = throttles_then_page(2);

    run_query(&executor, &client, 4).await.unwrap();

    let acquired = limiter.acquired.lock().unwrap().clone();
    assert_eq!(acquired, vec![("edgestore".to_string(), 4); 3]);
}

#[tokio::test]
async fn test_jittered_retries_sleep_non_decreasing() {
    let sleeper = Arc::new(RecordingSleeper::new());
    let executor = executor(steady_policy(12).with_jitter(true), &sleeper);
    let client = throttles_then_page(11);

    let page = run_query(&executor, &client, 1).await.unwrap();

    assert_eq!(page.scanned_count, 7);
    let delays = sleeper.delays();
    assert_eq!(delays.len(), 11);
    assert!(delays.windows(2).all(|w| w[0] <= w[1]), "{delays:?}");
    assert!(delays.iter().all(|d| *d <= Duration::from_millis(50)));
}
