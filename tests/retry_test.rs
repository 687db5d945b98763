use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use reqwest::StatusCode;
use spotmover::{spotify::ApiError, transfer::RetryPolicy};
use tokio::time::Instant;

fn status(code: StatusCode) -> ApiError {
    ApiError::Status {
        status: code,
        message: code.to_string(),
    }
}

// Fails with `code` for the first `failures` calls, then returns the call
// number.
async fn run_with(
    policy: RetryPolicy,
    code: StatusCode,
    failures: usize,
) -> (Result<usize, ApiError>, usize) {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let result = policy
        .run(|| {
            let call = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if call < failures {
                    Err(if code == StatusCode::UNAUTHORIZED {
                        ApiError::Unauthorized
                    } else {
                        status(code)
                    })
                } else {
                    Ok(call)
                }
            }
        })
        .await;
    (result, calls.load(Ordering::SeqCst))
}

#[test]
fn test_default_policy() {
    let policy = RetryPolicy::default();
    assert_eq!(policy.max_attempts, 3);
    assert_eq!(policy.base_delay, Duration::from_millis(1000));
}

#[test]
fn test_delay_doubles() {
    let policy = RetryPolicy::default();
    assert_eq!(policy.delay_for(0), Duration::from_millis(1000));
    assert_eq!(policy.delay_for(1), Duration::from_millis(2000));
    assert_eq!(policy.delay_for(2), Duration::from_millis(4000));
}

#[test]
fn test_delay_saturates() {
    let policy = RetryPolicy::new(3, Duration::from_secs(u64::MAX / 2));
    assert_eq!(policy.delay_for(40), Duration::MAX);
}

#[tokio::test(start_paused = true)]
async fn test_two_transient_failures_then_success() {
    let start = Instant::now();
    let (result, calls) = run_with(RetryPolicy::default(), StatusCode::BAD_GATEWAY, 2).await;

    assert_eq!(result.unwrap(), 2);
    assert_eq!(calls, 3);
    let waited = start.elapsed();
    assert!(waited >= Duration::from_millis(3000), "waited {:?}", waited);
    assert!(waited < Duration::from_millis(3100), "waited {:?}", waited);
}

#[tokio::test(start_paused = true)]
async fn test_every_transient_status_is_retried() {
    for code in [
        StatusCode::TOO_MANY_REQUESTS,
        StatusCode::BAD_GATEWAY,
        StatusCode::SERVICE_UNAVAILABLE,
    ] {
        let (result, calls) = run_with(RetryPolicy::default(), code, 1).await;
        assert!(result.is_ok(), "{} not retried", code);
        assert_eq!(calls, 2);
    }
}

#[tokio::test(start_paused = true)]
async fn test_permanent_failure_is_not_retried() {
    for code in [
        StatusCode::BAD_REQUEST,
        StatusCode::UNAUTHORIZED,
        StatusCode::FORBIDDEN,
        StatusCode::NOT_FOUND,
        StatusCode::INTERNAL_SERVER_ERROR,
    ] {
        let start = Instant::now();
        let (result, calls) = run_with(RetryPolicy::default(), code, 1).await;
        assert_eq!(result.unwrap_err().status(), Some(code));
        assert_eq!(calls, 1, "{} was retried", code);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}

#[tokio::test(start_paused = true)]
async fn test_gives_up_after_max_attempts() {
    let (result, calls) = run_with(RetryPolicy::default(), StatusCode::SERVICE_UNAVAILABLE, 10).await;

    let err = result.unwrap_err();
    assert!(err.is_transient());
    assert_eq!(err.status(), Some(StatusCode::SERVICE_UNAVAILABLE));
    assert_eq!(calls, 3);
}

#[tokio::test(start_paused = true)]
async fn test_zero_attempts_still_calls_once() {
    let (result, calls) = run_with(
        RetryPolicy::new(0, Duration::from_millis(1)),
        StatusCode::BAD_GATEWAY,
        5,
    )
    .await;

    assert!(result.is_err());
    assert_eq!(calls, 1);
}

#[test]
fn test_error_classification() {
    assert!(status(StatusCode::TOO_MANY_REQUESTS).is_transient());
    assert!(!status(StatusCode::GATEWAY_TIMEOUT).is_transient());
    assert!(!ApiError::Unauthorized.is_transient());
    assert!(ApiError::Unauthorized.is_auth());
    assert!(!status(StatusCode::FORBIDDEN).is_auth());
    assert_eq!(ApiError::Decode("x".into()).status(), None);
}
