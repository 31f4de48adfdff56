//! Backoff retry decorator behavior against failing transports.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use http::{HeaderMap, Method, StatusCode};
use rampart::{Backoff, BackoffPolicy, Body, Error, Request, Response, Result, Transport};
use tokio_util::sync::CancellationToken;

/// Fails the first `failures` calls, then succeeds.
struct FlakyTransport {
    failures: AtomicU32,
    calls:    AtomicU32,
    error:    fn() -> Error,
}

impl FlakyTransport {
    fn new(failures: u32, error: fn() -> Error) -> Arc<Self> {
        Arc::new(FlakyTransport {
            failures: AtomicU32::new(failures),
            calls: AtomicU32::new(0),
            error,
        })
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Transport for FlakyTransport {
    async fn send(&self, _req: &Request) -> Result<Response> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let remaining = self.failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures.store(remaining - 1, Ordering::SeqCst);
            return Err((self.error)());
        }
        Ok(Response {
            status:  StatusCode::OK,
            headers: HeaderMap::new(),
            body:    Body::empty(),
        })
    }
}

fn dial_refused() -> Error {
    Error::Connect("connection refused".into())
}

fn application_error() -> Error {
    Error::Transport("boom".into())
}

fn fast_policy() -> BackoffPolicy {
    BackoffPolicy {
        initial_interval: Duration::from_millis(1),
        multiplier: 2.0,
        max_interval: Duration::from_millis(4),
        max_elapsed_time: Duration::ZERO,
        max_tries: 0,
    }
}

fn request() -> Request {
    Request::new(Method::GET, "http://example.org/x")
}

#[tokio::test]
async fn transient_failures_are_retried_until_success() {
    let transport = FlakyTransport::new(2, dial_refused);
    let backoff = Backoff::new(transport.clone(), fast_policy(), "example.org");

    let res = backoff.send(&request()).await.unwrap();
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(transport.calls(), 3);
}

#[tokio::test]
async fn permanent_error_is_never_retried() {
    let transport = FlakyTransport::new(5, application_error);
    let backoff = Backoff::new(transport.clone(), fast_policy(), "example.org");

    let err = backoff.send(&request()).await.unwrap_err();
    assert!(!err.is_transient());
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn exhaustion_returns_last_error_unchanged() {
    let transport = FlakyTransport::new(u32::MAX, dial_refused);
    let policy = BackoffPolicy { max_tries: 3, ..fast_policy() };
    let backoff = Backoff::new(transport.clone(), policy, "example.org");

    let err = backoff.send(&request()).await.unwrap_err();
    // Still classified transient so an outer policy can failover.
    assert!(err.is_transient());
    assert!(matches!(err, Error::Connect(_)));
    assert_eq!(transport.calls(), 3);
}

#[tokio::test]
async fn elapsed_time_bound_stops_retrying() {
    let transport = FlakyTransport::new(u32::MAX, dial_refused);
    let policy = BackoffPolicy {
        initial_interval: Duration::from_millis(50),
        max_elapsed_time: Duration::from_millis(1),
        ..fast_policy()
    };
    let backoff = Backoff::new(transport.clone(), policy, "example.org");

    let err = backoff.send(&request()).await.unwrap_err();
    assert!(err.is_transient());
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn notify_hook_observes_every_retry() {
    let transport = FlakyTransport::new(2, dial_refused);
    let events: Arc<Mutex<Vec<(String, Duration)>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();

    let backoff = Backoff::new(transport, fast_policy(), "db.internal:5432").with_notify(
        move |target, next, err| {
            assert!(err.is_transient());
            sink.lock().unwrap().push((target.to_string(), next));
        },
    );

    backoff.send(&request()).await.unwrap();

    let events = events.lock().unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].0, "db.internal:5432");
    // Exponential growth between the first and second wait.
    assert_eq!(events[0].1, Duration::from_millis(1));
    assert_eq!(events[1].1, Duration::from_millis(2));
}

#[tokio::test]
async fn cancellation_aborts_the_backoff_wait() {
    let transport = FlakyTransport::new(u32::MAX, dial_refused);
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();

    let policy = BackoffPolicy {
        initial_interval: Duration::from_secs(3600),
        max_interval: Duration::from_secs(3600),
        ..fast_policy()
    };
    let backoff = Backoff::new(transport.clone(), policy, "example.org")
        .with_cancellation(cancel)
        .with_notify(move |_, _, _| trigger.cancel());

    let err = backoff.send(&request()).await.unwrap_err();
    assert!(matches!(err, Error::Cancelled));
    assert_eq!(transport.calls(), 1);
}
