//! Tower layer enforcing a minimum interval between request starts

use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
    time::Duration,
};

use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};
use tower::Layer;
use tracing::trace;

/// Spaces requests at least `interval` apart, across every clone of the
/// layer's services
///
/// Requests are released in the order they reserve a slot; none is dropped.
#[derive(Clone, Debug)]
pub struct PacingLayer {
    interval: Duration,
    next_slot: Arc<Mutex<Option<Instant>>>,
}

impl PacingLayer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_slot: Arc::new(Mutex::new(None)),
        }
    }

    /// At most `requests` requests per second
    pub fn per_second(requests: u32) -> Self {
        Self::new(Duration::from_secs(1) / requests.max(1))
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl<S> Layer<S> for PacingLayer {
    type Service = PacingService<S>;

    fn layer(&self, service: S) -> Self::Service {
        PacingService {
            service,
            interval: self.interval,
            next_slot: self.next_slot.clone(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct PacingService<S> {
    service: S,
    interval: Duration,
    next_slot: Arc<Mutex<Option<Instant>>>,
}

/// Claim the earliest free slot at or after `now` and advance the schedule
fn reserve(next_slot: &mut Option<Instant>, now: Instant, interval: Duration) -> Instant {
    let start = match *next_slot {
        Some(slot) if slot > now => slot,
        _ => now,
    };
    *next_slot = Some(start + interval);
    start
}

impl<S, Request> tower::Service<Request> for PacingService<S>
where
    S: tower::Service<Request> + Clone + Send + 'static,
    S::Future: Send,
    Request: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let next_slot = self.next_slot.clone();
        let interval = self.interval;
        let mut service = self.service.clone();

        Box::pin(async move {
            let now = Instant::now();
            let start = reserve(&mut *next_slot.lock().await, now, interval);
            if start > now {
                trace!(wait_ms = (start - now).as_millis() as u64, "Pacing RPC request");
                sleep_until(start).await;
            }
            service.call(request).await
        })
    }
}
