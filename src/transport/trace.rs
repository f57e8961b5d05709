// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Tower layer that traces every JSON-RPC request

use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
    time::{Duration, Instant},
};

use alloy_json_rpc::{RequestPacket, ResponsePacket};
use alloy_transport::TransportError;
use tower::Layer;
use tracing::{debug, warn, Instrument};

use crate::rpc::is_retryable_transport_error;

/// Records the method, duration and outcome of each RPC request
///
/// Requests slower than the configured threshold are reported at `warn`.
///
/// # Example
///
/// ```rust,ignore
/// use eventharvest::transport::TraceLayer;
/// use alloy_rpc_client::ClientBuilder;
///
/// let client = ClientBuilder::default()
///     .layer(TraceLayer::new().slow_threshold(Duration::from_secs(5)))
///     .http(rpc_url);
/// ```
#[derive(Clone, Debug, Default)]
pub struct TraceLayer {
    slow_threshold: Option<Duration>,
}

impl TraceLayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slow_threshold(mut self, threshold: Duration) -> Self {
        self.slow_threshold = Some(threshold);
        self
    }
}

impl<S> Layer<S> for TraceLayer {
    type Service = TraceService<S>;

    fn layer(&self, service: S) -> Self::Service {
        TraceService {
            service,
            slow_threshold: self.slow_threshold,
        }
    }
}

#[derive(Clone, Debug)]
pub struct TraceService<S> {
    service: S,
    slow_threshold: Option<Duration>,
}

impl<S> tower::Service<RequestPacket> for TraceService<S>
where
    S: tower::Service<RequestPacket, Response = ResponsePacket, Error = TransportError>
        + Clone
        + Send
        + 'static,
    S::Future: Send,
{
    type Response = ResponsePacket;
    type Error = TransportError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&mut self, request: RequestPacket) -> Self::Future {
        let slow_threshold = self.slow_threshold;
        let mut service = self.service.clone();
        let method = describe(&request);

        let span = tracing::info_span!(
            "rpc_call",
            method = %method,
            duration_ms = tracing::field::Empty,
        );

        Box::pin(
            async move {
                let start = Instant::now();
                let result = service.call(request).await;
                let elapsed = start.elapsed();
                tracing::Span::current().record("duration_ms", elapsed.as_millis() as u64);

                match &result {
                    Ok(_) if slow_threshold.is_some_and(|t| elapsed > t) => {
                        warn!(duration_ms = elapsed.as_millis() as u64, "Slow RPC call: {method}");
                    }
                    Ok(_) => debug!("RPC call: {method}"),
                    Err(e) => warn!(
                        error = %e,
                        retryable = is_retryable_transport_error(e),
                        "RPC call failed: {method}"
                    ),
                }

                result
            }
            .instrument(span),
        )
    }
}

/// Method name of a request, or a summary of a batch
fn describe(request: &RequestPacket) -> String {
    match request {
        RequestPacket::Single(req) => req.method().to_string(),
        RequestPacket::Batch(reqs) => match reqs.as_slice() {
            [] => "batch(empty)".to_string(),
            [only] => only.method().to_string(),
            many => format!("batch({} calls)", many.len()),
        },
    }
}
