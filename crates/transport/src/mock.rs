//! Scripted in-memory transport for tests

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde_json::Value;

use crate::{HttpRequest, HttpResponse, Result, Transport, TransportError};

/// Replays queued responses in FIFO order and records every request it receives.
///
/// When the queue runs dry the transport answers with a connection error, so a
/// test that triggers an unexpected call fails loudly instead of hanging.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<HttpResponse>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response with the given status and JSON body.
    pub fn push_json(&self, status: u16, body: Value) -> &Self {
        lock(&self.responses).push_back(Ok(HttpResponse::new(status, body)));
        self
    }

    /// Queue a transport-level failure.
    pub fn push_error(&self, message: &str) -> &Self {
        lock(&self.responses).push_back(Err(TransportError::Connection(message.to_owned())));
        self
    }

    /// Snapshot of requests received so far, oldest first.
    pub fn requests(&self) -> Vec<HttpRequest> {
        lock(&self.requests).clone()
    }

    pub fn request_count(&self) -> usize {
        lock(&self.requests).len()
    }

    /// Responses still queued.
    pub fn remaining(&self) -> usize {
        lock(&self.responses).len()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Transport for ScriptedTransport {
    fn send(
        &self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse>> + Send + '_>> {
        let description = format!("{} {}", request.method, request.url);
        lock(&self.requests).push(request);
        let next = lock(&self.responses).pop_front();
        Box::pin(async move {
            next.unwrap_or_else(|| {
                Err(TransportError::Connection(format!(
                    "no scripted response for {description}"
                )))
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn replays_in_order_and_records() {
        let transport = ScriptedTransport::new();
        transport
            .push_json(200, json!({"n": 1}))
            .push_error("reset by peer");

        let first = transport.send(HttpRequest::get("http://a/1")).await.unwrap();
        assert_eq!(first.body, json!({"n": 1}));

        let second = transport.send(HttpRequest::get("http://a/2")).await;
        assert!(matches!(second, Err(TransportError::Connection(m)) if m == "reset by peer"));

        let urls: Vec<_> = transport.requests().into_iter().map(|r| r.url).collect();
        assert_eq!(urls, vec!["http://a/1", "http://a/2"]);
        assert_eq!(transport.remaining(), 0);
    }

    #[tokio::test]
    async fn exhausted_script_is_connection_error() {
        let transport = ScriptedTransport::new();
        let result = transport.send(HttpRequest::get("http://a/none")).await;
        match result {
            Err(TransportError::Connection(msg)) => assert!(msg.contains("http://a/none")),
            other => panic!("expected connection error, got {other:?}"),
        }
        assert_eq!(transport.request_count(), 1);
    }
}
