//! Abortable in-flight requests.
//!
//! A [`RequestScope`] belongs to one screen. Requests spawned through it run
//! as tokio tasks; when the screen is torn down the scope aborts whatever is
//! still pending, so stale responses are never applied.

use std::future::Future;

use tokio::task::{AbortHandle, JoinHandle};

use crate::error::{LedgerError, Result};

pub struct Pending<T> {
    handle: JoinHandle<Result<T>>,
}

impl<T> Pending<T> {
    pub async fn wait(self) -> Result<T> {
        match self.handle.await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Err(LedgerError::Cancelled),
            Err(e) => std::panic::resume_unwind(e.into_panic()),
        }
    }
}

#[derive(Default)]
pub struct RequestScope {
    handles: Vec<AbortHandle>,
}

impl RequestScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn<F, T>(&mut self, request: F) -> Pending<T>
    where
        F: Future<Output = Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        let handle = tokio::spawn(request);
        self.handles.retain(|h| !h.is_finished());
        self.handles.push(handle.abort_handle());
        Pending { handle }
    }

    /// Number of requests still in flight.
    pub fn in_flight(&self) -> usize {
        self.handles.iter().filter(|h| !h.is_finished()).count()
    }

    pub fn cancel(&mut self) {
        for handle in self.handles.drain(..) {
            handle.abort();
        }
    }
}

impl Drop for RequestScope {
    fn drop(&mut self) {
        if self.in_flight() > 0 {
            tracing::debug!(pending = self.in_flight(), "aborting in-flight requests");
        }
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::api::fake::FakeTransport;
    use crate::api::{ApiClient, Method};

    #[tokio::test]
    async fn test_completed_request_resolves() {
        let mut scope = RequestScope::new();
        let pending = scope.spawn(async { Ok(41 + 1) });
        assert_eq!(pending.wait().await.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_cancel_aborts_pending_request() {
        let fake = Arc::new(FakeTransport::new());
        fake.hang(Method::Get, "/api/transaction/get/");
        let client = ApiClient::new(fake);

        let mut scope = RequestScope::new();
        let pending = scope.spawn(async move {
            client
                .get_json::<serde_json::Value>("/api/transaction/get/", "failed")
                .await
        });
        tokio::task::yield_now().await;
        scope.cancel();
        assert!(matches!(pending.wait().await, Err(LedgerError::Cancelled)));
    }

    #[tokio::test]
    async fn test_drop_aborts_pending_request() {
        let pending = {
            let mut scope = RequestScope::new();
            scope.spawn(std::future::pending::<Result<()>>())
        };
        assert!(matches!(pending.wait().await, Err(LedgerError::Cancelled)));
    }
}
