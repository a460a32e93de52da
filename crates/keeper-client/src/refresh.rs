//! Eager background token refresh
//!
//! A `RefreshScheduler` keeps at most one delayed refresh per client.
//! Scheduling again replaces the pending one. Cancellation only interrupts
//! the wait: once the timer has fired, the refresh runs to completion so a
//! token issued by the server is never dropped on the floor.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use keeper_auth::now_millis;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::client::KeeperClient;
use crate::metrics::RefreshTrigger;

struct PendingRefresh {
    /// Dropping the sender cancels a refresh that has not fired yet.
    _cancel: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

/// Single cancellable delayed refresh for one client.
pub struct RefreshScheduler {
    client: Arc<KeeperClient>,
    pending: Mutex<Option<PendingRefresh>>,
}

impl RefreshScheduler {
    pub fn new(client: Arc<KeeperClient>) -> Self {
        Self {
            client,
            pending: Mutex::new(None),
        }
    }

    /// Refresh after `delay`, replacing any refresh already scheduled.
    pub fn schedule(&self, delay: Duration) {
        let (cancel, cancelled) = oneshot::channel::<()>();
        let client = self.client.clone();
        let handle = tokio::spawn(async move {
            tokio::select! {
                () = tokio::time::sleep(delay) => {}
                _ = cancelled => {
                    debug!("scheduled refresh cancelled");
                    return;
                }
            }
            match client.refresh_with_trigger(RefreshTrigger::Scheduled).await {
                Ok(credentials) => {
                    info!(expires_in = credentials.expires_in, "scheduled token refresh succeeded");
                }
                Err(e) => {
                    warn!(error = %e, "scheduled token refresh failed");
                }
            }
        });

        let previous = self.lock().replace(PendingRefresh {
            _cancel: cancel,
            handle,
        });
        if previous.is_some() {
            debug!("replaced pending scheduled refresh");
        }
        debug!(delay_secs = delay.as_secs(), "token refresh scheduled");
    }

    /// Schedule a refresh `margin` before the current access token expires.
    ///
    /// Returns the delay used, or `None` when the client holds no credentials.
    pub async fn schedule_before_expiry(&self, margin: Duration) -> Option<Duration> {
        let credentials = self.client.credentials().await?;
        let remaining = Duration::from_millis(credentials.remaining_millis(now_millis()));
        let delay = remaining.saturating_sub(margin);
        self.schedule(delay);
        Some(delay)
    }

    /// Drop the pending refresh if it has not fired. Returns whether one was pending.
    pub fn cancel(&self) -> bool {
        match self.lock().take() {
            Some(pending) => !pending.handle.is_finished(),
            None => false,
        }
    }

    /// Whether a scheduled refresh is waiting or running.
    pub fn is_pending(&self) -> bool {
        self.lock()
            .as_ref()
            .is_some_and(|pending| !pending.handle.is_finished())
    }

    fn lock(&self) -> MutexGuard<'_, Option<PendingRefresh>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::{client, credentials, expired};
    use serde_json::json;
    use transport::ScriptedTransport;

    fn token_body(access: &str) -> serde_json::Value {
        json!({"access_token": access, "expires_in": 3600, "token_type": "bearer"})
    }

    #[tokio::test(start_paused = true)]
    async fn fires_after_delay() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_json(200, token_body("at_scheduled"));
        let client = Arc::new(client(&transport, true, Some(expired("at_old"))));
        let scheduler = RefreshScheduler::new(client.clone());

        scheduler.schedule(Duration::from_secs(30));
        assert!(scheduler.is_pending());

        tokio::time::sleep(Duration::from_secs(29)).await;
        assert_eq!(transport.request_count(), 0);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(transport.request_count(), 1);
        assert_eq!(client.credentials().await.unwrap().access_token, "at_scheduled");
        assert!(!scheduler.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn rescheduling_replaces_pending_refresh() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_json(200, token_body("at_new"));
        let client = Arc::new(client(&transport, true, Some(expired("at_old"))));
        let scheduler = RefreshScheduler::new(client);

        scheduler.schedule(Duration::from_secs(60));
        scheduler.schedule(Duration::from_secs(10));

        tokio::time::sleep(Duration::from_secs(11)).await;
        assert_eq!(transport.request_count(), 1);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(transport.request_count(), 1, "replaced refresh must not fire");
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_stops_pending_refresh() {
        let transport = Arc::new(ScriptedTransport::new());
        let client = Arc::new(client(&transport, true, Some(expired("at_old"))));
        let scheduler = RefreshScheduler::new(client);

        scheduler.schedule(Duration::from_secs(5));
        assert!(scheduler.cancel());
        assert!(!scheduler.cancel());

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_scheduler_cancels() {
        let transport = Arc::new(ScriptedTransport::new());
        let client = Arc::new(client(&transport, true, Some(expired("at_old"))));

        let scheduler = RefreshScheduler::new(client);
        scheduler.schedule(Duration::from_secs(5));
        drop(scheduler);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn schedule_before_expiry_subtracts_margin() {
        let transport = Arc::new(ScriptedTransport::new());
        let creds = credentials("at", Some("rt"), Some(now_millis() + 100_000));
        let client = Arc::new(client(&transport, true, Some(creds)));
        let scheduler = RefreshScheduler::new(client);

        let delay = scheduler
            .schedule_before_expiry(Duration::from_secs(30))
            .await
            .unwrap();
        assert!(delay <= Duration::from_secs(70), "got {delay:?}");
        assert!(delay > Duration::from_secs(69), "got {delay:?}");
        scheduler.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn schedule_before_expiry_without_credentials_is_noop() {
        let transport = Arc::new(ScriptedTransport::new());
        let scheduler = RefreshScheduler::new(Arc::new(client(&transport, true, None)));

        assert!(scheduler.schedule_before_expiry(Duration::from_secs(30)).await.is_none());
        assert!(!scheduler.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_scheduled_refresh_is_logged_not_fatal() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_json(400, json!({"error": "invalid_grant"}));
        let client = Arc::new(client(&transport, true, Some(expired("at_old"))));
        let scheduler = RefreshScheduler::new(client.clone());

        scheduler.schedule(Duration::from_secs(1));
        tokio::time::sleep(Duration::from_secs(2)).await;

        assert_eq!(transport.request_count(), 1);
        assert_eq!(client.credentials().await.unwrap().access_token, "at_old");
    }
}
