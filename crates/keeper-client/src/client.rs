//! Authenticated Keeper client
//!
//! Owns one credential set and everything that mutates it: the
//! authorization-code exchange, token refresh, and the request engine that
//! refreshes around API calls.
//!
//! Request algorithm, per call:
//! 1. Stale credentials (no token, expiry unset or past) trigger a proactive
//!    refresh, then the call restarts with a retry budget of zero. A stale token
//!    seen with a zero budget fails with `TooManyRefreshAttempts`.
//! 2. A 401 while the budget is positive decrements it, refreshes, and restarts.
//! 3. A JSON `error` member fails with `Api`; any other status >= 400 fails
//!    with `HttpStatus`; everything else returns the body.
//!
//! A refresh always completes before the retried call is built. Credentials
//! carry a version bumped on every change; a refresh requested against a
//! version that has since moved on is skipped, so concurrent callers that saw
//! the same stale token share one token endpoint round trip.

use std::sync::Arc;

use keeper_auth::{ClientOptions, Credentials, RealmDescriptor, now_millis, token};
use serde_json::Value;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, warn};
use transport::Transport;

use crate::error::{Error, Result};
use crate::metrics::{RefreshTrigger, record_refresh, record_request};
use crate::request::ApiRequest;

/// Retry budget for a top-level `request`.
pub const DEFAULT_RETRIES: u32 = 1;

/// Invoked with the new credentials after every successful exchange or refresh.
pub type RefreshCallback = Arc<dyn Fn(&Credentials) + Send + Sync>;

struct CredentialState {
    credentials: Option<Credentials>,
    version: u64,
}

/// Client bound to one OAuth client registration and one user's credentials.
pub struct KeeperClient {
    endpoint: String,
    transport: Arc<dyn Transport>,
    realm: Arc<RealmDescriptor>,
    options: ClientOptions,
    state: RwLock<CredentialState>,
    /// Serializes token endpoint calls made on behalf of this client.
    refresh_lock: Mutex<()>,
    on_refresh: RefreshCallback,
}

impl KeeperClient {
    /// Build a client for an already discovered realm.
    ///
    /// `credentials` resumes a previously persisted session; pass `None` to
    /// start from an authorization-code exchange.
    pub fn new(
        endpoint: impl Into<String>,
        transport: Arc<dyn Transport>,
        realm: Arc<RealmDescriptor>,
        options: ClientOptions,
        credentials: Option<Credentials>,
    ) -> Result<Self> {
        options.validate().map_err(|field| {
            error!(field, "client configuration incomplete");
            Error::Config(format!("{field} is required"))
        })?;

        Ok(Self {
            endpoint: endpoint.into().trim_end_matches('/').to_owned(),
            transport,
            realm,
            options,
            state: RwLock::new(CredentialState {
                credentials,
                version: 0,
            }),
            refresh_lock: Mutex::new(()),
            on_refresh: Arc::new(|_: &Credentials| {
                warn!("tokens refreshed but no callback registered");
            }),
        })
    }

    /// Register the persistence hook for refreshed credentials.
    pub fn with_refresh_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Credentials) + Send + Sync + 'static,
    {
        self.on_refresh = Arc::new(callback);
        self
    }

    /// API root the resource endpoints hang off.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    pub fn realm(&self) -> &RealmDescriptor {
        &self.realm
    }

    /// Where to send the user to grant access.
    pub fn authorize_url(&self, redirect_uri: &str, state: &str) -> String {
        keeper_auth::build_authorization_url(&self.realm, &self.options, redirect_uri, state)
            .into()
    }

    pub fn token_url(&self) -> String {
        self.realm.token_endpoint().into()
    }

    /// Snapshot of the current credentials.
    pub async fn credentials(&self) -> Option<Credentials> {
        self.state.read().await.credentials.clone()
    }

    /// Replace the credentials wholesale, e.g. after the caller reloads them.
    ///
    /// Does not invoke the refresh callback.
    pub async fn set_credentials(&self, credentials: Credentials) {
        let mut state = self.state.write().await;
        state.credentials = Some(credentials);
        state.version += 1;
    }

    /// Exchange an authorization code for a fresh credential set.
    pub async fn exchange_code(&self, redirect_uri: &str, code: &str) -> Result<Credentials> {
        let _guard = self.refresh_lock.lock().await;
        let response = token::exchange_code(
            self.transport.as_ref(),
            &self.realm,
            &self.options,
            redirect_uri,
            code,
        )
        .await?;

        let credentials = Credentials::from_token_response(response, now_millis());
        {
            let mut state = self.state.write().await;
            state.credentials = Some(credentials.clone());
            state.version += 1;
        }
        info!(display_name = %credentials.display_name, "authorization code exchanged");
        (self.on_refresh)(&credentials);
        Ok(credentials)
    }

    /// Refresh the access token now, whatever its expiry.
    pub async fn refresh(&self) -> Result<Credentials> {
        self.refresh_with_trigger(RefreshTrigger::Manual).await
    }

    pub(crate) async fn refresh_with_trigger(&self, trigger: RefreshTrigger) -> Result<Credentials> {
        let _guard = self.refresh_lock.lock().await;
        self.refresh_locked(trigger).await
    }

    /// Refresh unless the credentials moved past `observed` while we waited for the lock.
    async fn refresh_observed(&self, observed: u64, trigger: RefreshTrigger) -> Result<()> {
        let _guard = self.refresh_lock.lock().await;
        if self.state.read().await.version != observed {
            debug!(
                trigger = trigger.label(),
                "credentials changed while waiting, reusing them"
            );
            return Ok(());
        }
        self.refresh_locked(trigger).await.map(|_| ())
    }

    /// Caller must hold `refresh_lock`.
    async fn refresh_locked(&self, trigger: RefreshTrigger) -> Result<Credentials> {
        let result = self.perform_refresh().await;
        record_refresh(trigger, result.is_ok());
        result
    }

    async fn perform_refresh(&self) -> Result<Credentials> {
        let refresh = self
            .state
            .read()
            .await
            .credentials
            .as_ref()
            .and_then(|c| c.refresh_token.clone());
        let Some(refresh) = refresh else {
            error!("unable to refresh, no refresh token");
            return Err(Error::NoRefreshToken);
        };

        let response = token::refresh_token(
            self.transport.as_ref(),
            &self.realm,
            &self.options,
            &refresh,
        )
        .await?;

        let updated = {
            let mut state = self.state.write().await;
            let credentials = state.credentials.as_mut().ok_or(Error::NoRefreshToken)?;
            if credentials.apply_refresh(response, now_millis(), !self.options.offline) {
                debug!("online mode, refresh token rotated");
            }
            let updated = credentials.clone();
            state.version += 1;
            updated
        };
        debug!(expires_in = updated.expires_in, "access token refreshed");
        (self.on_refresh)(&updated);
        Ok(updated)
    }

    /// Send an authenticated request with the default retry budget.
    pub async fn request(&self, request: impl Into<ApiRequest>) -> Result<Value> {
        self.request_with_retries(request.into(), DEFAULT_RETRIES)
            .await
    }

    /// Send an authenticated request with an explicit retry budget.
    pub async fn request_with_retries(&self, request: ApiRequest, mut retries: u32) -> Result<Value> {
        let method = request.method.as_str().to_owned();
        debug!(method = %method, url = %request.url, "authenticated request");

        loop {
            let (bearer, version) = {
                let state = self.state.read().await;
                let bearer = state
                    .credentials
                    .as_ref()
                    .filter(|c| !c.access_token.is_empty() && !c.is_stale(now_millis()))
                    .map(|c| c.access_token.clone());
                (bearer, state.version)
            };

            let Some(bearer) = bearer else {
                if retries == 0 {
                    error!(method = %method, url = %request.url, "too many refresh attempts");
                    return Err(Error::TooManyRefreshAttempts);
                }
                debug!("access token stale, refreshing before request");
                self.refresh_observed(version, RefreshTrigger::Proactive)
                    .await?;
                retries = 0;
                continue;
            };

            let response = match self.transport.send(request.to_http(&bearer)).await {
                Ok(response) => response,
                Err(e) => {
                    record_request(&method, "transport");
                    error!(method = %method, url = %request.url, error = %e, "request failed (transport)");
                    return Err(e.into());
                }
            };
            record_request(&method, &response.status.to_string());

            if response.status == 401 && retries > 0 {
                retries -= 1;
                warn!(method = %method, url = %request.url, "401 received, refreshing access token");
                self.refresh_observed(version, RefreshTrigger::Reactive)
                    .await?;
                continue;
            }

            if let Some(payload) = response.error_payload() {
                error!(method = %method, url = %request.url, status = response.status, error = %payload, "request error");
                return Err(Error::Api(response.body));
            }

            if response.status >= 400 {
                error!(method = %method, url = %request.url, status = response.status, "request error (bad status code)");
                return Err(Error::HttpStatus {
                    status: response.status,
                    body: response.body,
                });
            }

            return Ok(response.body);
        }
    }
}
