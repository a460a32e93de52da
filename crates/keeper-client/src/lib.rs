//! Nunux Keeper client SDK
//!
//! Stateful half of the SDK: realm discovery with single-flight caching, the
//! per-client credential lifecycle, and the authenticated request engine that
//! the document and profile APIs are built on.
//!
//! Client lifecycle:
//! 1. `KeeperSdk::create_client()` resolves the realm (once per SDK)
//! 2. Caller redirects the user to `KeeperClient::authorize_url()`
//! 3. `KeeperClient::exchange_code()` obtains credentials
//! 4. Resource calls go through `KeeperClient::request()`, which refreshes
//!    proactively on local expiry and reactively on 401
//! 5. Every new credential set is handed to the refresh callback for persistence
//! 6. Optionally, `RefreshScheduler` refreshes ahead of expiry in the background

pub mod api;
pub mod client;
pub mod discovery;
pub mod error;
pub mod metrics;
pub mod refresh;
pub mod request;
pub mod sdk;

pub use api::{ApiResource, DocumentApi, ProfileApi};
pub use client::{DEFAULT_RETRIES, KeeperClient, RefreshCallback};
pub use discovery::{ApiInfo, RealmDiscovery};
pub use error::{Error, Result};
pub use keeper_auth::{ClientOptions, Credentials, RealmDescriptor};
pub use refresh::RefreshScheduler;
pub use request::ApiRequest;
pub use sdk::{KeeperSdk, SdkOptions};
