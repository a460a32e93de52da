//! Keeper OAuth constants

/// Public Nunux Keeper API root, used when no endpoint is configured.
pub const DEFAULT_ENDPOINT: &str = "https://api.nunux.org/keeper";

/// Scope requested in offline mode: one long-lived refresh token.
pub const OFFLINE_SCOPE: &str = "offline_access";

/// Scope requested in online mode: refresh tokens may rotate.
pub const ONLINE_SCOPE: &str = "openid";

/// Display name used when the access token carries no usable identity.
pub const UNKNOWN_IDENTITY: &str = "Unknown";
