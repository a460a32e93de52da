//! Nunux Keeper OAuth building blocks
//!
//! Stateless pieces of the credential lifecycle: realm descriptors, authorize
//! and token URL construction, access-token identity decoding, and the two
//! token endpoint grants. The stateful parts (discovery caching, refresh
//! sequencing, authenticated requests) live in `keeper-client`.
//!
//! Credential flow:
//! 1. Realm resolved by discovery → `RealmDescriptor`
//! 2. User authorizes via `authorize::build_authorization_url()`
//! 3. Client calls `token::exchange_code()` with the returned code
//! 4. `Credentials::from_token_response()` derives identity and expiry
//! 5. Later, `token::refresh_token()` + `Credentials::apply_refresh()`

pub mod authorize;
pub mod constants;
pub mod credentials;
pub mod error;
pub mod options;
pub mod realm;
pub mod token;

pub use authorize::{build_authorization_url, generate_state};
pub use constants::*;
pub use credentials::{Credentials, decode_identity, display_name, now_millis};
pub use error::{Error, Result};
pub use options::ClientOptions;
pub use realm::RealmDescriptor;
pub use token::{TokenResponse, exchange_code, refresh_token};
