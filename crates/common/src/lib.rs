//! Shared types for the Keeper SDK workspace

mod error;
mod secret;

pub use error::{Error, Result};
pub use secret::Secret;
