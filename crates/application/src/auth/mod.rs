//! Session state held by the client.
//!
//! This module provides:
//! - Durable access/refresh token storage with change notification
//! - A single-flight cache of the authenticated user

mod identity;
mod token_store;

pub use identity::IdentityCache;
pub use token_store::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, TokenStore, TokensChanged};
