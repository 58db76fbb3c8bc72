//! Agenda Domain - Core client types
//!
//! This crate defines the data model shared by the session and
//! authenticated-request layers of the Agenda client.
//! All types here are pure Rust with no I/O dependencies.

pub mod contact;
pub mod error;
pub mod page;
pub mod request;
pub mod response;
pub mod session;
pub mod user;
pub mod wire;

pub use contact::{Contact, ContactChanges, ContactFilter, ContactSearch, NewContact};
pub use error::{DomainError, DomainResult};
pub use page::{ContactListPayload, ContactPage, LegacyPagination, PaginationMeta};
pub use request::{ApiRequest, HttpMethod, RequestBody, join_url};
pub use response::{ApiResponse, StatusCode};
pub use session::{SessionState, TokenPair};
pub use user::{Credentials, NewAccount, PasswordChange, ProfileChanges, User};
pub use wire::{
    ApiErrorBody, AuthResponse, ErrorMessage, HealthStatus, LogoutRequest, MessageResponse,
    RefreshRequest, RefreshResponse,
};
