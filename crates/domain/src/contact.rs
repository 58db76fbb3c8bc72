//! Contact payloads
//!
//! The client transports these types without enforcing business rules on
//! them; validation lives on the server and in the forms layer.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{DomainError, DomainResult};

/// A contact owned by the authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    /// Server-assigned identifier.
    pub id: String,
    /// Contact name.
    #[serde(rename = "nome")]
    pub name: String,
    /// Phone number, 11 digits without mask.
    #[serde(rename = "telefone")]
    pub phone: String,
    /// Optional e-mail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Optional free-form category.
    #[serde(rename = "categoria", default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Optional photo as a base64 string or data URL.
    #[serde(rename = "foto", default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    /// Identifier of the owning user.
    pub owner_id: String,
    /// Creation timestamp, as sent by the server.
    pub created_at: String,
    /// Last update timestamp, as sent by the server.
    pub updated_at: String,
    /// Members this client does not model, kept for round-tripping.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Contact {
    /// Returns the API path of a single contact.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidIdentifier` if the id is blank or
    /// would escape the `/contacts/` segment.
    pub fn resource_path(id: &str) -> DomainResult<String> {
        let id = id.trim();
        if id.is_empty() || id.contains(['/', '?', '#']) {
            return Err(DomainError::InvalidIdentifier(id.to_string()));
        }
        Ok(format!("/contacts/{id}"))
    }
}

/// Body of `POST /contacts`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NewContact {
    /// Contact name.
    #[serde(rename = "nome")]
    pub name: String,
    /// Phone number.
    #[serde(rename = "telefone")]
    pub phone: String,
    /// Optional e-mail.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Optional category.
    #[serde(rename = "categoria", skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Optional photo (base64).
    #[serde(rename = "foto", skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
}

/// Body of `PATCH /contacts/{id}`. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContactChanges {
    /// New name.
    #[serde(rename = "nome", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New phone number.
    #[serde(rename = "telefone", skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// New e-mail.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// New category.
    #[serde(rename = "categoria", skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// New photo (base64).
    #[serde(rename = "foto", skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
}

impl ContactChanges {
    /// Returns true if no field would be sent.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.phone.is_none()
            && self.email.is_none()
            && self.category.is_none()
            && self.photo.is_none()
    }
}

/// Query parameters of `GET /contacts`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContactFilter {
    /// 1-based page number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    /// Page size.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    /// Name filter.
    #[serde(rename = "nome", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Category filter.
    #[serde(rename = "categoria", skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// E-mail filter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl ContactFilter {
    /// Drops blank text filters so they are not sent as empty parameters.
    #[must_use]
    pub fn normalized(&self) -> Self {
        fn keep(value: Option<&String>) -> Option<String> {
            value.filter(|v| !v.trim().is_empty()).cloned()
        }

        Self {
            page: self.page,
            limit: self.limit,
            name: keep(self.name.as_ref()),
            category: keep(self.category.as_ref()),
            email: keep(self.email.as_ref()),
        }
    }
}

/// Query parameters of `GET /contacts/search`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContactSearch {
    /// Free-text search term, always sent.
    pub q: String,
    /// 1-based page number, sent only when non-zero.
    #[serde(skip_serializing_if = "is_unset")]
    pub page: Option<u32>,
    /// Page size, sent only when non-zero.
    #[serde(skip_serializing_if = "is_unset")]
    pub limit: Option<u32>,
}

impl ContactSearch {
    /// Creates a search for the given term.
    #[must_use]
    pub fn new(q: impl Into<String>) -> Self {
        Self {
            q: q.into(),
            ..Self::default()
        }
    }
}

#[allow(clippy::ref_option, clippy::trivially_copy_pass_by_ref)]
fn is_unset(value: &Option<u32>) -> bool {
    value.is_none_or(|v| v == 0)
}
