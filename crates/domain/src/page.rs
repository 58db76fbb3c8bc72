//! Contact list envelopes
//!
//! The list endpoints have answered with three different shapes over time.
//! They are decoded as one tagged union and normalized into [`ContactPage`]
//! at the boundary, so no caller inspects the raw shape.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::contact::Contact;

/// Pagination metadata of the `{data, meta}` envelope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaginationMeta {
    /// Total number of matching contacts.
    pub total: Option<u64>,
    /// Current page.
    pub page: Option<u32>,
    /// Page size.
    pub limit: Option<u32>,
    /// Number of pages.
    pub total_pages: Option<u32>,
    /// Whether a next page exists.
    pub has_next_page: Option<bool>,
    /// Whether a previous page exists.
    pub has_previous_page: Option<bool>,
}

/// Pagination block of the `{contacts, pagination}` envelope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LegacyPagination {
    /// Total items, sent either as a number or as a numeric string.
    pub total_items: Option<Value>,
    /// Current page.
    pub page: Option<u32>,
    /// Page size.
    pub limit: Option<u32>,
}

impl LegacyPagination {
    /// Parses `totalItems`, accepting numbers and numeric strings.
    #[must_use]
    pub fn total(&self) -> Option<u64> {
        match self.total_items.as_ref()? {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

/// Every list shape the backend may return.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ContactListPayload {
    /// `{data: [...], meta: {...}}`
    Envelope {
        /// Page items.
        data: Vec<Contact>,
        /// Pagination metadata.
        #[serde(default)]
        meta: Option<PaginationMeta>,
    },
    /// `{contacts: [...], pagination: {...}}`
    Legacy {
        /// Page items.
        contacts: Vec<Contact>,
        /// Pagination block.
        #[serde(default)]
        pagination: Option<LegacyPagination>,
    },
    /// A bare JSON array.
    Bare(Vec<Contact>),
}

/// Canonical page of contacts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContactPage {
    /// Contacts on this page.
    pub items: Vec<Contact>,
    /// Total matches, when the server reports it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    /// Current page, when the server reports it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    /// Page size, when the server reports it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

impl From<ContactListPayload> for ContactPage {
    fn from(payload: ContactListPayload) -> Self {
        match payload {
            ContactListPayload::Envelope { data, meta } => {
                let meta = meta.unwrap_or_default();
                Self {
                    items: data,
                    total: meta.total,
                    page: meta.page,
                    limit: meta.limit,
                }
            }
            ContactListPayload::Legacy {
                contacts,
                pagination,
            } => {
                let pagination = pagination.unwrap_or_default();
                Self {
                    items: contacts,
                    total: pagination.total(),
                    page: pagination.page,
                    limit: pagination.limit,
                }
            }
            ContactListPayload::Bare(items) => Self {
                items,
                ..Self::default()
            },
        }
    }
}
