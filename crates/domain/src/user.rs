//! User identity and account payloads

use serde::{Deserialize, Serialize};

/// The authenticated user as returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Server-assigned identifier.
    pub id: String,
    /// Display name.
    #[serde(rename = "nome")]
    pub name: String,
    /// Login e-mail.
    pub email: String,
    /// Creation timestamp, as sent by the server.
    pub created_at: String,
    /// Last update timestamp, as sent by the server.
    pub updated_at: String,
}

/// Body of `POST /auth/register`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewAccount {
    /// Display name.
    #[serde(rename = "nome")]
    pub name: String,
    /// Login e-mail.
    pub email: String,
    /// Plain-text password, sent once over TLS.
    #[serde(rename = "senha")]
    pub password: String,
}

/// Body of `POST /auth/login`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Credentials {
    /// Login e-mail.
    pub email: String,
    /// Plain-text password.
    #[serde(rename = "senha")]
    pub password: String,
}

/// Body of `PATCH /users/me`. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProfileChanges {
    /// New display name.
    #[serde(rename = "nome", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New login e-mail.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Body of `PATCH /users/me/password`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PasswordChange {
    /// Password currently in use.
    #[serde(rename = "senhaAtual")]
    pub current_password: String,
    /// Replacement password.
    #[serde(rename = "novaSenha")]
    pub new_password: String,
}
