//! Auth gateway
//!
//! The public surface of the session client. Each operation resolves the
//! endpoint, builds the request and hands it to the
//! [`AuthenticatedClient`]; auth operations also keep the token store and
//! the identity cache in step with the server.

use std::sync::Arc;

use agenda_domain::{
    ApiRequest, AuthResponse, Contact, ContactChanges, ContactFilter, ContactListPayload,
    ContactPage, ContactSearch, Credentials, HealthStatus, LogoutRequest, MessageResponse,
    NewAccount, NewContact, PasswordChange, ProfileChanges, SessionState, TokenPair, User,
};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::auth::{IdentityCache, TokenStore, TokensChanged};
use crate::client::AuthenticatedClient;
use crate::endpoint::EndpointResolver;
use crate::error::{ApiError, ApiResult};
use crate::ports::{HttpTransport, KeyValueStorage};
use crate::settings::ClientSettings;

/// Outcome of a route-guard style identity check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStatus {
    /// No usable session.
    SignedOut,
    /// The server confirmed the session.
    Authenticated(User),
}

/// Entry point for every backend operation.
#[derive(Clone)]
pub struct AuthGateway {
    client: AuthenticatedClient,
}

impl AuthGateway {
    /// Wraps an existing pipeline.
    #[must_use]
    pub const fn new(client: AuthenticatedClient) -> Self {
        Self { client }
    }

    /// Wires a gateway from settings.
    ///
    /// `storage` is ignored in a headless execution context, where tokens
    /// are never persisted.
    #[must_use]
    pub fn with_settings(
        settings: &ClientSettings,
        transport: Arc<dyn HttpTransport>,
        storage: Option<Arc<dyn KeyValueStorage>>,
    ) -> Self {
        let tokens = match storage {
            Some(storage) if settings.context.has_storage() => TokenStore::new(storage),
            _ => TokenStore::unavailable(),
        };
        let endpoint = EndpointResolver::from_settings(settings, Arc::clone(&transport));
        let client = AuthenticatedClient::new(
            transport,
            tokens,
            Arc::new(IdentityCache::new()),
            Arc::new(endpoint),
        )
        .with_request_timeout(settings.request_timeout());

        Self::new(client)
    }

    /// Returns the underlying pipeline.
    #[must_use]
    pub const fn client(&self) -> &AuthenticatedClient {
        &self.client
    }

    // Auth

    /// Creates an account and signs it in.
    ///
    /// # Errors
    ///
    /// Returns the server error (e.g. e-mail already in use) or a storage
    /// error if the issued tokens cannot be persisted.
    pub async fn register(&self, account: &NewAccount) -> ApiResult<AuthResponse> {
        let request = ApiRequest::post(self.client.url("/auth/register").await).with_json(account)?;
        let response: AuthResponse = self.client.public(request).await?;
        self.establish(&response)?;
        Ok(response)
    }

    /// Signs in with e-mail and password.
    ///
    /// # Errors
    ///
    /// Returns the server error (e.g. invalid credentials) or a storage
    /// error if the issued tokens cannot be persisted.
    pub async fn login(&self, credentials: &Credentials) -> ApiResult<AuthResponse> {
        let url = self.client.url("/auth/login").await;
        let request = ApiRequest::post(url).with_json(credentials)?;
        let response: AuthResponse = self.client.public(request).await?;
        self.establish(&response)?;
        Ok(response)
    }

    /// Revokes the refresh token server-side and signs out locally.
    ///
    /// The local session is cleared whatever the server answers.
    ///
    /// # Errors
    ///
    /// Returns the server or network error after the local sign-out.
    /// A success without a message body yields `None`.
    pub async fn logout(&self) -> ApiResult<Option<MessageResponse>> {
        let refresh_token = self.client.tokens().get().refresh_token;
        let url = self.client.url("/auth/logout").await;

        let result = match ApiRequest::post(url).with_json(&LogoutRequest { refresh_token }) {
            Ok(request) => self.client.request(request).await,
            Err(error) => Err(error.into()),
        };

        self.client.sign_out();
        match &result {
            Ok(_) => info!("signed out"),
            Err(error) => warn!(error = %error, "logout request failed, local session cleared"),
        }
        result
    }

    // Current user

    /// Fetches the authenticated user from the server.
    ///
    /// # Errors
    ///
    /// Returns the server or network error. An authorization failure also
    /// drops the cached identity.
    pub async fn me(&self) -> ApiResult<User> {
        let url = self.client.url("/users/me").await;
        let result = self.client.request(ApiRequest::get(url)).await;
        if result.as_ref().is_err_and(ApiError::is_unauthorized) {
            self.client.identity().invalidate();
        }
        result
    }

    /// Returns the cached user, fetching it once on a miss.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotAuthenticated` without a network call when no
    /// tokens are stored, otherwise the error of [`Self::me`].
    pub async fn current_user(&self) -> ApiResult<User> {
        if !self.client.tokens().state().has_credentials() {
            self.client.identity().invalidate();
            return Err(ApiError::NotAuthenticated);
        }

        let gateway = self.clone();
        self.client
            .identity()
            .get_or_fetch(move || async move { gateway.me().await })
            .await
    }

    /// Asks the server whether the stored session is still valid.
    pub async fn verify_session(&self) -> SessionStatus {
        if !self.session_state().has_credentials() {
            return SessionStatus::SignedOut;
        }

        match self.me().await {
            Ok(user) => {
                self.client.identity().prime(user.clone());
                SessionStatus::Authenticated(user)
            }
            Err(error) => {
                debug!(error = %error, "session verification failed");
                SessionStatus::SignedOut
            }
        }
    }

    /// Updates name and/or e-mail of the authenticated user.
    ///
    /// # Errors
    ///
    /// Returns the server or network error.
    pub async fn update_me(&self, changes: &ProfileChanges) -> ApiResult<User> {
        let request = ApiRequest::patch(self.client.url("/users/me").await).with_json(changes)?;
        let user: User = self.client.request(request).await?;
        self.client.identity().prime(user.clone());
        Ok(user)
    }

    /// Changes the password of the authenticated user.
    ///
    /// # Errors
    ///
    /// Returns the server error (e.g. wrong current password).
    pub async fn update_password(&self, change: &PasswordChange) -> ApiResult<MessageResponse> {
        let url = self.client.url("/users/me/password").await;
        let request = ApiRequest::patch(url).with_json(change)?;
        self.client.request(request).await
    }

    /// Deletes the authenticated account and signs out locally.
    ///
    /// # Errors
    ///
    /// Returns the server or network error; the session is kept on failure.
    /// A success without a message body (`204`) yields `None`.
    pub async fn delete_me(&self) -> ApiResult<Option<MessageResponse>> {
        let url = self.client.url("/users/me").await;
        let response = self.client.request(ApiRequest::delete(url)).await?;
        self.client.sign_out();
        info!("account deleted");
        Ok(response)
    }

    // Contacts

    /// Creates a contact.
    ///
    /// # Errors
    ///
    /// Returns the server or network error.
    pub async fn create_contact(&self, contact: &NewContact) -> ApiResult<Contact> {
        let request = ApiRequest::post(self.client.url("/contacts").await).with_json(contact)?;
        self.client.request(request).await
    }

    /// Lists contacts, optionally filtered and paginated.
    ///
    /// # Errors
    ///
    /// Returns the server or network error.
    pub async fn list_contacts(&self, filter: &ContactFilter) -> ApiResult<ContactPage> {
        self.fetch_page("/contacts", &filter.normalized()).await
    }

    /// Full-text contact search.
    ///
    /// # Errors
    ///
    /// Returns the server or network error.
    pub async fn search_contacts(&self, search: &ContactSearch) -> ApiResult<ContactPage> {
        self.fetch_page("/contacts/search", search).await
    }

    /// Fetches one contact.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Domain` for an unusable id, otherwise the server
    /// or network error.
    pub async fn get_contact(&self, id: &str) -> ApiResult<Contact> {
        let url = self.client.url(&Contact::resource_path(id)?).await;
        self.client.request(ApiRequest::get(url)).await
    }

    /// Applies a partial update to a contact.
    ///
    /// # Errors
    ///
    /// Same as [`Self::get_contact`].
    pub async fn update_contact(&self, id: &str, changes: &ContactChanges) -> ApiResult<Contact> {
        let url = self.client.url(&Contact::resource_path(id)?).await;
        let request = ApiRequest::patch(url).with_json(changes)?;
        self.client.request(request).await
    }

    /// Deletes a contact. A success without a message body yields `None`.
    ///
    /// # Errors
    ///
    /// Same as [`Self::get_contact`].
    pub async fn delete_contact(&self, id: &str) -> ApiResult<Option<MessageResponse>> {
        let url = self.client.url(&Contact::resource_path(id)?).await;
        self.client.request(ApiRequest::delete(url)).await
    }

    // Utilities

    /// Backend health check; needs no credentials.
    ///
    /// # Errors
    ///
    /// Returns the server or network error.
    pub async fn health(&self) -> ApiResult<HealthStatus> {
        let url = self.client.url("/health").await;
        self.client.public(ApiRequest::get(url)).await
    }

    /// Session state implied by the stored tokens.
    #[must_use]
    pub fn session_state(&self) -> SessionState {
        self.client.tokens().state()
    }

    /// Currently stored tokens.
    #[must_use]
    pub fn tokens(&self) -> TokenPair {
        self.client.tokens().get()
    }

    /// Subscribes to token change notifications.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<TokensChanged> {
        self.client.tokens().subscribe()
    }

    /// Resolves the API endpoint, probing on first use.
    pub async fn resolve_endpoint(&self) -> String {
        self.client.endpoint().resolve().await
    }

    /// Forgets the resolved endpoint.
    pub async fn reset_endpoint(&self) {
        self.client.endpoint().reset().await;
    }

    /// Returns the resolved endpoint, if resolution already ran.
    pub async fn current_endpoint(&self) -> Option<String> {
        self.client.endpoint().current().await
    }

    fn establish(&self, response: &AuthResponse) -> ApiResult<()> {
        self.client.tokens().replace(&response.tokens())?;
        self.client.identity().prime(response.user.clone());
        info!(user_id = %response.user.id, "signed in");
        Ok(())
    }

    async fn fetch_page<Q: Serialize>(&self, path: &str, query: &Q) -> ApiResult<ContactPage> {
        let query =
            serde_urlencoded::to_string(query).map_err(|e| ApiError::Encode(e.to_string()))?;
        let path = if query.is_empty() {
            path.to_string()
        } else {
            format!("{path}?{query}")
        };

        let url = self.client.url(&path).await;
        let payload: ContactListPayload = self.client.request(ApiRequest::get(url)).await?;
        Ok(payload.into())
    }
}
