//! Authenticated request pipeline
//!
//! Every call to the backend goes through [`AuthenticatedClient`]. It
//! attaches the bearer credential, recovers once from an expired access
//! token through the refresh protocol and normalizes error payloads.

mod refresh;
mod response;

use std::sync::Arc;
use std::time::Duration;

use agenda_domain::{ApiRequest, ApiResponse, join_url};
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::auth::{IdentityCache, TokenStore};
use crate::endpoint::EndpointResolver;
use crate::error::ApiResult;
use crate::ports::HttpTransport;

type SharedRefresh = Shared<BoxFuture<'static, bool>>;

/// Collaborators the pipeline and the refresh protocol share.
#[derive(Clone)]
struct SessionContext {
    transport: Arc<dyn HttpTransport>,
    tokens: TokenStore,
    identity: Arc<IdentityCache>,
    endpoint: Arc<EndpointResolver>,
    request_timeout: Option<Duration>,
}

impl SessionContext {
    async fn url(&self, path: &str) -> String {
        join_url(&self.endpoint.resolve().await, path)
    }

    fn prepare(&self, request: &mut ApiRequest, bearer: Option<&str>) {
        if let Some(token) = bearer {
            request.set_header("Authorization", format!("Bearer {token}"));
        }
        if !request.has_header("content-type") && !request.body.is_binary() {
            request.set_header("Content-Type", "application/json");
        }
        if request.timeout.is_none() {
            request.timeout = self.request_timeout;
        }
    }

    async fn dispatch(&self, request: ApiRequest) -> ApiResult<ApiResponse> {
        let method = request.method;
        let url = request.url.clone();
        let response = self.transport.execute(request).await.inspect_err(|error| {
            warn!(method = %method, url = %url, error = %error, "request failed");
        })?;
        debug!(
            method = %method,
            url = %url,
            status = response.status.as_u16(),
            "request completed"
        );
        Ok(response)
    }

    async fn send_public(&self, mut request: ApiRequest) -> ApiResult<ApiResponse> {
        self.prepare(&mut request, None);
        response::check(self.dispatch(request).await?)
    }

    fn sign_out(&self) {
        if let Err(error) = self.tokens.clear() {
            warn!(error = %error, "failed to clear stored tokens");
        }
        self.identity.invalidate();
    }
}

/// Client for authenticated and public backend calls.
///
/// Cloning is cheap; clones share the token store, the identity cache,
/// the endpoint memo and the in-flight refresh.
#[derive(Clone)]
pub struct AuthenticatedClient {
    ctx: SessionContext,
    refresh: Arc<Mutex<Option<SharedRefresh>>>,
}

impl AuthenticatedClient {
    /// Creates a pipeline over the given collaborators.
    #[must_use]
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        tokens: TokenStore,
        identity: Arc<IdentityCache>,
        endpoint: Arc<EndpointResolver>,
    ) -> Self {
        Self {
            ctx: SessionContext {
                transport,
                tokens,
                identity,
                endpoint,
                request_timeout: None,
            },
            refresh: Arc::new(Mutex::new(None)),
        }
    }

    /// Applies `timeout` to every request that does not set its own.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.ctx.request_timeout = timeout;
        self
    }

    /// Returns the token store.
    #[must_use]
    pub const fn tokens(&self) -> &TokenStore {
        &self.ctx.tokens
    }

    /// Returns the identity cache.
    #[must_use]
    pub fn identity(&self) -> &IdentityCache {
        &self.ctx.identity
    }

    /// Returns the endpoint resolver.
    #[must_use]
    pub fn endpoint(&self) -> &EndpointResolver {
        &self.ctx.endpoint
    }

    /// Resolves the endpoint and appends `path` to it.
    pub async fn url(&self, path: &str) -> String {
        self.ctx.url(path).await
    }

    /// Sends an authenticated request, refreshing once on HTTP 401.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Network` if the server cannot be reached,
    /// `ApiError::Http` for non-success statuses (after at most one
    /// refresh-and-retry) and `ApiError::Decode` for unexpected bodies.
    pub async fn request<T: DeserializeOwned>(&self, request: ApiRequest) -> ApiResult<T> {
        let response = self.send(request, true).await?;
        response::decode(&response)
    }

    /// Sends an authenticated request without the refresh-and-retry step.
    ///
    /// # Errors
    ///
    /// Same as [`Self::request`], except that a 401 is returned at once.
    pub async fn request_once<T: DeserializeOwned>(&self, request: ApiRequest) -> ApiResult<T> {
        let response = self.send(request, false).await?;
        response::decode(&response)
    }

    /// Sends a request without credentials and without retry.
    ///
    /// # Errors
    ///
    /// Same as [`Self::request`].
    pub async fn public<T: DeserializeOwned>(&self, request: ApiRequest) -> ApiResult<T> {
        let response = self.ctx.send_public(request).await?;
        response::decode(&response)
    }

    async fn send(&self, request: ApiRequest, mut allow_retry: bool) -> ApiResult<ApiResponse> {
        loop {
            let mut attempt = request.clone();
            let access_token = self.ctx.tokens.get().access_token;
            self.ctx.prepare(&mut attempt, access_token.as_deref());

            let response = self.ctx.dispatch(attempt).await?;

            if response.status.is_unauthorized() && allow_retry {
                debug!(url = %request.url, "access token rejected");
                if self.try_refresh().await {
                    allow_retry = false;
                    continue;
                }
            }
            return response::check(response);
        }
    }

    /// Runs the refresh protocol, joining a refresh already in flight.
    ///
    /// Returns true when a new token pair was stored. On failure the
    /// session is signed out.
    pub async fn try_refresh(&self) -> bool {
        let flight = {
            let mut slot = self.refresh.lock();
            if let Some(flight) = slot.as_ref() {
                flight.clone()
            } else {
                let flight = refresh::refresh_session(self.ctx.clone()).boxed().shared();
                *slot = Some(flight.clone());
                flight
            }
        };

        let refreshed = flight.clone().await;

        let mut slot = self.refresh.lock();
        if slot.as_ref().is_some_and(|f| f.ptr_eq(&flight)) {
            *slot = None;
        }
        refreshed
    }

    /// Removes both tokens and drops the cached identity.
    pub fn sign_out(&self) {
        self.ctx.sign_out();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::ports::{MemoryStorage, TransportError};
    use crate::auth::REFRESH_TOKEN_KEY;
    use crate::test_support::{FailingStorage, ScriptedTransport, user};
    use agenda_domain::{MessageResponse, RequestBody, TokenPair};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const BASE: &str = "http://api.test/api";

    fn client_over(transport: &Arc<ScriptedTransport>, store: TokenStore) -> AuthenticatedClient {
        let endpoint = EndpointResolver::new(vec![Box::new(
            crate::endpoint::ConfiguredOverride::new(Some(BASE.to_string())),
        )]);
        AuthenticatedClient::new(
            transport.clone(),
            store,
            Arc::new(IdentityCache::new()),
            Arc::new(endpoint),
        )
    }

    fn client_with(transport: &Arc<ScriptedTransport>, tokens: &TokenPair) -> AuthenticatedClient {
        let store = TokenStore::new(Arc::new(MemoryStorage::new()));
        store.replace(tokens).unwrap();
        client_over(transport, store)
    }

    fn ok() -> ApiResponse {
        ApiResponse::json(200, &json!({"message": "ok"}))
    }

    fn unauthorized() -> ApiResponse {
        ApiResponse::json(401, &json!({"statusCode": 401, "message": "Unauthorized"}))
    }

    fn refreshed() -> ApiResponse {
        ApiResponse::json(200, &json!({"accessToken": "a2", "refreshToken": "r2"}))
    }

    async fn get_ping(client: &AuthenticatedClient) -> ApiResult<MessageResponse> {
        let url = client.url("/ping").await;
        client.request(ApiRequest::get(url)).await
    }

    #[tokio::test]
    async fn test_attaches_bearer_and_json_content_type() {
        let transport = ScriptedTransport::new();
        transport.respond("GET", "/ping", ok());
        let client = client_with(&transport, &TokenPair::new("a1", "r1"));

        get_ping(&client).await.unwrap();

        let sent = &transport.requests()[0];
        assert_eq!(sent.url, "http://api.test/api/ping");
        assert_eq!(sent.header("authorization"), Some("Bearer a1"));
        assert_eq!(sent.header("content-type"), Some("application/json"));
    }

    #[tokio::test]
    async fn test_caller_content_type_and_binary_bodies_are_kept() {
        let transport = ScriptedTransport::new();
        transport.respond("POST", "/upload", ok());
        let client = client_with(&transport, &TokenPair::default());

        let url = client.url("/upload").await;
        let binary = ApiRequest::post(url.clone()).with_body(RequestBody::Binary(vec![1, 2, 3]));
        let _: MessageResponse = client.request(binary).await.unwrap();
        let typed = ApiRequest::post(url).with_header("Content-Type", "text/csv");
        let _: MessageResponse = client.request(typed).await.unwrap();

        let requests = transport.requests();
        assert_eq!(requests[0].header("content-type"), None);
        assert_eq!(requests[0].header("authorization"), None);
        assert_eq!(requests[1].header("content-type"), Some("text/csv"));
    }

    #[tokio::test]
    async fn test_401_refreshes_and_retries_once() {
        let transport = ScriptedTransport::new();
        transport.respond("GET", "/ping", unauthorized());
        transport.respond("GET", "/ping", ok());
        transport.respond("POST", "/auth/refresh", refreshed());
        let client = client_with(&transport, &TokenPair::new("a1", "r1"));

        let result = get_ping(&client).await.unwrap();

        assert_eq!(result.message, "ok");
        assert_eq!(transport.calls("/auth/refresh"), 1);
        assert_eq!(transport.calls("/ping"), 2);
        assert_eq!(client.tokens().get(), TokenPair::new("a2", "r2"));

        let requests = transport.requests();
        let refresh = requests.iter().find(|r| r.url.ends_with("/auth/refresh")).unwrap();
        assert_eq!(refresh.header("authorization"), None);
        assert_eq!(
            serde_json::from_slice::<serde_json::Value>(refresh.body.as_bytes()).unwrap(),
            json!({"refreshToken": "r1"})
        );
        let retry = requests.last().unwrap();
        assert_eq!(retry.header("authorization"), Some("Bearer a2"));
    }

    #[tokio::test]
    async fn test_second_401_is_final() {
        let transport = ScriptedTransport::new();
        transport.respond("GET", "/ping", unauthorized());
        transport.respond("POST", "/auth/refresh", refreshed());
        let client = client_with(&transport, &TokenPair::new("a1", "r1"));

        let error = get_ping(&client).await.unwrap_err();

        assert_eq!(error, ApiError::http(401, "Unauthorized"));
        assert_eq!(transport.calls("/auth/refresh"), 1);
        assert_eq!(transport.calls("/ping"), 2);
    }

    #[tokio::test]
    async fn test_refresh_failure_signs_out() {
        let transport = ScriptedTransport::new();
        transport.respond("GET", "/ping", unauthorized());
        transport.respond(
            "POST",
            "/auth/refresh",
            ApiResponse::json(401, &json!({"message": "Refresh token inválido"})),
        );
        let client = client_with(&transport, &TokenPair::new("a1", "r1"));
        client.identity().prime(user("u1"));
        let mut events = client.tokens().subscribe();

        let error = get_ping(&client).await.unwrap_err();

        assert_eq!(error.status(), Some(401));
        assert_eq!(transport.calls("/ping"), 1);
        assert_eq!(client.tokens().get(), TokenPair::default());
        assert_eq!(client.identity().cached(), None);
        assert_eq!(events.try_recv().unwrap().tokens, TokenPair::default());
    }

    #[tokio::test]
    async fn test_unpersisted_refresh_signs_out() {
        let transport = ScriptedTransport::new();
        transport.respond("GET", "/ping", unauthorized());
        transport.respond("POST", "/auth/refresh", refreshed());
        let storage = FailingStorage::new();
        let client = client_over(&transport, TokenStore::new(storage.clone()));
        client.tokens().replace(&TokenPair::new("a1", "r1")).unwrap();
        client.identity().prime(user("u1"));
        storage.fail_writes_to(REFRESH_TOKEN_KEY);

        let error = get_ping(&client).await.unwrap_err();

        assert_eq!(error.status(), Some(401));
        assert_eq!(transport.calls("/auth/refresh"), 1);
        assert_eq!(transport.calls("/ping"), 1);
        assert_eq!(client.tokens().get(), TokenPair::default());
        assert_eq!(client.identity().cached(), None);
    }

    #[tokio::test]
    async fn test_refresh_network_failure_signs_out() {
        let transport = ScriptedTransport::new();
        let reset = TransportError::ConnectionFailed("reset".to_string());
        transport.fail("POST", "/auth/refresh", reset);
        let client = client_with(&transport, &TokenPair::new("a1", "r1"));

        assert!(!client.try_refresh().await);
        assert_eq!(client.tokens().get(), TokenPair::default());
    }

    #[tokio::test]
    async fn test_no_refresh_token_means_no_refresh_call() {
        let transport = ScriptedTransport::new();
        transport.respond("GET", "/ping", unauthorized());
        let client = client_with(
            &transport,
            &TokenPair {
                access_token: Some("a1".to_string()),
                refresh_token: None,
            },
        );

        assert!(get_ping(&client).await.unwrap_err().is_unauthorized());
        assert_eq!(transport.calls("/auth/refresh"), 0);
        assert_eq!(transport.calls("/ping"), 1);
    }

    #[tokio::test]
    async fn test_request_once_does_not_refresh() {
        let transport = ScriptedTransport::new();
        transport.respond("GET", "/ping", unauthorized());
        let client = client_with(&transport, &TokenPair::new("a1", "r1"));

        let url = client.url("/ping").await;
        let result: ApiResult<MessageResponse> = client.request_once(ApiRequest::get(url)).await;

        assert!(result.unwrap_err().is_unauthorized());
        assert_eq!(transport.calls("/auth/refresh"), 0);
        assert_eq!(client.tokens().get(), TokenPair::new("a1", "r1"));
    }

    #[tokio::test]
    async fn test_concurrent_401s_share_one_refresh() {
        let transport = ScriptedTransport::delayed(Duration::from_millis(20));
        transport.respond("GET", "/ping", unauthorized());
        transport.respond("GET", "/ping", unauthorized());
        transport.respond("GET", "/ping", ok());
        transport.respond("POST", "/auth/refresh", refreshed());
        let client = client_with(&transport, &TokenPair::new("a1", "r1"));

        let (a, b) = tokio::join!(get_ping(&client), get_ping(&client));

        assert_eq!(a.unwrap().message, "ok");
        assert_eq!(b.unwrap().message, "ok");
        assert_eq!(transport.calls("/auth/refresh"), 1);
        assert_eq!(client.tokens().get(), TokenPair::new("a2", "r2"));
    }

    #[tokio::test]
    async fn test_public_requests_carry_no_credentials() {
        let transport = ScriptedTransport::new();
        transport.respond("GET", "/health", unauthorized());
        let client = client_with(&transport, &TokenPair::new("a1", "r1"));

        let url = client.url("/health").await;
        let result: ApiResult<MessageResponse> = client.public(ApiRequest::get(url)).await;

        assert!(result.unwrap_err().is_unauthorized());
        assert_eq!(transport.requests()[0].header("authorization"), None);
        assert_eq!(transport.calls("/auth/refresh"), 0);
    }

    #[tokio::test]
    async fn test_transport_failure_is_network_error() {
        let transport = ScriptedTransport::new();
        transport.fail("GET", "/ping", TransportError::Timeout { timeout_ms: 500 });
        let client = client_with(&transport, &TokenPair::new("a1", "r1"))
            .with_request_timeout(Some(Duration::from_millis(500)));

        let error = get_ping(&client).await.unwrap_err();

        assert!(matches!(error, ApiError::Network(_)));
        assert_eq!(transport.requests()[0].timeout, Some(Duration::from_millis(500)));
    }
}
