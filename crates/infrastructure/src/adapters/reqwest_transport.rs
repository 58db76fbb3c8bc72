//! HTTP transport implementation using reqwest.
//!
//! This adapter implements the `HttpTransport` port. It performs the
//! network I/O only; credentials, retries and error bodies are handled by
//! the session core.

use std::collections::HashMap;
use std::error::Error as _;
use std::time::Duration;

use agenda_application::ports::{HttpTransport, TransportError, TransportFuture};
use agenda_domain::{ApiRequest, ApiResponse, HttpMethod, RequestBody};
use reqwest::{Client, Method, Url};
use tracing::trace;

/// HTTP transport backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Creates a transport with default settings.
    ///
    /// Default configuration:
    /// - Follow redirects: up to 10
    /// - TLS verification: enabled
    /// - User-Agent: "agenda/<version>"
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be created.
    pub fn new() -> Result<Self, TransportError> {
        let client = Client::builder()
            .user_agent(concat!("agenda/", env!("CARGO_PKG_VERSION")))
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| TransportError::Other(e.to_string()))?;

        Ok(Self { client })
    }

    /// Creates a transport over a preconfigured client.
    #[must_use]
    pub const fn with_client(client: Client) -> Self {
        Self { client }
    }

    const fn to_reqwest_method(method: HttpMethod) -> Method {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Patch => Method::PATCH,
            HttpMethod::Delete => Method::DELETE,
        }
    }

    /// Maps reqwest errors to `TransportError`.
    fn map_error(error: &reqwest::Error, timeout: Option<Duration>) -> TransportError {
        if error.is_timeout() {
            let timeout_ms =
                timeout.map_or(0, |t| u64::try_from(t.as_millis()).unwrap_or(u64::MAX));
            return TransportError::Timeout { timeout_ms };
        }

        let message = describe(error);
        if error.is_connect() {
            if message.to_lowercase().contains("refused") {
                let url = error.url();
                return TransportError::ConnectionRefused {
                    host: url
                        .and_then(Url::host_str)
                        .unwrap_or("unknown")
                        .to_string(),
                    port: url.and_then(Url::port_or_known_default).unwrap_or(80),
                };
            }
            return TransportError::ConnectionFailed(message);
        }

        TransportError::Other(message)
    }
}

/// Renders an error with its source chain, which is where hyper puts the
/// OS-level cause.
fn describe(error: &reqwest::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

impl HttpTransport for ReqwestTransport {
    fn execute(&self, request: ApiRequest) -> TransportFuture<'_> {
        Box::pin(async move {
            let ApiRequest {
                method,
                url,
                headers,
                body,
                timeout,
            } = request;

            let parsed_url =
                Url::parse(&url).map_err(|e| TransportError::InvalidUrl(format!("{e}: {url}")))?;

            let mut builder = self
                .client
                .request(Self::to_reqwest_method(method), parsed_url);

            if let Some(timeout) = timeout {
                builder = builder.timeout(timeout);
            }

            for (name, value) in &headers {
                builder = builder.header(name, value);
            }

            builder = match body {
                RequestBody::Empty => builder,
                RequestBody::Json(content) => builder.body(content),
                RequestBody::Binary(bytes) => builder.body(bytes),
            };

            trace!(method = %method, url = %url, "sending request");
            let response = builder
                .send()
                .await
                .map_err(|e| Self::map_error(&e, timeout))?;

            let status = response.status().as_u16();
            let response_headers: HashMap<String, String> = response
                .headers()
                .iter()
                .map(|(k, v)| (k.as_str().to_string(), v.to_str().unwrap_or_default().to_string()))
                .collect();

            let body = response
                .bytes()
                .await
                .map_err(|e| TransportError::Body(e.to_string()))?
                .to_vec();

            Ok(ApiResponse::new(status, response_headers, body))
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_to_reqwest_method() {
        assert_eq!(ReqwestTransport::to_reqwest_method(HttpMethod::Get), Method::GET);
        assert_eq!(ReqwestTransport::to_reqwest_method(HttpMethod::Patch), Method::PATCH);
        assert_eq!(ReqwestTransport::to_reqwest_method(HttpMethod::Delete), Method::DELETE);
    }

    #[test]
    fn test_transport_creation() {
        assert!(ReqwestTransport::new().is_ok());
    }

    #[tokio::test]
    async fn test_invalid_url_is_rejected() {
        let transport = ReqwestTransport::new().unwrap();
        let result = transport.execute(ApiRequest::get("not a url")).await;
        assert!(matches!(result, Err(TransportError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_closed_port_is_a_connection_error() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let client = Client::builder().no_proxy().build().unwrap();
        let transport = ReqwestTransport::with_client(client);

        let result = transport
            .execute(ApiRequest::get(format!("http://127.0.0.1:{port}/api/health")))
            .await;

        assert!(matches!(
            result,
            Err(TransportError::ConnectionRefused { .. } | TransportError::ConnectionFailed(_))
        ));
    }
}
