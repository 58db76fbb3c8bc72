//! Scripted collaborators shared by the unit tests.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use agenda_domain::{ApiRequest, ApiResponse, Contact, User};
use parking_lot::Mutex;
use serde_json::{Value, json};

use crate::ports::{
    HttpTransport, KeyValueStorage, MemoryStorage, StorageError, TransportError, TransportFuture,
};

type Outcome = Result<ApiResponse, TransportError>;

/// Memory storage whose writes to one key can be made to fail.
///
/// Removals always succeed so a sign-out can still clear the store.
#[derive(Default)]
pub struct FailingStorage {
    inner: MemoryStorage,
    failing_key: Mutex<Option<String>>,
}

impl FailingStorage {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Makes every later write to `key` fail.
    pub fn fail_writes_to(&self, key: &str) {
        *self.failing_key.lock() = Some(key.to_string());
    }
}

impl KeyValueStorage for FailingStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.failing_key.lock().as_deref() == Some(key) {
            return Err(StorageError::Io(std::io::Error::other("disk full")));
        }
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.inner.remove(key)
    }
}

#[derive(Default)]
struct Route {
    queue: VecDeque<Outcome>,
    last: Option<Outcome>,
}

impl Route {
    /// Next scripted outcome; the last one repeats once the queue drains.
    fn next(&mut self) -> Option<Outcome> {
        if let Some(outcome) = self.queue.pop_front() {
            self.last = Some(outcome);
        }
        self.last.clone()
    }
}

/// Transport answering from per-route scripts and recording every request.
///
/// Routes are matched on method and path suffix, query string excluded.
/// The longest matching suffix wins.
#[derive(Default)]
pub struct ScriptedTransport {
    routes: Mutex<HashMap<(String, String), Route>>,
    requests: Mutex<Vec<ApiRequest>>,
    delay: Option<Duration>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Every answer is delayed by `delay`.
    pub fn delayed(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay: Some(delay),
            ..Self::default()
        })
    }

    pub fn respond(&self, method: &str, path: &str, response: ApiResponse) {
        self.push(method, path, Ok(response));
    }

    pub fn fail(&self, method: &str, path: &str, error: TransportError) {
        self.push(method, path, Err(error));
    }

    fn push(&self, method: &str, path: &str, outcome: Outcome) {
        self.routes
            .lock()
            .entry((method.to_uppercase(), path.to_string()))
            .or_default()
            .queue
            .push_back(outcome);
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().clone()
    }

    /// Number of requests whose path ends with `path`.
    pub fn calls(&self, path: &str) -> usize {
        self.requests
            .lock()
            .iter()
            .filter(|r| path_of(&r.url).ends_with(path))
            .count()
    }

    fn answer(&self, request: &ApiRequest) -> Outcome {
        let path = path_of(&request.url);
        let method = request.method.as_str();
        let mut routes = self.routes.lock();

        let key = routes
            .keys()
            .filter(|(m, p)| m == method && path.ends_with(p.as_str()))
            .max_by_key(|(_, p)| p.len())
            .cloned();

        key.and_then(|key| routes.get_mut(&key).and_then(Route::next))
            .unwrap_or_else(|| {
                Ok(ApiResponse::json(
                    404,
                    &json!({"statusCode": 404, "message": format!("no route for {method} {path}")}),
                ))
            })
    }
}

impl HttpTransport for ScriptedTransport {
    fn execute(&self, request: ApiRequest) -> TransportFuture<'_> {
        Box::pin(async move {
            let outcome = self.answer(&request);
            self.requests.lock().push(request);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            outcome
        })
    }
}

fn path_of(url: &str) -> String {
    let without_scheme = url.split_once("://").map_or(url, |(_, rest)| rest);
    let path = without_scheme
        .find('/')
        .map_or("", |index| &without_scheme[index..]);
    path.split(['?', '#']).next().unwrap_or_default().to_string()
}

pub fn user_json(id: &str) -> Value {
    json!({
        "id": id,
        "nome": "Ana Souza",
        "email": "ana@example.com",
        "createdAt": "2024-05-01T12:00:00Z",
        "updatedAt": "2024-05-01T12:00:00Z"
    })
}

pub fn user(id: &str) -> User {
    serde_json::from_value(user_json(id)).unwrap()
}

pub fn contact_json(id: &str) -> Value {
    json!({
        "id": id,
        "nome": "Bruno Lima",
        "telefone": "11987654321",
        "email": "bruno@example.com",
        "categoria": "Trabalho",
        "ownerId": "u1",
        "createdAt": "2024-05-02T08:30:00Z",
        "updatedAt": "2024-05-02T08:30:00Z"
    })
}

pub fn contact(id: &str) -> Contact {
    serde_json::from_value(contact_json(id)).unwrap()
}

pub fn auth_json(id: &str, access: &str, refresh: &str) -> Value {
    json!({"user": user_json(id), "accessToken": access, "refreshToken": refresh})
}

#[test]
fn test_path_of_strips_host_and_query() {
    assert_eq!(path_of("http://h:8000/api/contacts?page=1"), "/api/contacts");
    assert_eq!(path_of("https://h"), "");
}
