//! Single-flight cache of the authenticated user.

use std::future::Future;

use agenda_domain::User;
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use tracing::debug;

use crate::error::ApiResult;

type SharedFetch = Shared<BoxFuture<'static, ApiResult<User>>>;

/// Holds at most one cached [`User`] and at most one in-flight fetch.
///
/// Concurrent callers that miss the cache share one fetch and observe the
/// same outcome. `invalidate` and `prime` bump a generation counter so a
/// fetch that completes afterwards cannot overwrite the newer state.
#[derive(Default)]
pub struct IdentityCache {
    state: Mutex<IdentityState>,
}

#[derive(Default)]
struct IdentityState {
    user: Option<User>,
    inflight: Option<SharedFetch>,
    generation: u64,
}

impl IdentityCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached user without fetching.
    #[must_use]
    pub fn cached(&self) -> Option<User> {
        self.state.lock().user.clone()
    }

    /// Returns true while a fetch is outstanding.
    #[must_use]
    pub fn is_fetching(&self) -> bool {
        self.state.lock().inflight.is_some()
    }

    /// Returns the cached user, joining or starting a fetch on a miss.
    ///
    /// `fetch` is only called when no value is cached and nothing is in
    /// flight. It runs under the cache lock, so it must only build the
    /// future and never touch this cache.
    ///
    /// # Errors
    ///
    /// Returns the fetch error, shared by every concurrent caller. An
    /// authorization failure also clears the cached value.
    pub async fn get_or_fetch<F, Fut>(&self, fetch: F) -> ApiResult<User>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ApiResult<User>> + Send + 'static,
    {
        let (flight, generation) = {
            let mut state = self.state.lock();
            if let Some(user) = &state.user {
                return Ok(user.clone());
            }
            let flight = if let Some(flight) = &state.inflight {
                flight.clone()
            } else {
                debug!("fetching current user");
                let flight = fetch().boxed().shared();
                state.inflight = Some(flight.clone());
                flight
            };
            (flight, state.generation)
        };

        let result = flight.clone().await;

        let mut state = self.state.lock();
        if state.generation == generation {
            if state.inflight.as_ref().is_some_and(|f| f.ptr_eq(&flight)) {
                state.inflight = None;
            }
            match &result {
                Ok(user) => state.user = Some(user.clone()),
                Err(error) if error.is_unauthorized() => state.user = None,
                Err(_) => {}
            }
        }
        result
    }

    /// Caches `user` directly, e.g. from a login response.
    pub fn prime(&self, user: User) {
        let mut state = self.state.lock();
        state.generation += 1;
        state.inflight = None;
        state.user = Some(user);
    }

    /// Drops the cached user and forgets any in-flight fetch.
    pub fn invalidate(&self) {
        let mut state = self.state.lock();
        state.generation += 1;
        state.inflight = None;
        state.user = None;
    }
}
