use crate::api::ApiError;
use crate::session::Session;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, watch};
use tracing::{debug, warn};

const MAX_ENTRIES: usize = 1024;

#[derive(Debug, Clone, PartialEq)]
pub enum Resource<T> {
    Loading,
    Ready(T),
    Failed(ApiError),
}

/// Authenticated responses are never shared between sessions.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    url: String,
    identity: Option<String>,
}

impl CacheKey {
    pub fn public(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            identity: None,
        }
    }

    pub fn for_session(url: impl Into<String>, session: &Session) -> Self {
        Self {
            url: url.into(),
            identity: Some(session.token().to_string()),
        }
    }
}

// Only the URL is printed so keys can be logged.
impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

type Outcome<T> = Option<Result<T, ApiError>>;

enum Slot<T> {
    Ready {
        value: T,
        expires_at: Instant,
    },
    Pending {
        rx: watch::Receiver<Outcome<T>>,
        stale: Option<T>,
    },
}

impl<T> Slot<T> {
    fn value(&self) -> Option<&T> {
        match self {
            Slot::Ready { value, .. } => Some(value),
            Slot::Pending { stale, .. } => stale.as_ref(),
        }
    }

    fn is_live(&self, now: Instant) -> bool {
        match self {
            Slot::Ready { expires_at, .. } => *expires_at > now,
            Slot::Pending { .. } => true,
        }
    }
}

type Slots<T> = Arc<Mutex<HashMap<CacheKey, Slot<T>>>>;

#[derive(Clone)]
pub struct FetchCache<T> {
    slots: Slots<T>,
    ttl: Duration,
    render_wait: Duration,
}

impl<T> FetchCache<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(ttl: Duration, render_wait: Duration) -> Self {
        Self {
            slots: Arc::new(Mutex::new(HashMap::new())),
            ttl,
            render_wait,
        }
    }

    /// `fetch` is only called when this caller starts a new fetch.
    pub async fn load<F, Fut>(&self, key: CacheKey, fetch: F) -> Resource<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        let (rx, stale) = {
            let mut slots = self.slots.lock().await;
            match slots.get(&key) {
                Some(Slot::Ready { value, expires_at }) if *expires_at > Instant::now() => {
                    return Resource::Ready(value.clone());
                }
                Some(Slot::Pending { rx, stale }) => (rx.clone(), stale.clone()),
                current => {
                    let stale = current.and_then(Slot::value).cloned();
                    if slots.len() >= MAX_ENTRIES {
                        let now = Instant::now();
                        slots.retain(|_, slot| slot.is_live(now));
                    }
                    let (tx, rx) = watch::channel(None);
                    slots.insert(
                        key.clone(),
                        Slot::Pending {
                            rx: rx.clone(),
                            stale: stale.clone(),
                        },
                    );
                    debug!(%key, revalidating = stale.is_some(), "fetch started");
                    tokio::spawn(revalidate(
                        Arc::clone(&self.slots),
                        key,
                        self.ttl,
                        fetch(),
                        tx,
                    ));
                    (rx, stale)
                }
            }
        };

        self.await_outcome(rx, stale).await
    }

    async fn await_outcome(
        &self,
        mut rx: watch::Receiver<Outcome<T>>,
        stale: Option<T>,
    ) -> Resource<T> {
        let settled = async {
            loop {
                if let Some(outcome) = (*rx.borrow_and_update()).clone() {
                    return outcome;
                }
                if rx.changed().await.is_err() {
                    return Err(ApiError::Request("fetch ended without a result".to_string()));
                }
            }
        };
        let outcome = tokio::time::timeout(self.render_wait, settled).await.ok();

        match (outcome, stale) {
            (Some(Ok(value)), _) => Resource::Ready(value),
            (Some(Err(_)), Some(value)) => Resource::Ready(value),
            (Some(Err(err)), None) => Resource::Failed(err),
            (None, Some(value)) => Resource::Ready(value),
            (None, None) => Resource::Loading,
        }
    }
}

async fn revalidate<T, Fut>(
    slots: Slots<T>,
    key: CacheKey,
    ttl: Duration,
    fetch: Fut,
    tx: watch::Sender<Outcome<T>>,
) where
    T: Clone,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let outcome = fetch.await;
    {
        let mut slots = slots.lock().await;
        match &outcome {
            Ok(value) => {
                slots.insert(
                    key,
                    Slot::Ready {
                        value: value.clone(),
                        expires_at: Instant::now() + ttl,
                    },
                );
            }
            Err(err) => {
                warn!(%key, error = %err, "fetch failed");
                // Keep a previous value around, already expired, so the next
                // request retries.
                if let Some(Slot::Pending {
                    stale: Some(value), ..
                }) = slots.remove(&key)
                {
                    slots.insert(
                        key,
                        Slot::Ready {
                            value,
                            expires_at: Instant::now(),
                        },
                    );
                }
            }
        }
    }
    tx.send_replace(Some(outcome));
}
