//! Time-windowed request coalescing.
//!
//! The first request of a window arms a timer. Every request until the timer
//! fires is appended to the pending list of its content. When the timer fires
//! the whole pending map is swept out at once, so requests arriving during
//! the outbound call start a fresh window.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use lumen_cache::{CacheBucket, CacheBucketExt, DEFAULT_CAPACITY, MemoryCacheBucket};
use tokio::sync::oneshot;

use crate::error::StructureError;
use crate::transport::{StructureResult, StructureTransport};

/// Default coalescing window.
pub const DEFAULT_WINDOW: Duration = Duration::from_millis(50);

type Waiter = oneshot::Sender<Result<String, StructureError>>;

#[derive(Default)]
struct State {
    /// Callers waiting on each content, in arrival order.
    pending: HashMap<String, Vec<Waiter>>,
    timer_armed: bool,
}

struct Inner<T> {
    transport: T,
    cache: Box<dyn CacheBucket>,
    cache_etag: String,
    window: Duration,
    state: Mutex<State>,
}

/// Coalesces structure requests into one outbound call per window.
///
/// Cheap to clone; clones share the same queue and cache. Must be used from
/// within a Tokio runtime.
pub struct StructureBatcher<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for StructureBatcher<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Builder for [`StructureBatcher`].
pub struct StructureBatcherBuilder<T> {
    transport: T,
    window: Duration,
    cache: Option<Box<dyn CacheBucket>>,
    cache_etag: String,
}

impl<T: StructureTransport> StructureBatcherBuilder<T> {
    #[must_use]
    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    /// Store results in `cache` instead of the default in-memory bucket.
    #[must_use]
    pub fn with_cache(mut self, cache: Box<dyn CacheBucket>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Etag stored with every cached result, usually the service URL.
    #[must_use]
    pub fn with_cache_etag(mut self, etag: impl Into<String>) -> Self {
        self.cache_etag = etag.into();
        self
    }

    #[must_use]
    pub fn build(self) -> StructureBatcher<T> {
        let cache = self.cache.unwrap_or_else(|| {
            Box::new(MemoryCacheBucket::with_capacity(DEFAULT_CAPACITY))
        });
        StructureBatcher {
            inner: Arc::new(Inner {
                transport: self.transport,
                cache,
                cache_etag: self.cache_etag,
                window: self.window,
                state: Mutex::new(State::default()),
            }),
        }
    }
}

enum Registration {
    Cached(String),
    Pending(oneshot::Receiver<Result<String, StructureError>>),
}

impl<T: StructureTransport> StructureBatcher<T> {
    /// Start building a batcher around `transport`.
    #[must_use]
    pub fn builder(transport: T) -> StructureBatcherBuilder<T> {
        StructureBatcherBuilder {
            transport,
            window: DEFAULT_WINDOW,
            cache: None,
            cache_etag: String::new(),
        }
    }

    /// Batcher with the default window and cache.
    #[must_use]
    pub fn new(transport: T) -> Self {
        Self::builder(transport).build()
    }

    /// Request the image URL for `content`.
    ///
    /// The request is registered immediately, before the returned future is
    /// polled. Dropping the future only stops this caller from receiving the
    /// result; the content stays in the batch for everyone else.
    pub fn request(
        &self,
        content: &str,
    ) -> impl Future<Output = Result<String, StructureError>> + Send + use<T> {
        let registration = self.register(content);
        async move {
            match registration {
                Registration::Cached(url) => Ok(url),
                Registration::Pending(receiver) => {
                    receiver.await.unwrap_or(Err(StructureError::Cancelled))
                }
            }
        }
    }

    fn register(&self, content: &str) -> Registration {
        if let Some(url) = self.inner.cache.get_string(content, &self.inner.cache_etag) {
            tracing::debug!(content, "structure cache hit");
            return Registration::Cached(url);
        }

        let (sender, receiver) = oneshot::channel();
        let arm_timer = {
            let mut state = self.lock_state();
            state.pending.entry(content.to_owned()).or_default().push(sender);
            !std::mem::replace(&mut state.timer_armed, true)
        };

        if arm_timer {
            let batcher = self.clone();
            tokio::spawn(async move {
                tokio::time::sleep(batcher.inner.window).await;
                batcher.flush().await;
            });
        }

        Registration::Pending(receiver)
    }

    /// Sweep the current window and issue its batched call.
    async fn flush(&self) {
        let pending = {
            let mut state = self.lock_state();
            state.timer_armed = false;
            std::mem::take(&mut state.pending)
        };
        if pending.is_empty() {
            return;
        }

        let mut contents: Vec<String> = pending.keys().cloned().collect();
        contents.sort();
        let callers: usize = pending.values().map(Vec::len).sum();
        tracing::debug!(keys = contents.len(), callers, "flushing structure batch");

        match self.inner.transport.fetch(contents).await {
            Ok(mut results) => {
                for (content, waiters) in pending {
                    let outcome = self.outcome_for(&content, results.remove(&content));
                    for waiter in waiters {
                        // A closed receiver means the caller lost interest.
                        let _ = waiter.send(outcome.clone());
                    }
                }
            }
            Err(error) => {
                tracing::warn!(%error, callers, "structure batch failed");
                for waiter in pending.into_values().flatten() {
                    let _ = waiter.send(Err(error.clone()));
                }
            }
        }
    }

    fn outcome_for(
        &self,
        content: &str,
        result: Option<StructureResult>,
    ) -> Result<String, StructureError> {
        match result {
            Some(StructureResult::Url { url }) => {
                self.inner
                    .cache
                    .set_string(content, &self.inner.cache_etag, &url);
                Ok(url)
            }
            Some(StructureResult::Error { error }) => Err(StructureError::Render {
                content: content.to_owned(),
                message: error,
            }),
            None => Err(StructureError::MissingResult(content.to_owned())),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, State> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
