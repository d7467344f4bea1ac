//! Fetch collaborators: the boundary between the viewport and whatever
//! actually retrieves tile bytes.
//!
//! `fetch` must not block. Completions come back later, either pushed by the
//! host through `Viewport::complete_tile` or pulled by the viewport from
//! `drain_completed` on every tick.

use crate::core::geo::TileKey;
use crate::layers::types::{FetchOutcome, TileCompletion};

pub trait FetchCollaborator {
    /// Start retrieving `locator` for `key`.
    fn fetch(&mut self, key: TileKey, locator: String);

    /// Completions that arrived since the last call.
    fn drain_completed(&mut self) -> Vec<TileCompletion> {
        Vec::new()
    }
}

impl<F: FetchCollaborator + ?Sized> FetchCollaborator for Box<F> {
    fn fetch(&mut self, key: TileKey, locator: String) {
        (**self).fetch(key, locator)
    }

    fn drain_completed(&mut self) -> Vec<TileCompletion> {
        (**self).drain_completed()
    }
}

/// In-memory collaborator that records requests and hands back whatever
/// completions the host queues. Used for headless operation and tests.
#[derive(Debug, Default)]
pub struct QueuedFetcher {
    requests: Vec<(TileKey, String)>,
    total_requests: usize,
    completed: Vec<TileCompletion>,
}

impl QueuedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests issued since the last call.
    pub fn take_requests(&mut self) -> Vec<(TileKey, String)> {
        std::mem::take(&mut self.requests)
    }

    pub fn pending_requests(&self) -> &[(TileKey, String)] {
        &self.requests
    }

    pub fn total_requests(&self) -> usize {
        self.total_requests
    }

    /// Queue a completion to be picked up on the next drain.
    pub fn complete(&mut self, key: TileKey, outcome: FetchOutcome) {
        self.completed.push(TileCompletion { key, outcome });
    }
}

impl FetchCollaborator for QueuedFetcher {
    fn fetch(&mut self, key: TileKey, locator: String) {
        self.total_requests += 1;
        self.requests.push((key, locator));
    }

    fn drain_completed(&mut self) -> Vec<TileCompletion> {
        std::mem::take(&mut self.completed)
    }
}

#[cfg(feature = "tokio-runtime")]
pub use http::HttpTileLoader;

#[cfg(feature = "tokio-runtime")]
mod http {
    use super::*;
    use crate::layers::types::TilePayload;
    use crate::Result;
    use crossbeam_channel::{unbounded, Receiver, Sender};
    use once_cell::sync::Lazy;
    use std::time::Duration;

    /// Shared async HTTP client; building it once keeps the connection pool.
    static HTTP_CLIENT: Lazy<reqwest::Client> = Lazy::new(|| {
        reqwest::Client::builder()
            .user_agent(concat!("tileview/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .pool_max_idle_per_host(16)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new())
    });

    /// Fetches tiles over HTTP on a tokio runtime.
    ///
    /// Every request runs as its own task; results are sent back over a
    /// crossbeam channel and handed to the viewport on its next tick. Failed
    /// fetches are reported once and never retried.
    pub struct HttpTileLoader {
        base_url: Option<reqwest::Url>,
        runtime: tokio::runtime::Handle,
        tx: Sender<TileCompletion>,
        rx: Receiver<TileCompletion>,
    }

    impl HttpTileLoader {
        /// Create a loader on the current tokio runtime.
        pub fn new() -> Result<Self> {
            let runtime = tokio::runtime::Handle::try_current()
                .map_err(|e| crate::Error::Runtime(e.to_string()))?;
            Ok(Self::with_runtime(runtime))
        }

        pub fn with_runtime(runtime: tokio::runtime::Handle) -> Self {
            let (tx, rx) = unbounded();
            Self {
                base_url: None,
                runtime,
                tx,
                rx,
            }
        }

        /// Resolve relative locators against `base`.
        pub fn with_base_url(mut self, base: &str) -> Result<Self> {
            let url = reqwest::Url::parse(base)
                .map_err(|e| crate::Error::Config(format!("invalid base url {:?}: {}", base, e)))?;
            self.base_url = Some(url);
            Ok(self)
        }

        fn resolve(&self, locator: &str) -> std::result::Result<reqwest::Url, String> {
            match &self.base_url {
                Some(base) => base.join(locator),
                None => reqwest::Url::parse(locator),
            }
            .map_err(|e| format!("invalid locator {:?}: {}", locator, e))
        }
    }

    async fn download(url: reqwest::Url) -> Result<TilePayload> {
        let response = HTTP_CLIENT.get(url).send().await?.error_for_status()?;
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await?;

        let mut payload = TilePayload::new(bytes.to_vec());
        payload.content_type = content_type;
        Ok(payload)
    }

    impl FetchCollaborator for HttpTileLoader {
        fn fetch(&mut self, key: TileKey, locator: String) {
            let url = match self.resolve(&locator) {
                Ok(url) => url,
                Err(error) => {
                    let _ = self.tx.send(TileCompletion::failed(key, error));
                    return;
                }
            };

            let tx = self.tx.clone();
            self.runtime.spawn(async move {
                log::debug!("fetch {} from {}", key, url);
                let completion = match download(url).await {
                    Ok(payload) => TileCompletion::loaded(key, payload),
                    Err(e) => TileCompletion::failed(key, e.to_string()),
                };
                let _ = tx.send(completion);
            });
        }

        fn drain_completed(&mut self) -> Vec<TileCompletion> {
            self.rx.try_iter().collect()
        }
    }
}
