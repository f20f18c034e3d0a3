//! Durable seen-set storage + paced HTTP fetch utilities for jobwatch.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::time::Instant;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

pub const CRATE_NAME: &str = "jobwatch-storage";

/// Identifiers that have already been notified, each with the time it was first recorded.
///
/// Entries are only ever added; there is no removal or expiry. Serializes as a JSON object
/// with keys in sorted order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeenSet {
    entries: HashMap<String, DateTime<Utc>>,
}

impl Serialize for SeenSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let sorted: BTreeMap<&str, &DateTime<Utc>> =
            self.entries.iter().map(|(k, v)| (k.as_str(), v)).collect();
        sorted.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SeenSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        HashMap::<String, DateTime<Utc>>::deserialize(deserializer).map(|entries| Self { entries })
    }
}

impl SeenSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.entries.contains_key(identifier)
    }

    pub fn first_seen(&self, identifier: &str) -> Option<DateTime<Utc>> {
        self.entries.get(identifier).copied()
    }

    /// Inserts every identifier not already present and returns how many were new.
    /// Existing entries keep their original timestamp.
    pub fn add_all<I, S>(&mut self, identifiers: I, seen_at: DateTime<Utc>) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let before = self.entries.len();
        for identifier in identifiers {
            self.entries.entry(identifier.into()).or_insert(seen_at);
        }
        self.entries.len() - before
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, DateTime<Utc>)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Most recently recorded entries, newest first.
    pub fn newest(&self, limit: usize) -> Vec<(&str, DateTime<Utc>)> {
        let mut items: Vec<_> = self.iter().collect();
        items.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        items.truncate(limit);
        items
    }
}

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("{action} {path}: {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("serializing seen set: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Durable home of one poll loop's [`SeenSet`].
#[async_trait]
pub trait SeenStore: Send + Sync {
    fn describe(&self) -> String;

    /// Reads the stored set without touching anything on disk. Missing or unreadable state
    /// yields an empty set.
    async fn load(&self) -> SeenSet;

    async fn persist(&self, set: &SeenSet) -> Result<(), PersistError>;
}

/// Seen set kept as a pretty-printed JSON object `{ identifier: first_seen }`.
#[derive(Debug, Clone)]
pub struct JsonFileSeenStore {
    path: PathBuf,
}

impl JsonFileSeenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_prefix(&self) -> String {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "seen".to_string());
        format!(".{name}.")
    }

    fn parent_dir(&self) -> PathBuf {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    /// Removes temp files left behind by a write that never reached its rename.
    async fn remove_stale_temp_files(&self) {
        let prefix = self.temp_prefix();
        let Ok(mut entries) = fs::read_dir(self.parent_dir()).await else {
            return;
        };
        while let Ok(Some(entry)) = entries.next_entry().await {
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with(&prefix) && name.ends_with(".tmp") {
                match fs::remove_file(entry.path()).await {
                    Ok(()) => debug!(file = %entry.path().display(), "removed stale seen-set temp file"),
                    Err(err) => debug!(file = %entry.path().display(), error = %err, "could not remove stale temp file"),
                }
            }
        }
    }
}

#[async_trait]
impl SeenStore for JsonFileSeenStore {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn load(&self) -> SeenSet {
        let text = match fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %self.path.display(), "no seen-set file yet; starting empty");
                return SeenSet::new();
            }
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "reading seen-set failed; starting empty");
                return SeenSet::new();
            }
        };

        if text.trim().is_empty() {
            warn!(path = %self.path.display(), "seen-set file is empty; starting empty");
            return SeenSet::new();
        }

        match serde_json::from_str::<SeenSet>(&text) {
            Ok(set) => {
                info!(path = %self.path.display(), seen = set.len(), "loaded seen-set");
                set
            }
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "seen-set file is corrupt; starting empty");
                SeenSet::new()
            }
        }
    }

    /// Writes to a sibling temp file, syncs it, then renames it over the target so readers
    /// only ever observe the previous or the complete new contents.
    async fn persist(&self, set: &SeenSet) -> Result<(), PersistError> {
        let parent = self.parent_dir();
        fs::create_dir_all(&parent)
            .await
            .map_err(|source| PersistError::Io {
                action: "creating state directory",
                path: parent.clone(),
                source,
            })?;

        self.remove_stale_temp_files().await;

        let bytes = serde_json::to_vec_pretty(set)?;
        let temp_path = parent.join(format!("{}{}.tmp", self.temp_prefix(), Uuid::new_v4()));

        let write_result = async {
            let mut file = fs::OpenOptions::new()
                .create_new(true)
                .write(true)
                .open(&temp_path)
                .await
                .map_err(|source| PersistError::Io {
                    action: "opening temp seen-set file",
                    path: temp_path.clone(),
                    source,
                })?;
            file.write_all(&bytes).await.map_err(|source| PersistError::Io {
                action: "writing temp seen-set file",
                path: temp_path.clone(),
                source,
            })?;
            file.flush().await.map_err(|source| PersistError::Io {
                action: "flushing temp seen-set file",
                path: temp_path.clone(),
                source,
            })?;
            file.sync_all().await.map_err(|source| PersistError::Io {
                action: "syncing temp seen-set file",
                path: temp_path.clone(),
                source,
            })?;
            drop(file);

            fs::rename(&temp_path, &self.path)
                .await
                .map_err(|source| PersistError::Io {
                    action: "renaming temp seen-set file over",
                    path: self.path.clone(),
                    source,
                })
        }
        .await;

        if write_result.is_err() {
            let _ = fs::remove_file(&temp_path).await;
        } else {
            debug!(path = %self.path.display(), seen = set.len(), bytes = bytes.len(), "persisted seen-set");
        }
        write_result
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    stored: Option<SeenSet>,
    persist_calls: usize,
}

/// In-process store for tests and dry runs. Clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct MemorySeenStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemorySeenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_initial(set: SeenSet) -> Self {
        let store = Self::default();
        store.lock().stored = Some(set);
        store
    }

    pub fn snapshot(&self) -> Option<SeenSet> {
        self.lock().stored.clone()
    }

    pub fn persist_calls(&self) -> usize {
        self.lock().persist_calls
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        // A poisoned lock only means a test panicked mid-update; the data is still usable.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl SeenStore for MemorySeenStore {
    fn describe(&self) -> String {
        "memory".to_string()
    }

    async fn load(&self) -> SeenSet {
        self.lock().stored.clone().unwrap_or_default()
    }

    async fn persist(&self, set: &SeenSet) -> Result<(), PersistError> {
        let mut state = self.lock();
        state.stored = Some(set.clone());
        state.persist_calls += 1;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    pub timeout: Duration,
    pub user_agent: Option<String>,
    /// Minimum gap between two outbound requests; `None` disables pacing.
    pub request_spacing: Option<Duration>,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: None,
            request_spacing: Some(Duration::from_secs(1)),
        }
    }
}

#[derive(Debug)]
pub struct SimpleTokenBucket {
    capacity: u32,
    refill_every: Duration,
    state: tokio::sync::Mutex<TokenBucketState>,
}

#[derive(Debug, Clone, Copy)]
struct TokenBucketState {
    tokens: u32,
    last_refill: Instant,
}

impl SimpleTokenBucket {
    pub fn new(capacity: u32, refill_every: Duration) -> Self {
        Self {
            capacity,
            refill_every,
            state: tokio::sync::Mutex::new(TokenBucketState {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
        }
    }

    pub async fn take(&self) {
        loop {
            let mut state = self.state.lock().await;
            let elapsed = state.last_refill.elapsed();
            if elapsed >= self.refill_every && !self.refill_every.is_zero() {
                let refills = (elapsed.as_millis() / self.refill_every.as_millis()) as u32;
                state.tokens = state.tokens.saturating_add(refills).min(self.capacity);
                state.last_refill = Instant::now();
            }

            if state.tokens > 0 {
                state.tokens -= 1;
                return;
            }

            let sleep_for = self.refill_every.saturating_sub(elapsed);
            drop(state);
            tokio::time::sleep(sleep_for).await;
        }
    }
}

#[derive(Debug, Clone)]
pub struct FetchedResponse {
    pub status: StatusCode,
    pub final_url: String,
    pub body: Vec<u8>,
}

impl FetchedResponse {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, FetchError> {
        serde_json::from_slice(&self.body).map_err(|source| FetchError::Decode {
            url: self.final_url.clone(),
            source,
        })
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("http status {status} for {url}")]
    HttpStatus { status: u16, url: String },
    #[error("decoding response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Shared HTTP client for source adapters. One attempt per request; outbound calls are
/// spaced by a token bucket so a loop never hammers a source.
#[derive(Debug)]
pub struct HttpFetcher {
    client: reqwest::Client,
    pacing: Option<Arc<SimpleTokenBucket>>,
}

impl HttpFetcher {
    pub fn new(config: HttpClientConfig) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder()
            .gzip(true)
            .brotli(true)
            .timeout(config.timeout);

        if let Some(user_agent) = &config.user_agent {
            builder = builder.user_agent(user_agent.clone());
        }

        let client = builder.build().context("building reqwest client")?;
        let pacing = config
            .request_spacing
            .filter(|spacing| !spacing.is_zero())
            .map(|spacing| Arc::new(SimpleTokenBucket::new(1, spacing)));

        Ok(Self { client, pacing })
    }

    async fn pace(&self) {
        if let Some(bucket) = &self.pacing {
            bucket.take().await;
        }
    }

    pub async fn get(&self, url: &str) -> Result<FetchedResponse, FetchError> {
        self.pace().await;
        let span = info_span!("http_fetch", method = "GET", url);
        async {
            let resp = self.client.get(url).send().await?;
            Self::collect(resp).await
        }
        .instrument(span)
        .await
    }

    pub async fn post_json<B: Serialize + ?Sized>(
        &self,
        url: &str,
        query: &[(&str, &str)],
        body: &B,
    ) -> Result<FetchedResponse, FetchError> {
        self.pace().await;
        let span = info_span!("http_fetch", method = "POST", url);
        async {
            let resp = self.client.post(url).query(query).json(body).send().await?;
            Self::collect(resp).await
        }
        .instrument(span)
        .await
    }

    async fn collect(resp: reqwest::Response) -> Result<FetchedResponse, FetchError> {
        let status = resp.status();
        let final_url = resp.url().to_string();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
                url: final_url,
            });
        }
        let body = resp.bytes().await?.to_vec();
        debug!(status = status.as_u16(), bytes = body.len(), "fetched");
        Ok(FetchedResponse {
            status,
            final_url,
            body,
        })
    }
}
