//! Poll-loop orchestration: fetch, filter against the seen-set, notify, persist, sleep.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use jobwatch_adapters::{
    board_adapters, company_adapters, load_board_registry, load_company_registry, AdapterContext,
    SourceAdapter,
};
use jobwatch_core::{dedupe_by_identifier, is_entry_level, JobRecord};
use jobwatch_notify::{EmailNotifier, LogNotifier, Notifier, WebhookNotifier};
use jobwatch_storage::{HttpFetcher, JsonFileSeenStore, PersistError, SeenSet, SeenStore};
use secrecy::ExposeSecret;
use serde::Serialize;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

mod config;

pub use config::{ConfigError, WatchConfig};

pub const CRATE_NAME: &str = "jobwatch-sync";

pub const DEFAULT_SEND_DELAY: Duration = Duration::from_secs(2);

/// Which identifiers a cycle adds to the seen-set after dispatching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum SeenPolicy {
    /// Every attempted record, provided at least one send in the batch succeeded.
    #[default]
    MarkAttempted,
    /// Only records whose send succeeded.
    MarkDelivered,
}

impl FromStr for SeenPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "attempted" | "mark-attempted" => Ok(Self::MarkAttempted),
            "delivered" | "mark-delivered" => Ok(Self::MarkDelivered),
            other => Err(format!("expected `attempted` or `delivered`, got `{other}`")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LoopState {
    Fetching,
    Sleeping,
}

#[derive(Debug, Clone)]
pub struct PollLoopConfig {
    pub name: String,
    pub interval: Duration,
    pub send_delay: Duration,
    pub seen_policy: SeenPolicy,
}

impl PollLoopConfig {
    pub fn new(name: impl Into<String>, interval: Duration) -> Self {
        Self {
            name: name.into(),
            interval,
            send_delay: DEFAULT_SEND_DELAY,
            seen_policy: SeenPolicy::default(),
        }
    }

    pub fn with_send_delay(mut self, send_delay: Duration) -> Self {
        self.send_delay = send_delay;
        self
    }

    pub fn with_seen_policy(mut self, seen_policy: SeenPolicy) -> Self {
        self.seen_policy = seen_policy;
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CycleSummary {
    pub cycle_id: Uuid,
    pub loop_name: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub fetched: usize,
    pub unique: usize,
    pub filtered_out: usize,
    pub new_records: usize,
    pub sent: usize,
    pub failed: usize,
    pub adapter_failures: usize,
    pub newly_seen: usize,
    pub seen_total: usize,
    pub persisted: bool,
}

/// Hook applied to a cycle's de-duplicated records before the seen check.
pub trait RecordFilter: Send + Sync {
    fn apply(&self, records: Vec<JobRecord>) -> Vec<JobRecord>;
}

#[derive(Default)]
pub struct NoopRecordFilter;

impl RecordFilter for NoopRecordFilter {
    fn apply(&self, records: Vec<JobRecord>) -> Vec<JobRecord> {
        records
    }
}

/// Keeps only postings that look entry level.
#[derive(Default)]
pub struct EntryLevelFilter;

impl RecordFilter for EntryLevelFilter {
    fn apply(&self, records: Vec<JobRecord>) -> Vec<JobRecord> {
        records
            .into_iter()
            .filter(|record| {
                let keep = is_entry_level(record);
                if !keep {
                    debug!(title = %record.title, company = %record.company, "filtered out: not entry level");
                }
                keep
            })
            .collect()
    }
}

/// Records absent from `seen`, in their original order.
pub fn select_unseen(seen: &SeenSet, records: Vec<JobRecord>) -> Vec<JobRecord> {
    records
        .into_iter()
        .filter(|record| !seen.contains(&record.identifier))
        .collect()
}

/// Per-record send results of one cycle, in send order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub attempts: Vec<(String, bool)>,
}

impl DispatchOutcome {
    pub fn sent(&self) -> usize {
        self.attempts.iter().filter(|(_, ok)| *ok).count()
    }

    pub fn failed(&self) -> usize {
        self.attempts.len() - self.sent()
    }

    pub fn identifiers_to_commit(&self, policy: SeenPolicy) -> Vec<&str> {
        match policy {
            SeenPolicy::MarkAttempted if self.sent() > 0 => {
                self.attempts.iter().map(|(id, _)| id.as_str()).collect()
            }
            SeenPolicy::MarkAttempted => Vec::new(),
            SeenPolicy::MarkDelivered => self
                .attempts
                .iter()
                .filter(|(_, ok)| *ok)
                .map(|(id, _)| id.as_str())
                .collect(),
        }
    }
}

/// One repeating fetch -> filter -> notify -> persist -> sleep pipeline.
pub struct PollLoop {
    config: PollLoopConfig,
    adapters: Vec<Box<dyn SourceAdapter>>,
    store: Box<dyn SeenStore>,
    notifier: Box<dyn Notifier>,
    filter: Box<dyn RecordFilter>,
    seen: SeenSet,
    state: LoopState,
}

impl PollLoop {
    pub fn new(config: PollLoopConfig, store: Box<dyn SeenStore>, notifier: Box<dyn Notifier>) -> Self {
        Self {
            config,
            adapters: Vec::new(),
            store,
            notifier,
            filter: Box::<NoopRecordFilter>::default(),
            seen: SeenSet::new(),
            state: LoopState::Sleeping,
        }
    }

    pub fn with_adapter(mut self, adapter: Box<dyn SourceAdapter>) -> Self {
        self.adapters.push(adapter);
        self
    }

    pub fn with_adapters(mut self, adapters: Vec<Box<dyn SourceAdapter>>) -> Self {
        self.adapters.extend(adapters);
        self
    }

    pub fn with_filter(mut self, filter: Box<dyn RecordFilter>) -> Self {
        self.filter = filter;
        self
    }

    pub fn config(&self) -> &PollLoopConfig {
        &self.config
    }

    pub fn adapter_count(&self) -> usize {
        self.adapters.len()
    }

    pub fn seen(&self) -> &SeenSet {
        &self.seen
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Replaces the in-memory seen-set with the store's contents.
    pub async fn load_seen(&mut self) -> usize {
        self.seen = self.store.load().await;
        self.seen.len()
    }

    pub async fn run_cycle(&mut self) -> CycleSummary {
        let cycle_id = Uuid::new_v4();
        let span = info_span!("poll_cycle", loop_name = %self.config.name, %cycle_id);
        self.cycle(cycle_id).instrument(span).await
    }

    async fn cycle(&mut self, cycle_id: Uuid) -> CycleSummary {
        self.state = LoopState::Fetching;
        let started_at = Utc::now();
        let ctx = AdapterContext::new(cycle_id, started_at);

        let mut fetched = Vec::new();
        let mut adapter_failures = 0usize;
        for adapter in &self.adapters {
            match adapter.fetch(&ctx).await {
                Ok(records) => {
                    debug!(source_id = adapter.source_id(), records = records.len(), "source fetched");
                    fetched.extend(records);
                }
                Err(err) => {
                    adapter_failures += 1;
                    warn!(source_id = adapter.source_id(), error = %err, "source fetch failed; skipping it this cycle");
                }
            }
        }

        let fetched_count = fetched.len();
        let unique = dedupe_by_identifier(fetched);
        let unique_count = unique.len();
        let kept = self.filter.apply(unique);
        let filtered_out = unique_count - kept.len();
        let new_records = select_unseen(&self.seen, kept);

        let outcome = self.dispatch(&new_records).await;
        let to_commit = outcome.identifiers_to_commit(self.config.seen_policy);
        let newly_seen = self.seen.add_all(to_commit, Utc::now());
        if outcome.sent() == 0 && outcome.failed() > 0 {
            warn!(failed = outcome.failed(), "every send failed; records stay unseen for the next cycle");
        }

        let persisted = match self.store.persist(&self.seen).await {
            Ok(()) => true,
            Err(err) => {
                log_persist_error(&self.config.name, self.store.describe(), &err);
                false
            }
        };

        let summary = CycleSummary {
            cycle_id,
            loop_name: self.config.name.clone(),
            started_at,
            finished_at: Utc::now(),
            fetched: fetched_count,
            unique: unique_count,
            filtered_out,
            new_records: new_records.len(),
            sent: outcome.sent(),
            failed: outcome.failed(),
            adapter_failures,
            newly_seen,
            seen_total: self.seen.len(),
            persisted,
        };
        info!(
            fetched = summary.fetched,
            unique = summary.unique,
            filtered_out = summary.filtered_out,
            new = summary.new_records,
            sent = summary.sent,
            failed = summary.failed,
            adapter_failures = summary.adapter_failures,
            seen_total = summary.seen_total,
            "cycle complete"
        );
        summary
    }

    /// Sends each record once, in order, with `send_delay` between consecutive sends.
    async fn dispatch(&self, records: &[JobRecord]) -> DispatchOutcome {
        let mut outcome = DispatchOutcome::default();
        for (index, record) in records.iter().enumerate() {
            if index > 0 && !self.config.send_delay.is_zero() {
                tokio::time::sleep(self.config.send_delay).await;
            }
            info!(
                number = index + 1,
                company = %record.company,
                title = %record.title,
                location = %record.location,
                url = %record.url,
                "new job"
            );
            match self.notifier.send(record).await {
                Ok(()) => outcome.attempts.push((record.identifier.clone(), true)),
                Err(err) => {
                    warn!(
                        channel = self.notifier.channel(),
                        identifier = %record.identifier,
                        error = %err,
                        "notification failed"
                    );
                    outcome.attempts.push((record.identifier.clone(), false));
                }
            }
        }
        outcome
    }

    /// Loads the seen-set and cycles until `shutdown` fires. Returns the number of completed
    /// cycles. A cycle in progress finishes before the loop exits; a sleep does not.
    pub async fn run(mut self, shutdown: CancellationToken) -> usize {
        let loaded = self.load_seen().await;
        info!(
            loop_name = %self.config.name,
            adapters = self.adapters.len(),
            interval_secs = self.config.interval.as_secs(),
            seen = loaded,
            "poll loop started"
        );

        let mut cycles = 0usize;
        while !shutdown.is_cancelled() {
            self.run_cycle().await;
            cycles += 1;

            self.state = LoopState::Sleeping;
            debug!(loop_name = %self.config.name, interval_secs = self.config.interval.as_secs(), "sleeping");
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(self.config.interval) => {}
            }
        }

        info!(loop_name = %self.config.name, cycles, "poll loop stopped");
        cycles
    }

    pub async fn run_once(mut self) -> CycleSummary {
        self.load_seen().await;
        self.run_cycle().await
    }
}

fn log_persist_error(loop_name: &str, store: String, err: &PersistError) {
    error!(loop_name, store = %store, error = %err, "persisting seen-set failed; will retry next cycle");
}

/// Wraps a store so its state is read but never written.
pub struct ReadOnlySeenStore<S> {
    inner: S,
}

impl<S> ReadOnlySeenStore<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<S: SeenStore> SeenStore for ReadOnlySeenStore<S> {
    fn describe(&self) -> String {
        format!("{} (read-only)", self.inner.describe())
    }

    async fn load(&self) -> SeenSet {
        self.inner.load().await
    }

    async fn persist(&self, set: &SeenSet) -> std::result::Result<(), PersistError> {
        debug!(store = %self.inner.describe(), seen = set.len(), "read-only store; skipping persist");
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopKind {
    Boards,
    Companies,
}

impl LoopKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Boards => "boards",
            Self::Companies => "companies",
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Run a single cycle per loop and return.
    pub once: bool,
    /// Log instead of notifying and leave the seen-set file untouched.
    pub dry_run: bool,
}

fn seen_store(path: std::path::PathBuf, dry_run: bool) -> Box<dyn SeenStore> {
    let store = JsonFileSeenStore::new(path);
    if dry_run {
        Box::new(ReadOnlySeenStore::new(store))
    } else {
        Box::new(store)
    }
}

fn http_for(config: &WatchConfig) -> std::result::Result<Arc<HttpFetcher>, ConfigError> {
    HttpFetcher::new(config.http_config())
        .map(Arc::new)
        .map_err(|e| ConfigError::Http(format!("{e:#}")))
}

/// Board loop: sources from the board list, notifications to the chat webhook.
pub fn build_board_loop(config: &WatchConfig, dry_run: bool) -> std::result::Result<PollLoop, ConfigError> {
    let registry = load_board_registry(&config.boards_file)
        .map_err(|e| ConfigError::source_list(&config.boards_file, e))?;
    let api_key = config
        .simplify_api_key
        .as_ref()
        .map(|k| k.expose_secret().to_string());
    let needs_shared_key = registry.boards.iter().any(|b| {
        b.enabled && b.board.eq_ignore_ascii_case("simplify") && b.api_key.is_none()
    });
    if needs_shared_key && api_key.is_none() {
        return Err(ConfigError::Missing("JOBWATCH_SIMPLIFY_API_KEY"));
    }
    let adapters = board_adapters(&registry, http_for(config)?, api_key.as_deref())
        .map_err(|e| ConfigError::source_list(&config.boards_file, e))?;

    let notifier: Box<dyn Notifier> = if dry_run {
        Box::new(LogNotifier)
    } else {
        Box::new(WebhookNotifier::new(config.webhook_config()?)?)
    };

    let loop_config = PollLoopConfig::new(LoopKind::Boards.name(), config.board_interval)
        .with_send_delay(config.send_delay)
        .with_seen_policy(config.seen_policy);
    Ok(
        PollLoop::new(loop_config, seen_store(config.boards_seen_path(), dry_run), notifier)
            .with_adapters(adapters),
    )
}

/// Company loop: sources from the company list, notifications by email.
pub fn build_company_loop(config: &WatchConfig, dry_run: bool) -> std::result::Result<PollLoop, ConfigError> {
    let companies = load_company_registry(&config.companies_file)
        .map_err(|e| ConfigError::source_list(&config.companies_file, e))?;
    let adapters = company_adapters(&companies, http_for(config)?);

    let notifier: Box<dyn Notifier> = if dry_run {
        Box::new(LogNotifier)
    } else {
        Box::new(EmailNotifier::new(config.smtp_config()?)?)
    };

    let loop_config = PollLoopConfig::new(LoopKind::Companies.name(), config.company_interval)
        .with_send_delay(config.send_delay)
        .with_seen_policy(config.seen_policy);
    let mut poll = PollLoop::new(loop_config, seen_store(config.companies_seen_path(), dry_run), notifier)
        .with_adapters(adapters);
    if config.entry_level_only {
        poll = poll.with_filter(Box::<EntryLevelFilter>::default());
    }
    Ok(poll)
}

pub fn build_loop(kind: LoopKind, config: &WatchConfig, dry_run: bool) -> std::result::Result<PollLoop, ConfigError> {
    match kind {
        LoopKind::Boards => build_board_loop(config, dry_run),
        LoopKind::Companies => build_company_loop(config, dry_run),
    }
}

/// Builds every requested loop up front, so configuration problems stop the process before
/// any polling starts, then runs them as independent tasks.
pub async fn run_watch(
    config: &WatchConfig,
    kinds: &[LoopKind],
    options: RunOptions,
    shutdown: CancellationToken,
) -> Result<()> {
    let mut loops = Vec::with_capacity(kinds.len());
    for kind in kinds {
        let poll = build_loop(*kind, config, options.dry_run)
            .with_context(|| format!("configuring {} loop", kind.name()))?;
        loops.push(poll);
    }

    let mut tasks = JoinSet::new();
    for poll in loops {
        let name = poll.config().name.clone();
        let token = shutdown.child_token();
        if options.once {
            tasks.spawn(async move {
                let summary = poll.run_once().await;
                (name, summary.new_records)
            });
        } else {
            tasks.spawn(async move {
                let cycles = poll.run(token).await;
                (name, cycles)
            });
        }
    }

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((name, count)) => debug!(loop_name = %name, count, "loop task finished"),
            Err(err) => error!(error = %err, "loop task panicked"),
        }
    }
    Ok(())
}

/// Reads the persisted seen-set of one loop.
pub async fn inspect_seen(config: &WatchConfig, kind: LoopKind) -> SeenSet {
    let path = match kind {
        LoopKind::Boards => config.boards_seen_path(),
        LoopKind::Companies => config.companies_seen_path(),
    };
    JsonFileSeenStore::new(path).load().await
}
