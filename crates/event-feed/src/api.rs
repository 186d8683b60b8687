use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use cfapps_core_types::AppGuid;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::adapters::{BroadcastStatusPort, NoopStatusPort};
use crate::classify::classify_batch;
use crate::errors::{FeedError, FeedResult, FetchError};
use crate::metrics::FeedMetrics;
use crate::model::{FeedSnapshot, FeedUpdate, RawEventRecord, RefreshOutcome, RefreshStatus};
use crate::policy::{FeedPolicyHandle, FeedPolicyView, RefreshMode};
use crate::ports::{AttributeSummarizer, EventFetchPort, PolicyPort, StatusPort};
use crate::present::{rows, FeedRow};
use crate::store::{BeginCycle, CycleApply, CycleTicket, FeedStore};
use crate::summary::ChangeListSummarizer;
use crate::timestamp::TimestampFormatter;

/// Holds a started cycle. Dropping it before `finish` (the refresh future
/// was cancelled) hands the slot back so the feed can refresh again.
struct CycleGuard<'a> {
    store: &'a FeedStore,
    status: &'a dyn StatusPort,
    metrics: &'a FeedMetrics,
    ticket: Option<CycleTicket>,
}

impl CycleGuard<'_> {
    fn finish(&mut self, apply: CycleApply) -> Option<usize> {
        let ticket = self.ticket.take()?;
        self.store.finish(&ticket, apply)
    }
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        let Some(ticket) = self.ticket.take() else {
            return;
        };
        self.metrics.record_refresh_abandoned();
        if self.store.abandon(&ticket) {
            debug!(subject = %ticket.subject, "refresh cancelled before completion");
            self.status.publish(FeedUpdate::Status {
                subject: ticket.subject,
                status: RefreshStatus::Idle,
            });
        }
    }
}

#[async_trait]
pub trait EventFeed: Send + Sync {
    /// Runs one fetch -> decode -> classify -> store cycle for `subject`.
    async fn refresh(&self, subject: &AppGuid) -> FeedResult<RefreshOutcome>;
    /// Points the feed at `subject` (clearing foreign events) and loads it.
    async fn attach(&self, subject: AppGuid) -> FeedResult<RefreshOutcome>;
    fn reset(&self, subject: AppGuid);
    fn snapshot(&self) -> FeedSnapshot;
}

pub struct FeedService {
    store: FeedStore,
    fetcher: Arc<dyn EventFetchPort>,
    summarizer: Arc<dyn AttributeSummarizer>,
    status: Arc<dyn StatusPort>,
    policy: Arc<dyn PolicyPort>,
    metrics: FeedMetrics,
}

impl FeedService {
    pub fn new(
        store: FeedStore,
        fetcher: Arc<dyn EventFetchPort>,
        summarizer: Arc<dyn AttributeSummarizer>,
        status: Arc<dyn StatusPort>,
        policy: Arc<dyn PolicyPort>,
    ) -> Self {
        Self {
            store,
            fetcher,
            summarizer,
            status,
            policy,
            metrics: FeedMetrics::default(),
        }
    }

    /// Default wiring: change-list summaries and the process-wide policy.
    pub fn with_runtime(
        subject: AppGuid,
        fetcher: Arc<dyn EventFetchPort>,
        status: Option<Arc<BroadcastStatusPort>>,
    ) -> Self {
        Self::with_runtime_and_policy(subject, fetcher, status, FeedPolicyHandle::global())
    }

    pub fn with_runtime_and_policy(
        subject: AppGuid,
        fetcher: Arc<dyn EventFetchPort>,
        status: Option<Arc<BroadcastStatusPort>>,
        policy: FeedPolicyHandle,
    ) -> Self {
        let status_port: Arc<dyn StatusPort> = match status {
            Some(port) => port as Arc<dyn StatusPort>,
            None => Arc::new(NoopStatusPort) as Arc<dyn StatusPort>,
        };
        Self::new(
            FeedStore::new(subject),
            fetcher,
            Arc::new(ChangeListSummarizer),
            status_port,
            Arc::new(policy) as Arc<dyn PolicyPort>,
        )
    }

    pub fn store(&self) -> &FeedStore {
        &self.store
    }

    pub fn metrics(&self) -> FeedMetrics {
        self.metrics.clone()
    }

    pub fn policy_view(&self) -> FeedPolicyView {
        self.policy.view()
    }

    pub fn formatter(&self) -> TimestampFormatter {
        TimestampFormatter::from_policy(&self.policy.view())
    }

    /// Current events as presentation rows.
    pub fn rows(&self) -> Vec<FeedRow> {
        rows(&self.store.events(), &self.formatter())
    }

    fn publish_status(&self, subject: &AppGuid, status: RefreshStatus) {
        self.status.publish(FeedUpdate::Status {
            subject: subject.clone(),
            status,
        });
    }

    async fn fetch(
        &self,
        subject: &AppGuid,
        policy: &FeedPolicyView,
    ) -> Result<Vec<RawEventRecord>, FetchError> {
        if policy.fetch_timeout_ms == 0 {
            return self.fetcher.fetch_events(subject).await;
        }
        let limit = Duration::from_millis(policy.fetch_timeout_ms);
        match timeout(limit, self.fetcher.fetch_events(subject)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout {
                after_ms: policy.fetch_timeout_ms,
            }),
        }
    }
}

#[async_trait]
impl EventFeed for FeedService {
    async fn refresh(&self, subject: &AppGuid) -> FeedResult<RefreshOutcome> {
        AppGuid::parse(subject.as_str())?;

        let mut cycle = match self.store.try_begin(subject) {
            BeginCycle::Started(ticket) => CycleGuard {
                store: &self.store,
                status: self.status.as_ref(),
                metrics: &self.metrics,
                ticket: Some(ticket),
            },
            BeginCycle::InFlight => {
                debug!(%subject, "refresh already in flight; ignoring request");
                self.metrics.record_refresh_in_flight();
                return Ok(RefreshOutcome::InFlight);
            }
            BeginCycle::Mismatch(expected) => {
                return Err(FeedError::SubjectMismatch {
                    expected,
                    requested: subject.clone(),
                });
            }
        };

        self.metrics.record_refresh_started();
        self.publish_status(subject, RefreshStatus::Fetching);

        let policy = self.policy.view();
        let started_at = Instant::now();
        let fetched = self.fetch(subject, &policy).await;

        match fetched {
            Ok(raw) => {
                let batch = classify_batch(&raw, self.summarizer.as_ref(), policy.max_events);
                let stored = batch.events.len();
                let dropped = batch.dropped();
                let apply = match policy.refresh_mode {
                    RefreshMode::Replace => CycleApply::Replace(batch.events),
                    RefreshMode::Accumulate => CycleApply::Append(batch.events),
                };
                let Some(count) = cycle.finish(apply) else {
                    debug!(%subject, "feed reset during fetch; discarding results");
                    self.metrics.record_refresh_superseded();
                    return Ok(RefreshOutcome::Superseded);
                };

                self.metrics.record_refresh_applied();
                self.metrics
                    .record_dropped(batch.dropped_decode as u64, batch.dropped_classify as u64);
                if batch.truncated > 0 {
                    self.metrics.record_truncated(batch.truncated as u64);
                }
                info!(
                    %subject,
                    fetched = raw.len(),
                    stored,
                    dropped,
                    truncated = batch.truncated,
                    total = count,
                    latency_ms = started_at.elapsed().as_millis() as u64,
                    "event feed refreshed"
                );
                self.status.publish(FeedUpdate::EventsUpdated {
                    subject: subject.clone(),
                    count,
                });
                self.publish_status(subject, RefreshStatus::Idle);
                Ok(RefreshOutcome::Applied { stored, dropped })
            }
            Err(err) => {
                let reason = err.to_string();
                let applied = cycle.finish(CycleApply::Failed {
                    reason: reason.clone(),
                });
                if applied.is_none() {
                    debug!(%subject, %err, "feed reset during failed fetch");
                    self.metrics.record_refresh_superseded();
                    return Ok(RefreshOutcome::Superseded);
                }
                warn!(%subject, %err, "event fetch failed; keeping previous events");
                self.metrics.record_refresh_failed();
                self.publish_status(subject, RefreshStatus::FetchFailed { reason });
                Err(FeedError::Fetch(err))
            }
        }
    }

    async fn attach(&self, subject: AppGuid) -> FeedResult<RefreshOutcome> {
        AppGuid::parse(subject.as_str())?;
        if self.store.subject() != subject {
            self.reset(subject.clone());
        }
        self.refresh(&subject).await
    }

    fn reset(&self, subject: AppGuid) {
        debug!(%subject, "resetting event feed");
        self.store.reset(subject.clone());
        self.status.publish(FeedUpdate::EventsUpdated {
            subject: subject.clone(),
            count: 0,
        });
        self.publish_status(&subject, RefreshStatus::Idle);
    }

    fn snapshot(&self) -> FeedSnapshot {
        self.store.snapshot()
    }
}
