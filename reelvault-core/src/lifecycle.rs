//! Lifecycle reconciler: expiry and orphan sweeps

use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::storage::traits::BlobStore;
use crate::storage::types::now_millis;
use crate::storage::ContentIndex;

/// Counts from one sweep
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepSummary {
    /// Expired entries removed from the index
    pub expired: usize,
    /// Unreferenced files deleted from the storage directory
    pub orphans: usize,
    /// File deletes (or directory listings) that failed and were skipped
    pub failures: usize,
}

impl SweepSummary {
    pub fn is_noop(&self) -> bool {
        self.expired == 0 && self.orphans == 0 && self.failures == 0
    }
}

/// Reclaims storage held by expired entries and orphaned files
pub struct Reconciler<B: BlobStore + 'static> {
    index: Arc<ContentIndex<B>>,
}

impl<B: BlobStore + 'static> Clone for Reconciler<B> {
    fn clone(&self) -> Self {
        Self {
            index: Arc::clone(&self.index),
        }
    }
}

impl<B: BlobStore + 'static> Reconciler<B> {
    pub fn new(index: Arc<ContentIndex<B>>) -> Self {
        Self { index }
    }

    /// Sweep against the current time
    pub async fn sweep(&self) -> SweepSummary {
        self.sweep_at(now_millis()).await
    }

    /// Sweep treating `now` (epoch ms) as the current time.
    ///
    /// Holds the index lock for the whole pass and persists once at the end.
    /// An entry whose file cannot be deleted is still dropped from the index.
    pub async fn sweep_at(&self, now: i64) -> SweepSummary {
        let mut summary = SweepSummary::default();
        let mut entries = self.index.lock().await;

        let expired: Vec<_> = entries
            .iter()
            .filter(|(_, e)| e.is_expired(now))
            .map(|(d, _)| d.clone())
            .collect();

        for digest in expired {
            let Some(entry) = entries.remove(&digest) else {
                continue;
            };
            match self.index.blobs().delete(&entry.filename).await {
                Ok(_) => debug!(filename = %entry.filename, "deleted expired file"),
                Err(e) => {
                    warn!(filename = %entry.filename, error = %e, "failed to delete expired file");
                    summary.failures += 1;
                }
            }
            summary.expired += 1;
        }

        let referenced: HashSet<&str> = entries.values().map(|e| e.filename.as_str()).collect();
        match self.index.blobs().list_all().await {
            Ok(names) => {
                for name in names.iter().filter(|n| !referenced.contains(n.as_str())) {
                    match self.index.blobs().delete(name).await {
                        Ok(_) => {
                            debug!(filename = %name, "deleted orphaned file");
                            summary.orphans += 1;
                        }
                        Err(e) => {
                            warn!(filename = %name, error = %e, "failed to delete orphaned file");
                            summary.failures += 1;
                        }
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "failed to list storage directory, skipping orphan sweep");
                summary.failures += 1;
            }
        }

        self.index.persist_locked(&entries).await;

        if summary.is_noop() {
            debug!(remaining = entries.len(), "sweep found nothing to reclaim");
        } else {
            info!(
                expired = summary.expired,
                orphans = summary.orphans,
                failures = summary.failures,
                remaining = entries.len(),
                "sweep complete"
            );
        }
        summary
    }

    /// Run [`Reconciler::sweep`] every `period` on a background task.
    ///
    /// The first sweep happens one period from now; callers that want an
    /// eager sweep at startup run one themselves first.
    pub fn spawn(self, period: Duration) -> ReconcilerHandle {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first tick completes immediately
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    _ = ticker.tick() => {
                        self.sweep().await;
                    }
                }
            }
            debug!("reconciler stopped");
        });

        info!(period_secs = period.as_secs(), "reconciler started");
        ReconcilerHandle {
            shutdown_tx,
            handle,
        }
    }
}

/// Handle to a running reconciler task
pub struct ReconcilerHandle {
    shutdown_tx: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl ReconcilerHandle {
    /// Stop the task, letting an in-flight sweep finish
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
        if let Err(e) = self.handle.await {
            warn!(error = %e, "reconciler task ended abnormally");
        }
    }
}
