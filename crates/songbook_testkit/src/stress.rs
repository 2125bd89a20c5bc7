//! Concurrent-writer stress tests.
//!
//! Several clients repeatedly read a record and send an update carrying
//! the stamp they read. Every update must come back applied or as a
//! conflict; none may be lost or fail.

use songbook_store::EntityStore;
use songbook_sync_protocol::{
    BatchSyncRequest, EntityKind, Fields, OperationResult, SyncOperation,
};
use songbook_sync_server::SyncServer;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// Result of a stress test run.
#[derive(Debug, Clone)]
pub struct StressTestResult {
    /// Total updates sent.
    pub total_ops: usize,
    /// Updates applied.
    pub applied: usize,
    /// Updates returned as conflicts.
    pub conflicts: usize,
    /// Updates that failed or were missing from the response.
    pub failed: usize,
    /// Total duration.
    pub duration: Duration,
}

impl StressTestResult {
    /// Returns true if every update was applied or reported as a conflict.
    pub fn is_consistent(&self) -> bool {
        self.failed == 0 && self.applied + self.conflicts == self.total_ops
    }

    /// Prints a summary of the test.
    pub fn print_summary(&self, name: &str) {
        println!("\n=== {} ===", name);
        println!("Updates sent: {}", self.total_ops);
        println!("Applied: {}", self.applied);
        println!("Conflicts: {}", self.conflicts);
        println!("Failed: {}", self.failed);
        println!("Duration: {:?}", self.duration);
    }
}

/// Configuration for stress tests.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Number of concurrent clients.
    pub threads: usize,
    /// Updates each client sends.
    pub updates_per_thread: usize,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            threads: 4,
            updates_per_thread: 100,
        }
    }
}

/// Runs concurrent read-then-update clients against one record.
///
/// `payload` builds each client's update from `(thread, iteration)`.
///
/// # Panics
///
/// Panics if the target record cannot be read.
pub fn stress_concurrent_updates(
    server: &SyncServer,
    kind: EntityKind,
    entity_id: &str,
    config: &StressConfig,
    payload: impl Fn(usize, usize) -> Fields + Sync,
) -> StressTestResult {
    let applied = AtomicUsize::new(0);
    let conflicts = AtomicUsize::new(0);
    let failed = AtomicUsize::new(0);

    let start = Instant::now();
    thread::scope(|scope| {
        for t in 0..config.threads {
            let (applied, conflicts, failed, payload) = (&applied, &conflicts, &failed, &payload);
            scope.spawn(move || {
                for i in 0..config.updates_per_thread {
                    let seen = server
                        .store()
                        .get(kind, entity_id)
                        .expect("Failed to read record")
                        .expect("Record must exist");
                    let op = SyncOperation::update(
                        format!("t{t}-{i}"),
                        kind,
                        entity_id,
                        payload(t, i),
                        seen.last_modified,
                    )
                    .with_client_id(format!("client-{t}"));

                    match server.sync(&BatchSyncRequest::new(vec![op])) {
                        Ok(response) if response.conflicts.len() == 1 => {
                            conflicts.fetch_add(1, Ordering::Relaxed);
                        }
                        Ok(response)
                            if matches!(
                                response.results.first().and_then(|r| r.result()),
                                Some(OperationResult::Updated { .. })
                            ) =>
                        {
                            applied.fetch_add(1, Ordering::Relaxed);
                        }
                        _ => {
                            failed.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                }
            });
        }
    });

    StressTestResult {
        total_ops: config.threads * config.updates_per_thread,
        applied: applied.into_inner(),
        conflicts: conflicts.into_inner(),
        failed: failed.into_inner(),
        duration: start.elapsed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{song, TestServer};

    #[test]
    fn concurrent_updates_are_applied_or_conflict() {
        let server = TestServer::memory();
        server.seed(EntityKind::Song, "hot", song("Contested"));

        let config = StressConfig {
            threads: 4,
            updates_per_thread: 25,
        };
        let result = stress_concurrent_updates(&server, EntityKind::Song, "hot", &config, |t, i| {
            song(&format!("client {t} edit {i}"))
        });

        result.print_summary("concurrent updates");
        assert!(result.is_consistent());
        assert!(result.applied >= 1);
    }
}
