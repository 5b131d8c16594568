use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use tracing::error;

use crate::protocol::RoutingError;

/// Counts outstanding protocol work (router start-ups and in-flight link
/// deliveries) so callers can wait for the network to go quiet.
///
/// A delivery's guard is held until the receiving router has finished
/// relaxing, and any broadcast that relaxation triggers takes its own guards
/// first, so the count cannot touch zero while traffic is still pending.
#[derive(Debug, Default)]
pub struct Quiescence {
    pending: AtomicUsize,
    idle: Notify,
    datagrams_sent: AtomicUsize,
    datagrams_delivered: AtomicUsize,
    table_updates: AtomicUsize,
    faults: Mutex<Vec<RoutingError>>,
}

/// Keeps the network busy until dropped.
#[derive(Debug)]
pub struct WorkGuard {
    tracker: Arc<Quiescence>,
}

impl Drop for WorkGuard {
    fn drop(&mut self) {
        if self.tracker.pending.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.tracker.idle.notify_waiters();
        }
    }
}

/// Traffic counters collected over a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimulationStats {
    pub datagrams_sent: usize,
    pub datagrams_delivered: usize,
    pub table_updates: usize,
}

impl Quiescence {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn enter(self: &Arc<Self>) -> WorkGuard {
        self.pending.fetch_add(1, Ordering::AcqRel);
        WorkGuard {
            tracker: Arc::clone(self),
        }
    }

    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }

    /// Resolves once no work is outstanding.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.pending() == 0 {
                return;
            }
            notified.await;
        }
    }

    pub fn datagram_sent(&self) {
        self.datagrams_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn datagram_delivered(&self) {
        self.datagrams_delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn table_updated(&self) {
        self.table_updates.fetch_add(1, Ordering::Relaxed);
    }

    pub fn report_fault(&self, fault: RoutingError) {
        error!("Protocol fault: {}", fault);
        self.faults
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(fault);
    }

    pub fn faults(&self) -> Vec<RoutingError> {
        self.faults
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn stats(&self) -> SimulationStats {
        SimulationStats {
            datagrams_sent: self.datagrams_sent.load(Ordering::Relaxed),
            datagrams_delivered: self.datagrams_delivered.load(Ordering::Relaxed),
            table_updates: self.table_updates.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn idle_when_nothing_pending() {
        let tracker = Quiescence::new();
        tracker.wait_idle().await;
        assert_eq!(tracker.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn waits_for_chained_work() {
        let tracker = Quiescence::new();
        let first = tracker.enter();

        let chained = Arc::clone(&tracker);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            // Follow-up work is registered before the first guard drops.
            let second = chained.enter();
            drop(first);
            tokio::time::sleep(Duration::from_secs(1)).await;
            drop(second);
        });

        let started = tokio::time::Instant::now();
        tracker.wait_idle().await;
        assert!(started.elapsed() >= Duration::from_secs(2));
        assert_eq!(tracker.pending(), 0);
    }
}
