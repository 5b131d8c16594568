use std::sync::{Arc, OnceLock};
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use crate::logging::{ChangeReason, TableJournal};
use crate::network::{Link, Quiescence};
use crate::protocol::{Datagram, DistanceVector, RoutingError};
use crate::RouterId;

/// A simulated router.
///
/// Owns its distance vector and its outgoing links. Talks to other routers
/// only by sending datagrams over those links.
#[derive(Debug)]
pub struct Router {
    id: RouterId,
    links: OnceLock<Vec<Link>>,
    table: Mutex<DistanceVector>,
    ready: watch::Sender<bool>,
    journal: Arc<TableJournal>,
    tracker: Arc<Quiescence>,
}

impl Router {
    pub fn new(id: RouterId, journal: Arc<TableJournal>, tracker: Arc<Quiescence>) -> Self {
        let (ready, _) = watch::channel(false);
        Self {
            id,
            links: OnceLock::new(),
            table: Mutex::new(DistanceVector::new()),
            ready,
            journal,
            tracker,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Installs the outgoing links. Only the first call has any effect;
    /// topology is fixed once built.
    pub fn connect(&self, links: Vec<Link>) -> bool {
        self.links.set(links).is_ok()
    }

    pub fn links(&self) -> &[Link] {
        self.links.get().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_started(&self) -> bool {
        *self.ready.borrow()
    }

    /// Copy of the current table.
    pub async fn table(&self) -> DistanceVector {
        self.table.lock().await.clone()
    }

    /// Seeds the local entry, discovers neighbors, advertises the result and
    /// opens the gate for pending advertisements.
    pub async fn start(&self) {
        let mut table = self.table.lock().await;
        if self.is_started() {
            warn!("Router {} already started", self.id);
            return;
        }

        table.seed_local(&self.id);
        for link in self.links() {
            let (cost, neighbor) = link.describe();
            table.learn_neighbor(neighbor, cost);
        }
        info!("Router {} started with {} neighbor(s)", self.id, self.links().len());

        self.journal.record(&self.id, ChangeReason::Startup, &table);
        self.tracker.table_updated();
        self.broadcast(&table);

        self.ready.send_replace(true);
    }

    /// Handles an advertisement from a neighbor.
    ///
    /// Waits until this router has started, then relaxes the table against
    /// the advertisement and re-advertises on change. Returns whether the
    /// table changed.
    pub async fn receive(&self, datagram: Datagram) -> Result<bool, RoutingError> {
        let mut ready = self.ready.subscribe();
        // The sender half lives in `self`, so the channel cannot close here.
        let _ = ready.wait_for(|started| *started).await;

        let mut table = self.table.lock().await;
        let changed = table.relax(&self.id, &datagram)?;

        if changed {
            self.journal.record(
                &self.id,
                ChangeReason::Advertisement {
                    from: datagram.sender.clone(),
                },
                &table,
            );
            self.tracker.table_updated();
            self.broadcast(&table);
        } else {
            debug!("Router {}: nothing new from {}", self.id, datagram.sender);
        }

        Ok(changed)
    }

    fn broadcast(&self, table: &DistanceVector) {
        for link in self.links() {
            link.send(Datagram::new(self.id.clone(), table.clone()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::ChangeReason;
    use crate::protocol::DistanceVectorEntry;
    use crate::{Network, SimulationConfig};
    use std::time::Duration;

    fn pair() -> Network {
        Network::build(
            vec!["A".into(), "B".into()],
            &[Some(5)],
            &SimulationConfig::default(),
        )
        .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn receive_waits_for_start() {
        let network = pair();
        let b = network.router("B").unwrap().clone();

        let mut advertised = DistanceVector::new();
        advertised.seed_local("A");
        advertised.learn_neighbor("B", 5);
        advertised.learn_neighbor("X", 1);

        let pending = tokio::spawn({
            let b = b.clone();
            async move { b.receive(Datagram::new("A".into(), advertised)).await }
        });

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(!pending.is_finished());
        assert!(b.table().await.is_empty());

        b.start().await;
        assert!(pending.await.unwrap().unwrap());

        let table = b.table().await;
        assert_eq!(table.cost_to("X"), Some(6));
        assert_eq!(table.get("X").unwrap().next_hop.as_deref(), Some("A"));

        let history = network.journal().history_of("B");
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].reason, ChangeReason::Startup);
        assert_eq!(history[1].reason, ChangeReason::Advertisement { from: "A".into() });
    }

    #[tokio::test(start_paused = true)]
    async fn start_seeds_local_entry_and_neighbors_once() {
        let network = pair();
        let a = network.router("A").unwrap();

        a.start().await;
        a.start().await;

        assert!(a.is_started());
        let table = a.table().await;
        assert_eq!(table.get("A").unwrap().cost, 0);
        assert_eq!(table.get("A").unwrap().next_hop, None);
        assert_eq!(table.cost_to("B"), Some(5));
        assert_eq!(network.journal().history_of("A").len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn advertisement_from_stranger_is_an_error() {
        let network = pair();
        let a = network.router("A").unwrap();
        a.start().await;

        let mut advertised = DistanceVector::new();
        advertised.seed_local("Z");

        let err = a.receive(Datagram::new("Z".into(), advertised)).await.unwrap_err();
        assert_eq!(
            err,
            RoutingError::UnknownSender {
                router: "A".into(),
                sender: "Z".into()
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn failed_advertisement_leaves_table_and_journal_alone() {
        let network = Network::build(
            vec!["A".into(), "B".into()],
            &[Some(10)],
            &SimulationConfig::default(),
        )
        .unwrap();
        let a = network.router("A").unwrap();
        a.start().await;
        let before = a.table().await;
        let sent_before = network.stats().datagrams_sent;

        let advertised: DistanceVector = [
            ("B".to_string(), DistanceVectorEntry::local()),
            ("C".to_string(), DistanceVectorEntry::via(5, "C")),
            ("Z".to_string(), DistanceVectorEntry::via(u32::MAX, "C")),
        ]
        .into_iter()
        .collect();

        let err = a.receive(Datagram::new("B".into(), advertised)).await.unwrap_err();

        assert_eq!(
            err,
            RoutingError::CostOverflow {
                sender: "B".into(),
                destination: "Z".into()
            }
        );
        assert_eq!(a.table().await, before);
        assert_eq!(network.journal().history_of("A").len(), 1);
        assert_eq!(network.stats().datagrams_sent, sent_before);
    }

    #[test]
    fn links_can_only_be_installed_once() {
        let network = pair();
        let a = network.router("A").unwrap();

        assert_eq!(a.links().len(), 1);
        assert!(!a.connect(Vec::new()));
        assert_eq!(a.links().len(), 1);
        assert_eq!(a.links()[0].describe(), (5, "B"));
    }
}
