pub mod link;
pub mod quiescence;
pub mod topology;

pub use link::Link;
pub use quiescence::{Quiescence, SimulationStats, WorkGuard};
pub use topology::{Topology, TopologyError, TopologyLink};

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::algorithms::dijkstra::shortest_paths;
use crate::config::SimulationConfig;
use crate::logging::TableJournal;
use crate::protocol::{DistanceVector, RoutingError};
use crate::router::Router;
use crate::{Cost, RouterId};

/// A converged cost that disagrees with the offline shortest path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discrepancy {
    pub router: RouterId,
    pub destination: RouterId,
    pub expected: Option<Cost>,
    pub actual: Option<Cost>,
}

/// The set of routers and the links between them.
#[derive(Debug)]
pub struct Network {
    topology: Topology,
    routers: Vec<Arc<Router>>,
    journal: Arc<TableJournal>,
    tracker: Arc<Quiescence>,
}

impl Network {
    /// Validates the pairwise cost list and wires one router per name with a
    /// link in each direction for every present cost.
    pub fn build(
        routers: Vec<RouterId>,
        costs: &[Option<Cost>],
        config: &SimulationConfig,
    ) -> Result<Self, TopologyError> {
        let topology = Topology::from_pairwise(routers, costs)?;
        Self::from_topology(topology, config)
    }

    /// Wires an already built topology. Fails if a link names a router the
    /// topology does not list.
    pub fn from_topology(
        topology: Topology,
        config: &SimulationConfig,
    ) -> Result<Self, TopologyError> {
        let journal = Arc::new(TableJournal::new());
        let tracker = Quiescence::new();

        let routers: Vec<Arc<Router>> = topology
            .routers
            .iter()
            .map(|id| Arc::new(Router::new(id.clone(), journal.clone(), tracker.clone())))
            .collect();

        let mut outgoing: Vec<Vec<Link>> = vec![Vec::new(); routers.len()];
        for link in &topology.links {
            let a = topology
                .index_of(&link.a)
                .ok_or_else(|| TopologyError::UnknownRouter(link.a.clone()))?;
            let b = topology
                .index_of(&link.b)
                .ok_or_else(|| TopologyError::UnknownRouter(link.b.clone()))?;

            let time_unit = config.time_unit;
            outgoing[a].push(Link::new(link.cost, &routers[b], time_unit, tracker.clone()));
            outgoing[b].push(Link::new(link.cost, &routers[a], time_unit, tracker.clone()));
            debug!("Connected {} <-> {} (cost {})", link.a, link.b, link.cost);
        }

        for (router, links) in routers.iter().zip(outgoing) {
            if !router.connect(links) {
                error!("Router {} was already connected; new links ignored", router.id());
            }
        }

        info!(
            "Built network with {} routers and {} links",
            routers.len(),
            topology.links.len()
        );

        Ok(Self {
            topology,
            routers,
            journal,
            tracker,
        })
    }

    /// Starts every router concurrently. Does not wait for convergence.
    pub fn start_all(&self) {
        for router in &self.routers {
            let guard = self.tracker.enter();
            let router = Arc::clone(router);
            tokio::spawn(async move {
                router.start().await;
                drop(guard);
            });
        }
    }

    /// Resolves once no router start-up or link delivery is outstanding.
    /// Call after [`Network::start_all`].
    pub async fn wait_for_convergence(&self) -> Result<SimulationStats, RoutingError> {
        self.tracker.wait_idle().await;

        if let Some(fault) = self.tracker.faults().into_iter().next() {
            return Err(fault);
        }

        let stats = self.tracker.stats();
        info!(
            "Converged: {} datagrams sent, {} table updates",
            stats.datagrams_sent, stats.table_updates
        );
        Ok(stats)
    }

    /// Starts all routers and waits for the network to go quiet, giving up
    /// after `timeout`.
    pub async fn run(&self, timeout: Duration) -> anyhow::Result<SimulationStats> {
        self.start_all();
        let stats = tokio::time::timeout(timeout, self.wait_for_convergence())
            .await
            .map_err(|_| anyhow::anyhow!("no convergence within {:?}", timeout))??;
        Ok(stats)
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn routers(&self) -> &[Arc<Router>] {
        &self.routers
    }

    pub fn router(&self, id: &str) -> Option<&Arc<Router>> {
        self.routers.iter().find(|router| router.id() == id)
    }

    pub fn journal(&self) -> &TableJournal {
        &self.journal
    }

    pub fn stats(&self) -> SimulationStats {
        self.tracker.stats()
    }

    /// Current table of every router, keyed by router name.
    pub async fn tables(&self) -> BTreeMap<RouterId, DistanceVector> {
        let mut tables = BTreeMap::new();
        for router in &self.routers {
            tables.insert(router.id().to_string(), router.table().await);
        }
        tables
    }

    /// Compares every router's costs with an offline shortest-path
    /// computation. Next hops are not compared: equal-cost paths may differ.
    pub async fn verify(&self) -> Vec<Discrepancy> {
        let mut discrepancies = Vec::new();

        for router in &self.routers {
            let table = router.table().await;
            let expected = shortest_paths(&self.topology, router.id());

            for destination in &self.topology.routers {
                let want = expected.get(destination).map(|path| path.cost);
                let got = table.cost_to(destination);
                if want != got {
                    discrepancies.push(Discrepancy {
                        router: router.id().to_string(),
                        destination: destination.clone(),
                        expected: want,
                        actual: got,
                    });
                }
            }
        }

        discrepancies
    }
}
