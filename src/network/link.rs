use std::sync::{Arc, Weak};
use std::time::Duration;
use tracing::{debug, warn};

use crate::protocol::Datagram;
use crate::router::Router;
use crate::{Cost, RouterId};
use super::Quiescence;

/// One direction of a connection between two routers.
///
/// The cost is both the routing metric and the propagation delay, measured
/// in `time_unit`s. The destination is held weakly; the network owns routers.
#[derive(Debug, Clone)]
pub struct Link {
    cost: Cost,
    destination_id: RouterId,
    destination: Weak<Router>,
    time_unit: Duration,
    tracker: Arc<Quiescence>,
}

impl Link {
    pub fn new(
        cost: Cost,
        destination: &Arc<Router>,
        time_unit: Duration,
        tracker: Arc<Quiescence>,
    ) -> Self {
        Self {
            cost,
            destination_id: destination.id().to_string(),
            destination: Arc::downgrade(destination),
            time_unit,
            tracker,
        }
    }

    /// Neighbor discovery: the cost of this link and who is on the other end.
    pub fn describe(&self) -> (Cost, &str) {
        (self.cost, &self.destination_id)
    }

    pub fn delay(&self) -> Duration {
        self.time_unit.saturating_mul(self.cost)
    }

    /// Hands the datagram to the destination after the link delay.
    ///
    /// Returns immediately. Deliveries on different links are unordered.
    pub fn send(&self, datagram: Datagram) {
        let guard = self.tracker.enter();
        self.tracker.datagram_sent();

        let delay = self.delay();
        let destination = self.destination.clone();
        let destination_id = self.destination_id.clone();
        let tracker = Arc::clone(&self.tracker);

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            let Some(router) = destination.upgrade() else {
                warn!(
                    "Dropping datagram from {}: router {} is gone",
                    datagram.sender, destination_id
                );
                drop(guard);
                return;
            };

            debug!("{} -> {} delivered after {:?}", datagram.sender, destination_id, delay);
            tracker.datagram_delivered();
            if let Err(e) = router.receive(datagram).await {
                tracker.report_fault(e);
            }
            drop(guard);
        });
    }
}
