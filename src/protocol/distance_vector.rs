use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::{Cost, RouterId};
use super::{Datagram, RoutingError};

/// Best known path to one destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DistanceVectorEntry {
    pub cost: Cost,
    /// `None` only on the owning router's entry for itself.
    pub next_hop: Option<RouterId>,
}

impl DistanceVectorEntry {
    pub fn local() -> Self {
        Self {
            cost: 0,
            next_hop: None,
        }
    }

    pub fn via(cost: Cost, next_hop: impl Into<RouterId>) -> Self {
        Self {
            cost,
            next_hop: Some(next_hop.into()),
        }
    }
}

impl fmt::Display for DistanceVectorEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.next_hop {
            Some(hop) => write!(f, "Cost: {}, Next hop: {}", self.cost, hop),
            None => write!(f, "Cost: {}, Next hop: -", self.cost),
        }
    }
}

/// A router's table of destination -> (cost, next hop).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DistanceVector {
    entries: BTreeMap<RouterId, DistanceVectorEntry>,
}

impl DistanceVector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs the zero-cost entry for the owning router.
    pub fn seed_local(&mut self, owner: &str) {
        self.entries.insert(owner.to_string(), DistanceVectorEntry::local());
    }

    /// Records a directly attached neighbor, overwriting whatever was known.
    pub fn learn_neighbor(&mut self, neighbor: &str, link_cost: Cost) {
        self.entries
            .insert(neighbor.to_string(), DistanceVectorEntry::via(link_cost, neighbor));
    }

    pub fn get(&self, destination: &str) -> Option<&DistanceVectorEntry> {
        self.entries.get(destination)
    }

    pub fn cost_to(&self, destination: &str) -> Option<Cost> {
        self.entries.get(destination).map(|entry| entry.cost)
    }

    pub fn contains(&self, destination: &str) -> bool {
        self.entries.contains_key(destination)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RouterId, &DistanceVectorEntry)> {
        self.entries.iter()
    }

    /// Bellman-Ford relaxation of `owner`'s table against a neighbor's
    /// advertisement.
    ///
    /// The cost of the link to the sender is read from this table, so the
    /// sender must already be a known neighbor. A destination is updated only
    /// when it is new or the path through the sender is strictly cheaper;
    /// equal-cost paths keep the entry already installed.
    ///
    /// Either every improvement is applied or, on error, none is. Returns
    /// whether anything changed.
    pub fn relax(&mut self, owner: &str, datagram: &Datagram) -> Result<bool, RoutingError> {
        let link_cost = self
            .cost_to(&datagram.sender)
            .ok_or_else(|| RoutingError::UnknownSender {
                router: owner.to_string(),
                sender: datagram.sender.clone(),
            })?;

        let mut improvements = Vec::new();
        for (destination, advertised) in datagram.vector.iter() {
            match (link_cost.checked_add(advertised.cost), self.cost_to(destination)) {
                (Some(candidate), Some(current)) if candidate < current => {
                    improvements.push((destination, candidate));
                }
                (Some(candidate), None) => improvements.push((destination, candidate)),
                // No cheaper than the known path; an overflowing sum never is.
                (_, Some(_)) => {}
                (None, None) => {
                    return Err(RoutingError::CostOverflow {
                        sender: datagram.sender.clone(),
                        destination: destination.clone(),
                    });
                }
            }
        }

        let changed = !improvements.is_empty();
        for (destination, cost) in improvements {
            self.entries.insert(
                destination.clone(),
                DistanceVectorEntry::via(cost, datagram.sender.as_str()),
            );
        }

        Ok(changed)
    }
}

impl FromIterator<(RouterId, DistanceVectorEntry)> for DistanceVector {
    fn from_iter<I: IntoIterator<Item = (RouterId, DistanceVectorEntry)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
