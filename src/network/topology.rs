use std::collections::HashSet;
use thiserror::Error;

use crate::{Cost, RouterId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopologyError {
    #[error("a network needs at least one router")]
    NoRouters,

    #[error("router identifiers must not be empty")]
    EmptyIdentifier,

    #[error("router {0} is listed more than once")]
    DuplicateRouter(RouterId),

    #[error("expected {expected} pairwise costs for {routers} routers, got {actual}")]
    CostCountMismatch {
        routers: usize,
        expected: usize,
        actual: usize,
    },

    #[error("link {a}-{b} has cost 0; costs must be positive")]
    ZeroCost { a: RouterId, b: RouterId },

    #[error("link refers to {0}, which is not in the router list")]
    UnknownRouter(RouterId),

    #[error("link costs add up to {total}, paths could exceed the maximum cost {max}")]
    CostTooLarge { total: u64, max: Cost },
}

/// A full-duplex connection; both directions share the cost.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopologyLink {
    pub a: RouterId,
    pub b: RouterId,
    pub cost: Cost,
}

/// Validated static topology.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topology {
    pub routers: Vec<RouterId>,
    pub links: Vec<TopologyLink>,
}

/// Number of unordered pairs among `n` routers.
pub fn pair_count(n: usize) -> usize {
    n * n.saturating_sub(1) / 2
}

/// Unordered index pairs in combination order: (0,1), (0,2), ..., (1,2), ...
pub fn pairs(n: usize) -> impl Iterator<Item = (usize, usize)> {
    (0..n).flat_map(move |i| (i + 1..n).map(move |j| (i, j)))
}

impl Topology {
    /// Builds a topology from router names and one optional cost per pair,
    /// pairs enumerated as by [`pairs`]. `None` means the two are not linked.
    pub fn from_pairwise(
        routers: Vec<RouterId>,
        costs: &[Option<Cost>],
    ) -> Result<Self, TopologyError> {
        if routers.is_empty() {
            return Err(TopologyError::NoRouters);
        }

        let mut seen = HashSet::new();
        for id in &routers {
            if id.is_empty() {
                return Err(TopologyError::EmptyIdentifier);
            }
            if !seen.insert(id.as_str()) {
                return Err(TopologyError::DuplicateRouter(id.clone()));
            }
        }

        let expected = pair_count(routers.len());
        if costs.len() != expected {
            return Err(TopologyError::CostCountMismatch {
                routers: routers.len(),
                expected,
                actual: costs.len(),
            });
        }

        let mut links = Vec::new();
        for ((i, j), cost) in pairs(routers.len()).zip(costs) {
            match cost {
                None => {}
                Some(0) => {
                    return Err(TopologyError::ZeroCost {
                        a: routers[i].clone(),
                        b: routers[j].clone(),
                    });
                }
                Some(cost) => links.push(TopologyLink {
                    a: routers[i].clone(),
                    b: routers[j].clone(),
                    cost: *cost,
                }),
            }
        }

        // No simple path is longer than every link put together.
        let total: u64 = links.iter().map(|link| u64::from(link.cost)).sum();
        if total > u64::from(Cost::MAX) {
            return Err(TopologyError::CostTooLarge {
                total,
                max: Cost::MAX,
            });
        }

        Ok(Self { routers, links })
    }

    pub fn index_of(&self, router: &str) -> Option<usize> {
        self.routers.iter().position(|id| id == router)
    }

    /// Direct neighbors of `router` with the link cost.
    pub fn get_neighbors(&self, router: &str) -> Vec<(RouterId, Cost)> {
        self.links
            .iter()
            .filter_map(|link| {
                if link.a == router {
                    Some((link.b.clone(), link.cost))
                } else if link.b == router {
                    Some((link.a.clone(), link.cost))
                } else {
                    None
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<RouterId> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn pairs_follow_combination_order() {
        let order: Vec<_> = pairs(4).collect();
        assert_eq!(order, vec![(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)]);
        assert_eq!(pair_count(4), 6);
        assert_eq!(pair_count(1), 0);
    }

    #[test]
    fn builds_links_for_present_costs() {
        let topology =
            Topology::from_pairwise(names(&["A", "B", "C"]), &[Some(1), None, Some(2)]).unwrap();

        assert_eq!(topology.links.len(), 2);
        assert_eq!(
            topology.get_neighbors("B"),
            vec![("A".to_string(), 1), ("C".to_string(), 2)]
        );
        assert_eq!(topology.get_neighbors("A"), vec![("B".to_string(), 1)]);
    }

    #[test]
    fn rejects_wrong_cost_count() {
        let err = Topology::from_pairwise(names(&["A", "B", "C"]), &[Some(1)]).unwrap_err();
        assert_eq!(
            err,
            TopologyError::CostCountMismatch {
                routers: 3,
                expected: 3,
                actual: 1
            }
        );
    }

    #[test]
    fn rejects_duplicates_empty_and_zero_cost() {
        assert_eq!(
            Topology::from_pairwise(names(&["A", "A"]), &[Some(1)]).unwrap_err(),
            TopologyError::DuplicateRouter("A".into())
        );
        assert_eq!(
            Topology::from_pairwise(names(&["A", ""]), &[Some(1)]).unwrap_err(),
            TopologyError::EmptyIdentifier
        );
        assert_eq!(
            Topology::from_pairwise(names(&["A", "B"]), &[Some(0)]).unwrap_err(),
            TopologyError::ZeroCost {
                a: "A".into(),
                b: "B".into()
            }
        );
        assert_eq!(
            Topology::from_pairwise(Vec::new(), &[]).unwrap_err(),
            TopologyError::NoRouters
        );
    }

    #[test]
    fn rejects_costs_whose_paths_could_overflow() {
        let err = Topology::from_pairwise(
            names(&["A", "B", "C"]),
            &[Some(3_000_000_000), None, Some(3_000_000_000)],
        )
        .unwrap_err();
        assert_eq!(
            err,
            TopologyError::CostTooLarge {
                total: 6_000_000_000,
                max: Cost::MAX
            }
        );

        let largest = Topology::from_pairwise(names(&["A", "B"]), &[Some(Cost::MAX)]);
        assert!(largest.is_ok());
    }
}
