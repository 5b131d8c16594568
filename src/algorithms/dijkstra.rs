use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use crate::network::Topology;
use crate::{Cost, RouterId};

/// Offline shortest path, used to check what the routers converged to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortestPath {
    pub cost: Cost,
    pub next_hop: Option<RouterId>,
    pub path: Vec<RouterId>,
}

#[derive(Debug)]
struct State {
    cost: Cost,
    router: RouterId,
}

impl Eq for State {}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        self.cost == other.cost
    }
}

impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap
        other.cost.cmp(&self.cost)
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Shortest paths from `source` to every reachable router, including
/// `source` itself at cost 0.
pub fn shortest_paths(topology: &Topology, source: &str) -> HashMap<RouterId, ShortestPath> {
    let mut distances: HashMap<RouterId, Cost> = HashMap::new();
    let mut previous: HashMap<RouterId, RouterId> = HashMap::new();
    let mut heap = BinaryHeap::new();

    distances.insert(source.to_string(), 0);
    heap.push(State {
        cost: 0,
        router: source.to_string(),
    });

    while let Some(State { cost, router }) = heap.pop() {
        if cost > *distances.get(&router).unwrap_or(&Cost::MAX) {
            continue;
        }

        for (neighbor, link_cost) in topology.get_neighbors(&router) {
            let Some(new_cost) = cost.checked_add(link_cost) else {
                continue;
            };

            if new_cost < *distances.get(&neighbor).unwrap_or(&Cost::MAX) {
                distances.insert(neighbor.clone(), new_cost);
                previous.insert(neighbor.clone(), router.clone());
                heap.push(State {
                    cost: new_cost,
                    router: neighbor,
                });
            }
        }
    }

    distances
        .into_iter()
        .map(|(dest, cost)| {
            let path = reconstruct_path(&previous, &dest);
            let next_hop = path.get(1).cloned();
            (dest, ShortestPath { cost, next_hop, path })
        })
        .collect()
}

fn reconstruct_path(previous: &HashMap<RouterId, RouterId>, dest: &str) -> Vec<RouterId> {
    let mut path = vec![dest.to_string()];
    let mut current = dest;

    while let Some(prev) = previous.get(current) {
        path.push(prev.clone());
        current = prev;
    }

    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    fn five_node() -> Topology {
        Topology::from_pairwise(
            ["A", "B", "C", "D", "E"].iter().map(|s| s.to_string()).collect(),
            &[Some(1), Some(6), None, None, Some(2), Some(1), None, Some(3), Some(7), Some(2)],
        )
        .unwrap()
    }

    #[test]
    fn five_node_costs_from_a() {
        let paths = shortest_paths(&five_node(), "A");

        let cost = |dest: &str| paths[dest].cost;
        assert_eq!(cost("A"), 0);
        assert_eq!(cost("B"), 1);
        assert_eq!(cost("C"), 3);
        assert_eq!(cost("D"), 2);
        assert_eq!(cost("E"), 4);

        assert_eq!(paths["A"].next_hop, None);
        assert_eq!(paths["E"].next_hop.as_deref(), Some("B"));
        assert_eq!(paths["E"].path, vec!["A", "B", "D", "E"]);
    }

    #[test]
    fn unreachable_routers_are_absent() {
        let topology = Topology::from_pairwise(
            ["A", "B", "C"].iter().map(|s| s.to_string()).collect(),
            &[Some(2), None, None],
        )
        .unwrap();

        let paths = shortest_paths(&topology, "A");
        assert_eq!(paths.len(), 2);
        assert!(!paths.contains_key("C"));
    }
}
