use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Duration;

use crate::network::{Topology, TopologyError};
use crate::{Cost, RouterId};

/// Runtime knobs for a simulation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationConfig {
    /// Real time one unit of link cost takes to traverse.
    pub time_unit: Duration,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            time_unit: Duration::from_secs(1),
        }
    }
}

/// Topology as written by hand: router names plus one cost per pair in
/// combination order (A-B, A-C, ..., B-C, ...). `null` means no link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologyConfig {
    pub routers: Vec<RouterId>,
    pub costs: Vec<Option<Cost>>,
}

impl TopologyConfig {
    pub fn new(routers: &[&str], costs: &[Option<Cost>]) -> Self {
        Self {
            routers: routers.iter().map(|name| name.to_string()).collect(),
            costs: costs.to_vec(),
        }
    }

    pub fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: TopologyConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn to_topology(&self) -> Result<Topology, TopologyError> {
        Topology::from_pairwise(self.routers.clone(), &self.costs)
    }

    /// Names accepted by [`TopologyConfig::scenario`].
    pub const SCENARIOS: [&'static str; 3] = ["five-node", "six-node", "pair"];

    /// Built-in example networks.
    pub fn scenario(name: &str) -> Option<Self> {
        match name {
            // A-B 1, A-C 6, B-C 2, B-D 1, C-D 3, C-E 7, D-E 2
            "five-node" => Some(Self::new(
                &["A", "B", "C", "D", "E"],
                &[Some(1), Some(6), None, None, Some(2), Some(1), None, Some(3), Some(7), Some(2)],
            )),
            // A-B 1, A-F 3, B-C 3, B-E 5, B-F 1, C-D 2, D-E 1, D-F 6, E-F 2
            "six-node" => Some(Self::new(
                &["A", "B", "C", "D", "E", "F"],
                &[
                    Some(1), None, None, None, Some(3), Some(3), None, Some(5), Some(1),
                    Some(2), None, None, Some(1), Some(6), Some(2),
                ],
            )),
            "pair" => Some(Self::new(&["A", "B"], &[Some(5)])),
            _ => None,
        }
    }
}
