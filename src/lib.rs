pub mod algorithms;
pub mod config;
pub mod logging;
pub mod network;
pub mod protocol;
pub mod router;

pub use config::{SimulationConfig, TopologyConfig};
pub use network::{Network, Topology, TopologyError};
pub use protocol::{Datagram, DistanceVector, DistanceVectorEntry, RoutingError};
pub use router::Router;

/// Routers are named by free-form strings, unique within a network.
pub type RouterId = String;

/// Additive link/path cost. Also the link's one-way delay in time units.
pub type Cost = u32;
