pub mod distance_vector;
pub mod messages;

pub use distance_vector::*;
pub use messages::*;

use crate::RouterId;
use thiserror::Error;

/// Faults raised while processing advertisements. Any of these means the
/// topology handed to the routers was inconsistent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutingError {
    #[error("router {router} got an advertisement from {sender}, which is not a neighbor")]
    UnknownSender { router: RouterId, sender: RouterId },

    #[error("cost to {destination} via {sender} overflows")]
    CostOverflow { sender: RouterId, destination: RouterId },
}
