use crate::RouterId;
use super::DistanceVector;

/// Advertisement carried over a link: the sender's name and a copy of its
/// table taken at broadcast time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Datagram {
    pub sender: RouterId,
    pub vector: DistanceVector,
}

impl Datagram {
    pub fn new(sender: RouterId, vector: DistanceVector) -> Self {
        Self { sender, vector }
    }
}
