//! Frame links the node stack runs on

use crate::models::MacCounters;
use crate::transport::wire::Envelope;
use crate::types::Result;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Moves envelopes between nodes
pub trait Link {
    /// Hand one envelope to the medium; broadcast destinations reach every node
    fn send(&mut self, envelope: &Envelope) -> Result<()>;

    /// Next envelope addressed to this node, if one has arrived
    fn try_recv(&mut self) -> Result<Option<Envelope>>;

    /// Counters of this node's transmissions
    fn mac_stats(&self) -> SharedMacStats;
}

/// Monotonic transmit counters shared between a link and the platform
#[derive(Debug, Default)]
pub struct MacStats {
    total: AtomicU32,
    error: AtomicU32,
}

pub type SharedMacStats = Arc<MacStats>;

impl MacStats {
    pub fn record(&self, success: bool) {
        self.total.fetch_add(1, Ordering::Relaxed);
        if !success {
            self.error.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> MacCounters {
        MacCounters::new(
            self.total.load(Ordering::Relaxed),
            self.error.load(Ordering::Relaxed),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mac_stats_counts_errors() {
        let stats = MacStats::default();
        stats.record(true);
        stats.record(false);
        stats.record(true);
        assert_eq!(stats.snapshot(), MacCounters::new(3, 1));
    }
}
