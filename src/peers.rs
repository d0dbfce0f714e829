//! Directory of peers found by discovery

use crate::types::{BenchmarkError, DeviceId, NetworkAddress, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A discovered peer; identity is the network address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerEntry {
    /// Resolved asynchronously, zero until then
    pub device_id: DeviceId,
    pub address: NetworkAddress,
}

impl PeerEntry {
    pub fn new(address: NetworkAddress) -> Self {
        Self {
            device_id: DeviceId::default(),
            address,
        }
    }
}

impl fmt::Display for PeerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.device_id, self.address)
    }
}

/// Bounded, insertion-ordered peer list with a selected entry
///
/// The selection always points at an existing entry or is unset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerDirectory {
    capacity: usize,
    entries: Vec<PeerEntry>,
    selected: Option<usize>,
}

impl PeerDirectory {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Vec::with_capacity(capacity),
            selected: None,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[PeerEntry] {
        &self.entries
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.selected = None;
    }

    /// Append a peer; full directories and already known addresses are left unchanged
    pub fn insert(&mut self, entry: PeerEntry) -> bool {
        if self.entries.len() >= self.capacity || self.contains(entry.address) {
            return false;
        }
        self.entries.push(entry);
        true
    }

    pub fn contains(&self, address: NetworkAddress) -> bool {
        self.entries.iter().any(|e| e.address == address)
    }

    /// Fill in the device identifier of a known peer
    pub fn resolve(&mut self, address: NetworkAddress, device_id: DeviceId) -> bool {
        match self.entries.iter_mut().find(|e| e.address == address) {
            Some(entry) => {
                entry.device_id = device_id;
                true
            }
            None => false,
        }
    }

    pub fn select(&mut self, index: usize) -> Result<()> {
        if index >= self.entries.len() {
            return Err(BenchmarkError::invalid_argument(format!(
                "Peer index {} out of range, {} peer(s) known",
                index,
                self.entries.len()
            )));
        }
        self.selected = Some(index);
        Ok(())
    }

    /// Select the most recently discovered peer, or nothing if the directory is empty
    pub fn select_last(&mut self) {
        self.selected = self.entries.len().checked_sub(1);
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected(&self) -> Option<&PeerEntry> {
        self.selected.and_then(|i| self.entries.get(i))
    }
}
