//! Static description of a backend.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use qport_ir::RegisterSlot;

/// Register holding device nodes.
pub const NODE_REGISTER: &str = "node";

/// Qubit connectivity of a device. All edges are bidirectional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Architecture {
    /// Every pair of nodes can interact.
    FullyConnected {
        /// Number of nodes.
        n_nodes: u32,
    },
    /// Explicit coupling edges.
    Edges(Vec<(u32, u32)>),
}

impl Architecture {
    /// Number of nodes.
    pub fn n_nodes(&self) -> u32 {
        match self {
            Architecture::FullyConnected { n_nodes } => *n_nodes,
            Architecture::Edges(edges) => edges
                .iter()
                .map(|&(a, b)| a.max(b) + 1)
                .max()
                .unwrap_or(0),
        }
    }

    /// Check whether two nodes are coupled.
    pub fn is_connected(&self, a: u32, b: u32) -> bool {
        match self {
            Architecture::FullyConnected { n_nodes } => a != b && a < *n_nodes && b < *n_nodes,
            Architecture::Edges(edges) => edges
                .iter()
                .any(|&(x, y)| (x == a && y == b) || (x == b && y == a)),
        }
    }
}

/// What a backend is and what it accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendInfo {
    /// Backend class name.
    pub name: String,
    /// Device the backend talks to.
    pub device_name: Option<String>,
    /// Version of the backend implementation.
    pub version: String,
    /// Connectivity.
    pub architecture: Architecture,
    /// Names of the operations the device runs.
    pub gate_set: BTreeSet<String>,
}

impl BackendInfo {
    /// Info for an all-to-all device of `n_nodes` qubits.
    pub fn fully_connected(
        name: impl Into<String>,
        device_name: impl Into<String>,
        version: impl Into<String>,
        n_nodes: u32,
        gate_set: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            name: name.into(),
            device_name: Some(device_name.into()),
            version: version.into(),
            architecture: Architecture::FullyConnected { n_nodes },
            gate_set: gate_set.into_iter().map(Into::into).collect(),
        }
    }

    /// Number of device nodes.
    pub fn n_nodes(&self) -> u32 {
        self.architecture.n_nodes()
    }

    /// Device nodes as `node[i]` slots.
    pub fn nodes(&self) -> Vec<RegisterSlot> {
        (0..self.n_nodes())
            .map(|i| RegisterSlot::new(NODE_REGISTER, i))
            .collect()
    }

    /// Check whether the device runs `gate`.
    pub fn supports(&self, gate: &str) -> bool {
        self.gate_set.contains(gate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fully_connected() {
        let info = BackendInfo::fully_connected("IonQBackend", "qpu", "0.4.0", 3, ["rx", "cx"]);
        assert_eq!(info.n_nodes(), 3);
        assert_eq!(info.nodes()[2].to_string(), "node[2]");
        assert!(info.architecture.is_connected(0, 2));
        assert!(!info.architecture.is_connected(1, 1));
        assert!(info.supports("cx"));
        assert!(!info.supports("cz"));
    }

    #[test]
    fn test_edges() {
        let arch = Architecture::Edges(vec![(0, 1), (1, 4)]);
        assert_eq!(arch.n_nodes(), 5);
        assert!(arch.is_connected(4, 1));
        assert!(!arch.is_connected(0, 4));
    }
}
