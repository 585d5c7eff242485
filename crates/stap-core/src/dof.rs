//! Degree-of-freedom table: global equation numbering.
//!
//! Nodes are visited in input order and freedoms in x, y, z order within each node.
//! A free freedom takes the next equation number, a fixed one gets 0. The resulting
//! order fixes the bandwidth of the global matrix, so it must not be changed.

use log::debug;

use crate::error::{Error, Result};
use crate::node::{NDF, Node};

/// Result of equation numbering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DofTable {
    neq: usize,
    constrained: usize,
}

impl DofTable {
    /// Assign equation numbers to every freedom of `nodes`.
    ///
    /// # Errors
    /// Fails when `nodes` is empty or when any node has already been numbered.
    pub fn number(nodes: &mut [Node]) -> Result<Self> {
        if nodes.is_empty() {
            return Err(Error::malformed("nodal data", "no nodal points defined"));
        }
        if let Some(node) = nodes.iter().find(|n| n.is_numbered()) {
            return Err(Error::malformed(
                format!("node {}", node.id),
                "equation numbers were already assigned",
            ));
        }

        let mut neq = 0usize;
        let mut constrained = 0usize;
        for node in nodes.iter_mut() {
            let mut equations = [0usize; NDF];
            for (dof, eq) in equations.iter_mut().enumerate() {
                if node.fixed[dof] {
                    constrained += 1;
                } else {
                    neq += 1;
                    *eq = neq;
                }
            }
            node.equations = Some(equations);
        }

        debug!(
            "numbered {} nodes: {neq} equations, {constrained} constrained freedoms",
            nodes.len()
        );
        Ok(Self { neq, constrained })
    }

    /// Number of active equations (NEQ).
    pub fn neq(&self) -> usize {
        self.neq
    }

    pub fn constrained(&self) -> usize {
        self.constrained
    }
}
