//! Nodal points.

use serde::Serialize;
use stap_inp::NodeRecord;

/// Physical freedoms per node: translations along x, y and z.
pub const NDF: usize = stap_inp::NODE_FREEDOMS;

/// A nodal point of the mesh
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    /// Node number (1-based, as in the input deck)
    pub id: usize,
    /// X, Y, Z coordinates
    pub coords: [f64; 3],
    /// `true` for each freedom that is fixed
    pub fixed: [bool; NDF],
    /// Global equation number per freedom, 0 when constrained. Written once by
    /// [`crate::dof::DofTable::number`].
    pub(crate) equations: Option<[usize; NDF]>,
}

impl Node {
    pub fn new(id: usize, coords: [f64; 3], fixed: [bool; NDF]) -> Self {
        Self {
            id,
            coords,
            fixed,
            equations: None,
        }
    }

    /// A node with every freedom free.
    pub fn free(id: usize, coords: [f64; 3]) -> Self {
        Self::new(id, coords, [false; NDF])
    }

    pub fn from_record(record: &NodeRecord) -> Self {
        Self::new(record.id, record.coords, record.fixed)
    }

    pub fn is_numbered(&self) -> bool {
        self.equations.is_some()
    }

    /// Equation numbers of all freedoms, if numbering has run.
    pub fn equations(&self) -> Option<&[usize; NDF]> {
        self.equations.as_ref()
    }

    /// Equation number of freedom `dof` (0-based). Returns 0 for a constrained freedom
    /// and for a node that has not been numbered yet.
    pub fn equation(&self, dof: usize) -> usize {
        self.equations.map_or(0, |eq| eq[dof])
    }

    pub fn distance_to(&self, other: &Node) -> f64 {
        let dx = other.coords[0] - self.coords[0];
        let dy = other.coords[1] - self.coords[1];
        let dz = other.coords[2] - self.coords[2];
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}
