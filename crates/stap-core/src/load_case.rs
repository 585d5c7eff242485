//! Concentrated nodal loads grouped by load case.

use serde::Serialize;
use stap_inp::LoadCaseRecord;

/// A single nodal load
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConcentratedLoad {
    /// Node number, 1-based
    pub node: usize,
    /// Freedom direction, 1-based (1 = x, 2 = y, 3 = z)
    pub dof: usize,
    pub magnitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadCase {
    pub id: usize,
    pub loads: Vec<ConcentratedLoad>,
}

impl LoadCase {
    pub fn new(id: usize, loads: Vec<ConcentratedLoad>) -> Self {
        Self { id, loads }
    }

    pub fn from_record(record: &LoadCaseRecord) -> Self {
        let loads = record
            .loads
            .iter()
            .map(|l| ConcentratedLoad {
                node: l.node,
                dof: l.dof,
                magnitude: l.magnitude,
            })
            .collect();
        Self::new(record.id, loads)
    }
}

/// Load that targeted a constrained freedom and was left out of the force vector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DroppedLoad {
    pub node: usize,
    pub dof: usize,
    pub magnitude: f64,
}

/// Outcome of assembling one load case.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ForceReport {
    pub load_case: usize,
    pub applied: usize,
    pub dropped: Vec<DroppedLoad>,
}

impl ForceReport {
    pub fn new(load_case: usize) -> Self {
        Self {
            load_case,
            ..Self::default()
        }
    }
}
