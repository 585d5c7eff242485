//! Analysis configuration.
//!
//! Everything has a default, so an empty JSON object is a valid configuration.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Solution mode selector (MODEX of the legacy deck).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolutionMode {
    /// Read and check the data, do not assemble or solve
    DataCheck,
    /// Linear static analysis
    Static,
    /// Natural frequencies and mode shapes
    Modal,
    /// Time integration
    Dynamic,
}

impl SolutionMode {
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(SolutionMode::DataCheck),
            1 => Some(SolutionMode::Static),
            2 => Some(SolutionMode::Modal),
            3 => Some(SolutionMode::Dynamic),
            _ => None,
        }
    }

    pub fn code(self) -> u32 {
        match self {
            SolutionMode::DataCheck => 0,
            SolutionMode::Static => 1,
            SolutionMode::Modal => 2,
            SolutionMode::Dynamic => 3,
        }
    }

    /// Whether a global mass matrix is part of the assembled system.
    pub fn needs_mass(self) -> bool {
        matches!(self, SolutionMode::Modal | SolutionMode::Dynamic)
    }
}

/// How the global mass matrix is represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MassFormulation {
    /// Full mass matrix sharing the stiffness skyline
    #[default]
    Consistent,
    /// Diagonal mass vector indexed by equation number
    Lumped,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub mass: MassFormulation,
    /// Compute element matrices on the rayon pool.
    pub parallel: bool,
    /// Overrides the solution mode given by the deck.
    pub mode: Option<SolutionMode>,
}

impl AnalysisConfig {
    pub fn from_json_str(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path.as_ref()).map_err(Error::Io)?;
        Self::from_json_str(&raw)
    }
}
