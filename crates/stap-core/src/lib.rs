//! Domain model and global assembly for STAP-style linear structural analysis.
//!
//! This crate numbers the equations of a mesh, sizes the skyline (variable-bandwidth)
//! storage of the global matrices and scatters element stiffness, mass and load
//! contributions into it. Equation solvers and result writers plug in through the
//! [`Solver`] and [`Outputter`] traits.
//!
//! ```no_run
//! use stap_core::{AnalysisConfig, Domain};
//! use stap_inp::Deck;
//!
//! let deck = Deck::parse_file("truss.dat")?;
//! let mut domain = Domain::new(AnalysisConfig::default());
//! domain.load(&deck)?;
//! domain.number_equations()?;
//! domain.allocate_matrices()?;
//! domain.assemble()?;
//! let report = domain.assemble_force(1)?;
//! println!("{} loads applied", report.applied);
//! # Ok::<(), stap_core::Error>(())
//! ```

pub mod assembly;
pub mod config;
pub mod dof;
pub mod domain;
pub mod element_group;
pub mod elements;
pub mod error;
pub mod load_case;
pub mod materials;
pub mod node;
pub mod output;
pub mod skyline;
pub mod skyline_matrix;
pub mod solver;

pub use assembly::Assembler;
pub use config::{AnalysisConfig, MassFormulation, SolutionMode};
pub use dof::DofTable;
pub use domain::{Domain, Dynamics, ForceState, HistoryFreedom, MassMatrix, Stage};
pub use element_group::ElementGroup;
pub use elements::{Element, ElementKernel, ElementType};
pub use error::{Error, Result};
pub use load_case::{ConcentratedLoad, DroppedLoad, ForceReport, LoadCase};
pub use materials::Material;
pub use node::{NDF, Node};
pub use output::Outputter;
pub use skyline::{SkylineBuilder, SkylineLayout};
pub use skyline_matrix::SkylineMatrix;
pub use solver::Solver;
