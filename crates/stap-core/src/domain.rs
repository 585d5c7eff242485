//! The problem domain: every collection of one analysis run and the stage machine
//! that drives it from input to results.
//!
//! ```text
//! Uninitialized → Loaded → Numbered → Sized → Assembled → Solved → Reported
//! ```
//!
//! Stages only move forward. Load cases are looped over through the force buffer,
//! which carries its own content tag ([`ForceState`]): after a report the next
//! [`Domain::assemble_force`] call starts another load case without the stage going
//! back.

use std::sync::Arc;

use log::info;
use nalgebra::DVector;
use serde::Serialize;
use stap_inp::Deck;

use crate::assembly::Assembler;
use crate::config::{AnalysisConfig, MassFormulation, SolutionMode};
use crate::dof::DofTable;
use crate::element_group::ElementGroup;
use crate::error::{Error, Result};
use crate::load_case::{ForceReport, LoadCase};
use crate::node::{NDF, Node};
use crate::output::Outputter;
use crate::skyline::SkylineLayout;
use crate::skyline_matrix::SkylineMatrix;
use crate::solver::Solver;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Stage {
    Uninitialized,
    Loaded,
    Numbered,
    Sized,
    Assembled,
    Solved,
    Reported,
}

/// What the shared force/displacement buffer currently holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ForceState {
    Empty,
    /// Load vector of a load case (1-based)
    Load(usize),
    /// Displacement solution of a load case (1-based)
    Displacement(usize),
}

/// Global mass in the configured formulation.
#[derive(Debug, Clone, PartialEq)]
pub enum MassMatrix {
    Consistent(SkylineMatrix),
    /// Diagonal entries indexed by equation number - 1
    Lumped(DVector<f64>),
}

/// Time step and Rayleigh damping coefficients of a dynamic run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Dynamics {
    pub time_step: f64,
    pub alpha: f64,
    pub beta: f64,
}

/// A freedom selected for history output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HistoryFreedom {
    /// Node number, 1-based
    pub node: usize,
    /// Freedom direction, 1-based
    pub dof: usize,
}

impl HistoryFreedom {
    /// Equation number of this freedom. Returns 0 when it is constrained, not yet
    /// numbered, or names a node or direction outside `nodes`.
    pub fn equation(&self, nodes: &[Node]) -> usize {
        if self.dof == 0 || self.dof > NDF {
            return 0;
        }
        self.node
            .checked_sub(1)
            .and_then(|k| nodes.get(k))
            .map_or(0, |node| node.equation(self.dof - 1))
    }
}

#[derive(Debug)]
pub struct Domain {
    config: AnalysisConfig,
    assembler: Assembler,
    stage: Stage,
    title: String,
    mode: SolutionMode,
    nodes: Vec<Node>,
    groups: Vec<ElementGroup>,
    load_cases: Vec<LoadCase>,
    history: Vec<HistoryFreedom>,
    dynamics: Option<Dynamics>,
    neq: usize,
    layout: Option<Arc<SkylineLayout>>,
    stiffness: Option<SkylineMatrix>,
    mass: Option<MassMatrix>,
    force: DVector<f64>,
    force_state: ForceState,
}

impl Domain {
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            assembler: Assembler::from_config(&config),
            config,
            stage: Stage::Uninitialized,
            title: String::new(),
            mode: SolutionMode::DataCheck,
            nodes: Vec::new(),
            groups: Vec::new(),
            load_cases: Vec::new(),
            history: Vec::new(),
            dynamics: None,
            neq: 0,
            layout: None,
            stiffness: None,
            mass: None,
            force: DVector::zeros(0),
            force_state: ForceState::Empty,
        }
    }

    /// Build nodes, load cases, element groups, history selections and dynamics
    /// parameters from `deck`.
    ///
    /// A configured mode override cannot supply the dynamics parameters, so
    /// overriding to [`SolutionMode::Dynamic`] needs a deck that carries them.
    ///
    /// # Errors
    /// [`Error::MalformedInput`] for out-of-order node or load-case numbers, for any
    /// reference to a node, material set or freedom that does not exist, and for a
    /// dynamic run without a dynamics record.
    pub fn load(&mut self, deck: &Deck) -> Result<()> {
        self.require_exact("load input", Stage::Uninitialized)?;

        let mode = match self.config.mode {
            Some(mode) => mode,
            None => SolutionMode::from_code(deck.control.mode).ok_or_else(|| {
                Error::malformed("control line", format!("unknown mode {}", deck.control.mode))
            })?,
        };
        if mode == SolutionMode::Dynamic && deck.dynamics.is_none() {
            return Err(Error::malformed(
                "control line",
                "dynamic analysis needs a time step and damping record",
            ));
        }

        let mut nodes = Vec::with_capacity(deck.nodes.len());
        for (k, record) in deck.nodes.iter().enumerate() {
            if record.id != k + 1 {
                return Err(Error::malformed(
                    format!("node {} (line {})", record.id, record.line),
                    format!("nodes must be numbered in order, expected {}", k + 1),
                ));
            }
            nodes.push(Node::from_record(record));
        }
        let num_nodes = nodes.len();

        let mut load_cases = Vec::with_capacity(deck.load_cases.len());
        for (k, record) in deck.load_cases.iter().enumerate() {
            if record.id != k + 1 {
                return Err(Error::malformed(
                    format!("load case {} (line {})", record.id, record.line),
                    format!("load cases must be numbered in order, expected {}", k + 1),
                ));
            }
            for load in &record.loads {
                check_freedom(load.node, load.dof, num_nodes, load.line)?;
            }
            load_cases.push(LoadCase::from_record(record));
        }

        let groups = deck
            .element_groups
            .iter()
            .map(|record| ElementGroup::read(record, num_nodes))
            .collect::<Result<Vec<_>>>()?;

        let mut history = Vec::with_capacity(deck.history.len());
        for h in &deck.history {
            check_freedom(h.node, h.dof, num_nodes, h.line)?;
            history.push(HistoryFreedom {
                node: h.node,
                dof: h.dof,
            });
        }

        self.title = deck.title.clone();
        self.mode = mode;
        self.nodes = nodes;
        self.load_cases = load_cases;
        self.groups = groups;
        self.history = history;
        self.dynamics = deck.dynamics.as_ref().map(|d| Dynamics {
            time_step: d.time_step,
            alpha: d.alpha,
            beta: d.beta,
        });
        self.stage = Stage::Loaded;

        info!(
            "loaded '{}': {} nodes, {} element groups ({} elements), {} load cases, mode {:?}",
            self.title,
            self.nodes.len(),
            self.groups.len(),
            self.num_elements(),
            self.load_cases.len(),
            self.mode
        );
        Ok(())
    }

    /// Assign global equation numbers to every node freedom.
    pub fn number_equations(&mut self) -> Result<usize> {
        self.require_exact("number equations", Stage::Loaded)?;
        let table = DofTable::number(&mut self.nodes)?;
        self.neq = table.neq();
        self.stage = Stage::Numbered;
        info!(
            "numbered equations: NEQ = {} ({} constrained freedoms)",
            self.neq,
            table.constrained()
        );
        Ok(self.neq)
    }

    /// Compute the skyline layout and allocate the stiffness store, the mass store
    /// when the solution mode needs it, and the force vector.
    ///
    /// # Errors
    /// [`Error::NoActiveEquations`] when every freedom is constrained.
    pub fn allocate_matrices(&mut self) -> Result<()> {
        self.require_exact("allocate matrices", Stage::Numbered)?;
        let layout = Arc::new(
            self.assembler
                .column_heights(&self.nodes, &self.groups, self.neq)?,
        );

        self.stiffness = Some(SkylineMatrix::new(Arc::clone(&layout)));
        self.mass = self.mode.needs_mass().then(|| match self.config.mass {
            MassFormulation::Consistent => {
                MassMatrix::Consistent(SkylineMatrix::new(Arc::clone(&layout)))
            }
            MassFormulation::Lumped => MassMatrix::Lumped(DVector::zeros(self.neq)),
        });
        self.force = DVector::zeros(self.neq);
        self.force_state = ForceState::Empty;
        self.layout = Some(layout);
        self.stage = Stage::Sized;
        info!(
            "allocated matrices: {} stored entries per skyline matrix{}",
            self.layout.as_ref().map_or(0, |l| l.len()),
            match &self.mass {
                Some(MassMatrix::Consistent(_)) => ", consistent mass",
                Some(MassMatrix::Lumped(_)) => ", lumped mass",
                None => "",
            }
        );
        Ok(())
    }

    /// Assemble the global stiffness matrix, and the mass matrix when allocated.
    pub fn assemble(&mut self) -> Result<()> {
        self.require_exact("assemble", Stage::Sized)?;
        let stiffness = self.stiffness.as_mut().ok_or(Error::Stage {
            operation: "assemble",
            found: self.stage,
            required: Stage::Sized,
        })?;
        self.assembler
            .assemble_stiffness(&self.nodes, &self.groups, stiffness)?;

        match self.mass.as_mut() {
            Some(MassMatrix::Consistent(mass)) => {
                self.assembler
                    .assemble_consistent_mass(&self.nodes, &self.groups, mass)?;
            }
            Some(MassMatrix::Lumped(mass)) => {
                self.assembler
                    .assemble_lumped_mass(&self.nodes, &self.groups, mass)?;
            }
            None => {}
        }
        self.stage = Stage::Assembled;
        info!("assembled global matrices ({} elements)", self.num_elements());
        Ok(())
    }

    /// Fill the force vector with load case `load_case` (1-based).
    pub fn assemble_force(&mut self, load_case: usize) -> Result<ForceReport> {
        self.require_at_least("assemble force vector", Stage::Assembled)?;
        let case = load_case
            .checked_sub(1)
            .and_then(|k| self.load_cases.get(k))
            .ok_or_else(|| {
                Error::malformed(
                    format!("load case {load_case}"),
                    format!("outside 1..={}", self.load_cases.len()),
                )
            })?;

        self.force_state = ForceState::Empty;
        let report = Assembler::assemble_force(&self.nodes, case, &mut self.force)?;
        self.force_state = ForceState::Load(load_case);
        info!(
            "load case {load_case}: {} loads applied, {} dropped",
            report.applied,
            report.dropped.len()
        );
        Ok(report)
    }

    /// Hand the stiffness matrix and the load vector to `solver`; the force buffer
    /// holds the displacement afterwards.
    pub fn solve(&mut self, solver: &mut dyn Solver) -> Result<()> {
        self.require_at_least("solve", Stage::Assembled)?;
        let ForceState::Load(case) = self.force_state else {
            return Err(Error::ForceVector(format!(
                "solve needs an assembled load vector, buffer holds {:?}",
                self.force_state
            )));
        };
        let stiffness = self.stiffness.as_ref().ok_or(Error::Stage {
            operation: "solve",
            found: self.stage,
            required: Stage::Assembled,
        })?;

        info!("solving load case {case} with {}", solver.name());
        solver.solve(stiffness, &mut self.force)?;
        self.force_state = ForceState::Displacement(case);
        self.stage = self.stage.max(Stage::Solved);
        Ok(())
    }

    /// Pass the solved load case to `outputter`.
    pub fn report(&mut self, outputter: &mut dyn Outputter) -> Result<()> {
        self.require_at_least("report", Stage::Solved)?;
        let ForceState::Displacement(case) = self.force_state else {
            return Err(Error::ForceVector(format!(
                "report needs a displacement solution, buffer holds {:?}",
                self.force_state
            )));
        };
        outputter.write_results(self, case)?;
        self.stage = Stage::Reported;
        Ok(())
    }

    fn require_exact(&self, operation: &'static str, required: Stage) -> Result<()> {
        if self.stage != required {
            return Err(Error::Stage {
                operation,
                found: self.stage,
                required,
            });
        }
        Ok(())
    }

    fn require_at_least(&self, operation: &'static str, required: Stage) -> Result<()> {
        if self.stage < required {
            return Err(Error::Stage {
                operation,
                found: self.stage,
                required,
            });
        }
        Ok(())
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn mode(&self) -> SolutionMode {
        self.mode
    }

    /// Number of equations; 0 before numbering.
    pub fn neq(&self) -> usize {
        self.neq
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn element_groups(&self) -> &[ElementGroup] {
        &self.groups
    }

    pub fn num_elements(&self) -> usize {
        self.groups.iter().map(ElementGroup::len).sum()
    }

    pub fn load_cases(&self) -> &[LoadCase] {
        &self.load_cases
    }

    pub fn history(&self) -> &[HistoryFreedom] {
        &self.history
    }

    pub fn dynamics(&self) -> Option<&Dynamics> {
        self.dynamics.as_ref()
    }

    pub fn layout(&self) -> Option<&SkylineLayout> {
        self.layout.as_deref()
    }

    pub fn stiffness(&self) -> Option<&SkylineMatrix> {
        self.stiffness.as_ref()
    }

    pub fn mass(&self) -> Option<&MassMatrix> {
        self.mass.as_ref()
    }

    /// The shared force/displacement buffer, whatever it holds.
    pub fn force(&self) -> &DVector<f64> {
        &self.force
    }

    pub fn force_state(&self) -> ForceState {
        self.force_state
    }

    /// Displacement solution, once a load case has been solved.
    pub fn displacement(&self) -> Option<&DVector<f64>> {
        matches!(self.force_state, ForceState::Displacement(_)).then_some(&self.force)
    }
}

fn check_freedom(node: usize, dof: usize, num_nodes: usize, line: usize) -> Result<()> {
    if node == 0 || node > num_nodes {
        return Err(Error::malformed(
            format!("line {line}"),
            format!("node {node} is outside 1..={num_nodes}"),
        ));
    }
    if dof == 0 || dof > NDF {
        return Err(Error::malformed(
            format!("line {line}"),
            format!("direction {dof} is outside 1..={NDF}"),
        ));
    }
    Ok(())
}
