//! Global assembly: column heights, stiffness, mass and load vectors.
//!
//! Element matrices are computed either sequentially or on the rayon pool. In both
//! cases they are scattered into the global store in element order, so the two
//! paths produce bit-identical results.

use log::{debug, info, trace};
use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;

use crate::config::AnalysisConfig;
use crate::element_group::ElementGroup;
use crate::elements::{Element, ElementKernel};
use crate::error::{Error, Result};
use crate::load_case::{DroppedLoad, ForceReport, LoadCase};
use crate::node::{NDF, Node};
use crate::skyline::{SkylineBuilder, SkylineLayout};
use crate::skyline_matrix::SkylineMatrix;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Stiffness,
    Mass,
}

/// Local equation indices and the element matrix they address.
type Contribution = (Vec<usize>, DMatrix<f64>);

/// Scatters element contributions into global storage.
#[derive(Debug, Clone, Copy, Default)]
pub struct Assembler {
    parallel: bool,
}

impl Assembler {
    pub fn new(parallel: bool) -> Self {
        Self { parallel }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(config.parallel)
    }

    pub fn is_parallel(&self) -> bool {
        self.parallel
    }

    /// Skyline layout for the connectivity of all groups.
    ///
    /// # Errors
    /// [`Error::NoActiveEquations`] when `neq` is 0.
    pub fn column_heights(
        &self,
        nodes: &[Node],
        groups: &[ElementGroup],
        neq: usize,
    ) -> Result<SkylineLayout> {
        let empty = SkylineBuilder::new(neq)?;
        let builder = if self.parallel {
            groups
                .par_iter()
                .flat_map_iter(|g| g.elements().iter())
                .try_fold(
                    || empty.clone(),
                    |mut builder, element| {
                        builder.add_element(&element.equation_indices(nodes))?;
                        Ok::<_, Error>(builder)
                    },
                )
                .try_reduce(|| empty.clone(), |a, b| Ok(a.merge(&b)))?
        } else {
            let mut builder = empty;
            for element in groups.iter().flat_map(|g| g.elements()) {
                builder.add_element(&element.equation_indices(nodes))?;
            }
            builder
        };

        let layout = builder.finish();
        info!(
            "skyline: {} equations, {} stored entries, max half-bandwidth {}",
            layout.neq(),
            layout.len(),
            layout.max_half_bandwidth()
        );
        Ok(layout)
    }

    /// Add every element stiffness matrix into `stiffness`.
    pub fn assemble_stiffness(
        &self,
        nodes: &[Node],
        groups: &[ElementGroup],
        stiffness: &mut SkylineMatrix,
    ) -> Result<()> {
        for (g, group) in groups.iter().enumerate() {
            let contributions = self.contributions(nodes, group, Kind::Stiffness)?;
            for (indices, local) in &contributions {
                scatter(stiffness, indices, local)?;
            }
            debug!("group {}: scattered {} stiffness matrices", g + 1, contributions.len());
        }
        Ok(())
    }

    /// Add every consistent element mass matrix into `mass`, which shares the
    /// stiffness layout.
    pub fn assemble_consistent_mass(
        &self,
        nodes: &[Node],
        groups: &[ElementGroup],
        mass: &mut SkylineMatrix,
    ) -> Result<()> {
        for (g, group) in groups.iter().enumerate() {
            let contributions = self.contributions(nodes, group, Kind::Mass)?;
            for (indices, local) in &contributions {
                scatter(mass, indices, local)?;
            }
            debug!("group {}: scattered {} mass matrices", g + 1, contributions.len());
        }
        Ok(())
    }

    /// Add row-summed element mass into the diagonal vector `mass` (length NEQ).
    pub fn assemble_lumped_mass(
        &self,
        nodes: &[Node],
        groups: &[ElementGroup],
        mass: &mut DVector<f64>,
    ) -> Result<()> {
        for group in groups {
            for (indices, local) in self.contributions(nodes, group, Kind::Mass)? {
                for (p, &eq) in indices.iter().enumerate() {
                    if eq == 0 {
                        continue;
                    }
                    if eq > mass.len() {
                        return Err(Error::EquationOutOfRange {
                            row: eq,
                            col: eq,
                            neq: mass.len(),
                        });
                    }
                    mass[eq - 1] += local.row(p).sum();
                }
            }
        }
        Ok(())
    }

    /// Zero `force` and fill it with the loads of `load_case`.
    ///
    /// Loads on constrained freedoms are dropped and listed in the report.
    ///
    /// # Errors
    /// [`Error::MalformedInput`] when a load names a node outside `1..=nodes.len()` or a
    /// freedom outside `1..=NDF`; `force` is left zeroed.
    pub fn assemble_force(
        nodes: &[Node],
        load_case: &LoadCase,
        force: &mut DVector<f64>,
    ) -> Result<ForceReport> {
        force.fill(0.0);
        let mut report = ForceReport::new(load_case.id);
        for load in &load_case.loads {
            if load.node == 0 || load.node > nodes.len() {
                force.fill(0.0);
                return Err(Error::malformed(
                    format!("load case {}", load_case.id),
                    format!("load on node {} outside 1..={}", load.node, nodes.len()),
                ));
            }
            if load.dof == 0 || load.dof > NDF {
                force.fill(0.0);
                return Err(Error::malformed(
                    format!("load case {}", load_case.id),
                    format!("load direction {} outside 1..={NDF}", load.dof),
                ));
            }

            let eq = nodes[load.node - 1].equation(load.dof - 1);
            if eq == 0 {
                info!(
                    "load case {}: dropped load {} on constrained node {} direction {}",
                    load_case.id, load.magnitude, load.node, load.dof
                );
                report.dropped.push(DroppedLoad {
                    node: load.node,
                    dof: load.dof,
                    magnitude: load.magnitude,
                });
                continue;
            }
            if eq > force.len() {
                force.fill(0.0);
                return Err(Error::ForceVector(format!(
                    "equation {eq} exceeds force vector length {}",
                    force.len()
                )));
            }
            force[eq - 1] += load.magnitude;
            report.applied += 1;
        }
        Ok(report)
    }

    fn contributions(
        &self,
        nodes: &[Node],
        group: &ElementGroup,
        kind: Kind,
    ) -> Result<Vec<Contribution>> {
        let compute = |element: &Element| -> Result<Contribution> {
            let material = group.material_of(element);
            let local = match kind {
                Kind::Stiffness => element.stiffness(nodes, material)?,
                Kind::Mass => element.mass(nodes, material)?,
            };
            trace!("element {}: {kind:?} {}x{}", element.id(), local.nrows(), local.ncols());
            Ok((element.equation_indices(nodes), local))
        };

        if self.parallel {
            group.elements().par_iter().map(compute).collect()
        } else {
            group.elements().iter().map(compute).collect()
        }
    }
}

/// Upper-triangle scatter of one element matrix; constrained freedoms are skipped.
fn scatter(target: &mut SkylineMatrix, indices: &[usize], local: &DMatrix<f64>) -> Result<()> {
    for (p, &gi) in indices.iter().enumerate() {
        if gi == 0 {
            continue;
        }
        for (q, &gj) in indices.iter().enumerate().skip(p) {
            if gj == 0 {
                continue;
            }
            // (gi, gj) is canonicalised by the store.
            target.add(gi, gj, local[(p, q)])?;
        }
    }
    Ok(())
}
