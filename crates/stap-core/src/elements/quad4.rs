//! 4-node bilinear isoparametric quadrilateral (plane stress or plane strain).
//!
//! Nodes are numbered counter-clockwise in the x-y plane; each node couples its x and
//! y translations, giving an 8×8 element matrix. Integration uses the 2×2 Gauss rule.

use nalgebra::DMatrix;
use serde::Serialize;

use crate::elements::gauss::gauss_quad;
use crate::elements::{ElementKernel, ElementType, physical_derivatives};
use crate::error::{Error, Result};
use crate::materials::PlanarMaterial;
use crate::node::Node;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quad4 {
    pub id: usize,
    pub nodes: [usize; 4],
    pub material: usize,
}

/// Corner positions in natural coordinates.
const NODE_COORDS: [(f64, f64); 4] = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];

impl Quad4 {
    pub fn new(id: usize, nodes: [usize; 4], material: usize) -> Self {
        Self {
            id,
            nodes,
            material,
        }
    }

    fn shape_functions(xi: f64, eta: f64) -> [f64; 4] {
        NODE_COORDS.map(|(xi_i, eta_i)| 0.25 * (1.0 + xi_i * xi) * (1.0 + eta_i * eta))
    }

    fn shape_function_derivatives(xi: f64, eta: f64) -> [(f64, f64); 4] {
        NODE_COORDS.map(|(xi_i, eta_i)| {
            (
                0.25 * xi_i * (1.0 + eta_i * eta),
                0.25 * eta_i * (1.0 + xi_i * xi),
            )
        })
    }

    fn coords(&self, nodes: &[Node]) -> [[f64; 3]; 4] {
        self.nodes.map(|n| nodes[n].coords)
    }
}

impl ElementKernel for Quad4 {
    type Material = PlanarMaterial;

    fn id(&self) -> usize {
        self.id
    }

    fn node_indices(&self) -> &[usize] {
        &self.nodes
    }

    fn material_set(&self) -> usize {
        self.material
    }

    fn freedoms(&self) -> &'static [usize] {
        ElementType::Quad4.freedoms()
    }

    fn stiffness(&self, nodes: &[Node], material: &PlanarMaterial) -> Result<DMatrix<f64>> {
        let coords = self.coords(nodes);
        let d = material.constitutive();
        let mut k = DMatrix::zeros(8, 8);

        for gp in gauss_quad(2) {
            let natural = Self::shape_function_derivatives(gp.xi, gp.eta);
            let (dn, det_j) = physical_derivatives(self.id, &coords, &natural)?;

            // ε = [εxx, εyy, γxy]
            let mut b = DMatrix::zeros(3, 8);
            for (i, &(dx, dy)) in dn.iter().enumerate() {
                b[(0, 2 * i)] = dx;
                b[(1, 2 * i + 1)] = dy;
                b[(2, 2 * i)] = dy;
                b[(2, 2 * i + 1)] = dx;
            }
            let db = d * &b;
            k += b.transpose() * db * (gp.weight * material.thickness * det_j);
        }
        Ok(k)
    }

    /// `ρ t ∫ Nᵀ N dA`.
    fn mass(&self, nodes: &[Node], material: &PlanarMaterial) -> Result<DMatrix<f64>> {
        let density = material.density.ok_or_else(|| {
            Error::malformed(
                format!("material set {}", material.set),
                "density is required for mass assembly",
            )
        })?;
        let coords = self.coords(nodes);
        let mut m = DMatrix::zeros(8, 8);

        for gp in gauss_quad(2) {
            let n = Self::shape_functions(gp.xi, gp.eta);
            let natural = Self::shape_function_derivatives(gp.xi, gp.eta);
            let (_, det_j) = physical_derivatives(self.id, &coords, &natural)?;
            let factor = gp.weight * density * material.thickness * det_j;
            for a in 0..4 {
                for b in 0..4 {
                    let value = factor * n[a] * n[b];
                    m[(2 * a, 2 * b)] += value;
                    m[(2 * a + 1, 2 * b + 1)] += value;
                }
            }
        }
        Ok(m)
    }
}
