//! 2-node bar element for tension/compression.
//!
//! The bar resists only axial force. Each node couples its three translations.
//!
//! Local stiffness along the bar axis:
//! ```text
//! k_local = (E*A/L) * [ 1  -1]
//!                     [-1   1]
//! ```
//!
//! projected to global axes with `k = Tᵀ k_local T`, where
//! ```text
//! T = [l  m  n  0  0  0]
//!     [0  0  0  l  m  n]
//! ```
//! and (l, m, n) are the direction cosines of the axis.

use nalgebra::DMatrix;
use serde::Serialize;

use crate::elements::{ElementKernel, ElementType};
use crate::error::{Error, Result};
use crate::materials::BarMaterial;
use crate::node::Node;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    pub id: usize,
    /// Arena indices of the end nodes
    pub nodes: [usize; 2],
    /// Index into the group material list
    pub material: usize,
}

impl Bar {
    pub fn new(id: usize, nodes: [usize; 2], material: usize) -> Self {
        Self {
            id,
            nodes,
            material,
        }
    }

    fn length(&self, nodes: &[Node]) -> Result<f64> {
        let length = nodes[self.nodes[0]].distance_to(&nodes[self.nodes[1]]);
        if length < 1e-10 {
            return Err(Error::DegenerateElement {
                element: self.id,
                message: format!("zero or near-zero length {length:e}"),
            });
        }
        Ok(length)
    }

    fn direction_cosines(&self, nodes: &[Node]) -> Result<[f64; 3]> {
        let length = self.length(nodes)?;
        let a = nodes[self.nodes[0]].coords;
        let b = nodes[self.nodes[1]].coords;
        Ok([
            (b[0] - a[0]) / length,
            (b[1] - a[1]) / length,
            (b[2] - a[2]) / length,
        ])
    }

    fn transformation_matrix(&self, nodes: &[Node]) -> Result<DMatrix<f64>> {
        let [l, m, n] = self.direction_cosines(nodes)?;
        let mut t = DMatrix::zeros(2, 6);
        t[(0, 0)] = l;
        t[(0, 1)] = m;
        t[(0, 2)] = n;
        t[(1, 3)] = l;
        t[(1, 4)] = m;
        t[(1, 5)] = n;
        Ok(t)
    }
}

impl ElementKernel for Bar {
    type Material = BarMaterial;

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
        ElementType::Bar.freedoms()
    }

    fn stiffness(&self, nodes: &[Node], material: &BarMaterial) -> Result<DMatrix<f64>> {
        let length = self.length(nodes)?;
        let k = material.modulus * material.area / length;
        let k_local = DMatrix::from_row_slice(2, 2, &[k, -k, -k, k]);
        let t = self.transformation_matrix(nodes)?;
        Ok(t.transpose() * k_local * t)
    }

    /// `ρAL/6 · [2 1; 1 2]` in each global direction.
    fn mass(&self, nodes: &[Node], material: &BarMaterial) -> Result<DMatrix<f64>> {
        let density = material.density.ok_or_else(|| {
            Error::malformed(
                format!("material set {}", material.set),
                "density is required for mass assembly",
            )
        })?;
        let c = density * material.area * self.length(nodes)? / 6.0;
        let mut m = DMatrix::zeros(6, 6);
        for d in 0..3 {
            m[(d, d)] = 2.0 * c;
            m[(3 + d, 3 + d)] = 2.0 * c;
            m[(d, 3 + d)] = c;
            m[(3 + d, d)] = c;
        }
        Ok(m)
    }
}
