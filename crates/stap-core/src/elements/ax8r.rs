//! 8-node serendipity axisymmetric solid with reduced integration (AX8R).
//!
//! The mesh lives in the r-z plane: node x is the radius r, node y the axial
//! coordinate z. Each node couples (u_r, u_z), giving a 16×16 element matrix.
//!
//! ```text
//!  4----7----3
//!  |         |
//!  8         6
//!  |         |
//!  1----5----2
//! ```
//!
//! Strains are `[εrr, εzz, εθθ, γrz]` with hoop strain `εθθ = u_r / r`. Volume
//! integrals run over the full circumference, `dV = 2πr dr dz`. Stiffness uses the
//! reduced 2×2 rule, mass the full 3×3 rule.

use std::f64::consts::PI;

use nalgebra::DMatrix;
use serde::Serialize;

use crate::elements::gauss::gauss_quad;
use crate::elements::{ElementKernel, ElementType, physical_derivatives};
use crate::error::{Error, Result};
use crate::materials::AxisymmetricMaterial;
use crate::node::Node;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ax8r {
    pub id: usize,
    pub nodes: [usize; 8],
    pub material: usize,
}

impl Ax8r {
    pub fn new(id: usize, nodes: [usize; 8], material: usize) -> Self {
        Self {
            id,
            nodes,
            material,
        }
    }

    fn shape_functions(xi: f64, eta: f64) -> [f64; 8] {
        let xi2 = xi * xi;
        let eta2 = eta * eta;
        [
            0.25 * (1.0 - xi) * (1.0 - eta) * (-xi - eta - 1.0),
            0.25 * (1.0 + xi) * (1.0 - eta) * (xi - eta - 1.0),
            0.25 * (1.0 + xi) * (1.0 + eta) * (xi + eta - 1.0),
            0.25 * (1.0 - xi) * (1.0 + eta) * (-xi + eta - 1.0),
            0.5 * (1.0 - xi2) * (1.0 - eta),
            0.5 * (1.0 + xi) * (1.0 - eta2),
            0.5 * (1.0 - xi2) * (1.0 + eta),
            0.5 * (1.0 - xi) * (1.0 - eta2),
        ]
    }

    fn shape_function_derivatives(xi: f64, eta: f64) -> [(f64, f64); 8] {
        [
            (
                0.25 * (1.0 - eta) * (2.0 * xi + eta),
                0.25 * (1.0 - xi) * (xi + 2.0 * eta),
            ),
            (
                0.25 * (1.0 - eta) * (2.0 * xi - eta),
                0.25 * (1.0 + xi) * (-xi + 2.0 * eta),
            ),
            (
                0.25 * (1.0 + eta) * (2.0 * xi + eta),
                0.25 * (1.0 + xi) * (xi + 2.0 * eta),
            ),
            (
                0.25 * (1.0 + eta) * (2.0 * xi - eta),
                0.25 * (1.0 - xi) * (-xi + 2.0 * eta),
            ),
            (-xi * (1.0 - eta), -0.5 * (1.0 - xi * xi)),
            (0.5 * (1.0 - eta * eta), -(1.0 + xi) * eta),
            (-xi * (1.0 + eta), 0.5 * (1.0 - xi * xi)),
            (-0.5 * (1.0 - eta * eta), -(1.0 - xi) * eta),
        ]
    }

    fn coords(&self, nodes: &[Node]) -> [[f64; 3]; 8] {
        self.nodes.map(|n| nodes[n].coords)
    }

    /// Radius at a Gauss point; the hoop strain is undefined on the axis.
    fn radius(&self, coords: &[[f64; 3]; 8], n: &[f64; 8]) -> Result<f64> {
        let r: f64 = n.iter().zip(coords).map(|(n, c)| n * c[0]).sum();
        if r <= 0.0 {
            return Err(Error::DegenerateElement {
                element: self.id,
                message: format!("non-positive radius {r:.3e} at an integration point"),
            });
        }
        Ok(r)
    }
}

impl ElementKernel for Ax8r {
    type Material = AxisymmetricMaterial;

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
        ElementType::Ax8r.freedoms()
    }

    fn stiffness(&self, nodes: &[Node], material: &AxisymmetricMaterial) -> Result<DMatrix<f64>> {
        let coords = self.coords(nodes);
        let d = material.constitutive();
        let mut k = DMatrix::zeros(16, 16);

        for gp in gauss_quad(2) {
            let n = Self::shape_functions(gp.xi, gp.eta);
            let natural = Self::shape_function_derivatives(gp.xi, gp.eta);
            let (dn, det_j) = physical_derivatives(self.id, &coords, &natural)?;
            let r = self.radius(&coords, &n)?;

            let mut b = DMatrix::zeros(4, 16);
            for (i, &(dr, dz)) in dn.iter().enumerate() {
                b[(0, 2 * i)] = dr;
                b[(1, 2 * i + 1)] = dz;
                b[(2, 2 * i)] = n[i] / r;
                b[(3, 2 * i)] = dz;
                b[(3, 2 * i + 1)] = dr;
            }
            let db = d * &b;
            k += b.transpose() * db * (gp.weight * 2.0 * PI * r * det_j);
        }
        Ok(k)
    }

    fn mass(&self, nodes: &[Node], material: &AxisymmetricMaterial) -> Result<DMatrix<f64>> {
        let coords = self.coords(nodes);
        let mut m = DMatrix::zeros(16, 16);

        for gp in gauss_quad(3) {
            let n = Self::shape_functions(gp.xi, gp.eta);
            let natural = Self::shape_function_derivatives(gp.xi, gp.eta);
            let (_, det_j) = physical_derivatives(self.id, &coords, &natural)?;
            let r = self.radius(&coords, &n)?;
            let factor = gp.weight * material.density * 2.0 * PI * r * det_j;
            for a in 0..8 {
                for b in 0..8 {
                    let value = factor * n[a] * n[b];
                    m[(2 * a, 2 * b)] += value;
                    m[(2 * a + 1, 2 * b + 1)] += value;
                }
            }
        }
        Ok(m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::DVector;

    fn material() -> AxisymmetricMaterial {
        AxisymmetricMaterial {
            set: 1,
            modulus: 1000.0,
            poisson: 0.3,
            density: 3.0,
        }
    }

    /// Unit square in the r-z plane spanning r in [r0, r0 + 1].
    fn ring(r0: f64) -> Vec<Node> {
        let points = [
            [r0, 0.0],
            [r0 + 1.0, 0.0],
            [r0 + 1.0, 1.0],
            [r0, 1.0],
            [r0 + 0.5, 0.0],
            [r0 + 1.0, 0.5],
            [r0 + 0.5, 1.0],
            [r0, 0.5],
        ];
        points
            .iter()
            .enumerate()
            .map(|(i, p)| Node::free(i + 1, [p[0], p[1], 0.0]))
            .collect()
    }

    fn element() -> Ax8r {
        Ax8r::new(1, [0, 1, 2, 3, 4, 5, 6, 7], 0)
    }

    #[test]
    fn shape_functions_are_interpolating() {
        let natural = [
            (-1.0, -1.0),
            (1.0, -1.0),
            (1.0, 1.0),
            (-1.0, 1.0),
            (0.0, -1.0),
            (1.0, 0.0),
            (0.0, 1.0),
            (-1.0, 0.0),
        ];
        for (i, &(xi, eta)) in natural.iter().enumerate() {
            let n = Ax8r::shape_functions(xi, eta);
            for (j, value) in n.iter().enumerate() {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_relative_eq!(*value, expected, epsilon = 1e-14);
            }
        }
    }

    #[test]
    fn stiffness_is_symmetric_and_free_in_axial_translation() {
        let k = element().stiffness(&ring(1.0), &material()).unwrap();
        assert_eq!(k.nrows(), 16);
        assert_relative_eq!(k.clone(), k.transpose(), epsilon = 1e-9);

        // Rigid axial translation u_z = 1 everywhere.
        let u = DVector::from_fn(16, |i, _| if i % 2 == 1 { 1.0 } else { 0.0 });
        assert!((&k * u).iter().all(|v| v.abs() < 1e-8));
    }

    #[test]
    fn radial_translation_is_resisted_by_hoop_strain() {
        let k = element().stiffness(&ring(1.0), &material()).unwrap();
        let u = DVector::from_fn(16, |i, _| if i % 2 == 0 { 1.0 } else { 0.0 });
        let energy = u.dot(&(&k * &u));
        assert!(energy > 0.0);
    }

    #[test]
    fn mass_integrates_ring_volume() {
        let m = element().mass(&ring(1.0), &material()).unwrap();
        // Ring between r = 1 and r = 2, height 1: V = π (4 - 1).
        let volume = PI * 3.0;
        assert_relative_eq!(m.sum(), 2.0 * 3.0 * volume, epsilon = 1e-9);
    }

    #[test]
    fn radius_must_stay_positive_at_gauss_points() {
        // An edge on the axis is fine, the Gauss points stay off it.
        assert!(element().stiffness(&ring(0.0), &material()).is_ok());

        let mut nodes = ring(0.0);
        for node in &mut nodes {
            node.coords[0] -= 1.0;
        }
        let err = element().stiffness(&nodes, &material()).unwrap_err();
        assert!(matches!(err, Error::DegenerateElement { element: 1, .. }));
    }
}
