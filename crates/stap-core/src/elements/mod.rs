//! Element library.
//!
//! The set of element types is closed: [`Element`] is a tagged variant over the
//! kernels below and dispatches every [`ElementKernel`] call to the matching one.
//! Elements refer to nodes by arena index into the domain node list and to their
//! material by index into the owning group's material list.

use nalgebra::{DMatrix, Matrix2, Vector2};
use serde::Serialize;
use stap_inp::Record;

use crate::error::{Error, Result};
use crate::materials::Material;
use crate::node::Node;

pub mod ax8r;
pub mod bar;
pub mod gauss;
pub mod quad4;

pub use ax8r::Ax8r;
pub use bar::Bar;
pub use quad4::Quad4;

/// Element type code of an element group (NPAR1 in the deck).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ElementType {
    Bar,
    Quad4,
    Ax8r,
}

impl ElementType {
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            1 => Some(ElementType::Bar),
            2 => Some(ElementType::Quad4),
            3 => Some(ElementType::Ax8r),
            _ => None,
        }
    }

    pub fn code(self) -> u32 {
        match self {
            ElementType::Bar => 1,
            ElementType::Quad4 => 2,
            ElementType::Ax8r => 3,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ElementType::Bar => "BAR",
            ElementType::Quad4 => "QUAD4",
            ElementType::Ax8r => "AX8R",
        }
    }

    pub fn nodes_per_element(self) -> usize {
        match self {
            ElementType::Bar => 2,
            ElementType::Quad4 => 4,
            ElementType::Ax8r => 8,
        }
    }

    /// Node freedoms (0-based) the element couples, in local order.
    pub fn freedoms(self) -> &'static [usize] {
        match self {
            ElementType::Bar => &[0, 1, 2],
            ElementType::Quad4 | ElementType::Ax8r => &[0, 1],
        }
    }
}

/// Capability interface shared by all element kernels.
pub trait ElementKernel {
    /// Material data the kernel consumes.
    type Material;

    /// Element number (1-based within its group).
    fn id(&self) -> usize;

    /// Arena indices into the domain node list, in local node order.
    fn node_indices(&self) -> &[usize];

    /// Index into the owning group's material list.
    fn material_set(&self) -> usize;

    /// Node freedoms the element couples.
    fn freedoms(&self) -> &'static [usize];

    /// Local stiffness matrix, square and symmetric, ordered node by node and
    /// freedom by freedom.
    fn stiffness(&self, nodes: &[Node], material: &Self::Material) -> Result<DMatrix<f64>>;

    /// Consistent local mass matrix, same ordering as [`ElementKernel::stiffness`].
    fn mass(&self, nodes: &[Node], material: &Self::Material) -> Result<DMatrix<f64>>;

    /// Global equation numbers of the local freedoms; 0 marks a constrained freedom.
    fn equation_indices(&self, nodes: &[Node]) -> Vec<usize> {
        let freedoms = self.freedoms();
        let mut indices = Vec::with_capacity(self.node_indices().len() * freedoms.len());
        for &n in self.node_indices() {
            for &dof in freedoms {
                indices.push(nodes[n].equation(dof));
            }
        }
        indices
    }

    /// Smallest positive equation number the element touches.
    fn lowest_connected_equation(&self, nodes: &[Node]) -> Option<usize> {
        self.equation_indices(nodes)
            .into_iter()
            .filter(|&eq| eq != 0)
            .min()
    }
}

/// An element of any supported type
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Element {
    Bar(Bar),
    Quad4(Quad4),
    Ax8r(Ax8r),
}

impl Element {
    /// Read one element record: `N I1 .. In MSET`.
    ///
    /// `expected_id` enforces sequential numbering; node numbers must lie in
    /// `1..=num_nodes` and the material set in `1..=num_materials`.
    pub fn read(
        element_type: ElementType,
        record: &Record,
        expected_id: usize,
        num_nodes: usize,
        num_materials: usize,
    ) -> Result<Self> {
        let n = element_type.nodes_per_element();
        record.expect_len(n + 2, n + 2, element_type.name())?;

        let id: usize = record.field(0, "element number")?;
        let context = || format!("element {id} (line {})", record.line);
        if id != expected_id {
            return Err(Error::malformed(
                context(),
                format!("elements must be numbered in order, expected {expected_id}"),
            ));
        }
        let set: usize = record.field(n + 1, "material set")?;
        if set == 0 || set > num_materials {
            return Err(Error::malformed(
                context(),
                format!("material set {set} is outside 1..={num_materials}"),
            ));
        }
        let material = set - 1;

        Ok(match element_type {
            ElementType::Bar => {
                Element::Bar(Bar::new(id, read_connectivity(record, num_nodes)?, material))
            }
            ElementType::Quad4 => {
                Element::Quad4(Quad4::new(id, read_connectivity(record, num_nodes)?, material))
            }
            ElementType::Ax8r => {
                Element::Ax8r(Ax8r::new(id, read_connectivity(record, num_nodes)?, material))
            }
        })
    }

    pub fn element_type(&self) -> ElementType {
        match self {
            Element::Bar(_) => ElementType::Bar,
            Element::Quad4(_) => ElementType::Quad4,
            Element::Ax8r(_) => ElementType::Ax8r,
        }
    }

    fn material_mismatch(&self, material: &Material) -> Error {
        Error::malformed(
            format!("element {}", self.id()),
            format!(
                "{} element cannot use a {} material set",
                self.element_type().name(),
                material.element_type().name()
            ),
        )
    }
}

impl ElementKernel for Element {
    type Material = Material;

    fn id(&self) -> usize {
        match self {
            Element::Bar(e) => e.id(),
            Element::Quad4(e) => e.id(),
            Element::Ax8r(e) => e.id(),
        }
    }

    fn node_indices(&self) -> &[usize] {
        match self {
            Element::Bar(e) => e.node_indices(),
            Element::Quad4(e) => e.node_indices(),
            Element::Ax8r(e) => e.node_indices(),
        }
    }

    fn material_set(&self) -> usize {
        match self {
            Element::Bar(e) => e.material_set(),
            Element::Quad4(e) => e.material_set(),
            Element::Ax8r(e) => e.material_set(),
        }
    }

    fn freedoms(&self) -> &'static [usize] {
        self.element_type().freedoms()
    }

    fn stiffness(&self, nodes: &[Node], material: &Material) -> Result<DMatrix<f64>> {
        match (self, material) {
            (Element::Bar(e), Material::Bar(m)) => e.stiffness(nodes, m),
            (Element::Quad4(e), Material::Planar(m)) => e.stiffness(nodes, m),
            (Element::Ax8r(e), Material::Axisymmetric(m)) => e.stiffness(nodes, m),
            _ => Err(self.material_mismatch(material)),
        }
    }

    fn mass(&self, nodes: &[Node], material: &Material) -> Result<DMatrix<f64>> {
        match (self, material) {
            (Element::Bar(e), Material::Bar(m)) => e.mass(nodes, m),
            (Element::Quad4(e), Material::Planar(m)) => e.mass(nodes, m),
            (Element::Ax8r(e), Material::Axisymmetric(m)) => e.mass(nodes, m),
            _ => Err(self.material_mismatch(material)),
        }
    }
}

/// Node numbers in fields `1..=N`, converted to 0-based arena indices.
fn read_connectivity<const N: usize>(record: &Record, num_nodes: usize) -> Result<[usize; N]> {
    let mut indices = [0usize; N];
    for (k, index) in indices.iter_mut().enumerate() {
        let node: usize = record.field(k + 1, "node number")?;
        if node == 0 || node > num_nodes {
            return Err(Error::malformed(
                format!("element record (line {})", record.line),
                format!("node {node} is outside 1..={num_nodes}"),
            ));
        }
        *index = node - 1;
    }
    Ok(indices)
}

/// Map natural-coordinate shape derivatives of a planar isoparametric element to
/// physical `(∂N/∂x, ∂N/∂y)` and return them with the Jacobian determinant.
pub(crate) fn physical_derivatives<const N: usize>(
    element: usize,
    coords: &[[f64; 3]; N],
    natural: &[(f64, f64); N],
) -> Result<([(f64, f64); N], f64)> {
    let mut j = Matrix2::zeros();
    for (c, dn) in coords.iter().zip(natural) {
        j[(0, 0)] += dn.0 * c[0];
        j[(0, 1)] += dn.0 * c[1];
        j[(1, 0)] += dn.1 * c[0];
        j[(1, 1)] += dn.1 * c[1];
    }
    let det_j = j.determinant();
    if det_j <= 0.0 {
        return Err(Error::DegenerateElement {
            element,
            message: format!("non-positive Jacobian determinant {det_j:.3e}"),
        });
    }
    let j_inv = j.try_inverse().ok_or_else(|| Error::DegenerateElement {
        element,
        message: "singular Jacobian".to_string(),
    })?;

    let mut physical = [(0.0, 0.0); N];
    for (out, dn) in physical.iter_mut().zip(natural) {
        let d = j_inv * Vector2::new(dn.0, dn.1);
        *out = (d[0], d[1]);
    }
    Ok((physical, det_j))
}
