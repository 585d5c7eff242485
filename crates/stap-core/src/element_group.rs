//! Element groups: elements of one type sharing one material list.

use log::debug;
use serde::Serialize;
use stap_inp::ElementGroupRecord;

use crate::elements::{Element, ElementKernel, ElementType};
use crate::error::{Error, Result};
use crate::materials::Material;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElementGroup {
    element_type: ElementType,
    materials: Vec<Material>,
    elements: Vec<Element>,
}

impl ElementGroup {
    /// Build a group, checking that every element and material matches
    /// `element_type` and that every element's material index exists.
    pub fn new(
        element_type: ElementType,
        materials: Vec<Material>,
        elements: Vec<Element>,
    ) -> Result<Self> {
        if let Some(m) = materials.iter().find(|m| m.element_type() != element_type) {
            return Err(Error::malformed(
                format!("material set {}", m.set()),
                format!("expected a {} material", element_type.name()),
            ));
        }
        for e in &elements {
            if e.element_type() != element_type {
                return Err(Error::malformed(
                    format!("element {}", e.id()),
                    format!("expected a {} element", element_type.name()),
                ));
            }
            if e.material_set() >= materials.len() {
                return Err(Error::malformed(
                    format!("element {}", e.id()),
                    format!(
                        "material set {} is outside 1..={}",
                        e.material_set() + 1,
                        materials.len()
                    ),
                ));
            }
        }
        Ok(Self {
            element_type,
            materials,
            elements,
        })
    }

    /// Read a group from its deck record. Node references are checked against
    /// `num_nodes`.
    pub fn read(record: &ElementGroupRecord, num_nodes: usize) -> Result<Self> {
        let element_type = ElementType::from_code(record.element_type).ok_or_else(|| {
            Error::malformed(
                format!("element group (line {})", record.line),
                format!("unknown element type {}", record.element_type),
            )
        })?;
        if record.materials.is_empty() {
            return Err(Error::malformed(
                format!("element group (line {})", record.line),
                "at least one material set is required",
            ));
        }

        let mut materials = Vec::with_capacity(record.materials.len());
        for (k, raw) in record.materials.iter().enumerate() {
            let material = Material::read(element_type, raw)?;
            if material.set() != k + 1 {
                return Err(Error::malformed(
                    format!("material set {} (line {})", material.set(), raw.line),
                    format!("material sets must be numbered in order, expected {}", k + 1),
                ));
            }
            materials.push(material);
        }

        let elements = record
            .elements
            .iter()
            .enumerate()
            .map(|(k, raw)| Element::read(element_type, raw, k + 1, num_nodes, materials.len()))
            .collect::<Result<Vec<_>>>()?;

        debug!(
            "read {} group: {} elements, {} material sets",
            element_type.name(),
            elements.len(),
            materials.len()
        );
        Self::new(element_type, materials, elements)
    }

    pub fn element_type(&self) -> ElementType {
        self.element_type
    }

    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Material set of `element`.
    pub fn material_of(&self, element: &Element) -> &Material {
        &self.materials[element.material_set()]
    }
}
