//! Material property sets, one variant per element type.
//!
//! Every set carries its set number, Young's modulus and (possibly absent) density;
//! the remaining fields belong to the element family that uses it.

use std::io;

use nalgebra::{Matrix3, Matrix4};
use serde::Serialize;
use stap_inp::Record;

use crate::elements::ElementType;
use crate::error::{Error, Result};

/// Section and elastic data of a bar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarMaterial {
    pub set: usize,
    pub modulus: f64,
    pub area: f64,
    pub density: Option<f64>,
}

/// In-plane kinematic assumption of a planar element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PlaneCondition {
    PlaneStrain,
    PlaneStress,
}

impl PlaneCondition {
    fn from_flag(flag: u32) -> Option<Self> {
        match flag {
            0 => Some(PlaneCondition::PlaneStrain),
            1 => Some(PlaneCondition::PlaneStress),
            _ => None,
        }
    }

    fn flag(self) -> u32 {
        match self {
            PlaneCondition::PlaneStrain => 0,
            PlaneCondition::PlaneStress => 1,
        }
    }
}

/// Elastic data of a 4-node planar quadrilateral.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanarMaterial {
    pub set: usize,
    pub modulus: f64,
    pub poisson: f64,
    pub thickness: f64,
    pub condition: PlaneCondition,
    pub density: Option<f64>,
}

impl PlanarMaterial {
    /// 3×3 constitutive matrix for `[εxx, εyy, γxy]`.
    pub fn constitutive(&self) -> Matrix3<f64> {
        let e = self.modulus;
        let nu = self.poisson;
        match self.condition {
            PlaneCondition::PlaneStress => {
                let factor = e / (1.0 - nu * nu);
                Matrix3::new(
                    factor,
                    factor * nu,
                    0.0,
                    factor * nu,
                    factor,
                    0.0,
                    0.0,
                    0.0,
                    factor * (1.0 - nu) / 2.0,
                )
            }
            PlaneCondition::PlaneStrain => {
                let factor = e / ((1.0 + nu) * (1.0 - 2.0 * nu));
                let c11 = factor * (1.0 - nu);
                let c12 = factor * nu;
                let c33 = factor * (1.0 - 2.0 * nu) / 2.0;
                Matrix3::new(c11, c12, 0.0, c12, c11, 0.0, 0.0, 0.0, c33)
            }
        }
    }
}

/// Elastic data of an axisymmetric solid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisymmetricMaterial {
    pub set: usize,
    pub modulus: f64,
    pub poisson: f64,
    pub density: f64,
}

impl AxisymmetricMaterial {
    /// 4×4 constitutive matrix for `[εrr, εzz, εθθ, γrz]`.
    pub fn constitutive(&self) -> Matrix4<f64> {
        let e = self.modulus;
        let nu = self.poisson;
        let factor = e / ((1.0 + nu) * (1.0 - 2.0 * nu));
        let c11 = factor * (1.0 - nu);
        let c12 = factor * nu;
        let c44 = factor * (1.0 - 2.0 * nu) / 2.0;
        Matrix4::new(
            c11, c12, c12, 0.0, //
            c12, c11, c12, 0.0, //
            c12, c12, c11, 0.0, //
            0.0, 0.0, 0.0, c44,
        )
    }
}

/// A material property set
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Material {
    Bar(BarMaterial),
    Planar(PlanarMaterial),
    Axisymmetric(AxisymmetricMaterial),
}

impl Material {
    /// Read one material record for an element group of type `element_type`.
    ///
    /// # Errors
    /// Field count or number format errors, non-positive modulus or section data, and a
    /// Poisson ratio outside `[0, 0.5)`.
    pub fn read(element_type: ElementType, record: &Record) -> Result<Self> {
        let material = match element_type {
            ElementType::Bar => {
                record.expect_len(3, 4, "bar material")?;
                Material::Bar(BarMaterial {
                    set: record.field(0, "set number")?,
                    modulus: record.field(1, "Young's modulus")?,
                    area: record.field(2, "cross-sectional area")?,
                    density: record.optional_field(3, "density")?,
                })
            }
            ElementType::Quad4 => {
                record.expect_len(5, 6, "quadrilateral material")?;
                let flag: u32 = record.field(4, "plane stress flag")?;
                let condition = PlaneCondition::from_flag(flag).ok_or_else(|| {
                    stap_inp::ParseError::new(
                        record.line,
                        format!("plane stress flag must be 0 or 1, found {flag}"),
                    )
                })?;
                Material::Planar(PlanarMaterial {
                    set: record.field(0, "set number")?,
                    modulus: record.field(1, "Young's modulus")?,
                    poisson: record.field(2, "Poisson's ratio")?,
                    thickness: record.field(3, "thickness")?,
                    condition,
                    density: record.optional_field(5, "density")?,
                })
            }
            ElementType::Ax8r => {
                record.expect_len(4, 4, "axisymmetric material")?;
                Material::Axisymmetric(AxisymmetricMaterial {
                    set: record.field(0, "set number")?,
                    modulus: record.field(1, "Young's modulus")?,
                    poisson: record.field(2, "Poisson's ratio")?,
                    density: record.field(3, "density")?,
                })
            }
        };
        material.validate(record.line)?;
        Ok(material)
    }

    fn validate(&self, line: usize) -> Result<()> {
        let context = || format!("material set {} (line {line})", self.set());
        if self.modulus() <= 0.0 {
            return Err(Error::malformed(context(), "Young's modulus must be positive"));
        }
        if self.density().is_some_and(|rho| rho < 0.0) {
            return Err(Error::malformed(context(), "density must not be negative"));
        }
        match self {
            Material::Bar(bar) if bar.area <= 0.0 => {
                Err(Error::malformed(context(), "cross-sectional area must be positive"))
            }
            Material::Planar(quad) if quad.thickness <= 0.0 => {
                Err(Error::malformed(context(), "thickness must be positive"))
            }
            Material::Planar(PlanarMaterial { poisson, .. })
            | Material::Axisymmetric(AxisymmetricMaterial { poisson, .. })
                if !(0.0..0.5).contains(poisson) =>
            {
                Err(Error::malformed(
                    context(),
                    format!("Poisson's ratio {poisson} is outside [0, 0.5)"),
                ))
            }
            _ => Ok(()),
        }
    }

    pub fn set(&self) -> usize {
        match self {
            Material::Bar(m) => m.set,
            Material::Planar(m) => m.set,
            Material::Axisymmetric(m) => m.set,
        }
    }

    pub fn modulus(&self) -> f64 {
        match self {
            Material::Bar(m) => m.modulus,
            Material::Planar(m) => m.modulus,
            Material::Axisymmetric(m) => m.modulus,
        }
    }

    pub fn density(&self) -> Option<f64> {
        match self {
            Material::Bar(m) => m.density,
            Material::Planar(m) => m.density,
            Material::Axisymmetric(m) => Some(m.density),
        }
    }

    pub fn element_type(&self) -> ElementType {
        match self {
            Material::Bar(_) => ElementType::Bar,
            Material::Planar(_) => ElementType::Quad4,
            Material::Axisymmetric(_) => ElementType::Ax8r,
        }
    }

    /// Column headings of the material table for `element_type`.
    pub fn write_header(element_type: ElementType, out: &mut dyn io::Write) -> io::Result<()> {
        match element_type {
            ElementType::Bar => {
                writeln!(out, " SET       YOUNG'S     CROSS-SECTIONAL      DENSITY")?;
                writeln!(out, " NUMBER    MODULUS          AREA")?;
                writeln!(out, "               E              A               RHO")?;
            }
            ElementType::Quad4 => {
                writeln!(
                    out,
                    " SET       YOUNG'S       POISSON'S      THICKNESS   PLANE      DENSITY"
                )?;
                writeln!(
                    out,
                    " NUMBER    MODULUS         RATIO                    STRESS"
                )?;
                writeln!(
                    out,
                    "               E              NU             T       SS          RHO"
                )?;
            }
            ElementType::Ax8r => {
                writeln!(out, " SET       YOUNG'S       POISSON'S       DENSITY")?;
                writeln!(out, " NUMBER    MODULUS         RATIO")?;
                writeln!(out, "               E              NU             RHO")?;
            }
        }
        Ok(())
    }

    /// One row of the material table.
    pub fn write(&self, out: &mut dyn io::Write) -> io::Result<()> {
        let density = |rho: Option<f64>| rho.map_or_else(|| format!("{:>15}", "-"), fmt_real);
        match self {
            Material::Bar(m) => writeln!(
                out,
                "{:>5}{}{}{}",
                m.set,
                fmt_real(m.modulus),
                fmt_real(m.area),
                density(m.density)
            ),
            Material::Planar(m) => writeln!(
                out,
                "{:>5}{}{}{}{:>8}{}",
                m.set,
                fmt_real(m.modulus),
                fmt_real(m.poisson),
                fmt_real(m.thickness),
                m.condition.flag(),
                density(m.density)
            ),
            Material::Axisymmetric(m) => writeln!(
                out,
                "{:>5}{}{}{}",
                m.set,
                fmt_real(m.modulus),
                fmt_real(m.poisson),
                fmt_real(m.density)
            ),
        }
    }
}

fn fmt_real(value: f64) -> String {
    format!("{value:>15.6e}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn record(raw: &str) -> Record {
        Record::from_line(10, raw)
    }

    #[test]
    fn reads_bar_material_with_optional_density() {
        let m = Material::read(ElementType::Bar, &record("1 2.0e5 0.01")).unwrap();
        assert_eq!(m.set(), 1);
        assert_relative_eq!(m.modulus(), 2.0e5);
        assert!(m.density().is_none());

        let m = Material::read(ElementType::Bar, &record("2 2.0e5 0.01 7800")).unwrap();
        assert_eq!(m.density(), Some(7800.0));
    }

    #[test]
    fn reads_planar_material() {
        let m = Material::read(ElementType::Quad4, &record("1 1000 0.25 0.5 1")).unwrap();
        let Material::Planar(quad) = m else {
            panic!("expected planar material");
        };
        assert_eq!(quad.condition, PlaneCondition::PlaneStress);
        assert_relative_eq!(quad.thickness, 0.5);
    }

    #[test]
    fn reads_axisymmetric_material() {
        let m = Material::read(ElementType::Ax8r, &record("1 2.1e11 0.3 7850")).unwrap();
        assert_eq!(m.element_type(), ElementType::Ax8r);
        assert_eq!(m.density(), Some(7850.0));
    }

    #[test]
    fn rejects_bad_plane_flag() {
        let err = Material::read(ElementType::Quad4, &record("1 1000 0.25 0.5 2")).unwrap_err();
        assert!(matches!(err, Error::Parse(e) if e.line == 10));
    }

    #[test]
    fn rejects_missing_fields() {
        assert!(Material::read(ElementType::Ax8r, &record("1 2.1e11 0.3")).is_err());
        assert!(Material::read(ElementType::Bar, &record("1 2.1e11")).is_err());
    }

    #[test]
    fn rejects_non_physical_values() {
        for raw in ["1 0 0.01", "1 2e5 -1"] {
            assert!(matches!(
                Material::read(ElementType::Bar, &record(raw)),
                Err(Error::MalformedInput { .. })
            ));
        }
        assert!(matches!(
            Material::read(ElementType::Ax8r, &record("1 2e5 0.5 1")),
            Err(Error::MalformedInput { .. })
        ));
    }

    #[test]
    fn plane_stress_and_strain_differ() {
        let mut quad = PlanarMaterial {
            set: 1,
            modulus: 1.0,
            poisson: 0.25,
            thickness: 1.0,
            condition: PlaneCondition::PlaneStress,
            density: None,
        };
        let stress = quad.constitutive();
        assert_relative_eq!(stress[(0, 0)], 1.0 / (1.0 - 0.0625));
        assert_relative_eq!(stress[(2, 2)], 0.4, epsilon = 1e-12);

        quad.condition = PlaneCondition::PlaneStrain;
        let strain = quad.constitutive();
        assert_relative_eq!(strain[(0, 0)], 0.75 / (1.25 * 0.5));
        assert_relative_eq!(strain[(2, 2)], 0.4, epsilon = 1e-12);
    }

    #[test]
    fn axisymmetric_constitutive_is_symmetric() {
        let m = AxisymmetricMaterial {
            set: 1,
            modulus: 100.0,
            poisson: 0.3,
            density: 1.0,
        };
        let d = m.constitutive();
        assert_eq!(d, d.transpose());
        assert!(d.diagonal().iter().all(|&v| v > 0.0));
    }

    #[test]
    fn writes_one_row_per_set() {
        let m = Material::read(ElementType::Bar, &record("3 2.0e5 0.01")).unwrap();
        let mut out = Vec::new();
        Material::write_header(ElementType::Bar, &mut out).unwrap();
        m.write(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let row = text.lines().last().unwrap();
        assert!(row.starts_with("    3"));
        assert!(row.contains("2.000000e5"));
        assert!(row.trim_end().ends_with('-'));
    }
}
