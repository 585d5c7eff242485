//! Input echo report.

use std::io::{self, Write};

use stap_core::{Domain, ElementKernel, Material};

pub fn write_echo(domain: &Domain, out: &mut dyn Write) -> io::Result<()> {
    writeln!(out, "TITLE : {}", domain.title())?;
    writeln!(out)?;
    writeln!(out, " C O N T R O L   I N F O R M A T I O N")?;
    writeln!(
        out,
        "    NUMBER OF NODAL POINTS . . . . (NUMNP)  = {:>8}",
        domain.nodes().len()
    )?;
    writeln!(
        out,
        "    NUMBER OF ELEMENT GROUPS . . . (NUMEG)  = {:>8}",
        domain.element_groups().len()
    )?;
    writeln!(
        out,
        "    NUMBER OF LOAD CASES . . . . . (NLCASE) = {:>8}",
        domain.load_cases().len()
    )?;
    writeln!(
        out,
        "    SOLUTION MODE  . . . . . . . . (MODEX)  = {:>8}",
        domain.mode().code()
    )?;
    writeln!(out)?;

    write_nodes(domain, out)?;
    write_equations(domain, out)?;
    write_groups(domain, out)?;
    write_loads(domain, out)
}

fn write_nodes(domain: &Domain, out: &mut dyn Write) -> io::Result<()> {
    writeln!(out, " N O D A L   P O I N T   D A T A")?;
    writeln!(
        out,
        "    NODE       BOUNDARY                         NODAL POINT"
    )?;
    writeln!(
        out,
        "   NUMBER  CONDITION  CODES                     COORDINATES"
    )?;
    for node in domain.nodes() {
        let codes = node.fixed.map(u8::from);
        writeln!(
            out,
            "{:>9}{:>5}{:>5}{:>5}{:>18.6e}{:>15.6e}{:>15.6e}",
            node.id,
            codes[0],
            codes[1],
            codes[2],
            node.coords[0],
            node.coords[1],
            node.coords[2]
        )?;
    }
    writeln!(out)
}

fn write_equations(domain: &Domain, out: &mut dyn Write) -> io::Result<()> {
    writeln!(out, " EQUATION NUMBERS")?;
    writeln!(out, "   NODE NUMBER   DEGREES OF FREEDOM")?;
    writeln!(out, "        N           X    Y    Z")?;
    for node in domain.nodes() {
        let Some(eq) = node.equations() else {
            continue;
        };
        writeln!(
            out,
            "{:>9}       {:>5}{:>5}{:>5}",
            node.id, eq[0], eq[1], eq[2]
        )?;
    }
    writeln!(out)?;
    writeln!(out, "    TOTAL NUMBER OF EQUATIONS . . . (NEQ) = {:>8}", domain.neq())?;
    writeln!(out)
}

fn write_groups(domain: &Domain, out: &mut dyn Write) -> io::Result<()> {
    writeln!(out, " E L E M E N T   G R O U P   D A T A")?;
    for (g, group) in domain.element_groups().iter().enumerate() {
        let element_type = group.element_type();
        writeln!(out)?;
        writeln!(
            out,
            " ELEMENT GROUP {:>4}: TYPE {} ({}), {} ELEMENTS, {} MATERIAL SETS",
            g + 1,
            element_type.code(),
            element_type.name(),
            group.len(),
            group.materials().len()
        )?;
        writeln!(out)?;
        Material::write_header(element_type, out)?;
        for material in group.materials() {
            material.write(out)?;
        }
        writeln!(out)?;
        writeln!(out, " ELEMENT     NODES                                      SET")?;
        for element in group.elements() {
            write!(out, "{:>8}   ", element.id())?;
            for &n in element.node_indices() {
                write!(out, "{:>6}", domain.nodes()[n].id)?;
            }
            writeln!(out, "{:>8}", element.material_set() + 1)?;
        }
    }
    writeln!(out)
}

fn write_loads(domain: &Domain, out: &mut dyn Write) -> io::Result<()> {
    writeln!(out, " L O A D   C A S E   D A T A")?;
    for case in domain.load_cases() {
        writeln!(out)?;
        writeln!(out, "    LOAD CASE NUMBER . . . . . . . = {:>8}", case.id)?;
        writeln!(
            out,
            "    NUMBER OF CONCENTRATED LOADS . = {:>8}",
            case.loads.len()
        )?;
        writeln!(out, "      NODE   DIRECTION      LOAD")?;
        for load in &case.loads {
            writeln!(
                out,
                "{:>10}{:>12}{:>15.6e}",
                load.node, load.dof, load.magnitude
            )?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use stap_core::AnalysisConfig;
    use stap_inp::Deck;

    const DECK: &str = "\
echo test
2 1 1 1
1 1 1 1 0.0 0.0 0.0
2 0 1 1 1.0 0.0 0.0
1 1
2 1 2.5
1 1 1
1 2.0e5 0.01
1 1 2 1
";

    fn echo() -> String {
        let mut domain = Domain::new(AnalysisConfig::default());
        domain.load(&Deck::parse_str(DECK).unwrap()).unwrap();
        domain.number_equations().unwrap();
        let mut out = Vec::new();
        write_echo(&domain, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn echoes_controls_and_equation_numbers() {
        let text = echo();
        assert!(text.starts_with("TITLE : echo test"));
        assert!(text.contains("(NEQ) =        1"));
        assert!(
            text.lines()
                .any(|l| l.split_whitespace().collect::<Vec<_>>() == ["2", "1", "0", "0"])
        );
    }

    #[test]
    fn echoes_material_table_and_connectivity() {
        let text = echo();
        assert!(text.contains("TYPE 1 (BAR)"));
        assert!(text.contains("2.000000e5"));
        assert!(
            text.lines()
                .any(|l| l.split_whitespace().collect::<Vec<_>>() == ["1", "1", "2", "1"])
        );
    }
}
