//! End-to-end runs: deck text through numbering, sizing, assembly, solution and
//! reporting, with a dense Cholesky solver standing in for a skyline factorisation.

use approx::assert_relative_eq;
use nalgebra::DVector;
use stap_core::{
    AnalysisConfig, Domain, Error, MassMatrix, Outputter, Result, SkylineMatrix, SolutionMode,
    Solver, Stage,
};
use stap_inp::Deck;

struct DenseCholesky;

impl Solver for DenseCholesky {
    fn solve(&mut self, stiffness: &SkylineMatrix, rhs: &mut DVector<f64>) -> Result<()> {
        if stiffness.diagonal().iter().any(|&d| d <= 0.0) {
            return Err(Error::SingularSystem("non-positive diagonal entry".into()));
        }
        let cholesky = stiffness
            .to_dense()
            .cholesky()
            .ok_or_else(|| Error::SingularSystem("matrix is not positive definite".into()))?;
        let solution = cholesky.solve(&*rhs);
        rhs.copy_from(&solution);
        Ok(())
    }
}

#[derive(Default)]
struct Collect {
    displacements: Vec<DVector<f64>>,
}

impl Outputter for Collect {
    fn write_results(&mut self, domain: &Domain, _load_case: usize) -> Result<()> {
        if let Some(u) = domain.displacement() {
            self.displacements.push(u.clone());
        }
        Ok(())
    }
}

fn run(text: &str, config: AnalysisConfig) -> (Domain, Vec<DVector<f64>>) {
    let deck = Deck::parse_str(text).expect("deck parses");
    let mut domain = Domain::new(config);
    domain.load(&deck).expect("load");
    domain.number_equations().expect("numbering");
    domain.allocate_matrices().expect("sizing");
    domain.assemble().expect("assembly");

    let mut solver = DenseCholesky;
    let mut out = Collect::default();
    for case in 1..=domain.load_cases().len() {
        domain.assemble_force(case).expect("force");
        domain.solve(&mut solver).expect("solve");
        domain.report(&mut out).expect("report");
    }
    (domain, out.displacements)
}

/// One bar, E = A = L = 1; node 1 fixed, node 2 free only along x.
const SINGLE_BAR: &str = "\
single bar
2 1 1 1
1 1 1 1 0.0 0.0 0.0
2 0 1 1 1.0 0.0 0.0
1 1
2 1 1.0
1 1 1
1 1.0 1.0
1 1 2 1
";

#[test]
fn single_bar_scenario() {
    let (domain, u) = run(SINGLE_BAR, AnalysisConfig::default());
    assert_eq!(domain.neq(), 1);
    assert_eq!(domain.layout().unwrap().heights(), &[0]);
    assert_eq!(domain.stiffness().unwrap().values(), &[1.0]);
    assert_relative_eq!(u[0][0], 1.0);
    assert_eq!(domain.stage(), Stage::Reported);
}

/// Plane-stress strip on a 3×3 node grid, left edge clamped, z restrained everywhere.
const PLATE: &str = "\
plate strip
# 2 x 2 quadrilateral mesh
9 1 2 1
1 1 1 1 0.0 0.0 0.0
2 0 0 1 1.0 0.0 0.0
3 0 0 1 2.0 0.0 0.0
4 1 1 1 0.0 1.0 0.0
5 0 0 1 1.0 1.0 0.0
6 0 0 1 2.0 1.0 0.0
7 1 1 1 0.0 2.0 0.0
8 0 0 1 1.0 2.0 0.0
9 0 0 1 2.0 2.0 0.0
1 2
3 1 10.0
9 1 10.0
2 2
6 2 -5.0
1 1 99.0
2 4 1
1 1000.0 0.25 1.0 1
1 1 2 5 4 1
2 2 3 6 5 1
3 4 5 8 7 1
4 5 6 9 8 1
";

#[test]
fn plate_displacements_satisfy_equilibrium() {
    let (domain, u) = run(PLATE, AnalysisConfig::default());
    assert_eq!(domain.neq(), 12);
    assert_eq!(u.len(), 2);

    let k = domain.stiffness().unwrap().to_dense();
    let mut f = DVector::zeros(12);
    // Node 3 x and node 9 x.
    let eq3 = domain.nodes()[2].equation(0);
    let eq9 = domain.nodes()[8].equation(0);
    f[eq3 - 1] = 10.0;
    f[eq9 - 1] = 10.0;
    let residual = &k * &u[0] - f;
    assert!(residual.norm() < 1e-9);

    // Symmetric about y = 1.
    assert_relative_eq!(u[0][eq3 - 1], u[0][eq9 - 1], epsilon = 1e-12);
    assert!(u[0][eq3 - 1] > 0.0);
}

#[test]
fn plate_dropped_load_does_not_reach_the_system() {
    let deck = Deck::parse_str(PLATE).unwrap();
    let mut domain = Domain::new(AnalysisConfig::default());
    domain.load(&deck).unwrap();
    domain.number_equations().unwrap();
    domain.allocate_matrices().unwrap();
    domain.assemble().unwrap();

    let report = domain.assemble_force(2).unwrap();
    assert_eq!(report.applied, 1);
    assert_eq!(report.dropped.len(), 1);
    assert_eq!(report.dropped[0].node, 1);
    let total: f64 = domain.force().iter().sum();
    assert_relative_eq!(total, -5.0);
}

/// Three-bar space truss with one free apex node.
const TRIPOD: &str = "\
tripod
4 1 1 1
1 1 1 1 1.0 0.0 0.0
2 1 1 1 -0.5 0.8660254037844386 0.0
3 1 1 1 -0.5 -0.8660254037844386 0.0
4 0 0 0 0.0 0.0 1.0
1 1
4 3 -30.0
1 3 1
1 2.0e5 0.01
1 1 4 1
2 2 4 1
3 3 4 1
";

#[test]
fn tripod_carries_vertical_load_symmetrically() {
    let (domain, u) = run(TRIPOD, AnalysisConfig::default());
    assert_eq!(domain.neq(), 3);

    let u = &u[0];
    assert_relative_eq!(u[0], 0.0, epsilon = 1e-12);
    assert_relative_eq!(u[1], 0.0, epsilon = 1e-12);

    // Each bar has length √2 and direction cosine n = 1/√2 onto z:
    // k_zz = 3 · EA/L · n² = 3 · EA / (2√2).
    let ea = 2.0e5 * 0.01;
    let k_zz = 3.0 * ea / (2.0 * 2.0_f64.sqrt());
    assert_relative_eq!(u[2], -30.0 / k_zz, epsilon = 1e-12);
}

/// One 8-node axisymmetric ring element, bottom edge held axially, modal run.
const RING: &str = "\
axisymmetric ring
8 1 1 2
1 0 1 1 1.0 0.0 0.0
2 0 1 1 2.0 0.0 0.0
3 0 0 1 2.0 1.0 0.0
4 0 0 1 1.0 1.0 0.0
5 0 1 1 1.5 0.0 0.0
6 0 0 1 2.0 0.5 0.0
7 0 0 1 1.5 1.0 0.0
8 0 0 1 1.0 0.5 0.0
1 1
3 2 -1.0
3 1 1
1 1000.0 0.3 2.0
1 1 2 3 4 5 6 7 8 1
";

#[test]
fn modal_ring_assembles_consistent_mass() {
    let deck = Deck::parse_str(RING).unwrap();
    let mut domain = Domain::new(AnalysisConfig::default());
    domain.load(&deck).unwrap();
    assert_eq!(domain.mode(), SolutionMode::Modal);
    domain.number_equations().unwrap();
    domain.allocate_matrices().unwrap();
    domain.assemble().unwrap();

    // 3 nodes free in r only, 5 free in r and z.
    assert_eq!(domain.neq(), 13);
    let Some(MassMatrix::Consistent(mass)) = domain.mass() else {
        panic!("modal run should carry a consistent mass matrix");
    };
    assert_eq!(mass.layout(), domain.layout().unwrap());
    let dense = mass.to_dense();
    assert_relative_eq!(dense.clone(), dense.transpose(), epsilon = 1e-12);

    let stiffness = domain.stiffness().unwrap();
    assert!(stiffness.diagonal().iter().all(|&k| k > 0.0));
}

#[test]
fn lumped_mass_vector_has_one_entry_per_equation() {
    let config = AnalysisConfig {
        mass: stap_core::MassFormulation::Lumped,
        ..AnalysisConfig::default()
    };
    let deck = Deck::parse_str(RING).unwrap();
    let mut domain = Domain::new(config);
    domain.load(&deck).unwrap();
    domain.number_equations().unwrap();
    domain.allocate_matrices().unwrap();
    domain.assemble().unwrap();

    let Some(MassMatrix::Lumped(mass)) = domain.mass() else {
        panic!("expected lumped mass");
    };
    assert_eq!(mass.len(), domain.neq());

    // Every node is free radially, so the radial rows together carry the full ring
    // mass ρV = 2 · 3π.
    let radial: f64 = domain
        .nodes()
        .iter()
        .map(|n| mass[n.equation(0) - 1])
        .sum();
    assert_relative_eq!(radial, 6.0 * std::f64::consts::PI, epsilon = 1e-9);
}

#[test]
fn singular_system_is_reported_by_the_solver() {
    // Node 2 is also free in y, which the bar does not resist.
    let text = SINGLE_BAR.replacen("2 0 1 1 1.0", "2 0 0 1 1.0", 1);
    let deck = Deck::parse_str(&text).unwrap();
    let mut domain = Domain::new(AnalysisConfig::default());
    domain.load(&deck).unwrap();
    domain.number_equations().unwrap();
    domain.allocate_matrices().unwrap();
    domain.assemble().unwrap();
    domain.assemble_force(1).unwrap();

    let err = domain.solve(&mut DenseCholesky).unwrap_err();
    assert!(matches!(err, Error::SingularSystem(_)));
    assert_eq!(domain.stage(), Stage::Assembled);
}
