//! Gauss-Legendre quadrature on `[-1, 1]` and `[-1, 1]²`.

/// A point of a tensor-product rule in natural coordinates.
#[derive(Debug, Clone, Copy)]
pub struct GaussPoint {
    pub xi: f64,
    pub eta: f64,
    pub weight: f64,
}

/// `n`-point rule on `[-1, 1]` as `(point, weight)` pairs.
///
/// # Panics
/// If `n` is not 1, 2 or 3.
pub fn gauss_1d(n: usize) -> Vec<(f64, f64)> {
    match n {
        1 => vec![(0.0, 2.0)],
        2 => {
            let p = 1.0 / 3.0_f64.sqrt();
            vec![(-p, 1.0), (p, 1.0)]
        }
        3 => {
            let p = (3.0 / 5.0_f64).sqrt();
            vec![(-p, 5.0 / 9.0), (0.0, 8.0 / 9.0), (p, 5.0 / 9.0)]
        }
        _ => panic!("gauss_1d: n must be 1, 2 or 3, got {n}"),
    }
}

/// `n × n` tensor-product rule on the reference square.
pub fn gauss_quad(n: usize) -> Vec<GaussPoint> {
    let line = gauss_1d(n);
    let mut points = Vec::with_capacity(n * n);
    for &(eta, w_eta) in &line {
        for &(xi, w_xi) in &line {
            points.push(GaussPoint {
                xi,
                eta,
                weight: w_xi * w_eta,
            });
        }
    }
    points
}
