//! Contract for equation solvers consuming the assembled skyline system.

use nalgebra::DVector;

use crate::error::Result;
use crate::skyline_matrix::SkylineMatrix;

/// Solves `K u = f` in place.
///
/// On entry `rhs` holds the load vector of the current load case; on success it holds
/// the displacement solution. A singular or ill-conditioned `stiffness` is reported as
/// [`crate::Error::SingularSystem`].
pub trait Solver {
    fn solve(&mut self, stiffness: &SkylineMatrix, rhs: &mut DVector<f64>) -> Result<()>;

    /// Solver name for logs.
    fn name(&self) -> &str {
        "solver"
    }
}
