//! Contract for result writers.

use crate::domain::Domain;
use crate::error::Result;

/// Writes the results of one solved load case.
///
/// Implementations read everything through the domain's accessors; the displacement
/// vector is [`Domain::displacement`].
pub trait Outputter {
    fn write_results(&mut self, domain: &Domain, load_case: usize) -> Result<()>;
}
