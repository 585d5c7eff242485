//! Skyline (variable-bandwidth) layout of the global symmetric matrix.
//!
//! Column `i` stores the entries from its diagonal up to `height[i]` rows above it.
//! Heights are pointwise maxima over all elements, so the element order never changes
//! the result. Equation indices are 1-based throughout; slot 0 of the internal vectors
//! is unused so that `height[i]` and `address[i]` read exactly like their definitions.

use serde::Serialize;

use crate::error::{Error, Result};

/// Accumulates column heights from element connectivity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkylineBuilder {
    heights: Vec<usize>,
}

impl SkylineBuilder {
    /// # Errors
    /// [`Error::NoActiveEquations`] when `neq` is 0.
    pub fn new(neq: usize) -> Result<Self> {
        if neq == 0 {
            return Err(Error::NoActiveEquations);
        }
        Ok(Self {
            heights: vec![0; neq + 1],
        })
    }

    pub fn neq(&self) -> usize {
        self.heights.len() - 1
    }

    /// Raise column heights for one element's equation indices. Zero entries are
    /// constrained freedoms and are ignored.
    ///
    /// # Errors
    /// [`Error::EquationOutOfRange`] when an index exceeds NEQ.
    pub fn add_element(&mut self, equations: &[usize]) -> Result<()> {
        let neq = self.neq();
        let Some(lowest) = equations.iter().copied().filter(|&e| e != 0).min() else {
            return Ok(());
        };
        for &e in equations.iter().filter(|&&e| e != 0) {
            if e > neq {
                return Err(Error::EquationOutOfRange {
                    row: lowest,
                    col: e,
                    neq,
                });
            }
            let height = e - lowest;
            if height > self.heights[e] {
                self.heights[e] = height;
            }
        }
        Ok(())
    }

    /// Pointwise maximum with another builder of the same size.
    pub fn merge(mut self, other: &SkylineBuilder) -> Self {
        debug_assert_eq!(self.heights.len(), other.heights.len());
        for (mine, theirs) in self.heights.iter_mut().zip(&other.heights) {
            *mine = (*mine).max(*theirs);
        }
        self
    }

    /// Prefix-sum the heights into diagonal addresses.
    pub fn finish(self) -> SkylineLayout {
        let neq = self.neq();
        let mut addresses = vec![0usize; neq + 2];
        addresses[1] = 1;
        for i in 1..=neq {
            addresses[i + 1] = addresses[i] + self.heights[i] + 1;
        }
        SkylineLayout {
            heights: self.heights,
            addresses,
        }
    }
}

/// Column heights and diagonal addresses of a sized skyline matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkylineLayout {
    /// `heights[i]`, i in 1..=NEQ (index 0 unused)
    heights: Vec<usize>,
    /// `addresses[i]`, i in 1..=NEQ+1 (index 0 unused)
    addresses: Vec<usize>,
}

impl SkylineLayout {
    pub fn neq(&self) -> usize {
        self.heights.len() - 1
    }

    /// Height of column `col` (1-based).
    pub fn height(&self, col: usize) -> usize {
        self.heights[col]
    }

    /// Diagonal address of column `col`, `col` in 1..=NEQ+1. Addresses are 1-based.
    pub fn diagonal_address(&self, col: usize) -> usize {
        self.addresses[col]
    }

    /// Column heights in equation order.
    pub fn heights(&self) -> &[usize] {
        &self.heights[1..]
    }

    /// Diagonal addresses, `address[1]..=address[NEQ+1]`.
    pub fn addresses(&self) -> &[usize] {
        &self.addresses[1..]
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.addresses[self.neq() + 1] - self.addresses[1]
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `(row, col)` lies within the stored envelope. Expects `row <= col`.
    pub fn contains(&self, row: usize, col: usize) -> bool {
        col - row <= self.heights[col]
    }

    /// 0-based buffer offset of `(row, col)`, `row <= col`, without envelope checks.
    pub(crate) fn offset(&self, row: usize, col: usize) -> usize {
        self.addresses[col] - 1 + (col - row)
    }

    pub fn max_half_bandwidth(&self) -> usize {
        self.heights().iter().copied().max().unwrap_or(0)
    }

    pub fn mean_half_bandwidth(&self) -> f64 {
        let heights = self.heights();
        if heights.is_empty() {
            return 0.0;
        }
        heights.iter().sum::<usize>() as f64 / heights.len() as f64
    }
}
