//! Symmetric matrix in skyline storage.

use std::sync::Arc;

use nalgebra::{DMatrix, DVector};

use crate::error::{Error, Result};
use crate::skyline::SkylineLayout;

/// Upper triangle of a symmetric matrix, stored column by column from the diagonal
/// upwards in one contiguous buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct SkylineMatrix {
    layout: Arc<SkylineLayout>,
    values: Vec<f64>,
}

impl SkylineMatrix {
    /// Zero-initialised matrix sized to `layout`.
    pub fn new(layout: Arc<SkylineLayout>) -> Self {
        let values = vec![0.0; layout.len()];
        Self { layout, values }
    }

    pub fn layout(&self) -> &SkylineLayout {
        &self.layout
    }

    pub fn shared_layout(&self) -> Arc<SkylineLayout> {
        Arc::clone(&self.layout)
    }

    pub fn neq(&self) -> usize {
        self.layout.neq()
    }

    /// Stored entries in buffer order.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Accumulate `value` at `(row, col)`; `(i, j)` and `(j, i)` address the same cell.
    ///
    /// # Errors
    /// [`Error::EquationOutOfRange`] for indices outside 1..=NEQ and
    /// [`Error::LayoutViolation`] for a cell above the column height.
    pub fn add(&mut self, row: usize, col: usize, value: f64) -> Result<()> {
        let (row, col) = (row.min(col), row.max(col));
        let neq = self.neq();
        if row == 0 || col > neq {
            return Err(Error::EquationOutOfRange { row, col, neq });
        }
        if !self.layout.contains(row, col) {
            return Err(Error::LayoutViolation {
                row,
                col,
                height: self.layout.height(col),
            });
        }
        let offset = self.layout.offset(row, col);
        self.values[offset] += value;
        Ok(())
    }

    /// Entry at `(row, col)`, 0 outside the stored envelope.
    ///
    /// # Panics
    /// If either index is outside 1..=NEQ.
    pub fn get(&self, row: usize, col: usize) -> f64 {
        let (row, col) = (row.min(col), row.max(col));
        let neq = self.neq();
        assert!(
            row >= 1 && col <= neq,
            "equation index ({row}, {col}) is outside 1..={neq}"
        );
        if self.layout.contains(row, col) {
            self.values[self.layout.offset(row, col)]
        } else {
            0.0
        }
    }

    /// Diagonal entries in equation order.
    pub fn diagonal(&self) -> DVector<f64> {
        DVector::from_iterator(
            self.neq(),
            (1..=self.neq()).map(|i| self.values[self.layout.diagonal_address(i) - 1]),
        )
    }

    /// Expand into a full symmetric dense matrix (0-based).
    pub fn to_dense(&self) -> DMatrix<f64> {
        let neq = self.neq();
        let mut dense = DMatrix::zeros(neq, neq);
        for col in 1..=neq {
            for row in (col - self.layout.height(col))..=col {
                let value = self.values[self.layout.offset(row, col)];
                dense[(row - 1, col - 1)] = value;
                dense[(col - 1, row - 1)] = value;
            }
        }
        dense
    }

    /// Reset every stored entry to zero, keeping the layout.
    pub fn clear(&mut self) {
        self.values.iter_mut().for_each(|v| *v = 0.0);
    }
}
