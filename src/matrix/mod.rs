//! Dense training matrices
//!
//! Row-major `f64` matrices produced by collection, and the transforms applied
//! to them before they reach a model: polynomial expansion and preparation.

pub mod polynomial;
pub mod prep;

pub use polynomial::{expand_polynomial, exponents, monomial_count, monomial_label};
pub use prep::{add_bias_column, normalize, partition, shuffle_rows, split_response, Normalized};

use crate::{NordicError, Result};

/// Row-major matrix of `f64`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Matrix {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Wrap row-major `data` as a `rows` x `cols` matrix
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self> {
        if rows.checked_mul(cols) != Some(data.len()) {
            return Err(NordicError::Config(format!(
                "{} values cannot fill a {}x{} matrix",
                data.len(),
                rows,
                cols
            )));
        }
        Ok(Matrix { rows, cols, data })
    }

    /// Build from equal-length rows
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let cols = rows.first().map_or(0, Vec::len);
        if let Some(i) = rows.iter().position(|r| r.len() != cols) {
            return Err(NordicError::Config(format!(
                "row {} has {} values, expected {}",
                i,
                rows[i].len(),
                cols
            )));
        }
        Ok(Matrix {
            rows: rows.len(),
            cols,
            data: rows.concat(),
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn row(&self, row: usize) -> &[f64] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[f64]> + '_ {
        (0..self.rows).map(move |r| self.row(r))
    }

    pub fn column(&self, col: usize) -> Vec<f64> {
        self.iter_rows().map(|r| r[col]).collect()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub(crate) fn row_mut(&mut self, row: usize) -> &mut [f64] {
        let cols = self.cols;
        &mut self.data[row * cols..(row + 1) * cols]
    }

    /// Copy of the given rows, in the given order
    pub fn select_rows(&self, rows: &[usize]) -> Matrix {
        let data = rows.iter().flat_map(|&r| self.row(r)).copied().collect();
        Matrix {
            rows: rows.len(),
            cols: self.cols,
            data,
        }
    }

    /// Columns of `self` followed by the columns of `other`
    pub fn hstack(&self, other: &Matrix) -> Result<Matrix> {
        if self.rows != other.rows {
            return Err(NordicError::Config(format!(
                "cannot join {} rows beside {} rows",
                other.rows, self.rows
            )));
        }
        let data = self
            .iter_rows()
            .zip(other.iter_rows())
            .flat_map(|(a, b)| a.iter().chain(b).copied())
            .collect();
        Ok(Matrix {
            rows: self.rows,
            cols: self.cols + other.cols,
            data,
        })
    }

    /// Copy of the columns in `range`
    pub fn select_columns(&self, range: std::ops::Range<usize>) -> Matrix {
        let cols = range.len();
        let data = self
            .iter_rows()
            .flat_map(|r| r[range.clone()].iter().copied())
            .collect();
        Matrix {
            rows: self.rows,
            cols,
            data,
        }
    }
}
