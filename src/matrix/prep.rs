//! Preparation of a collected matrix for model fitting

use rand::seq::SliceRandom;
use rand::SeedableRng;

use super::Matrix;
use crate::{NordicError, Result};

/// Split a collected matrix into (features, response), the response being the
/// last `response_width` columns
pub fn split_response(matrix: &Matrix, response_width: usize) -> Result<(Matrix, Matrix)> {
    if response_width > matrix.cols() {
        return Err(NordicError::Config(format!(
            "response width {} exceeds the {} columns of the matrix",
            response_width,
            matrix.cols()
        )));
    }
    let split = matrix.cols() - response_width;
    Ok((
        matrix.select_columns(0..split),
        matrix.select_columns(split..matrix.cols()),
    ))
}

/// Prepend a column of ones
pub fn add_bias_column(matrix: &Matrix) -> Matrix {
    let mut biased = Matrix::zeros(matrix.rows(), matrix.cols() + 1);
    for r in 0..matrix.rows() {
        let out = biased.row_mut(r);
        out[0] = 1.0;
        out[1..].copy_from_slice(matrix.row(r));
    }
    biased
}

/// Z-scored matrix with the column statistics used to produce it
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub matrix: Matrix,
    pub means: Vec<f64>,
    /// Population standard deviations; zero for constant columns
    pub stds: Vec<f64>,
}

/// Z-score every column. Constant columns are only centered.
pub fn normalize(matrix: &Matrix) -> Normalized {
    let n = matrix.rows().max(1) as f64;
    let means: Vec<f64> = (0..matrix.cols())
        .map(|c| matrix.iter_rows().map(|r| r[c]).sum::<f64>() / n)
        .collect();
    let stds: Vec<f64> = (0..matrix.cols())
        .map(|c| {
            let var = matrix
                .iter_rows()
                .map(|r| (r[c] - means[c]).powi(2))
                .sum::<f64>()
                / n;
            var.sqrt()
        })
        .collect();

    let mut out = matrix.clone();
    for r in 0..out.rows() {
        for (c, value) in out.row_mut(r).iter_mut().enumerate() {
            let scale = if stds[c] > 0.0 { stds[c] } else { 1.0 };
            *value = (*value - means[c]) / scale;
        }
    }

    Normalized {
        matrix: out,
        means,
        stds,
    }
}

/// Reorder rows with a seeded shuffle
pub fn shuffle_rows(matrix: &Matrix, seed: u64) -> Matrix {
    let mut order: Vec<usize> = (0..matrix.rows()).collect();
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    order.shuffle(&mut rng);
    matrix.select_rows(&order)
}

/// Cut consecutive row blocks; block i ends at `floor(sum(fractions[..=i]) * rows)`.
/// Rows past the last block are dropped.
pub fn partition(matrix: &Matrix, fractions: &[f64]) -> Result<Vec<Matrix>> {
    if fractions.iter().any(|f| !(0.0..=1.0).contains(f)) {
        return Err(NordicError::Config(format!(
            "partition fractions must lie in [0, 1]: {:?}",
            fractions
        )));
    }
    let total: f64 = fractions.iter().sum();
    if total > 1.0 + 1e-9 {
        return Err(NordicError::Config(format!(
            "partition fractions sum to {}",
            total
        )));
    }

    let rows = matrix.rows();
    let mut parts = Vec::with_capacity(fractions.len());
    let mut start = 0;
    let mut cumulative = 0.0;
    for fraction in fractions {
        cumulative += fraction;
        let end = ((cumulative * rows as f64).floor() as usize).clamp(start, rows);
        parts.push(matrix.select_rows(&(start..end).collect::<Vec<_>>()));
        start = end;
    }
    Ok(parts)
}
