//! Polynomial feature expansion
//!
//! Lifts n raw columns into every monomial of total degree 0..=D. Monomials are
//! enumerated through nested degree budgets `D >= c0 >= c1 >= ... >= c(n-1) >= 0`
//! with the last budget varying fastest; the exponent of column i is
//! `c(i) - c(i+1)` and the last column takes `c(n-1)`. For two columns and
//! degree two this gives `1, x0, x1, x0^2, x0*x1, x1^2`.

use super::Matrix;
use crate::{NordicError, Result};

/// Number of monomials of total degree at most `degree` in `n` variables,
/// `C(n + degree, degree)`
pub fn monomial_count(n: usize, degree: u32) -> Result<usize> {
    let overflow = || {
        NordicError::Config(format!(
            "degree {} expansion of {} columns is too large",
            degree, n
        ))
    };
    let mut count: usize = 1;
    for k in 1..=degree as usize {
        // count == C(n + k - 1, k - 1) here, so the division is exact
        count = count
            .checked_mul(n.checked_add(k).ok_or_else(overflow)?)
            .ok_or_else(overflow)?
            / k;
    }
    Ok(count)
}

/// Exponent table of the expansion, one row per output column
pub fn exponents(n: usize, degree: u32) -> Result<Vec<Vec<u32>>> {
    let mut table = Vec::with_capacity(monomial_count(n, degree)?);
    if n == 0 {
        table.push(Vec::new());
        return Ok(table);
    }

    let mut budgets = vec![0u32; n];
    loop {
        table.push(
            (0..n)
                .map(|i| budgets[i] - budgets.get(i + 1).copied().unwrap_or(0))
                .collect(),
        );

        // Advance the rightmost budget still below its bound, reset the rest
        let Some(i) = (0..n).rev().find(|&i| {
            let bound = if i == 0 { degree } else { budgets[i - 1] };
            budgets[i] < bound
        }) else {
            break;
        };
        budgets[i] += 1;
        budgets[i + 1..].fill(0);
    }
    Ok(table)
}

/// Column label for one exponent row, e.g. `f0^2*f3`
pub fn monomial_label(exponents: &[u32], names: &[String]) -> String {
    let factors: Vec<String> = exponents
        .iter()
        .zip(names)
        .filter(|&(&e, _)| e > 0)
        .map(|(&e, name)| {
            if e == 1 {
                name.clone()
            } else {
                format!("{}^{}", name, e)
            }
        })
        .collect();
    if factors.is_empty() {
        "1".to_string()
    } else {
        factors.join("*")
    }
}

/// Expand every row of `matrix` into the full monomial basis up to `degree`
pub fn expand_polynomial(matrix: &Matrix, degree: u32) -> Result<Matrix> {
    let table = exponents(matrix.cols(), degree)?;
    let mut expanded = Matrix::zeros(matrix.rows(), table.len());

    for r in 0..matrix.rows() {
        let row = matrix.row(r);
        for (out, powers) in expanded.row_mut(r).iter_mut().zip(&table) {
            *out = row
                .iter()
                .zip(powers)
                .map(|(&x, &p)| x.powi(p as i32))
                .product();
        }
    }

    log::debug!(
        "Expanded {} columns to {} monomials of degree <= {}",
        matrix.cols(),
        table.len(),
        degree
    );
    Ok(expanded)
}
