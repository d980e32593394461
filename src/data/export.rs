//! CSV export of training matrices
//!
//! One header line of column names, then one comma-separated line per row.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::matrix::Matrix;
use crate::{NordicError, Result};

/// Column names `f0..f(k-1)` for features followed by `y0..y(m-1)` for responses
pub fn default_header(feature_width: usize, response_width: usize) -> Vec<String> {
    (0..feature_width)
        .map(|i| format!("f{}", i))
        .chain((0..response_width).map(|i| format!("y{}", i)))
        .collect()
}

/// Write `matrix` under `header`, creating parent directories as needed
pub fn write_csv<P: AsRef<Path>>(path: P, matrix: &Matrix, header: &[String]) -> Result<()> {
    let path = path.as_ref();
    if header.len() != matrix.cols() {
        return Err(NordicError::Config(format!(
            "{} column names for {} columns",
            header.len(),
            matrix.cols()
        )));
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut out = BufWriter::new(File::create(path)?);
    writeln!(out, "{}", header.join(","))?;
    for row in matrix.iter_rows() {
        let line: Vec<String> = row.iter().map(|v| v.to_string()).collect();
        writeln!(out, "{}", line.join(","))?;
    }
    out.flush()?;

    log::info!(
        "Wrote {} rows x {} columns to {}",
        matrix.rows(),
        matrix.cols(),
        path.display()
    );
    Ok(())
}

/// Read a matrix written by [`write_csv`], returning it with its header
pub fn read_csv<P: AsRef<Path>>(path: P) -> Result<(Vec<String>, Matrix)> {
    let path = path.as_ref();
    let mut lines = BufReader::new(File::open(path)?).lines();

    let header: Vec<String> = match lines.next() {
        Some(line) => line?.split(',').map(|s| s.trim().to_string()).collect(),
        None => return Err(NordicError::Parse(format!("{}: empty file", path.display()))),
    };

    let mut rows = Vec::new();
    for (n, line) in lines.enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let row = line
            .split(',')
            .map(|field| {
                field.trim().parse::<f64>().map_err(|e| {
                    NordicError::Parse(format!(
                        "{} line {}: {:?}: {}",
                        path.display(),
                        n + 2,
                        field,
                        e
                    ))
                })
            })
            .collect::<Result<Vec<f64>>>()?;
        rows.push(row);
    }

    let matrix = if rows.is_empty() {
        Matrix::zeros(0, header.len())
    } else {
        Matrix::from_rows(&rows)?
    };
    if matrix.cols() != header.len() {
        return Err(NordicError::Parse(format!(
            "{}: {} columns under a {} column header",
            path.display(),
            matrix.cols(),
            header.len()
        )));
    }
    Ok((header, matrix))
}
