pub mod integration;

pub use integration::{integrate_simpson, IntegrationError};

use faer::Mat;

/// Dense row-major view of spectra: one row per nuclide or transition, one column per
/// energy bin.
pub type SpectrumMatrix = Mat<f64>;

const GRID_COUNT_EPSILON: f64 = 1.0e-9;

fn kahan_add(sum: &mut f64, correction: &mut f64, value: f64) {
    let corrected = value - *correction;
    let next = *sum + corrected;
    *correction = (next - *sum) - corrected;
    *sum = next;
}

pub fn stable_sum(values: &[f64]) -> f64 {
    let mut sum = 0.0;
    let mut correction = 0.0;

    for &value in values {
        kahan_add(&mut sum, &mut correction, value);
    }

    sum
}

/// `sqrt(Σ v²)`.
pub fn quadrature_sum(values: impl IntoIterator<Item = f64>) -> f64 {
    let mut sum = 0.0;
    let mut correction = 0.0;
    for value in values {
        kahan_add(&mut sum, &mut correction, value * value);
    }
    sum.sqrt()
}

/// Points `start, start + step, …` strictly below `stop`, matching `numpy.arange`.
pub fn uniform_grid(start: f64, stop: f64, step: f64) -> Vec<f64> {
    if !(step > 0.0) || !start.is_finite() || !stop.is_finite() || stop <= start {
        return Vec::new();
    }
    let count = ((stop - start) / step - GRID_COUNT_EPSILON).ceil().max(0.0) as usize;
    (0..count).map(|index| start + step * index as f64).collect()
}

/// Piecewise-linear interpolation with edge clamping (`numpy.interp`).
///
/// `xp` must be non-decreasing. Queries outside the table take the first/last value.
pub fn interpolate_linear(x: f64, xp: &[f64], fp: &[f64]) -> f64 {
    let count = xp.len().min(fp.len());
    if count == 0 {
        return f64::NAN;
    }
    if x <= xp[0] {
        return fp[0];
    }
    if x >= xp[count - 1] {
        return fp[count - 1];
    }

    let upper = xp[..count].partition_point(|probe| *probe <= x);
    let lower = upper - 1;
    let (x0, x1) = (xp[lower], xp[upper]);
    if x1 == x0 {
        return fp[upper];
    }
    let fraction = (x - x0) / (x1 - x0);
    fp[lower] + (fp[upper] - fp[lower]) * fraction
}

pub fn matrix_from_rows(rows: &[Vec<f64>], ncols: usize) -> SpectrumMatrix {
    let mut matrix = SpectrumMatrix::zeros(rows.len(), ncols);
    for (row_index, row) in rows.iter().enumerate() {
        for (col, value) in row.iter().take(ncols).enumerate() {
            matrix[(row_index, col)] = *value;
        }
    }
    matrix
}

pub fn matrix_row(matrix: &SpectrumMatrix, row: usize) -> Vec<f64> {
    (0..matrix.ncols()).map(|col| matrix[(row, col)]).collect()
}

pub fn matrix_rows(matrix: &SpectrumMatrix) -> Vec<Vec<f64>> {
    (0..matrix.nrows()).map(|row| matrix_row(matrix, row)).collect()
}
