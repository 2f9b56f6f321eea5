#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IntegrationError {
    #[error("simpson integration requires at least 2 points, got {actual}")]
    InsufficientPoints { actual: usize },
    #[error("simpson input length mismatch: x={x}, y={y}")]
    LengthMismatch { x: usize, y: usize },
    #[error(
        "simpson abscissa must be strictly increasing, index {index} has {current} after {previous}"
    )]
    NonIncreasingAbscissa {
        index: usize,
        previous: f64,
        current: f64,
    },
}

/// Composite Simpson rule on a possibly non-uniform grid (`scipy.integrate.simpson`).
///
/// With an odd number of intervals the last one is integrated with the quadratic
/// end correction through the final three points, so the rule stays exact for
/// quadratics on any grid and for cubics on an even number of uniform intervals.
pub fn integrate_simpson(y: &[f64], x: &[f64]) -> Result<f64, IntegrationError> {
    validate_input(y, x)?;

    let point_count = y.len();
    if point_count == 2 {
        return Ok(0.5 * (x[1] - x[0]) * (y[0] + y[1]));
    }

    let even_points = point_count % 2 == 0;
    let simpson_points = if even_points {
        point_count - 1
    } else {
        point_count
    };

    let mut integral = 0.0;
    let mut start = 0;
    while start + 2 < simpson_points {
        integral += simpson_panel(&x[start..start + 3], &y[start..start + 3]);
        start += 2;
    }

    if even_points {
        let last = point_count - 1;
        let h0 = x[last - 1] - x[last - 2];
        let h1 = x[last] - x[last - 1];
        let alpha = (2.0 * h1 * h1 + 3.0 * h0 * h1) / (6.0 * (h0 + h1));
        let beta = (h1 * h1 + 3.0 * h0 * h1) / (6.0 * h0);
        let eta = h1 * h1 * h1 / (6.0 * h0 * (h0 + h1));
        integral += alpha * y[last] + beta * y[last - 1] - eta * y[last - 2];
    }

    Ok(integral)
}

fn simpson_panel(x: &[f64], y: &[f64]) -> f64 {
    let h0 = x[1] - x[0];
    let h1 = x[2] - x[1];
    let hsum = h0 + h1;
    let hprod = h0 * h1;
    let ratio = h0 / h1;
    hsum / 6.0 * (y[0] * (2.0 - 1.0 / ratio) + y[1] * (hsum * hsum / hprod) + y[2] * (2.0 - ratio))
}

fn validate_input(y: &[f64], x: &[f64]) -> Result<(), IntegrationError> {
    if y.len() != x.len() {
        return Err(IntegrationError::LengthMismatch {
            x: x.len(),
            y: y.len(),
        });
    }
    if y.len() < 2 {
        return Err(IntegrationError::InsufficientPoints { actual: y.len() });
    }

    for index in 1..x.len() {
        let previous = x[index - 1];
        let current = x[index];
        if !(current > previous) {
            return Err(IntegrationError::NonIncreasingAbscissa {
                index,
                previous,
                current,
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{integrate_simpson, IntegrationError};

    fn assert_scalar_close(label: &str, expected: f64, actual: f64, tol: f64) {
        assert!(
            (expected - actual).abs() <= tol,
            "{label} expected={expected:.15e} actual={actual:.15e}"
        );
    }

    #[test]
    fn simpson_is_exact_for_cubics_on_even_interval_count() {
        let x = [0.0, 0.5, 1.0, 1.5, 2.0];
        let y: Vec<f64> = x.iter().map(|value: &f64| value.powi(3)).collect();
        let integral = integrate_simpson(&y, &x).expect("integration");
        assert_scalar_close("cubic", 4.0, integral, 1.0e-12);
    }

    #[test]
    fn simpson_end_correction_is_exact_for_quadratics() {
        let x = [0.0, 1.0, 2.0, 3.0];
        let y: Vec<f64> = x.iter().map(|value: &f64| value * value).collect();
        let integral = integrate_simpson(&y, &x).expect("integration");
        assert_scalar_close("quadratic", 9.0, integral, 1.0e-12);
    }

    #[test]
    fn simpson_handles_non_uniform_grids() {
        let x = [0.0, 0.3, 1.0, 1.2, 2.0];
        let y: Vec<f64> = x.iter().map(|value: &f64| 3.0 * value * value + 1.0).collect();
        let integral = integrate_simpson(&y, &x).expect("integration");
        assert_scalar_close("non-uniform quadratic", 10.0, integral, 1.0e-12);
    }

    #[test]
    fn two_points_fall_back_to_trapezoid() {
        let integral = integrate_simpson(&[1.0, 3.0], &[0.0, 2.0]).expect("integration");
        assert_scalar_close("trapezoid", 4.0, integral, 1.0e-15);
    }

    #[test]
    fn simpson_rejects_degenerate_input() {
        assert_eq!(
            integrate_simpson(&[1.0], &[0.0]),
            Err(IntegrationError::InsufficientPoints { actual: 1 })
        );
        assert_eq!(
            integrate_simpson(&[1.0, 2.0], &[0.0]),
            Err(IntegrationError::LengthMismatch { x: 1, y: 2 })
        );
        assert_eq!(
            integrate_simpson(&[1.0, 2.0, 3.0], &[0.0, 1.0, 1.0]),
            Err(IntegrationError::NonIncreasingAbscissa {
                index: 2,
                previous: 1.0,
                current: 1.0,
            })
        );
    }
}
