//! Dense vector helpers for the eigensolver

use crate::error::{Error, Result};

/// Euclidean norm
pub fn norm2(x: &[f64]) -> f64 {
    dot(x, x).sqrt()
}

/// Inner product of two equally sized vectors
pub fn dot(x: &[f64], y: &[f64]) -> f64 {
    debug_assert_eq!(x.len(), y.len());
    x.iter().zip(y).map(|(a, b)| a * b).sum()
}

/// Euclidean distance between two vectors
pub fn distance(x: &[f64], y: &[f64]) -> f64 {
    debug_assert_eq!(x.len(), y.len());
    x.iter()
        .zip(y)
        .map(|(a, b)| (a - b) * (a - b))
        .sum::<f64>()
        .sqrt()
}

/// Scale `x` to unit length with its first coordinate non-negative.
///
/// Fixing the sign makes successive iterates comparable and results
/// reproducible. Fails on a zero or non-finite vector.
pub fn normalize_signed(x: &mut [f64]) -> Result<()> {
    let norm = norm2(x);
    if norm == 0.0 || !norm.is_finite() {
        return Err(Error::DegenerateIterate);
    }
    let sign = match x.first() {
        Some(&first) if first < 0.0 => -1.0,
        _ => 1.0,
    };
    let scale = sign / norm;
    x.iter_mut().for_each(|v| *v *= scale);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_normalize_fixes_sign() {
        let mut x = vec![-3.0, 4.0];
        normalize_signed(&mut x).unwrap();
        assert_relative_eq!(x[0], 0.6);
        assert_relative_eq!(x[1], -0.8);
        assert_relative_eq!(norm2(&x), 1.0);
    }

    #[test]
    fn test_normalize_zero_first_coordinate_keeps_sign() {
        let mut x = vec![0.0, -2.0];
        normalize_signed(&mut x).unwrap();
        assert_eq!(x, vec![0.0, -1.0]);
    }

    #[test]
    fn test_normalize_zero_vector_fails() {
        let mut x = vec![0.0; 3];
        assert!(matches!(normalize_signed(&mut x), Err(Error::DegenerateIterate)));
    }

    #[test]
    fn test_distance() {
        assert_relative_eq!(distance(&[1.0, 1.0], &[4.0, 5.0]), 5.0);
        assert_relative_eq!(dot(&[1.0, 2.0], &[3.0, 4.0]), 11.0);
    }
}
