//! Vector similarity scoring

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// How query and corpus vectors are compared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    /// Full cosine similarity. Safe for vectors of any norm.
    #[default]
    Cosine,
    /// Plain dot product. Only equals cosine similarity when both sides are unit length.
    Dot,
}

impl Metric {
    /// Score two vectors of equal dimension.
    pub fn score(self, a: &[f32], b: &[f32]) -> Result<f32> {
        match self {
            Metric::Cosine => cosine_similarity(a, b),
            Metric::Dot => dot_product(a, b),
        }
    }
}

/// Dot product of two equal-length vectors.
pub fn dot_product(a: &[f32], b: &[f32]) -> Result<f32> {
    check_len(a, b)?;
    Ok(dot(a, b))
}

/// Compute cosine similarity between two vectors.
///
/// Returns a value in [-1, 1] where 1 means identical direction. Fails with
/// [`Error::DegenerateVector`] if either vector has zero norm.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    check_len(a, b)?;

    let norm_a = l2_norm(a);
    let norm_b = l2_norm(b);

    if norm_a == 0.0 || norm_b == 0.0 {
        return Err(Error::DegenerateVector);
    }

    // rounding can push near-parallel vectors slightly past 1.0
    Ok((dot(a, b) / (norm_a * norm_b)).clamp(-1.0, 1.0))
}

/// Euclidean length of a vector.
pub fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Scale a vector to unit length in place.
pub fn normalize(v: &mut [f32]) -> Result<()> {
    let norm = l2_norm(v);
    if norm == 0.0 || !norm.is_finite() {
        return Err(Error::DegenerateVector);
    }
    v.iter_mut().for_each(|x| *x /= norm);
    Ok(())
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn check_len(a: &[f32], b: &[f32]) -> Result<()> {
    if a.len() != b.len() {
        return Err(Error::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity_identical() {
        let a = vec![1.0, 0.0, 0.0];
        let sim = cosine_similarity(&a, &a).unwrap();
        assert!((sim - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_orthogonal() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![0.0, 1.0, 0.0];
        let sim = cosine_similarity(&a, &b).unwrap();
        assert!(sim.abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_opposite() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![-1.0, 0.0, 0.0];
        let sim = cosine_similarity(&a, &b).unwrap();
        assert!((sim + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_ignores_magnitude() {
        let a = vec![3.0, 4.0];
        let b = vec![0.6, 0.8];
        let sim = cosine_similarity(&a, &b).unwrap();
        assert!((sim - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_zero_vector_is_degenerate() {
        let a = vec![0.0, 0.0];
        let b = vec![1.0, 0.0];
        assert!(matches!(cosine_similarity(&a, &b), Err(Error::DegenerateVector)));
        assert!(matches!(cosine_similarity(&b, &a), Err(Error::DegenerateVector)));
    }

    #[test]
    fn test_length_mismatch() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0];
        assert!(matches!(
            cosine_similarity(&a, &b),
            Err(Error::DimensionMismatch { expected: 3, actual: 2 })
        ));
        assert!(dot_product(&a, &b).is_err());
    }

    #[test]
    fn test_identical_unit_vectors_at_model_dimension() {
        let mut v: Vec<f32> = (0..384).map(|i| ((i * 37) % 101) as f32 - 50.0).collect();
        normalize(&mut v).unwrap();

        let cos = Metric::Cosine.score(&v, &v).unwrap();
        let dot = Metric::Dot.score(&v, &v).unwrap();
        assert!((cos - 1.0).abs() < 1e-5, "cosine was {cos}");
        assert!((dot - 1.0).abs() < 1e-5, "dot was {dot}");
    }

    #[test]
    fn test_normalize() {
        let mut v = vec![3.0, 4.0];
        normalize(&mut v).unwrap();
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);
        assert!((l2_norm(&v) - 1.0).abs() < 1e-6);

        let mut zero = vec![0.0; 4];
        assert!(normalize(&mut zero).is_err());
    }

    #[test]
    fn test_metric_deserializes_lowercase() {
        let m: Metric = serde_json::from_str("\"dot\"").unwrap();
        assert_eq!(m, Metric::Dot);
        assert_eq!(Metric::default(), Metric::Cosine);
    }
}
