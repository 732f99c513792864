use serde::{Deserialize, Serialize};

/// A dense embedding vector
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct Vector {
    data: Vec<f32>,
}

impl Vector {
    #[inline]
    #[must_use]
    pub fn new(data: Vec<f32>) -> Self {
        Self { data }
    }

    #[inline]
    #[must_use]
    pub fn from_slice(data: &[f32]) -> Self {
        Self {
            data: data.to_vec(),
        }
    }

    #[inline]
    #[must_use]
    pub fn dim(&self) -> usize {
        self.data.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    #[inline]
    #[must_use]
    pub fn into_inner(self) -> Vec<f32> {
        self.data
    }

    #[inline]
    pub fn norm(&self) -> f32 {
        dot(&self.data, &self.data).sqrt()
    }

    /// Cosine similarity in [-1, 1]; 0 when dimensions differ or either side is zero
    #[inline]
    pub fn cosine_similarity(&self, other: &Vector) -> f32 {
        if self.dim() != other.dim() {
            return 0.0;
        }

        let norm_a = self.norm();
        let norm_b = other.norm();
        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }

        dot(&self.data, &other.data) / (norm_a * norm_b)
    }

    /// Cosine distance (`1 - cosine similarity`) in [0, 2]
    #[inline]
    pub fn cosine_distance(&self, other: &Vector) -> f32 {
        (1.0 - self.cosine_similarity(other)).clamp(0.0, 2.0)
    }

    /// Normalize the vector to unit length
    #[inline]
    pub fn normalize(&mut self) {
        let norm = self.norm();
        if norm > f32::EPSILON {
            let inv_norm = 1.0 / norm;
            for x in &mut self.data {
                *x *= inv_norm;
            }
        }
    }

    #[inline]
    #[must_use]
    pub fn normalized(&self) -> Self {
        let mut v = self.clone();
        v.normalize();
        v
    }
}

impl From<Vec<f32>> for Vector {
    fn from(data: Vec<f32>) -> Self {
        Self::new(data)
    }
}

/// Dot product with two accumulators for better pipelining
#[inline]
fn dot(a: &[f32], b: &[f32]) -> f32 {
    let mut acc0 = 0.0f32;
    let mut acc1 = 0.0f32;

    let a_chunks = a.chunks_exact(8);
    let b_chunks = b.chunks_exact(8);
    let a_rest = a_chunks.remainder();
    let b_rest = b_chunks.remainder();

    for (x, y) in a_chunks.zip(b_chunks) {
        acc0 += x[0] * y[0] + x[1] * y[1] + x[2] * y[2] + x[3] * y[3];
        acc1 += x[4] * y[4] + x[5] * y[5] + x[6] * y[6] + x[7] * y[7];
    }
    for (x, y) in a_rest.iter().zip(b_rest) {
        acc0 += x * y;
    }

    acc0 + acc1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        let v1 = Vector::new(vec![1.0, 0.0]);
        let v2 = Vector::new(vec![1.0, 0.0]);
        assert!((v1.cosine_similarity(&v2) - 1.0).abs() < 1e-6);

        let v3 = Vector::new(vec![1.0, 0.0]);
        let v4 = Vector::new(vec![0.0, 1.0]);
        assert!((v3.cosine_similarity(&v4) - 0.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_distance_range() {
        let a = Vector::new(vec![1.0, 0.0, 0.0]);
        let b = Vector::new(vec![-1.0, 0.0, 0.0]);
        assert!((a.cosine_distance(&a) - 0.0).abs() < 1e-6);
        assert!((a.cosine_distance(&b) - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_mismatched_or_zero_vectors_are_orthogonal() {
        let a = Vector::new(vec![1.0, 2.0]);
        let b = Vector::new(vec![1.0, 2.0, 3.0]);
        let zero = Vector::new(vec![0.0, 0.0]);
        assert_eq!(a.cosine_similarity(&b), 0.0);
        assert_eq!(a.cosine_similarity(&zero), 0.0);
        assert!((a.cosine_distance(&zero) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_dot_handles_remainder() {
        let a: Vec<f32> = (0..11).map(|i| i as f32).collect();
        let expected: f32 = a.iter().map(|x| x * x).sum();
        assert!((dot(&a, &a) - expected).abs() < 1e-3);
    }

    #[test]
    fn test_normalize() {
        let v = Vector::new(vec![3.0, 4.0]).normalized();
        assert!((v.norm() - 1.0).abs() < 1e-6);
    }
}
