/// A face descriptor produced by the embedding model.
///
/// Stored L2-normalized, so the dot product of two embeddings is their
/// cosine similarity.
#[derive(Clone, Debug, PartialEq)]
pub struct Embedding(Vec<f32>);

impl Embedding {
    /// Wraps raw model output, normalizing it to unit length.
    pub fn from_raw(mut values: Vec<f32>) -> Self {
        l2_normalize(&mut values);
        Self(values)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Cosine distance `1 - a.b`, in `[0, 2]`. ArcFace embeddings of the same
    /// person typically sit at cosine similarity 0.4 or more, i.e. distance
    /// 0.6 or less. Embeddings of different length never match, so their
    /// distance is infinite.
    pub fn distance(&self, other: &Embedding) -> f64 {
        if self.0.len() != other.0.len() {
            return f64::INFINITY;
        }
        let similarity: f64 = self
            .0
            .iter()
            .zip(other.0.iter())
            .map(|(a, b)| *a as f64 * *b as f64)
            .sum();
        1.0 - similarity
    }
}

pub fn l2_normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_l2_normalize_unit_vector() {
        let mut v = vec![3.0, 4.0];
        l2_normalize(&mut v);
        assert_relative_eq!(v[0], 0.6, epsilon = 1e-6);
        assert_relative_eq!(v[1], 0.8, epsilon = 1e-6);
    }

    #[test]
    fn test_l2_normalize_zero_vector_unchanged() {
        let mut v = vec![0.0, 0.0, 0.0];
        l2_normalize(&mut v);
        assert_eq!(v, vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_from_raw_normalizes() {
        let e = Embedding::from_raw(vec![0.0, 5.0]);
        assert_eq!(e.as_slice(), &[0.0, 1.0]);
        assert_eq!(e.len(), 2);
    }

    #[test]
    fn test_distance_identical_is_zero() {
        let e = Embedding::from_raw(vec![1.0, 2.0, 3.0]);
        assert_relative_eq!(e.distance(&e), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_distance_orthogonal_unit_vectors() {
        let a = Embedding::from_raw(vec![1.0, 0.0]);
        let b = Embedding::from_raw(vec![0.0, 1.0]);
        assert_relative_eq!(a.distance(&b), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_distance_opposite_unit_vectors() {
        let a = Embedding::from_raw(vec![1.0, 0.0]);
        let b = Embedding::from_raw(vec![-1.0, 0.0]);
        assert_relative_eq!(a.distance(&b), 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_distance_is_one_minus_cosine_similarity() {
        let a = Embedding::from_raw(vec![1.0, 0.0]);
        let b = Embedding::from_raw(vec![0.6, 0.8]);
        assert_relative_eq!(a.distance(&b), 0.4, epsilon = 1e-6);
        assert_relative_eq!(b.distance(&a), 0.4, epsilon = 1e-6);
    }

    #[test]
    fn test_distance_ignores_magnitude() {
        let a = Embedding::from_raw(vec![2.0, 0.0]);
        let b = Embedding::from_raw(vec![30.0, 40.0]);
        assert_relative_eq!(a.distance(&b), 0.4, epsilon = 1e-6);
    }

    #[test]
    fn test_distance_length_mismatch_is_infinite() {
        let a = Embedding::from_raw(vec![1.0, 0.0]);
        let b = Embedding::from_raw(vec![1.0, 0.0, 0.0]);
        assert!(a.distance(&b).is_infinite());
    }
}
