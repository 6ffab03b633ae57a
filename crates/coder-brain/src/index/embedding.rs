//! Vector helpers and the built-in hashing embedder.

/// Euclidean norm.
pub fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// L2-normalize in place. Zero vectors stay zero.
pub fn l2_normalize(v: &mut [f32]) {
    let norm = l2_norm(v);
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

/// Cosine similarity. Returns 0.0 when either vector is all zeros.
///
/// Callers check dimensions first; extra trailing components are ignored.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "vectors must have equal dimensions");
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = l2_norm(a);
    let norm_b = l2_norm(b);
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Split text into lowercase identifier-like tokens.
pub fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

#[cfg(feature = "semantic")]
pub use hashing::{DEFAULT_HASH_DIMENSIONS, HashingEmbedder};

#[cfg(feature = "semantic")]
mod hashing {
    use sha2::{Digest, Sha256};

    use super::{l2_normalize, tokenize};
    use crate::RetrievalError;
    use crate::index::Embedder;

    pub const DEFAULT_HASH_DIMENSIONS: usize = 256;

    /// Feature-hashing embedder: each token lands in a SHA-256-chosen bucket
    /// with a hash-chosen sign. Deterministic across runs and platforms.
    #[derive(Debug, Clone)]
    pub struct HashingEmbedder {
        dimensions: usize,
    }

    impl Default for HashingEmbedder {
        fn default() -> Self {
            Self::new(DEFAULT_HASH_DIMENSIONS)
        }
    }

    impl HashingEmbedder {
        pub fn new(dimensions: usize) -> Self {
            Self {
                dimensions: dimensions.max(1),
            }
        }
    }

    impl Embedder for HashingEmbedder {
        fn embed(&self, text: &str) -> Result<Vec<f32>, RetrievalError> {
            let mut vector = vec![0.0f32; self.dimensions];
            let mut tokens = 0usize;
            for token in tokenize(text) {
                let digest = Sha256::digest(token.as_bytes());
                let mut bucket_bytes = [0u8; 8];
                bucket_bytes.copy_from_slice(&digest[..8]);
                let bucket = (u64::from_le_bytes(bucket_bytes) % self.dimensions as u64) as usize;
                let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
                vector[bucket] += sign;
                tokens += 1;
            }
            if tokens == 0 {
                return Err(RetrievalError::EmptyInput);
            }
            l2_normalize(&mut vector);
            Ok(vector)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-6;

    #[test]
    fn normalize_produces_unit_vector() {
        let mut v = vec![3.0, 4.0];
        l2_normalize(&mut v);
        assert!((l2_norm(&v) - 1.0).abs() < EPSILON);
    }

    #[test]
    fn normalize_leaves_zero_vector() {
        let mut v = vec![0.0, 0.0];
        l2_normalize(&mut v);
        assert_eq!(v, vec![0.0, 0.0]);
    }

    #[test]
    fn cosine_basics() {
        assert!((cosine_similarity(&[1.0, 0.0], &[2.0, 0.0]) - 1.0).abs() < EPSILON);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < EPSILON);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn tokenize_splits_identifiers() {
        let tokens: Vec<String> = tokenize("fn handle_request(Req) -> Ok").collect();
        assert_eq!(tokens, vec!["fn", "handle_request", "req", "ok"]);
    }

    #[cfg(feature = "semantic")]
    mod hashing {
        use crate::RetrievalError;
        use crate::index::embedding::*;
        use crate::index::Embedder;

        #[test]
        fn embedding_is_deterministic_and_normalized() {
            let embedder = HashingEmbedder::default();
            let a = embedder.embed("parse the config file").unwrap();
            let b = embedder.embed("parse the config file").unwrap();
            assert_eq!(a, b);
            assert_eq!(a.len(), DEFAULT_HASH_DIMENSIONS);
            assert!((l2_norm(&a) - 1.0).abs() < 1e-5);
        }

        #[test]
        fn shared_tokens_score_higher() {
            let embedder = HashingEmbedder::default();
            let query = embedder.embed("invoice total").unwrap();
            let related = embedder.embed("compute invoice total amount").unwrap();
            let unrelated = embedder.embed("render sidebar widget").unwrap();
            assert!(cosine_similarity(&query, &related) > cosine_similarity(&query, &unrelated));
        }

        #[test]
        fn empty_text_is_rejected() {
            let err = HashingEmbedder::default().embed("  -- ").unwrap_err();
            assert!(matches!(err, RetrievalError::EmptyInput));
        }
    }
}
