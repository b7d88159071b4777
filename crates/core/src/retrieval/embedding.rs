//! Local embeddings using feature hashing.
//!
//! Each folded token is hashed into one of [`EMBEDDING_DIM`] buckets and the resulting
//! term-frequency vector is L2-normalised. No vocabulary is kept, so a chunk's embedding does not
//! depend on what else is indexed.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::constants::EMBEDDING_DIM;
use crate::text::tokens;

pub type Embedding = Vec<f32>;

fn bucket(token: &str) -> usize {
    let mut hasher = DefaultHasher::new();
    token.hash(&mut hasher);
    (hasher.finish() as usize) % EMBEDDING_DIM
}

/// Embeds `text`. Text without tokens yields the zero vector.
pub fn embed(text: &str) -> Embedding {
    let mut tf = vec![0.0f32; EMBEDDING_DIM];
    for token in tokens(text) {
        tf[bucket(&token)] += 1.0;
    }

    let norm: f32 = tf.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in &mut tf {
            *x /= norm;
        }
    }
    tf
}

/// Cosine similarity; 0.0 when either vector is zero or the dimensions differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}
