use thiserror::Error;

/// Two embeddings of different lengths were compared.
///
/// Usually means the corpus mixes vectors from different models.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("Embedding dimension mismatch: {left} vs {right}")]
pub struct DimensionMismatch {
    pub left: usize,
    pub right: usize,
}

/// Cosine similarity of two equal-length vectors.
///
/// Returns 0 when either vector has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32, DimensionMismatch> {
    if a.len() != b.len() {
        return Err(DimensionMismatch {
            left: a.len(),
            right: b.len(),
        });
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (&x, &y) in a.iter().zip(b) {
        let (x, y) = (f64::from(x), f64::from(y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }

    let similarity = dot / (norm_a.sqrt() * norm_b.sqrt());
    Ok(similarity.clamp(-1.0, 1.0) as f32)
}
