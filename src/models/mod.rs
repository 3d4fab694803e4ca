//! Embedding models for the visual search service

pub mod siglip;

pub use siglip::SiglipEmbedder;

use async_trait::async_trait;
use image::DynamicImage;

use crate::core::Result;

/// A multimodal embedding model: text and images map into one shared
/// vector space of a fixed dimension, so a text query can retrieve images.
#[async_trait]
pub trait Embedder: Send + Sync {
    fn name(&self) -> &str;
    fn dimension(&self) -> usize;

    /// Embed a text query. The result is L2-normalized.
    async fn embed_text(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed an image. Same dimension and normalization as `embed_text`.
    async fn embed_image(&self, image: DynamicImage) -> Result<Vec<f32>>;

    /// Whether the model is loaded and ready to embed.
    fn is_ready(&self) -> bool {
        true
    }
}

/// L2 normalize a vector to unit length. Zero or non-finite input collapses
/// to the zero vector so NaNs cannot propagate into similarity scores.
pub fn l2_normalize(v: &[f32]) -> Vec<f32> {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm.is_finite() && norm > 1e-10 {
        v.iter().map(|x| x / norm).collect()
    } else {
        vec![0.0; v.len()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn l2_normalize_unit_vector_is_unchanged() {
        let v = l2_normalize(&[1.0, 0.0, 0.0]);
        assert_eq!(v, vec![1.0, 0.0, 0.0]);
    }

    #[test]
    fn l2_normalize_zero_vector_stays_zero() {
        let v = l2_normalize(&[0.0, 0.0, 0.0]);
        assert_eq!(v, vec![0.0, 0.0, 0.0]);
    }

    proptest! {
        /// Non-degenerate vectors normalize to Euclidean norm 1 ± 1e-3.
        #[test]
        fn l2_normalize_yields_unit_norm(
            v in prop::collection::vec(-1000.0f32..1000.0, 1..1152)
        ) {
            prop_assume!(v.iter().map(|x| x * x).sum::<f32>().sqrt() > 1e-3);
            let normalized = l2_normalize(&v);
            let norm: f32 = normalized.iter().map(|x| x * x).sum::<f32>().sqrt();
            prop_assert!((norm - 1.0).abs() < 1e-3, "norm was {norm}");
        }
    }
}
