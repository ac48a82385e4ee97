use crate::config::Config;
use anyhow::{Context, Result, anyhow, bail};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Dimensionality of the embedding model's output, also used for the
/// zero-vector fallback when a request fails.
pub const EMBEDDING_DIM: usize = 1536;

/// Converts text into a fixed-dimension vector. The trait is the seam that
/// lets tests drive the store with stub embeddings instead of a live
/// provider.
pub trait Embedder {
    fn embed(&self, text: &str) -> Result<Array1<f32>>;

    fn dimension(&self) -> usize {
        EMBEDDING_DIM
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// Client for an OpenAI-style `/embeddings` endpoint.
pub struct EmbeddingClient {
    http: reqwest::blocking::Client,
    config: Config,
}

impl EmbeddingClient {
    pub fn new(config: Config) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(EmbeddingClient { http, config })
    }
}

impl Embedder for EmbeddingClient {
    fn embed(&self, text: &str) -> Result<Array1<f32>> {
        let url = format!("{}/embeddings", self.config.base_url);
        let body = EmbeddingRequest {
            model: &self.config.embedding_model,
            input: text,
        };

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .with_context(|| format!("embedding request to {url} failed"))?
            .error_for_status()
            .context("embedding request rejected by provider")?;

        let parsed: EmbeddingResponse = response
            .json()
            .context("malformed embedding response")?;
        let embedding = parsed
            .data
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("embedding response contained no data"))?
            .embedding;

        Ok(Array1::from(embedding))
    }
}

/// Cosine similarity between two vectors of equal length. A zero-norm
/// operand yields 0.0 rather than NaN; callers use the score only for
/// relative ranking.
pub fn cosine_similarity(a: &Array1<f32>, b: &Array1<f32>) -> Result<f32> {
    if a.len() != b.len() {
        bail!(
            "vector length mismatch: {} vs {}",
            a.len(),
            b.len()
        );
    }

    let dot_product = a.dot(b);
    let norm_a = a.dot(a).sqrt();
    let norm_b = b.dot(b).sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        Ok(0.0)
    } else {
        Ok(dot_product / (norm_a * norm_b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_similarity_is_symmetric() {
        let a = Array1::from(vec![1.0, 2.0, 3.0]);
        let b = Array1::from(vec![-2.0, 0.5, 4.0]);
        let ab = cosine_similarity(&a, &b).unwrap();
        let ba = cosine_similarity(&b, &a).unwrap();
        assert_eq!(ab, ba);
    }

    #[test]
    fn test_similarity_of_vector_with_itself_is_one() {
        let a = Array1::from(vec![0.3, -1.2, 2.5, 0.0]);
        let score = cosine_similarity(&a, &a).unwrap();
        assert!((score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_vector_scores_zero_not_nan() {
        let zero = Array1::from(vec![0.0, 0.0, 0.0]);
        let b = Array1::from(vec![1.0, 2.0, 3.0]);
        assert_eq!(cosine_similarity(&zero, &b).unwrap(), 0.0);
        assert_eq!(cosine_similarity(&b, &zero).unwrap(), 0.0);
        assert_eq!(cosine_similarity(&zero, &zero).unwrap(), 0.0);
    }

    #[test]
    fn test_length_mismatch_is_an_error() {
        let a = Array1::from(vec![1.0, 2.0]);
        let b = Array1::from(vec![1.0, 2.0, 3.0]);
        let err = cosine_similarity(&a, &b).unwrap_err();
        assert!(err.to_string().contains("length mismatch"));
    }

    #[test]
    fn test_opposite_vectors_score_negative() {
        let a = Array1::from(vec![1.0, 0.0]);
        let b = Array1::from(vec![-1.0, 0.0]);
        let score = cosine_similarity(&a, &b).unwrap();
        assert!((score + 1.0).abs() < 1e-6);
    }
}
