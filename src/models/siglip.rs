//! SigLIP embedder over ONNX Runtime.
//!
//! The text and vision encoders of one SigLIP checkpoint produce vectors in
//! a shared space; that shared space is what makes text-to-image retrieval
//! work, so both branches must come from the same model version and end in
//! the same L2 normalization.
//!
//! Sessions and the tokenizer are loaded once behind locks, so concurrent
//! early requests cannot trigger a second load. Inference is synchronous
//! ONNX work and runs under `spawn_blocking`.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use image::{imageops::FilterType, DynamicImage, GenericImageView};
use ndarray::{Array, Array4};
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;
use tokenizers::{
    PaddingDirection, PaddingParams, PaddingStrategy, Tokenizer, TruncationDirection,
    TruncationParams, TruncationStrategy,
};
use tokio::task;

use crate::core::{ModelConfig, Result, SearchError};
use crate::models::{l2_normalize, Embedder};

pub struct SiglipEmbedder {
    inner: Arc<Inner>,
}

struct Inner {
    config: ModelConfig,
    vision_session: Mutex<Option<Session>>,
    text_session: Mutex<Option<Session>>,
    tokenizer: Mutex<Option<Tokenizer>>,
}

impl SiglipEmbedder {
    pub fn new(config: &ModelConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                config: config.clone(),
                vision_session: Mutex::new(None),
                text_session: Mutex::new(None),
                tokenizer: Mutex::new(None),
            }),
        }
    }

    /// Load both encoder sessions and the tokenizer eagerly.
    ///
    /// Called once at process start; later calls are no-ops because each
    /// loader checks under its lock before loading.
    pub async fn warm_up(&self) -> Result<()> {
        let inner = self.inner.clone();
        task::spawn_blocking(move || {
            inner.load_vision_session()?;
            inner.load_text_session()?;
            inner.load_tokenizer()
        })
        .await
        .map_err(|e| SearchError::ModelLoad(e.to_string()))?
    }

    pub fn is_loaded(&self) -> bool {
        let vision = self.inner.vision_session.lock().map(|g| g.is_some());
        let text = self.inner.text_session.lock().map(|g| g.is_some());
        matches!((vision, text), (Ok(true), Ok(true)))
    }
}

#[async_trait]
impl Embedder for SiglipEmbedder {
    fn name(&self) -> &str {
        &self.inner.config.model_name
    }

    fn dimension(&self) -> usize {
        self.inner.config.dimension
    }

    async fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        let inner = self.inner.clone();
        let text = text.to_string();
        task::spawn_blocking(move || inner.encode_text(&text))
            .await
            .map_err(|e| SearchError::ModelInference(e.to_string()))?
    }

    async fn embed_image(&self, image: DynamicImage) -> Result<Vec<f32>> {
        let inner = self.inner.clone();
        task::spawn_blocking(move || inner.encode_image(&image))
            .await
            .map_err(|e| SearchError::ModelInference(e.to_string()))?
    }

    fn is_ready(&self) -> bool {
        self.is_loaded()
    }
}

impl Inner {
    fn model_file(&self, kind: &str) -> Result<PathBuf> {
        let filename = format!("{}_{}.onnx", self.config.model_name, kind);
        let path = PathBuf::from(&self.config.models_dir).join(&filename);
        if path.exists() {
            Ok(path)
        } else {
            Err(SearchError::ModelLoad(format!(
                "model file {} not found; place the {} encoder ONNX export there",
                path.display(),
                kind
            )))
        }
    }

    fn tokenizer_file(&self) -> Result<PathBuf> {
        let filename = format!("{}_tokenizer.json", self.config.model_name);
        let path = PathBuf::from(&self.config.models_dir).join(&filename);
        if path.exists() {
            Ok(path)
        } else {
            Err(SearchError::ModelLoad(format!(
                "tokenizer file {} not found",
                path.display()
            )))
        }
    }

    fn build_session(&self, path: &PathBuf) -> Result<Session> {
        Session::builder()
            .map_err(|e| SearchError::ModelLoad(e.to_string()))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| SearchError::ModelLoad(e.to_string()))?
            .with_intra_threads(4)
            .map_err(|e| SearchError::ModelLoad(e.to_string()))?
            .commit_from_file(path)
            .map_err(|e| SearchError::ModelLoad(format!("{}: {}", path.display(), e)))
    }

    fn load_vision_session(&self) -> Result<()> {
        let mut guard = self
            .vision_session
            .lock()
            .map_err(|_| SearchError::ModelLoad("vision session lock poisoned".into()))?;
        if guard.is_some() {
            return Ok(());
        }
        let path = self.model_file("vision")?;
        tracing::debug!(path = %path.display(), "loading SigLIP vision encoder");
        *guard = Some(self.build_session(&path)?);
        tracing::info!(model = %self.config.model_name, "SigLIP vision encoder loaded");
        Ok(())
    }

    fn load_text_session(&self) -> Result<()> {
        let mut guard = self
            .text_session
            .lock()
            .map_err(|_| SearchError::ModelLoad("text session lock poisoned".into()))?;
        if guard.is_some() {
            return Ok(());
        }
        let path = self.model_file("text")?;
        tracing::debug!(path = %path.display(), "loading SigLIP text encoder");
        *guard = Some(self.build_session(&path)?);
        tracing::info!(model = %self.config.model_name, "SigLIP text encoder loaded");
        Ok(())
    }

    fn load_tokenizer(&self) -> Result<()> {
        let mut guard = self
            .tokenizer
            .lock()
            .map_err(|_| SearchError::ModelLoad("tokenizer lock poisoned".into()))?;
        if guard.is_some() {
            return Ok(());
        }
        let path = self.tokenizer_file()?;

        let mut tokenizer = Tokenizer::from_file(&path)
            .map_err(|e| SearchError::ModelLoad(format!("tokenizer: {}", e)))?;

        // SigLIP pads every query to a fixed sequence length.
        let length = self.config.text_sequence_length;
        tokenizer.with_padding(Some(PaddingParams {
            strategy: PaddingStrategy::Fixed(length),
            direction: PaddingDirection::Right,
            pad_to_multiple_of: None,
            pad_id: 1,
            pad_type_id: 0,
            pad_token: "</s>".to_string(),
        }));
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: length,
                strategy: TruncationStrategy::LongestFirst,
                stride: 0,
                direction: TruncationDirection::Right,
            }))
            .map_err(|e| SearchError::ModelLoad(format!("tokenizer truncation: {}", e)))?;

        *guard = Some(tokenizer);
        tracing::info!(model = %self.config.model_name, "SigLIP tokenizer loaded");
        Ok(())
    }

    /// Resize shortest edge to the model resolution, center-crop, and scale
    /// pixels to [-1, 1] in NCHW layout.
    fn preprocess_image(&self, image: &DynamicImage) -> Array4<f32> {
        let size = self.config.input_resolution;
        let (w, h) = (image.width(), image.height());

        let scale = size as f32 / w.min(h).max(1) as f32;
        let new_w = ((w as f32) * scale).round().max(1.0) as u32;
        let new_h = ((h as f32) * scale).round().max(1.0) as u32;
        let resized = image.resize_exact(new_w, new_h, FilterType::Triangle).to_rgb8();

        let start_x = (resized.width().saturating_sub(size)) / 2;
        let start_y = (resized.height().saturating_sub(size)) / 2;

        let mut array = Array4::<f32>::zeros((1, 3, size as usize, size as usize));
        for y in 0..size as usize {
            for x in 0..size as usize {
                let pixel = resized.get_pixel(
                    (start_x + x as u32).min(resized.width() - 1),
                    (start_y + y as u32).min(resized.height() - 1),
                );
                array[[0, 0, y, x]] = pixel[0] as f32 / 127.5 - 1.0;
                array[[0, 1, y, x]] = pixel[1] as f32 / 127.5 - 1.0;
                array[[0, 2, y, x]] = pixel[2] as f32 / 127.5 - 1.0;
            }
        }
        array
    }

    fn encode_image(&self, image: &DynamicImage) -> Result<Vec<f32>> {
        self.load_vision_session()?;

        let pixel_values = self.preprocess_image(image);

        let mut guard = self
            .vision_session
            .lock()
            .map_err(|_| SearchError::ModelInference("vision session lock poisoned".into()))?;
        let session = guard
            .as_mut()
            .ok_or_else(|| SearchError::ModelInference("vision session not loaded".into()))?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .unwrap_or_else(|| "pixel_values".into());
        let output_name = session
            .outputs
            .first()
            .map(|o| o.name.clone())
            .unwrap_or_else(|| "image_embeds".into());

        let input = Tensor::from_array(pixel_values)
            .map_err(|e| SearchError::ModelInference(e.to_string()))?;
        let outputs = session
            .run(ort::inputs![input_name => input])
            .map_err(|e| SearchError::ModelInference(format!("vision inference: {}", e)))?;

        let output = outputs
            .get(&output_name)
            .ok_or_else(|| SearchError::ModelInference(format!("no output '{}'", output_name)))?;
        let (_shape, data) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| SearchError::ModelInference(e.to_string()))?;

        self.finalize_embedding(data.to_vec())
    }

    fn encode_text(&self, text: &str) -> Result<Vec<f32>> {
        self.load_text_session()?;
        self.load_tokenizer()?;

        let encoding = {
            let guard = self
                .tokenizer
                .lock()
                .map_err(|_| SearchError::ModelInference("tokenizer lock poisoned".into()))?;
            let tokenizer = guard
                .as_ref()
                .ok_or_else(|| SearchError::ModelInference("tokenizer not loaded".into()))?;
            tokenizer
                .encode(text, true)
                .map_err(|e| SearchError::ModelInference(format!("tokenization: {}", e)))?
        };

        let input_ids: Vec<i64> = encoding.get_ids().iter().map(|id| *id as i64).collect();
        let attention_mask: Vec<i64> = encoding
            .get_attention_mask()
            .iter()
            .map(|id| *id as i64)
            .collect();
        let length = input_ids.len();

        let input_ids = Array::from_shape_vec((1, length), input_ids)
            .map_err(|e| SearchError::ModelInference(e.to_string()))?;
        let attention_mask = Array::from_shape_vec((1, length), attention_mask)
            .map_err(|e| SearchError::ModelInference(e.to_string()))?;

        let mut guard = self
            .text_session
            .lock()
            .map_err(|_| SearchError::ModelInference("text session lock poisoned".into()))?;
        let session = guard
            .as_mut()
            .ok_or_else(|| SearchError::ModelInference("text session not loaded".into()))?;

        let input_names: Vec<String> = session.inputs.iter().map(|i| i.name.clone()).collect();
        let output_name = session
            .outputs
            .first()
            .map(|o| o.name.clone())
            .unwrap_or_else(|| "text_embeds".into());

        let ids_tensor = Tensor::from_array(input_ids)
            .map_err(|e| SearchError::ModelInference(e.to_string()))?;
        let mask_tensor = Tensor::from_array(attention_mask)
            .map_err(|e| SearchError::ModelInference(e.to_string()))?;

        // Some text encoder exports take input_ids only.
        let outputs = if input_names.len() >= 2 {
            session
                .run(ort::inputs![
                    input_names[0].clone() => ids_tensor,
                    input_names[1].clone() => mask_tensor
                ])
                .map_err(|e| SearchError::ModelInference(format!("text inference: {}", e)))?
        } else {
            let name = input_names
                .first()
                .cloned()
                .unwrap_or_else(|| "input_ids".to_string());
            session
                .run(ort::inputs![name => ids_tensor])
                .map_err(|e| SearchError::ModelInference(format!("text inference: {}", e)))?
        };

        let output = outputs
            .get(&output_name)
            .ok_or_else(|| SearchError::ModelInference(format!("no output '{}'", output_name)))?;
        let (_shape, data) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| SearchError::ModelInference(e.to_string()))?;

        self.finalize_embedding(data.to_vec())
    }

    fn finalize_embedding(&self, embedding: Vec<f32>) -> Result<Vec<f32>> {
        if embedding.iter().any(|v| !v.is_finite()) {
            return Err(SearchError::ModelInference(
                "embedding contains non-finite values".into(),
            ));
        }
        if embedding.len() != self.config.dimension {
            return Err(SearchError::ModelInference(format!(
                "model produced {} dimensions, expected {}",
                embedding.len(),
                self.config.dimension
            )));
        }
        Ok(l2_normalize(&embedding))
    }
}
