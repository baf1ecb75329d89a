//! Candle-based sentence embedding model.
//!
//! BERT-family sentence transformers (all-MiniLM-L6-v2 by default) with mean
//! pooling over the attention mask followed by L2 normalization, matching the
//! `sentence-transformers` pipeline for these models.

use std::path::Path;
use std::sync::Mutex;

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig, DTYPE};
use tokenizers::{PaddingParams, PaddingStrategy, Tokenizer, TruncationParams};
use tracing::{debug, info};

use crate::config::{
    DevicePreference, EmbeddingConfig, HuggingFaceModelConfig, ModelArchitecture, ModelInfo,
};
use crate::error::{ModelError, ModelResult};
use crate::EmbeddingModel;

/// Local BERT sentence embedder.
pub struct CandleEmbeddingModel {
    model_info: ModelInfo,
    model: Mutex<BertModel>,
    tokenizer: Tokenizer,
    device: Device,
}

impl std::fmt::Debug for CandleEmbeddingModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CandleEmbeddingModel")
            .field("model_id", &self.model_info.model_id)
            .field("dimension", &self.model_info.dimension)
            .field("device", &self.device)
            .finish()
    }
}

impl CandleEmbeddingModel {
    /// Load the model described by `config`.
    pub fn new(config: &EmbeddingConfig) -> ModelResult<Self> {
        let model_path = config.effective_model_path();
        if !model_path.is_dir() {
            return Err(ModelError::ModelNotFound {
                model_id: config.model_id.clone(),
                path: model_path,
            });
        }

        let config_json = std::fs::read_to_string(model_path.join("config.json"))
            .map_err(|e| ModelError::model_load(&config.model_id, format!("config.json: {}", e)))?;
        let hf_config: HuggingFaceModelConfig = serde_json::from_str(&config_json)?;

        let architecture = hf_config.infer_architecture();
        if !matches!(
            architecture,
            ModelArchitecture::Bert | ModelArchitecture::Unknown
        ) {
            return Err(ModelError::UnsupportedArchitecture {
                model_id: config.model_id.clone(),
                architecture: architecture.to_string(),
            });
        }

        let dimension = hf_config.hidden_size;
        let max_seq_len = config
            .max_sequence_length
            .min(hf_config.max_position_embeddings);

        info!(
            "Loading embedding model '{}' from {:?} (dim={}, max_seq_len={})",
            config.model_id, model_path, dimension, max_seq_len
        );

        let tokenizer = load_tokenizer(&model_path, &config.model_id, max_seq_len)?;
        let device = select_device(config.device)?;

        let bert_config: BertConfig = serde_json::from_str(&config_json)?;
        let model = load_bert(&model_path, &config.model_id, &bert_config, &device)?;

        Ok(Self {
            model_info: ModelInfo::new(&config.model_id, dimension, max_seq_len)
                .with_architecture(ModelArchitecture::Bert),
            model: Mutex::new(model),
            tokenizer,
            device,
        })
    }

    fn fail(&self) -> impl Fn(candle_core::Error) -> ModelError + '_ {
        move |e| ModelError::embedding_failed(&self.model_info.model_id, e.to_string())
    }

    /// Average token states, ignoring padding.
    fn mean_pool(&self, hidden: &Tensor, mask: &Tensor) -> ModelResult<Tensor> {
        let mask = mask
            .to_dtype(DType::F32)
            .and_then(|m| m.unsqueeze(2))
            .and_then(|m| m.broadcast_as(hidden.shape()))
            .map_err(self.fail())?;

        let summed = hidden
            .broadcast_mul(&mask)
            .and_then(|t| t.sum(1))
            .map_err(self.fail())?;
        let counts = mask
            .sum(1)
            .and_then(|c| c.clamp(1e-9, f64::MAX))
            .map_err(self.fail())?;

        summed.broadcast_div(&counts).map_err(self.fail())
    }

    fn l2_normalize(&self, pooled: &Tensor) -> ModelResult<Tensor> {
        let norms = pooled
            .sqr()
            .and_then(|t| t.sum_keepdim(1))
            .and_then(|t| t.sqrt())
            .and_then(|t| t.clamp(1e-12, f64::MAX))
            .map_err(self.fail())?;
        pooled.broadcast_div(&norms).map_err(self.fail())
    }
}

fn load_tokenizer(model_path: &Path, model_id: &str, max_length: usize) -> ModelResult<Tokenizer> {
    let mut tokenizer = Tokenizer::from_file(model_path.join("tokenizer.json"))
        .map_err(|e| ModelError::model_load(model_id, format!("tokenizer.json: {}", e)))?;

    tokenizer.with_padding(Some(PaddingParams {
        strategy: PaddingStrategy::BatchLongest,
        pad_id: 0,
        pad_token: "[PAD]".to_string(),
        ..Default::default()
    }));
    tokenizer
        .with_truncation(Some(TruncationParams {
            max_length,
            ..Default::default()
        }))
        .map_err(|e| ModelError::model_load(model_id, e.to_string()))?;

    Ok(tokenizer)
}

fn load_bert(
    model_path: &Path,
    model_id: &str,
    config: &BertConfig,
    device: &Device,
) -> ModelResult<BertModel> {
    let weights = model_path.join("model.safetensors");
    if !weights.is_file() {
        return Err(ModelError::model_load(model_id, "model.safetensors not found"));
    }

    // SAFETY: the weights file is memory-mapped read-only and must not be
    // modified while the model is alive.
    let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[weights], DTYPE, device) }
        .map_err(|e| ModelError::model_load(model_id, e.to_string()))?;

    BertModel::load(vb, config).map_err(|e| ModelError::model_load(model_id, e.to_string()))
}

fn select_device(pref: DevicePreference) -> ModelResult<Device> {
    match pref {
        DevicePreference::Cpu => Ok(Device::Cpu),
        DevicePreference::Auto => Ok(try_gpu().unwrap_or(Device::Cpu)),
        DevicePreference::Gpu => try_gpu().ok_or_else(|| ModelError::DeviceNotAvailable {
            reason: "no Metal or CUDA device; rebuild with --features metal or --features cuda"
                .to_string(),
        }),
    }
}

fn try_gpu() -> Option<Device> {
    #[cfg(feature = "metal")]
    {
        match Device::new_metal(0) {
            Ok(device) => return Some(device),
            Err(e) => debug!("Metal not available: {}", e),
        }
    }

    #[cfg(feature = "cuda")]
    {
        match Device::new_cuda(0) {
            Ok(device) => return Some(device),
            Err(e) => debug!("CUDA not available: {}", e),
        }
    }

    None
}

impl EmbeddingModel for CandleEmbeddingModel {
    fn embed(&self, texts: &[&str]) -> ModelResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }
        debug!("Embedding {} texts", texts.len());

        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| ModelError::tokenization(e.to_string()))?;

        let batch = encodings.len();
        let seq_len = encodings.first().map(|e| e.get_ids().len()).unwrap_or(0);
        let ids: Vec<u32> = encodings.iter().flat_map(|e| e.get_ids().to_vec()).collect();
        let mask: Vec<u32> = encodings
            .iter()
            .flat_map(|e| e.get_attention_mask().to_vec())
            .collect();

        let ids = Tensor::from_vec(ids, (batch, seq_len), &self.device).map_err(self.fail())?;
        let mask = Tensor::from_vec(mask, (batch, seq_len), &self.device).map_err(self.fail())?;
        let type_ids = ids.zeros_like().map_err(self.fail())?;

        let hidden = {
            let model = self.model.lock().map_err(|e| {
                ModelError::embedding_failed(&self.model_info.model_id, e.to_string())
            })?;
            model
                .forward(&ids, &type_ids, Some(&mask))
                .map_err(self.fail())?
        };

        let pooled = self.mean_pool(&hidden, &mask)?;
        let normalized = self.l2_normalize(&pooled)?;
        normalized.to_vec2::<f32>().map_err(self.fail())
    }

    fn dimension(&self) -> usize {
        self.model_info.dimension
    }

    fn max_sequence_length(&self) -> usize {
        self.model_info.max_seq_len
    }

    fn model_info(&self) -> &ModelInfo {
        &self.model_info
    }
}
