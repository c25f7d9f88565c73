//! Local inference backend: runs GGUF models in-process.
//!
//! Uses [Candle](https://github.com/huggingface/candle) to run quantized
//! Llama-family models on the CPU. No daemon, no API key.
//!
//! `model.name` can be a preset alias (`tinyllama`, `smollm:360m`,
//! `qwen:0.5b`) or a path to a `.gguf` file with a `tokenizer.json` beside it.
//!
//! Candle inference is single-threaded; the backend reports itself as
//! non-reentrant so the shared handle serializes calls.

use async_trait::async_trait;
use candle_core::quantized::gguf_file;
use candle_core::{Device, Tensor};
use candle_transformers::generation::LogitsProcessor;
use candle_transformers::models::quantized_llama as qlm;
use hf_hub::api::sync::Api;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use symposium_core::backend::{GenerateOptions, ModelBackend};
use symposium_core::error::BackendError;
use tokenizers::Tokenizer;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

// ── Presets ────────────────────────────────────────────────────────────

struct ModelPreset {
    repo: &'static str,
    gguf_file: &'static str,
    tokenizer_repo: &'static str,
    template: ChatTemplate,
}

/// How a rendered prompt is wrapped before tokenization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChatTemplate {
    /// `<|user|>\n{prompt}</s>\n<|assistant|>\n`
    TinyLlama,
    /// `<|im_start|>user\n{prompt}<|im_end|>\n<|im_start|>assistant\n`
    ChatMl,
}

impl ChatTemplate {
    fn wrap(self, prompt: &str) -> String {
        match self {
            Self::TinyLlama => format!("<|user|>\n{prompt}</s>\n<|assistant|>\n"),
            Self::ChatMl => {
                format!("<|im_start|>user\n{prompt}<|im_end|>\n<|im_start|>assistant\n")
            }
        }
    }
}

pub const PRESETS: &[&str] = &[
    "tinyllama",
    "smollm:135m",
    "smollm:360m",
    "qwen:0.5b",
    "qwen:1.5b",
];

fn resolve_preset(alias: &str) -> Option<ModelPreset> {
    match alias.to_lowercase().as_str() {
        "tinyllama" | "tiny-llama" | "tinyllama-1.1b" => Some(ModelPreset {
            repo: "TheBloke/TinyLlama-1.1B-Chat-v1.0-GGUF",
            gguf_file: "tinyllama-1.1b-chat-v1.0.Q4_K_M.gguf",
            tokenizer_repo: "TinyLlama/TinyLlama-1.1B-Chat-v1.0",
            template: ChatTemplate::TinyLlama,
        }),
        "smollm" | "smollm:135m" | "smollm-135m" => Some(ModelPreset {
            repo: "TheBloke/SmolLM-135M-Instruct-GGUF",
            gguf_file: "smollm-135m-instruct.Q4_K_M.gguf",
            tokenizer_repo: "HuggingFaceTB/SmolLM-135M-Instruct",
            template: ChatTemplate::ChatMl,
        }),
        "smollm:360m" | "smollm-360m" => Some(ModelPreset {
            repo: "TheBloke/SmolLM-360M-Instruct-GGUF",
            gguf_file: "smollm-360m-instruct.Q4_K_M.gguf",
            tokenizer_repo: "HuggingFaceTB/SmolLM-360M-Instruct",
            template: ChatTemplate::ChatMl,
        }),
        "qwen:0.5b" | "qwen2-0.5b" => Some(ModelPreset {
            repo: "Qwen/Qwen2-0.5B-Instruct-GGUF",
            gguf_file: "qwen2-0_5b-instruct-q4_k_m.gguf",
            tokenizer_repo: "Qwen/Qwen2-0.5B-Instruct",
            template: ChatTemplate::ChatMl,
        }),
        "qwen:1.5b" | "qwen2-1.5b" => Some(ModelPreset {
            repo: "Qwen/Qwen2-1.5B-Instruct-GGUF",
            gguf_file: "qwen2-1_5b-instruct-q4_k_m.gguf",
            tokenizer_repo: "Qwen/Qwen2-1.5B-Instruct",
            template: ChatTemplate::ChatMl,
        }),
        _ => None,
    }
}

// ── Backend ────────────────────────────────────────────────────────────

/// A backend running a GGUF-quantized model locally via Candle.
pub struct LocalBackend {
    state: Arc<Mutex<LocalModelState>>,
    model_name: String,
}

struct LocalModelState {
    model: qlm::ModelWeights,
    tokenizer: Tokenizer,
    device: Device,
    template: ChatTemplate,
    eos_token_id: u32,
}

impl LocalBackend {
    /// Load the model eagerly. Downloads presets on first use.
    ///
    /// Blocking: call from `spawn_blocking`.
    pub fn load(model_name: &str) -> Result<Self, BackendError> {
        let state = LocalModelState::load(model_name)?;
        Ok(Self {
            state: Arc::new(Mutex::new(state)),
            model_name: model_name.to_string(),
        })
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }
}

fn init_err(context: &str, e: impl std::fmt::Display) -> BackendError {
    BackendError::Initialization(format!("{context}: {e}"))
}

fn find_eos(tokenizer: &Tokenizer) -> u32 {
    tokenizer
        .token_to_id("</s>")
        .or_else(|| tokenizer.token_to_id("<|im_end|>"))
        .or_else(|| tokenizer.token_to_id("<|endoftext|>"))
        .unwrap_or(2)
}

fn load_weights(path: &Path, device: &Device) -> Result<qlm::ModelWeights, BackendError> {
    let mut file =
        std::fs::File::open(path).map_err(|e| init_err("Failed to open model file", e))?;
    let gguf =
        gguf_file::Content::read(&mut file).map_err(|e| init_err("Failed to parse GGUF file", e))?;
    qlm::ModelWeights::from_gguf(gguf, &mut file, device)
        .map_err(|e| init_err("Failed to load model weights", e))
}

impl LocalModelState {
    fn load(model_name: &str) -> Result<Self, BackendError> {
        let device = Device::Cpu;

        if model_name.ends_with(".gguf") {
            return Self::load_from_path(Path::new(model_name), &device);
        }

        let preset = resolve_preset(model_name).ok_or_else(|| {
            BackendError::ModelNotFound(format!(
                "Unknown local model '{model_name}'. Available presets: {}. \
                 Or provide a path to a .gguf file.",
                PRESETS.join(", ")
            ))
        })?;

        info!(
            model = model_name,
            repo = preset.repo,
            file = preset.gguf_file,
            "Downloading/loading local model"
        );

        let api = Api::new().map_err(|e| init_err("Failed to initialize HuggingFace Hub API", e))?;
        let model_path = api
            .model(preset.repo.to_string())
            .get(preset.gguf_file)
            .map_err(|e| init_err(&format!("Failed to download '{}'", preset.gguf_file), e))?;
        let tokenizer_path = api
            .model(preset.tokenizer_repo.to_string())
            .get("tokenizer.json")
            .map_err(|e| init_err("Failed to download tokenizer", e))?;

        let tokenizer =
            Tokenizer::from_file(&tokenizer_path).map_err(|e| init_err("Failed to load tokenizer", e))?;
        let model = load_weights(&model_path, &device)?;
        let eos_token_id = find_eos(&tokenizer);

        info!(eos_token_id, "Local model loaded");

        Ok(Self {
            model,
            tokenizer,
            device,
            template: preset.template,
            eos_token_id,
        })
    }

    fn load_from_path(path: &Path, device: &Device) -> Result<Self, BackendError> {
        if !path.exists() {
            return Err(BackendError::ModelNotFound(path.display().to_string()));
        }
        info!(path = %path.display(), "Loading local GGUF model");

        let model = load_weights(path, device)?;

        let tokenizer_path = path.with_file_name("tokenizer.json");
        if !tokenizer_path.exists() {
            warn!(path = %tokenizer_path.display(), "No tokenizer.json next to GGUF file");
            return Err(BackendError::Initialization(format!(
                "missing tokenizer at {}",
                tokenizer_path.display()
            )));
        }
        let tokenizer =
            Tokenizer::from_file(&tokenizer_path).map_err(|e| init_err("Failed to load tokenizer", e))?;
        let eos_token_id = find_eos(&tokenizer);

        Ok(Self {
            model,
            tokenizer,
            device: device.clone(),
            template: ChatTemplate::ChatMl,
            eos_token_id,
        })
    }

    /// Tokenize, sample up to `max_tokens`, decode. Stops between tokens
    /// once `cancelled` is set.
    fn generate(
        &mut self,
        prompt: &str,
        options: &GenerateOptions,
        cancelled: &AtomicBool,
    ) -> Result<String, BackendError> {
        ensure_live(cancelled)?;
        let wrapped = self.template.wrap(prompt);
        let encoding = self
            .tokenizer
            .encode(wrapped, true)
            .map_err(|e| BackendError::Inference(format!("Tokenization failed: {e}")))?;
        let prompt_tokens = encoding.get_ids();

        debug!(
            prompt_tokens = prompt_tokens.len(),
            max_tokens = options.max_tokens,
            temperature = options.temperature,
            "Starting local generation"
        );

        let temperature = (options.temperature > 0.0).then_some(options.temperature as f64);
        let mut logits_processor = LogitsProcessor::new(42, temperature, None);

        let mut input = Tensor::new(prompt_tokens, &self.device)
            .and_then(|t| t.unsqueeze(0))
            .map_err(map_candle_err)?;
        // Position of the next input in the KV cache
        let mut pos = 0usize;
        let mut generated: Vec<u32> = Vec::new();

        for _ in 0..options.max_tokens {
            ensure_live(cancelled)?;
            let seq_len = input.dim(1).map_err(map_candle_err)?;
            let logits = self.model.forward(&input, pos).map_err(map_candle_err)?;
            pos += seq_len;

            let logits = logits.squeeze(0).map_err(map_candle_err)?;
            let logits = match logits.rank() {
                // Some weights return all positions, some only the last
                2 => {
                    let last = logits.dim(0).map_err(map_candle_err)? - 1;
                    logits.get(last).map_err(map_candle_err)?
                }
                _ => logits,
            };

            let next_token = logits_processor.sample(&logits).map_err(map_candle_err)?;
            if next_token == self.eos_token_id {
                break;
            }
            generated.push(next_token);

            input = Tensor::new(&[next_token][..], &self.device)
                .and_then(|t| t.unsqueeze(0))
                .map_err(map_candle_err)?;
        }

        let output = self
            .tokenizer
            .decode(&generated, true)
            .map_err(|e| BackendError::Inference(format!("Detokenization failed: {e}")))?;

        debug!(completion_tokens = generated.len(), "Generation complete");

        Ok(clean_output(&output))
    }
}

/// Strip trailing special tokens some models emit as text.
fn clean_output(output: &str) -> String {
    output
        .trim()
        .trim_end_matches("</s>")
        .trim_end_matches("<|im_end|>")
        .trim_end_matches("<|eot_id|>")
        .trim()
        .to_string()
}

/// Sets the flag when the awaiting caller goes away, e.g. on timeout.
struct CancelOnDrop(Arc<AtomicBool>);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

fn ensure_live(cancelled: &AtomicBool) -> Result<(), BackendError> {
    if cancelled.load(Ordering::Relaxed) {
        debug!("Local generation abandoned by caller");
        return Err(BackendError::Inference("Generation abandoned by caller".into()));
    }
    Ok(())
}

fn map_candle_err(e: candle_core::Error) -> BackendError {
    BackendError::Inference(format!("Candle inference error: {e}"))
}

#[async_trait]
impl ModelBackend for LocalBackend {
    fn name(&self) -> &str {
        "local"
    }

    async fn generate(
        &self,
        prompt: &str,
        options: &GenerateOptions,
    ) -> std::result::Result<String, BackendError> {
        let state = self.state.clone();
        let prompt = prompt.to_string();
        let options = options.clone();
        let cancelled = Arc::new(AtomicBool::new(false));
        let _cancel_on_drop = CancelOnDrop(cancelled.clone());

        // Candle is CPU-bound; keep it off the async workers
        tokio::task::spawn_blocking(move || {
            let mut guard = state.blocking_lock();
            guard.generate(&prompt, &options, &cancelled)
        })
        .await
        .map_err(|e| BackendError::Inference(format!("Inference task failed: {e}")))?
    }
}
