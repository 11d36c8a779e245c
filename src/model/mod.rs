//! The vision-language model boundary.
//!
//! The loop treats the model as a stateless function from `(image, prompt)` to
//! raw text. [`ModelHandle`] is the process-wide owner of a loaded model: create
//! it once at startup, lend it by reference to every run, and drop it at
//! shutdown. It serialises callers because one inference backend handles one
//! request at a time.

pub mod client;

pub use client::{ModelConfig, VisionModelClient};

use crate::error::{AgentError, Result};
use image::DynamicImage;
use std::sync::Mutex;

/// Single-shot inference: a normalized screenshot and a prompt in, raw text out
pub trait ActionModel {
    fn predict(&self, image: &DynamicImage, prompt: &str) -> Result<String>;
}

/// Init-once owner of a model, shared by reference
pub struct ModelHandle {
    inner: Mutex<Box<dyn ActionModel + Send>>,
}

impl ModelHandle {
    pub fn new(model: impl ActionModel + Send + 'static) -> Self {
        Self { inner: Mutex::new(Box::new(model)) }
    }
}

impl ActionModel for ModelHandle {
    fn predict(&self, image: &DynamicImage, prompt: &str) -> Result<String> {
        let model = self
            .inner
            .lock()
            .map_err(|_| AgentError::ModelRequestFailed("model lock poisoned by an earlier panic".to_string()))?;
        model.predict(image, prompt)
    }
}
