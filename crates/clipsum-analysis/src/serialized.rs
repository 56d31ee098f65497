//! Serialized access to models that cannot run overlapping calls.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::ModelResult;
use crate::model::{FrameImage, GenerationRequest, ReasoningModel, VisionModel};

/// Wraps a shared model so at most one call is in flight at a time.
pub struct Serialized<M: ?Sized> {
    inner: Arc<M>,
    lock: Mutex<()>,
}

impl<M: ?Sized> Serialized<M> {
    pub fn new(inner: Arc<M>) -> Self {
        Self {
            inner,
            lock: Mutex::new(()),
        }
    }
}

#[async_trait]
impl<M: VisionModel + ?Sized> VisionModel for Serialized<M> {
    async fn describe(&self, image: &FrameImage, prompt: &str) -> ModelResult<String> {
        let _permit = self.lock.lock().await;
        self.inner.describe(image, prompt).await
    }

    fn supports_concurrent_calls(&self) -> bool {
        true
    }
}

#[async_trait]
impl<M: ReasoningModel + ?Sized> ReasoningModel for Serialized<M> {
    async fn generate(&self, request: &GenerationRequest) -> ModelResult<String> {
        let _permit = self.lock.lock().await;
        self.inner.generate(request).await
    }

    fn supports_concurrent_calls(&self) -> bool {
        true
    }
}

/// Return `model` unchanged if it is concurrency-safe, otherwise wrapped.
pub fn serialize_vision(model: Arc<dyn VisionModel>) -> Arc<dyn VisionModel> {
    if model.supports_concurrent_calls() {
        model
    } else {
        debug!("Serializing access to vision model");
        Arc::new(Serialized::new(model))
    }
}

/// Return `model` unchanged if it is concurrency-safe, otherwise wrapped.
pub fn serialize_reasoning(model: Arc<dyn ReasoningModel>) -> Arc<dyn ReasoningModel> {
    if model.supports_concurrent_calls() {
        model
    } else {
        debug!("Serializing access to reasoning model");
        Arc::new(Serialized::new(model))
    }
}
