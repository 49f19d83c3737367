//! Token estimation.
//!
//! Costing a message means measuring its text with a BPE encoding and
//! adding the vendor's per-message bookkeeping overhead. The overhead
//! formula is NOT universal across vendors, so applying it to a model
//! family we have no rule for is an error, never a guess. Plain length
//! measurement, on the other hand, falls back to a generic encoding for
//! unrecognized models.

use std::sync::OnceLock;

use parley_core::{ContentPart, MessageContent, Role};
use tiktoken_rs::{cl100k_base, o200k_base, CoreBPE};

use crate::error::{ContextError, ContextResult};

/// Fixed token overhead the OpenAI chat format charges per message.
const MESSAGE_OVERHEAD_TOKENS: usize = 4;
/// Extra tokens charged once for priming the assistant's reply.
const REPLY_PRIMING_TOKENS: usize = 2;

/// Estimates the token cost of a message for a given model.
///
/// Implementations must be pure aside from a cached tokenizer resource.
/// The production implementation is [`TiktokenEstimator`]; tests inject
/// fixed-cost stubs.
pub trait TokenEstimator: Send + Sync {
    /// Full per-message cost of `content` sent as `role`, including the
    /// model family's bookkeeping overhead.
    fn estimate(&self, role: Role, content: &MessageContent, model: &str) -> ContextResult<usize>;
}

/// Cost rule for image parts: bucket the image into fixed-size tiles.
///
/// The defaults follow the published gpt-4o vision pricing guide
/// (85 base + 170 per 512x512 tile). This is a coarse approximation of
/// real model behavior, which is why the constants are configurable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageCostModel {
    pub base_cost: usize,
    pub per_tile_cost: usize,
    pub tile_size: u32,
}

impl Default for ImageCostModel {
    fn default() -> Self {
        Self {
            base_cost: 85,
            per_tile_cost: 170,
            tile_size: 512,
        }
    }
}

impl ImageCostModel {
    /// Token cost of a `width` x `height` image.
    pub fn cost(&self, width: u32, height: u32) -> usize {
        let tiles = width.div_ceil(self.tile_size) * height.div_ceil(self.tile_size);
        self.base_cost + self.per_tile_cost * tiles as usize
    }
}

/// BPE-backed estimator.
///
/// Text is measured with `o200k_base` for the gpt-4o family and
/// `cl100k_base` for everything else. The per-message overhead formula
/// (`4 + role + content + 2`) is only known for the OpenAI chat family;
/// other model ids fail with [`ContextError::UnsupportedModel`].
#[derive(Debug, Clone, Default)]
pub struct TiktokenEstimator {
    image_costs: ImageCostModel,
}

impl TiktokenEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_image_costs(image_costs: ImageCostModel) -> Self {
        Self { image_costs }
    }

    /// Raw BPE token length of `text` under the encoding for `model`.
    /// Falls back to `cl100k_base` for unrecognized models.
    pub fn text_tokens(&self, model: &str, text: &str) -> usize {
        encoding_for(model).encode_with_special_tokens(text).len()
    }

    /// Sum of per-part costs, without any per-message overhead.
    pub fn content_tokens(&self, model: &str, content: &MessageContent) -> usize {
        match content {
            MessageContent::Text(text) => self.text_tokens(model, text),
            MessageContent::Parts(parts) => parts
                .iter()
                .map(|part| match part {
                    ContentPart::Text { text } => self.text_tokens(model, text),
                    ContentPart::Image { width, height, .. } => {
                        self.image_costs.cost(*width, *height)
                    }
                })
                .sum(),
        }
    }

    pub fn image_costs(&self) -> &ImageCostModel {
        &self.image_costs
    }
}

impl TokenEstimator for TiktokenEstimator {
    fn estimate(&self, role: Role, content: &MessageContent, model: &str) -> ContextResult<usize> {
        if !model.starts_with("gpt-") {
            return Err(ContextError::UnsupportedModel(model.to_string()));
        }
        Ok(MESSAGE_OVERHEAD_TOKENS
            + self.text_tokens(model, role.as_str())
            + self.content_tokens(model, content)
            + REPLY_PRIMING_TOKENS)
    }
}

/// Process-wide tokenizer cache: loaded at most once per encoding,
/// shared read-only across sessions afterwards.
fn encoding_for(model: &str) -> &'static CoreBPE {
    static CL100K: OnceLock<CoreBPE> = OnceLock::new();
    static O200K: OnceLock<CoreBPE> = OnceLock::new();

    if model.starts_with("gpt-4o") {
        O200K.get_or_init(|| o200k_base().expect("failed to load o200k_base encoding"))
    } else {
        CL100K.get_or_init(|| cl100k_base().expect("failed to load cl100k_base encoding"))
    }
}
