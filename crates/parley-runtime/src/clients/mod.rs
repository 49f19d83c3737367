//! Vendor client implementations
//!
//! This module contains concrete implementations of the LlmClient trait
//! for the hosted APIs the bots talk to (OpenAI, Anthropic).

use base64::Engine as _;
use reqwest::Client;
use tracing::warn;

use parley_core::ContentPart;

use crate::error::{ClientError, ClientResult};
use crate::Attachment;

pub mod anthropic;
pub mod openai;

pub use anthropic::AnthropicClient;
pub use openai::OpenAiClient;

const IMAGE_TYPES: [&str; 5] = [
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/webp",
];

/// Download an attachment and convert it to vendor-neutral content
/// parts. The vendor-specific wire form is applied when the request is
/// serialized, so both clients share this step.
pub(crate) async fn fetch_attachment(
    client: &Client,
    attachment: &Attachment,
) -> ClientResult<Vec<ContentPart>> {
    let content_type = attachment.content_type.as_str();

    if content_type.contains("text/plain") {
        let response = client
            .get(&attachment.url)
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        if !response.status().is_success() {
            return Err(ClientError::AttachmentFetch(response.status().as_u16()));
        }
        let text = response
            .text()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))?;
        return Ok(vec![ContentPart::text(text)]);
    }

    if IMAGE_TYPES.contains(&content_type) {
        let response = client
            .get(&attachment.url)
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        if !response.status().is_success() {
            return Err(ClientError::AttachmentFetch(response.status().as_u16()));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))?;
        let data = base64::engine::general_purpose::STANDARD.encode(&bytes);
        return Ok(vec![ContentPart::Image {
            media_type: content_type.to_string(),
            data,
            // Platforms report image dimensions with the attachment;
            // a missing report is sized as a single tile.
            width: attachment.width.unwrap_or(512),
            height: attachment.height.unwrap_or(512),
        }]);
    }

    warn!(content_type, url = %attachment.url, "rejected attachment");
    Err(ClientError::UnsupportedAttachment(content_type.to_string()))
}
