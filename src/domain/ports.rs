use crate::domain::model::{EncodeSpec, EncodedImage};
use crate::utils::error::Result;
use async_trait::async_trait;
use image::DynamicImage;
use serde::Serialize;

/// Renders a validated spec into bytes of the resolved output type.
pub trait Encoder: Send + Sync {
    fn encode(&self, spec: &EncodeSpec) -> Result<EncodedImage>;
}

/// Finds every readable symbol in an image. No symbol is `Ok(vec![])`.
pub trait Decoder: Send + Sync {
    fn decode(&self, image: &DynamicImage) -> Result<Vec<String>>;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OutgoingMessage {
    pub vchannel_id: String,
    pub text: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<MessageAttachment>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageAttachment {
    pub images: Vec<AttachmentImage>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttachmentImage {
    pub url: String,
}

/// Outbound half of the chat platform.
#[async_trait]
pub trait ChatApi: Send + Sync {
    async fn post_message(&self, message: &OutgoingMessage) -> Result<()>;

    /// Fetches an attachment, failing once `limit` bytes have been read.
    async fn download_file(&self, image_url: &str, limit: usize) -> Result<Vec<u8>>;
}
