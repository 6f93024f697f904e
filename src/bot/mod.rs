pub mod event;
pub mod replies;

use crate::config::AppConfig;
use crate::core::scan::scan_image_bytes;
use crate::domain::ports::{AttachmentImage, ChatApi, Decoder, MessageAttachment, OutgoingMessage};
use crate::utils::error::{panic_message, QrError, Result};
use event::ChatEvent;
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

pub use event::{AttachedFile, ChatMessage};

/// Tag appended to generated encode URLs so the API logs show the source.
pub const SOURCE_TAG: &str = "bearychat";
pub const REPLY_TIMEOUT: Duration = Duration::from_secs(60);
pub const ACCEPTED_MIME_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/gif"];

/// Decides and posts the reply for each chat event.
pub struct Bot {
    uid: String,
    chat: Arc<dyn ChatApi>,
    decoder: Arc<dyn Decoder>,
    config: Arc<AppConfig>,
}

impl Bot {
    pub fn new(
        uid: String,
        chat: Arc<dyn ChatApi>,
        decoder: Arc<dyn Decoder>,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            uid,
            chat,
            decoder,
            config,
        }
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }

    /// Posts the reply for `event`, if any. Failures are logged, never returned.
    pub async fn handle(&self, event: ChatEvent) {
        let Some(message) = self.respond(&event).await else {
            return;
        };

        match tokio::time::timeout(REPLY_TIMEOUT, self.chat.post_message(&message)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::error!(outgoing = ?message, error = %e, "failed to make response")
            }
            Err(_) => tracing::error!(outgoing = ?message, "reply timed out"),
        }
    }

    /// The reply `event` deserves, or `None` when the bot should stay quiet.
    pub async fn respond(&self, event: &ChatEvent) -> Option<OutgoingMessage> {
        let message = event.message()?;
        if event.is_from(&self.uid) {
            return None;
        }
        let content = event.mention_text(&self.uid)?;

        tracing::info!(uid = %message.uid, text = %message.text, "triggered");

        if message.vchannel_id.is_empty() {
            tracing::error!("can not get vchannel_id");
            return None;
        }
        let mut reply = OutgoingMessage {
            vchannel_id: message.vchannel_id.clone(),
            ..OutgoingMessage::default()
        };

        if event.carries_attachment() {
            reply.text = self.scan_reply(message).await;
            return Some(reply);
        }

        if message.is_reply() {
            return None;
        }

        let content = content.trim_matches([' ', '\n', '\r', '\t']);
        if content.eq_ignore_ascii_case(replies::HELP_COMMAND) {
            reply.text = replies::HELP.to_string();
        } else if content.eq_ignore_ascii_case(replies::HELLO_COMMAND) {
            reply.text = replies::HELLO.to_string();
        } else if content.is_empty() {
            reply.text = format!("{}{}", replies::EMPTY_CONTENT, replies::HELP);
        } else {
            match encode_url(&self.config, content) {
                Ok(url) => {
                    tracing::info!(url = %url, "generated");
                    reply.text = replies::ENCODED.to_string();
                    reply.attachments = vec![MessageAttachment {
                        images: vec![AttachmentImage { url }],
                    }];
                }
                Err(e) => {
                    tracing::error!(error = %e, "cannot build encode url");
                    reply.text = format!("{}{}", replies::SCAN_FAILED, e);
                }
            }
        }

        Some(reply)
    }

    async fn scan_reply(&self, message: &ChatMessage) -> String {
        let limit = self.config.max_decode_bytes();
        let Some(file) = message.attached_file() else {
            return format!("{}{}", replies::NO_ATTACHMENT, replies::HELP);
        };
        if file.size >= limit {
            return replies::ATTACHMENT_TOO_LARGE.to_string();
        }
        if !ACCEPTED_MIME_TYPES.contains(&file.mime.as_str()) {
            return replies::UNSUPPORTED_MIME.to_string();
        }

        match self.download_and_scan(file, limit).await {
            Err(e) => {
                tracing::warn!(error = %e, url = %file.image_url, "scan failed");
                format!("{}{}", replies::SCAN_FAILED, e)
            }
            Ok(found) if found.is_empty() => replies::NOT_FOUND.to_string(),
            Ok(found) => format!("{}{}", replies::SCAN_RESULT, found.join("\n")),
        }
    }

    async fn download_and_scan(&self, file: &AttachedFile, limit: usize) -> Result<Vec<String>> {
        let bytes = self.chat.download_file(&file.image_url, limit).await?;
        scan_image_bytes(self.decoder.clone(), bytes).await
    }
}

/// `encode_api_endpoint` plus `content`, `size` and `src` query parameters.
pub fn encode_url(config: &AppConfig, content: &str) -> Result<String> {
    let mut url = url::Url::parse(&config.encode_api_endpoint).map_err(|e| {
        QrError::InvalidConfigValueError {
            field: "encode_api_endpoint".to_string(),
            value: config.encode_api_endpoint.clone(),
            reason: e.to_string(),
        }
    })?;
    url.query_pairs_mut()
        .append_pair("content", content)
        .append_pair("size", &config.qrcode_size.to_string())
        .append_pair("src", SOURCE_TAG);
    Ok(url.into())
}

/// The bot's event loop.
///
/// Termination wins over pending work; connection errors are logged; each
/// message is handled to completion before the next one. A panic while
/// handling one message is logged and the loop moves on.
pub async fn run<F>(
    bot: &Bot,
    mut messages: mpsc::Receiver<ChatEvent>,
    mut errors: mpsc::Receiver<QrError>,
    shutdown: F,
) where
    F: Future<Output = ()>,
{
    futures::pin_mut!(shutdown);

    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => {
                tracing::info!("QR Code Bot is exiting safely...");
                break;
            }
            Some(err) = errors.recv() => {
                tracing::error!(error = %err, "RTM error");
            }
            incoming = messages.recv() => {
                let Some(event) = incoming else {
                    tracing::warn!("message stream closed");
                    break;
                };
                if let Err(panic) = AssertUnwindSafe(bot.handle(event)).catch_unwind().await {
                    tracing::error!(panic = %panic_message(&*panic), "panic while handling message");
                }
            }
        }
    }
}
