use crate::utils::error::Result;
use serde::{Deserialize, Deserializer};

/// Direct-message text the platform sends alongside an uploaded image.
pub const IMAGE_UPLOAD_MARKER: &str = "上传了图片";

/// One real-time event, decoded once at ingress.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    /// Someone quoted an image and mentioned the bot.
    AttachmentUpdate(ChatMessage),
    ChannelMessage(ChatMessage),
    DirectMessage(ChatMessage),
    Other,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ChatMessage {
    #[serde(default, deserialize_with = "null_as_default")]
    pub uid: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub vchannel_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,
    #[serde(default)]
    pub refer_key: Option<String>,
    #[serde(default)]
    pub file: Option<AttachedFile>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Attachment {
    #[serde(default)]
    pub file: Option<AttachedFile>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AttachedFile {
    #[serde(default, deserialize_with = "null_as_default")]
    pub mime: String,
    /// bytes
    #[serde(default, deserialize_with = "null_as_default")]
    pub size: usize,
    #[serde(default, deserialize_with = "null_as_default")]
    pub image_url: String,
}

#[derive(Deserialize)]
#[serde(tag = "type")]
enum RawEvent {
    #[serde(rename = "update_attachments")]
    UpdateAttachments {
        #[serde(default, deserialize_with = "null_as_default")]
        data: ChatMessage,
    },
    #[serde(rename = "channel_message")]
    Channel(ChatMessage),
    #[serde(rename = "p2p_message")]
    P2p(ChatMessage),
    #[serde(other)]
    Other,
}

/// Missing and `null` fields both take the default.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl ChatEvent {
    pub fn from_json(raw: &str) -> Result<Self> {
        let event = match serde_json::from_str::<RawEvent>(raw)? {
            RawEvent::UpdateAttachments { data } => ChatEvent::AttachmentUpdate(data),
            RawEvent::Channel(message) => ChatEvent::ChannelMessage(message),
            RawEvent::P2p(message) => ChatEvent::DirectMessage(message),
            RawEvent::Other => ChatEvent::Other,
        };
        Ok(event)
    }

    pub fn message(&self) -> Option<&ChatMessage> {
        match self {
            ChatEvent::AttachmentUpdate(m)
            | ChatEvent::ChannelMessage(m)
            | ChatEvent::DirectMessage(m) => Some(m),
            ChatEvent::Other => None,
        }
    }

    pub fn is_from(&self, uid: &str) -> bool {
        self.message().is_some_and(|m| m.uid == uid)
    }

    /// The text with the bot's mention removed, or `None` if the bot was not
    /// addressed. Direct messages always address the bot.
    pub fn mention_text(&self, bot_uid: &str) -> Option<String> {
        let message = self.message()?;
        if matches!(self, ChatEvent::DirectMessage(_)) {
            return Some(message.text.clone());
        }

        let token = mention_token(bot_uid);
        if message.text.contains(&token) {
            Some(message.text.replace(&token, ""))
        } else {
            None
        }
    }

    /// Image attachments come either as an attachment update or as a direct
    /// upload announced by [`IMAGE_UPLOAD_MARKER`].
    pub fn carries_attachment(&self) -> bool {
        match self {
            ChatEvent::AttachmentUpdate(_) => true,
            ChatEvent::DirectMessage(m) => m.text == IMAGE_UPLOAD_MARKER,
            _ => false,
        }
    }
}

impl ChatMessage {
    pub fn attached_file(&self) -> Option<&AttachedFile> {
        self.file
            .as_ref()
            .or_else(|| self.attachments.iter().find_map(|a| a.file.as_ref()))
            .filter(|f| !f.image_url.is_empty())
    }

    pub fn is_reply(&self) -> bool {
        self.refer_key.as_deref().is_some_and(|k| !k.is_empty())
    }
}

pub fn mention_token(uid: &str) -> String {
    format!("@<={}=>", uid)
}
