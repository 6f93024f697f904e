#[cfg(feature = "bot")]
use crate::bot::event::ChatEvent;
use crate::core::bounded::read_bounded;
use crate::domain::ports::{ChatApi, OutgoingMessage};
use crate::utils::error::{QrError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
#[cfg(feature = "bot")]
use tokio::sync::mpsc;

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);
#[cfg(feature = "bot")]
const PING_INTERVAL: Duration = Duration::from_secs(30);
#[cfg(feature = "bot")]
const CHANNEL_CAPACITY: usize = 64;

/// BearyChat OpenAPI client: posts replies and fetches attachments.
#[derive(Debug, Clone)]
pub struct BearyChatClient {
    client: Client,
    downloader: Client,
    token: String,
    open_api_base: String,
    user_agent: String,
}

#[derive(Serialize)]
struct CreateMessage<'a> {
    token: &'a str,
    #[serde(flatten)]
    message: &'a OutgoingMessage,
}

impl BearyChatClient {
    pub fn new(token: &str, open_api_base: &str, version: &str) -> Result<Self> {
        let user_agent = format!("QR Code Bot(XiaoMa){}", version);
        Ok(Self {
            client: Client::builder().user_agent(&user_agent).build()?,
            downloader: Client::builder()
                .timeout(DOWNLOAD_TIMEOUT)
                .user_agent(&user_agent)
                .build()?,
            token: token.to_string(),
            open_api_base: open_api_base.trim_end_matches('/').to_string(),
            user_agent,
        })
    }

    /// `file.location` lookup URL for an attachment's image URL. The file key
    /// is the last path segment.
    pub fn file_location_url(&self, image_url: &str) -> Result<String> {
        let Some((_, file_key)) = image_url.rsplit_once('/') else {
            return Err(QrError::ChatError {
                message: "imageURL malformed".to_string(),
            });
        };

        let mut url = url::Url::parse(&format!("{}/file.location", self.open_api_base))
            .map_err(|e| QrError::transport("file.location url", e))?;
        url.query_pairs_mut()
            .append_pair("file_key", file_key)
            .append_pair("token", &self.token);
        Ok(url.into())
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }
}

#[async_trait]
impl ChatApi for BearyChatClient {
    async fn post_message(&self, message: &OutgoingMessage) -> Result<()> {
        let url = format!("{}/message.create", self.open_api_base);
        tracing::debug!("Posting message to: {}", message.vchannel_id);

        let response = self
            .client
            .post(&url)
            .json(&CreateMessage {
                token: &self.token,
                message,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(QrError::ChatError {
                message: format!("message.create returned {}: {}", status, body),
            });
        }
        Ok(())
    }

    async fn download_file(&self, image_url: &str, limit: usize) -> Result<Vec<u8>> {
        let url = self.file_location_url(image_url)?;
        let response = self
            .downloader
            .get(&url)
            .send()
            .await
            .map_err(|e| QrError::transport("download", e))?;

        if !response.status().is_success() {
            return Err(QrError::transport(
                "download",
                format!("unexpected status {}", response.status()),
            ));
        }

        read_bounded(response.bytes_stream(), limit).await
    }
}

/// What `rtm.start` tells us about this connection.
#[derive(Debug, Clone, PartialEq)]
pub struct RtmSession {
    pub uid: String,
    pub ws_host: String,
}

#[derive(Deserialize)]
struct RtmStartResponse {
    code: i64,
    #[serde(default)]
    error: Option<String>,
    result: Option<RtmStartResult>,
}

#[derive(Deserialize)]
struct RtmStartResult {
    user: RtmUser,
    ws_host: String,
}

#[derive(Deserialize)]
struct RtmUser {
    id: String,
}

pub async fn start_rtm(client: &Client, rtm_api_base: &str, token: &str) -> Result<RtmSession> {
    let url = format!("{}/start", rtm_api_base.trim_end_matches('/'));
    let response: RtmStartResponse = client
        .post(&url)
        .json(&serde_json::json!({ "token": token }))
        .send()
        .await?
        .json()
        .await?;

    match (response.code, response.result) {
        (0, Some(result)) => Ok(RtmSession {
            uid: result.user.id,
            ws_host: result.ws_host,
        }),
        (code, _) => Err(QrError::ChatError {
            message: format!(
                "rtm.start failed with code {}: {}",
                code,
                response.error.unwrap_or_default()
            ),
        }),
    }
}

/// Connects the websocket and returns the message and error streams.
///
/// A background task reads frames, decodes each into a [`ChatEvent`] and pings
/// the server periodically. Decode and transport failures go to the error
/// stream; the message stream closes when the connection ends.
#[cfg(feature = "bot")]
pub async fn connect_rtm(
    session: &RtmSession,
) -> Result<(mpsc::Receiver<ChatEvent>, mpsc::Receiver<QrError>)> {
    use futures::{SinkExt, StreamExt};
    use tokio_tungstenite::tungstenite::Message;

    let (ws, _) = tokio_tungstenite::connect_async(session.ws_host.as_str())
        .await
        .map_err(|e| QrError::transport("websocket connect", e))?;
    let (mut sink, mut stream) = ws.split();

    let (message_tx, message_rx) = mpsc::channel(CHANNEL_CAPACITY);
    let (error_tx, error_rx) = mpsc::channel(CHANNEL_CAPACITY);

    tokio::spawn(async move {
        let mut ping = tokio::time::interval(PING_INTERVAL);
        let mut call_id: u64 = 0;

        loop {
            tokio::select! {
                _ = ping.tick() => {
                    call_id += 1;
                    let frame = serde_json::json!({ "type": "ping", "call_id": call_id }).to_string();
                    if let Err(e) = sink.send(Message::Text(frame)).await {
                        let _ = error_tx.send(QrError::transport("websocket ping", e)).await;
                        break;
                    }
                }
                frame = stream.next() => match frame {
                    Some(Ok(Message::Text(text))) => match ChatEvent::from_json(&text) {
                        Ok(ChatEvent::Other) => {}
                        Ok(event) => {
                            if message_tx.send(event).await.is_err() {
                                break;
                            }
                        }
                        Err(e) => {
                            let _ = error_tx.send(e).await;
                        }
                    },
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        let _ = error_tx.send(QrError::transport("websocket read", e)).await;
                        break;
                    }
                }
            }
        }
        tracing::info!("RTM connection closed");
    });

    Ok((message_rx, error_rx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{AttachmentImage, MessageAttachment};
    use httpmock::prelude::*;

    fn client(base: &str) -> BearyChatClient {
        BearyChatClient::new("tok", base, "0.1.0").unwrap()
    }

    #[test]
    fn test_file_location_url() {
        let c = client("https://api.example.com/v1/");
        assert_eq!(
            c.file_location_url("https://file.example.com/images/abc123").unwrap(),
            "https://api.example.com/v1/file.location?file_key=abc123&token=tok"
        );
        assert!(c.file_location_url("no-slash-here").is_err());
        assert_eq!(c.user_agent(), "QR Code Bot(XiaoMa)0.1.0");
    }

    #[tokio::test]
    async fn test_post_message() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/message.create")
                .json_body(serde_json::json!({
                    "token": "tok",
                    "vchannel_id": "=c1",
                    "text": "hi",
                    "attachments": [{"images": [{"url": "https://qr.example.com/encode?content=hi"}]}]
                }));
            then.status(200).json_body(serde_json::json!({"key": "m1"}));
        });

        let message = OutgoingMessage {
            vchannel_id: "=c1".to_string(),
            text: "hi".to_string(),
            attachments: vec![MessageAttachment {
                images: vec![AttachmentImage {
                    url: "https://qr.example.com/encode?content=hi".to_string(),
                }],
            }],
        };
        client(&server.base_url()).post_message(&message).await.unwrap();
        api_mock.assert();
    }

    #[tokio::test]
    async fn test_post_message_error_status() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/message.create");
            then.status(403).body("forbidden");
        });

        let err = client(&server.base_url())
            .post_message(&OutgoingMessage::default())
            .await
            .unwrap_err();
        assert!(matches!(err, QrError::ChatError { .. }));
    }

    #[tokio::test]
    async fn test_download_file_bounded() {
        let server = MockServer::start();
        let download = server.mock(|when, then| {
            when.method(GET)
                .path("/file.location")
                .query_param("file_key", "k1")
                .query_param("token", "tok");
            then.status(200).body(vec![9u8; 100]);
        });

        let c = client(&server.base_url());
        let bytes = c.download_file("https://f.example.com/k1", 101).await.unwrap();
        assert_eq!(bytes.len(), 100);

        let err = c.download_file("https://f.example.com/k1", 100).await.unwrap_err();
        assert!(matches!(err, QrError::TooLarge { .. }));
        download.assert_hits(2);
    }

    #[tokio::test]
    async fn test_start_rtm() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/start").json_body(serde_json::json!({"token": "tok"}));
            then.status(200).json_body(serde_json::json!({
                "code": 0,
                "result": {"user": {"id": "=bot"}, "ws_host": "wss://rtm.example.com/ws"}
            }));
        });

        let session = start_rtm(&Client::new(), &server.base_url(), "tok").await.unwrap();
        assert_eq!(
            session,
            RtmSession {
                uid: "=bot".to_string(),
                ws_host: "wss://rtm.example.com/ws".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_start_rtm_failure() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/start");
            then.status(200)
                .json_body(serde_json::json!({"code": 1, "error": "invalid token"}));
        });

        let err = start_rtm(&Client::new(), &server.base_url(), "bad").await.unwrap_err();
        assert!(err.to_string().contains("invalid token"));
    }
}
