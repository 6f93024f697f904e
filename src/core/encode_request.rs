use crate::config::AppConfig;
use crate::domain::model::{EncodeSpec, OutputType};
use crate::utils::error::{QrError, Result};

/// Query field names
pub const CONTENT_FIELD: &str = "content";
pub const TYPE_FIELD: &str = "type";
pub const SIZE_FIELD: &str = "size";

/// Content length ceiling in bytes.
pub const MAX_CONTENT_BYTES: usize = 2048;

/// Raw `/encode` query parameters, first occurrence wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncodeQuery {
    pub content: Option<String>,
    pub r#type: Option<String>,
    pub size: Option<String>,
}

impl EncodeQuery {
    pub fn from_query_str(query: &str) -> Self {
        let mut parsed = Self::default();
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            let slot = match key.as_ref() {
                CONTENT_FIELD => &mut parsed.content,
                TYPE_FIELD => &mut parsed.r#type,
                SIZE_FIELD => &mut parsed.size,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into_owned());
            }
        }
        parsed
    }
}

/// Turns raw query parameters into an [`EncodeSpec`].
///
/// Only `content` can make this fail. A bad `size` silently becomes
/// `default_encode_width` and an unknown `type` becomes PNG.
pub fn parse_encode_request(query: &EncodeQuery, config: &AppConfig) -> Result<EncodeSpec> {
    let content = query.content.as_deref().unwrap_or_default();
    if content.is_empty() {
        return Err(QrError::validation("content is empty"));
    }
    if content.len() > MAX_CONTENT_BYTES {
        return Err(QrError::validation(format!(
            "content too long, should be no more than {} bytes",
            MAX_CONTENT_BYTES
        )));
    }

    let size = match query.size.as_deref().map(str::parse::<i64>) {
        Some(Ok(size)) if size > 0 && size <= i64::from(config.max_encode_width) => size as u32,
        _ => config.default_encode_width,
    };

    Ok(EncodeSpec {
        content: content.to_string(),
        output: OutputType::resolve(query.r#type.as_deref().unwrap_or_default()),
        size,
    })
}
