use serde::{Deserialize, Serialize};

/// Output format of an encode request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputType {
    #[default]
    Png,
    Jpeg,
    /// Text-art rendering, two characters per module.
    String,
}

impl OutputType {
    /// Unknown or missing values fall back to PNG.
    pub fn resolve(requested: &str) -> Self {
        match requested {
            "png" => OutputType::Png,
            "jpeg" | "jpg" => OutputType::Jpeg,
            "string" => OutputType::String,
            _ => OutputType::default(),
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            OutputType::Png => "image/png",
            OutputType::Jpeg => "image/jpeg",
            OutputType::String => "text/plain; charset=utf-8",
        }
    }
}

/// Validated parameters for one encode operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeSpec {
    pub content: String,
    pub output: OutputType,
    /// Desired edge length in pixels. Raster output may grow to fit the symbol.
    pub size: u32,
}

#[derive(Debug, Clone)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
    pub output: OutputType,
}

/// Body of every `/decode` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodeResult {
    pub ok: bool,
    pub desc: String,
    pub content: Option<Vec<String>>,
}

impl DecodeResult {
    pub fn found(content: Vec<String>) -> Self {
        Self {
            ok: true,
            desc: String::new(),
            content: Some(content),
        }
    }

    pub fn failed(desc: impl Into<String>) -> Self {
        Self {
            ok: false,
            desc: desc.into(),
            content: None,
        }
    }

    pub fn too_large() -> Self {
        Self::failed("request is too large")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_output_type() {
        assert_eq!(OutputType::resolve("png"), OutputType::Png);
        assert_eq!(OutputType::resolve("string"), OutputType::String);
        assert_eq!(OutputType::resolve("jpeg"), OutputType::Jpeg);
        assert_eq!(OutputType::resolve(""), OutputType::Png);
        assert_eq!(OutputType::resolve("bmp"), OutputType::Png);
        assert_eq!(OutputType::resolve("PNG"), OutputType::Png);
    }

    #[test]
    fn test_decode_result_json_shape() {
        let json = serde_json::to_value(DecodeResult::too_large()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"ok": false, "desc": "request is too large", "content": null})
        );

        let json = serde_json::to_value(DecodeResult::found(vec![])).unwrap();
        assert_eq!(json, serde_json::json!({"ok": true, "desc": "", "content": []}));
    }
}
