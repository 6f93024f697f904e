use crate::domain::model::{EncodeSpec, EncodedImage};
use crate::domain::ports::{Decoder, Encoder};
use crate::utils::error::{QrError, Result};
use std::sync::Arc;

/// Decodes the image container (PNG, JPEG or GIF) and scans it for symbols.
///
/// Runs on the blocking pool; a panic inside the decoder comes back as a
/// [`QrError::ScanError`] instead of tearing down the caller.
pub async fn scan_image_bytes(decoder: Arc<dyn Decoder>, bytes: Vec<u8>) -> Result<Vec<String>> {
    tokio::task::spawn_blocking(move || {
        let image = image::load_from_memory(&bytes)?;
        decoder.decode(&image)
    })
    .await
    .map_err(|e| QrError::ScanError {
        message: format!("fatal error: {}", e),
    })?
}

/// Blocking-pool wrapper around [`Encoder::encode`].
pub async fn encode_spec(encoder: Arc<dyn Encoder>, spec: EncodeSpec) -> Result<EncodedImage> {
    tokio::task::spawn_blocking(move || encoder.encode(&spec))
        .await
        .map_err(|e| QrError::EncodeError {
            message: format!("fatal error: {}", e),
        })?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::OutputType;
    use image::DynamicImage;

    struct PanickingDecoder;

    impl Decoder for PanickingDecoder {
        fn decode(&self, _image: &DynamicImage) -> Result<Vec<String>> {
            panic!("scanner exploded")
        }
    }

    struct FixedDecoder(Vec<String>);

    impl Decoder for FixedDecoder {
        fn decode(&self, _image: &DynamicImage) -> Result<Vec<String>> {
            Ok(self.0.clone())
        }
    }

    struct PanickingEncoder;

    impl Encoder for PanickingEncoder {
        fn encode(&self, _spec: &EncodeSpec) -> Result<EncodedImage> {
            panic!("encoder exploded")
        }
    }

    fn white_png() -> Vec<u8> {
        let img = image::GrayImage::from_pixel(8, 8, image::Luma([255u8]));
        let mut buf = Vec::new();
        DynamicImage::ImageLuma8(img)
            .write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    #[tokio::test]
    async fn test_scan_passes_decoded_image_to_decoder() {
        let decoder = Arc::new(FixedDecoder(vec!["hello".to_string()]));
        let result = scan_image_bytes(decoder, white_png()).await.unwrap();
        assert_eq!(result, vec!["hello".to_string()]);
    }

    #[tokio::test]
    async fn test_scan_rejects_non_image() {
        let decoder = Arc::new(FixedDecoder(vec![]));
        let err = scan_image_bytes(decoder, b"definitely not an image".to_vec())
            .await
            .unwrap_err();
        assert!(matches!(err, QrError::ImageError(_)));
        assert!(err.to_string().starts_with("file decoding error"));
    }

    #[tokio::test]
    async fn test_scan_converts_decoder_panic() {
        let err = scan_image_bytes(Arc::new(PanickingDecoder), white_png())
            .await
            .unwrap_err();
        assert!(matches!(err, QrError::ScanError { .. }));
        assert!(err.to_string().contains("fatal error"));
    }

    #[tokio::test]
    async fn test_encode_converts_encoder_panic() {
        let spec = EncodeSpec {
            content: "hello".to_string(),
            output: OutputType::Png,
            size: 64,
        };
        let err = encode_spec(Arc::new(PanickingEncoder), spec).await.unwrap_err();
        assert!(matches!(err, QrError::EncodeError { .. }));
    }
}
