use crate::domain::model::{EncodeSpec, EncodedImage, OutputType};
use crate::domain::ports::{Decoder, Encoder};
use crate::utils::error::{QrError, Result};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, GrayImage, ImageFormat, Luma};
use qirust::qrcode::{EncodeTextOptions, QrCode, QrCodeEcc, Version};

/// Light modules around the symbol, in modules.
const QUIET_ZONE: u32 = 4;
const JPEG_QUALITY: u8 = 80;

/// Encoder backed by `qirust`, medium error correction.
#[derive(Debug, Clone, Copy, Default)]
pub struct QrEncoder;

impl Encoder for QrEncoder {
    fn encode(&self, spec: &EncodeSpec) -> Result<EncodedImage> {
        let mut outbuffer = vec![0u8; Version::MAX.buffer_len()];
        let mut tempbuffer = vec![0u8; Version::MAX.buffer_len()];
        let qr = QrCode::encode_text(
            &spec.content,
            &mut tempbuffer,
            &mut outbuffer,
            EncodeTextOptions {
                ecl: QrCodeEcc::Medium,
                minversion: Version::MIN,
                maxversion: Version::MAX,
                mask: None,
                boostecl: false,
            },
        )
        .map_err(|e| QrError::EncodeError {
            message: e.to_string(),
        })?;

        let bytes = match spec.output {
            OutputType::Png => {
                let mut buf = Vec::new();
                DynamicImage::ImageLuma8(rasterize(&qr, spec.size))
                    .write_to(&mut std::io::Cursor::new(&mut buf), ImageFormat::Png)?;
                buf
            }
            OutputType::Jpeg => {
                let mut buf = Vec::new();
                JpegEncoder::new_with_quality(&mut buf, JPEG_QUALITY)
                    .encode_image(&rasterize(&qr, spec.size))?;
                buf
            }
            OutputType::String => to_text(&qr).into_bytes(),
        };

        Ok(EncodedImage {
            bytes,
            output: spec.output,
        })
    }
}

/// Draws the symbol on a `size`×`size` canvas, centred.
///
/// Modules are whole pixels, so a canvas too small for the symbol plus quiet
/// zone grows to the minimum that fits.
fn rasterize(qr: &QrCode, size: u32) -> GrayImage {
    let modules = qr.size() as u32 + 2 * QUIET_ZONE;
    let size = size.max(modules);
    let scale = size / modules;
    let offset = (size - modules * scale) / 2;

    GrayImage::from_fn(size, size, |x, y| {
        if x < offset || y < offset {
            return Luma([255u8]);
        }
        let mx = ((x - offset) / scale) as i32 - QUIET_ZONE as i32;
        let my = ((y - offset) / scale) as i32 - QUIET_ZONE as i32;
        if qr.get_module(mx, my) {
            Luma([0u8])
        } else {
            Luma([255u8])
        }
    })
}

fn to_text(qr: &QrCode) -> String {
    let border = QUIET_ZONE as i32;
    let mut out = String::new();
    for y in -border..qr.size() + border {
        for x in -border..qr.size() + border {
            out.push_str(if qr.get_module(x, y) { "██" } else { "  " });
        }
        out.push('\n');
    }
    out
}

/// Decoder backed by `rqrr`.
#[derive(Debug, Clone, Copy, Default)]
pub struct QrDecoder;

impl Decoder for QrDecoder {
    fn decode(&self, image: &DynamicImage) -> Result<Vec<String>> {
        let luma = image.to_luma8();
        let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
            luma.width() as usize,
            luma.height() as usize,
            |x, y| luma.get_pixel(x as u32, y as u32)[0],
        );

        let mut content = Vec::new();
        for grid in prepared.detect_grids() {
            match grid.decode() {
                Ok((_, text)) => content.push(text),
                // a damaged candidate does not spoil the others
                Err(e) => tracing::debug!("skipping unreadable grid: {:?}", e),
            }
        }
        Ok(content)
    }
}
