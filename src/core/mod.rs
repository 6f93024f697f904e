pub mod bounded;
pub mod encode_request;
pub mod scan;

pub use crate::domain::model::{DecodeResult, EncodeSpec, EncodedImage, OutputType};
pub use crate::domain::ports::{ChatApi, Decoder, Encoder};
pub use crate::utils::error::Result;
