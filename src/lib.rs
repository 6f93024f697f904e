pub mod adapters;
pub mod api;
pub mod bot;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::qr::{QrDecoder, QrEncoder};
pub use api::{router, AppState};
pub use config::AppConfig;
#[cfg(feature = "cli")]
pub use config::Args;
pub use utils::error::{QrError, Result};

/// Crate version, shown in the startup banner and the bot's user agent.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Set `BUILD_DATE` at compile time to stamp the banner.
pub const BUILD_DATE: &str = match option_env!("BUILD_DATE") {
    Some(date) => date,
    None => "unknown",
};
