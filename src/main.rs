use clap::Parser;
use qrcode_api::api::server::{serve, SHUTDOWN_TIMEOUT};
use qrcode_api::utils::{logger, shutdown::shutdown_signal, validation::Validate};
use qrcode_api::{router, AppConfig, AppState, Args, QrError, BUILD_DATE, VERSION};

#[tokio::main]
async fn main() {
    let args = Args::parse();

    println!("QRCode API({})\nbuilt on {}\n", VERSION, BUILD_DATE);

    // 載入並驗證配置
    let loaded = AppConfig::from_file(&args.config).and_then(|config| {
        config.validate()?;
        Ok(config)
    });
    logger::init_service_logger(loaded.as_ref().is_ok_and(|c| c.debug));

    let config = match loaded {
        Ok(config) => config,
        Err(e) => fatal(e),
    };
    tracing::debug!("config: {:?}", config);

    let addr = match config.listen_addr() {
        Ok(addr) => addr,
        Err(e) => fatal(e),
    };
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => fatal(QrError::IoError(e)),
    };

    println!("API starting...");
    tracing::info!(%addr, "API starting...");

    let app = router(AppState::with_qr_libraries(config));
    if let Err(e) = serve(listener, app, shutdown_signal(), SHUTDOWN_TIMEOUT).await {
        fatal(e);
    }

    println!("API exited successfully. :)");
}

fn fatal(e: QrError) -> ! {
    eprintln!("❌ {}", e);
    tracing::error!(error = %e, category = ?e.category(), "fatal error");
    std::process::exit(1);
}
