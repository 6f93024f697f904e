use clap::Parser;
use qrcode_api::adapters::bearychat::{connect_rtm, start_rtm, BearyChatClient};
use qrcode_api::bot::{self, Bot};
use qrcode_api::utils::{logger, shutdown::shutdown_signal};
use qrcode_api::{AppConfig, Args, QrDecoder, QrError, BUILD_DATE, VERSION};
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let args = Args::parse();

    println!("QR Code Bot({})\nbuilt on {}\n", VERSION, BUILD_DATE);

    let loaded = AppConfig::from_file(&args.config).and_then(|config| {
        config.validate_bot()?;
        Ok(config)
    });
    logger::init_service_logger(loaded.as_ref().is_ok_and(|c| c.debug));

    let config = match loaded {
        Ok(config) => Arc::new(config),
        Err(e) => fatal(e),
    };

    if let Err(e) = run(config).await {
        fatal(e);
    }
    println!("QR Code Bot exited. :)");
}

async fn run(config: Arc<AppConfig>) -> qrcode_api::Result<()> {
    let client = BearyChatClient::new(&config.rtm_token, &config.open_api_base, VERSION)?;

    let rtm_http = reqwest::Client::builder()
        .user_agent(client.user_agent())
        .build()?;
    let session = start_rtm(&rtm_http, &config.rtm_api_base, &config.rtm_token).await?;
    tracing::info!(uid = %session.uid, "rtm connected");

    let (messages, errors) = connect_rtm(&session).await?;
    let bot = Bot::new(session.uid, Arc::new(client), Arc::new(QrDecoder), config);

    println!("QR Code Bot started...");
    bot::run(&bot, messages, errors, shutdown_signal()).await;
    Ok(())
}

fn fatal(e: QrError) -> ! {
    eprintln!("❌ {}", e);
    tracing::error!(error = %e, category = ?e.category(), "fatal error");
    std::process::exit(1);
}
