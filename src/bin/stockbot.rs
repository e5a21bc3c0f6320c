use std::sync::Arc;

use tracing::{error, info};

use finchat::bot::{QuoteFetcher, StockBot};
use finchat::config::TransportKind;
use finchat::messenger::connect_transport;
use finchat::{ChatError, Config, Result};

#[tokio::main]
async fn main() {
    let config = match Config::load_with_env("config.toml") {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config.toml: {e}");
            eprintln!("Using default configuration.");
            let mut config = Config::default();
            config.apply_env_overrides();
            config
        }
    };

    if let Err(e) = finchat::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        finchat::logging::init_console_only(&config.logging.level);
    }

    if let Err(e) = run(config).await {
        error!("Fatal: {}", e);
        std::process::exit(1);
    }
}

async fn run(config: Config) -> Result<()> {
    config.validate()?;
    if config.messenger.transport == TransportKind::Memory {
        return Err(ChatError::Config(
            "the memory transport runs the bot inside finchat; choose amqp or sqs".to_string(),
        ));
    }

    let transport = connect_transport(&config.messenger).await?;
    let (request_queue, response_queue) = config.messenger.destinations();
    let bot = StockBot::new(
        Arc::new(QuoteFetcher::new(&config.bot)?),
        transport,
        request_queue,
        response_queue,
    );

    info!(
        transport = config.messenger.transport.as_str(),
        "Starting to process stock commands"
    );

    tokio::select! {
        result = bot.run() => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown requested");
            Ok(())
        }
    }
}
