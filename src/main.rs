use std::sync::Arc;

use tracing::{error, info};

use finchat::bot::{QuoteFetcher, StockBot};
use finchat::config::TransportKind;
use finchat::messenger::connect_transport;
use finchat::web::WebServer;
use finchat::{CommandMessageHandler, CommandMessenger, Config, Database, Hub, Result};

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

    info!("finchat - multi-room chat");

    if let Err(e) = run(config).await {
        error!("Fatal: {}", e);
        std::process::exit(1);
    }
}

async fn run(config: Config) -> Result<()> {
    config.validate()?;

    let db = Database::open(&config.database.path).await?;
    let (hub, hub_task) = Hub::spawn(&config.hub);

    let transport = connect_transport(&config.messenger).await?;
    let messenger = CommandMessenger::from_config(transport.clone(), &config.messenger);
    info!(
        transport = config.messenger.transport.as_str(),
        request_queue = messenger.request_queue(),
        response_queue = messenger.response_queue(),
        "Command messenger ready"
    );

    let handler = Arc::new(
        CommandMessageHandler::new(messenger.clone(), hub.clone(), db.clone(), &config.bot)
            .await?,
    );
    hub.add_subscriber(handler.clone());

    if config.messenger.transport == TransportKind::Memory {
        let bot = StockBot::new(
            Arc::new(QuoteFetcher::new(&config.bot)?),
            transport,
            messenger.request_queue(),
            messenger.response_queue(),
        );
        tokio::spawn(async move {
            if let Err(e) = bot.run().await {
                error!("In-process stock bot stopped: {}", e);
            }
        });
        info!("Stock bot running in-process");
    }

    let response_loop = {
        let handler = handler.clone();
        async move {
            messenger
                .run_response_loop(move |response| {
                    let handler = handler.clone();
                    async move { handler.on_command_response(response).await }
                })
                .await
        }
    };

    let server = WebServer::new(&config.server, db.clone(), hub.clone())?;
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for shutdown signal: {}", e);
        }
        info!("Shutdown requested");
    };

    let outcome = tokio::select! {
        result = server.run(shutdown) => result,
        result = response_loop => {
            error!("Command response loop ended");
            result
        }
    };

    hub.shutdown();
    if let Err(e) = hub_task.await {
        error!("Hub task failed: {}", e);
    }
    db.close().await;
    info!("finchat stopped");

    outcome
}
