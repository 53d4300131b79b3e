use std::sync::Arc;

use teloxide::Bot;
use tokio_util::sync::CancellationToken;

use relay_core::{
    chat::ChatService,
    commands::CommandService,
    company::CompanyService,
    config::Config,
    conversation::InMemoryConversations,
    messaging::{port::DeliveryPort, throttled::ThrottledDelivery},
    registration::RegistrationService,
    routing::MessageRouter,
    Error,
};
use relay_http::{server, HttpState};
use relay_storage::SqliteStore;
use relay_telegram::TelegramMessenger;

#[tokio::main]
async fn main() -> Result<(), Error> {
    let cfg = Config::load()?;
    relay_core::logging::init("relay", &cfg.log_level)?;

    let store = Arc::new(SqliteStore::connect(&cfg.database_url).await?);
    tracing::info!(op = "main", database = %cfg.database_url, "storage ready");

    let bot = Bot::new(cfg.telegram_bot_token.clone());

    // Webhook fan-out is paced to stay under Telegram's flood limits; the adapter itself
    // still retries once on a short RetryAfter.
    let raw: Arc<dyn DeliveryPort> = Arc::new(TelegramMessenger::new(bot.clone()));
    let transport: Arc<dyn DeliveryPort> = Arc::new(
        ThrottledDelivery::new(raw, cfg.throttle).with_send_timeout(cfg.http_timeout),
    );
    let router =
        MessageRouter::new(store.clone(), transport).with_lookup_timeout(cfg.http_timeout);

    let registration = Arc::new(RegistrationService::new(
        store.clone(),
        store.clone(),
        cfg.token_length,
    ));
    let companies = Arc::new(CompanyService::new(
        store.clone(),
        store.clone(),
        cfg.token_length,
    ));
    let chats = Arc::new(ChatService::new(store.clone(), store.clone(), store.clone()));
    let commands = Arc::new(CommandService::new(
        registration,
        companies,
        chats,
        Arc::new(InMemoryConversations::new()),
    ));

    let shutdown = CancellationToken::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    tracing::info!(op = "main", "ctrl-c received, shutting down");
                    shutdown.cancel();
                }
                Err(e) => tracing::error!(op = "main", error = %e, "cannot listen for ctrl-c"),
            }
        });
    }

    let listener = server::bind(&cfg.http_address).await?;
    let http = tokio::spawn(server::serve(
        listener,
        HttpState::new(Arc::new(router)),
        shutdown.clone(),
    ));

    let polled = relay_telegram::router::run_polling(bot, commands, shutdown.clone()).await;
    // The bot stopping for any reason takes the HTTP side down with it.
    shutdown.cancel();

    http.await
        .map_err(|e| Error::External(format!("http server task failed: {e}")))??;
    polled.map_err(|e| Error::External(format!("telegram bot failed: {e}")))?;

    store.close().await;
    Ok(())
}
