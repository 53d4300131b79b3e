use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};
use tokio_util::sync::CancellationToken;

use relay_core::commands::CommandService;

use crate::handlers;
use crate::TelegramMessenger;

#[derive(Clone)]
pub struct AppState {
    pub commands: Arc<CommandService>,
    /// Replies go straight to Telegram; only webhook fan-out is throttled.
    pub messenger: TelegramMessenger,
}

/// Long-poll Telegram for updates until `shutdown` fires.
pub async fn run_polling(
    bot: Bot,
    commands: Arc<CommandService>,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    match bot.get_me().await {
        Ok(me) => tracing::info!(op = "telegram.start", bot = %me.username(), "bot started"),
        Err(e) => tracing::warn!(op = "telegram.start", error = %e, "get_me failed"),
    }

    let state = Arc::new(AppState {
        commands,
        messenger: TelegramMessenger::new(bot.clone()),
    });

    let handler =
        dptree::entry().branch(Update::filter_message().endpoint(handlers::handle_message));

    let mut dispatcher = Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .default_handler(|_| async {})
        .build();

    let token = dispatcher.shutdown_token();
    tokio::spawn(async move {
        shutdown.cancelled().await;
        match token.shutdown() {
            Ok(done) => done.await,
            Err(e) => {
                tracing::warn!(op = "telegram.shutdown", error = %e, "dispatcher not running")
            }
        }
    });

    dispatcher.dispatch().await;
    tracing::info!(op = "telegram.stop", "bot stopped");
    Ok(())
}
