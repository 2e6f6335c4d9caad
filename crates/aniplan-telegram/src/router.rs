use std::{collections::HashMap, sync::Arc};

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};

use tokio::sync::{Mutex, OwnedMutexGuard};

use aniplan_core::{
    audit::AuditLogger, config::Config, dispatch::CommandDispatcher,
    messaging::port::MessagingPort, service::PlanService, source::AnimeSource,
};

use crate::handlers;
use crate::TelegramMessenger;

#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<CommandDispatcher>,
    pub chat_locks: Arc<ChatLocks>,
}

/// One async lock per chat, so commands from a chat run one at a time.
#[derive(Default)]
pub struct ChatLocks {
    inner: Mutex<HashMap<i64, Arc<Mutex<()>>>>,
}

impl ChatLocks {
    pub async fn lock_chat(&self, chat_id: i64) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().await;
            map.entry(chat_id)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}

pub async fn run_polling(cfg: Arc<Config>, source: Arc<dyn AnimeSource>) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.telegram_bot_token.clone());

    match bot.get_me().await {
        Ok(me) => tracing::info!(bot = %me.username(), "aniplan started"),
        Err(e) => tracing::warn!(error = %e, "get_me failed; continuing"),
    }
    tracing::info!(
        registry = %cfg.registry_file.display(),
        endpoint = %cfg.anilist_api_url,
        "configuration loaded"
    );

    let messenger: Arc<dyn MessagingPort> = Arc::new(TelegramMessenger::new(bot.clone()));
    let dispatcher = Arc::new(CommandDispatcher::new(
        PlanService::new(cfg.clone(), source),
        messenger,
        AuditLogger::new(cfg.audit_log_path.clone(), cfg.audit_log_json),
    ));

    let state = Arc::new(AppState {
        dispatcher,
        chat_locks: Arc::new(ChatLocks::default()),
    });

    let handler = dptree::entry().branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .build()
        .dispatch()
        .await;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn chat_lock_serialises_same_chat() {
        let locks = Arc::new(ChatLocks::default());
        let guard = locks.lock_chat(1).await;

        let l2 = locks.clone();
        let waiter = tokio::spawn(async move {
            let _g = l2.lock_chat(1).await;
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiter.is_finished());

        // A different chat is not blocked.
        let _other = tokio::time::timeout(Duration::from_millis(200), locks.lock_chat(2))
            .await
            .unwrap();

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }
}
