//! Telegram update handlers.
//!
//! Only slash commands are acted on; everything else is ignored.

use std::sync::Arc;

use teloxide::{prelude::*, types::Message};

use crate::router::AppState;

mod commands;

pub async fn handle_message(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    if !text.trim_start().starts_with('/') {
        return Ok(());
    }

    // Commands from one chat run in order; registry writes included.
    let _guard = state.chat_locks.lock_chat(msg.chat.id.0).await;
    commands::handle_command(bot, msg, state).await
}
