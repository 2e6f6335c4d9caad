use std::sync::Arc;

use teloxide::prelude::*;

use aniplan_core::{domain::ChatId, messaging::types::Command};

use crate::router::AppState;

/// Build a core `Command` from a Telegram message.
pub(crate) fn command_from_message(msg: &Message) -> Option<Command> {
    let text = msg.text()?;
    let user = msg.from();
    Command::parse(
        ChatId(msg.chat.id.0),
        user.map(|u| u.id.0 as i64),
        user.and_then(|u| u.username.clone()),
        text,
    )
}

pub async fn handle_command(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(cmd) = command_from_message(&msg) else {
        return Ok(());
    };

    if let Err(e) = state.dispatcher.handle(&cmd).await {
        // Only delivery failures reach here.
        tracing::error!(command = %cmd.name, error = %e, "command failed");
        let _ = bot
            .send_message(msg.chat.id, "❌ Something went wrong. Please try again.")
            .await;
    }

    Ok(())
}
