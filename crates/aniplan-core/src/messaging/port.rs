use async_trait::async_trait;

use crate::{
    domain::ChatId,
    messaging::types::{ChatAction, MessagingCapabilities},
    Result,
};

/// Cross-messenger port.
///
/// The dispatcher only talks to this trait; the Telegram adapter implements it.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    fn capabilities(&self) -> MessagingCapabilities;

    async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<()>;

    /// Send an image by URL with an optional HTML caption.
    async fn send_photo(
        &self,
        chat_id: ChatId,
        url: &str,
        caption: Option<&str>,
    ) -> Result<()>;

    async fn send_chat_action(&self, chat_id: ChatId, action: ChatAction) -> Result<()>;
}
