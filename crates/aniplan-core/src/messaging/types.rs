use crate::domain::ChatId;

/// A slash command received from a chat.
#[derive(Clone, Debug)]
pub struct Command {
    pub chat_id: ChatId,
    pub user_id: Option<i64>,
    pub sender: Option<String>,
    pub name: String,
    pub args: Vec<String>,
}

impl Command {
    /// Parse `/cmd@botname arg1 arg2`. Returns `None` for non-command text.
    pub fn parse(
        chat_id: ChatId,
        user_id: Option<i64>,
        sender: Option<String>,
        text: &str,
    ) -> Option<Self> {
        let text = text.trim();
        if !text.starts_with('/') {
            return None;
        }
        let mut parts = text.split_whitespace();
        let first = parts.next().unwrap_or("");

        let name = first
            .trim_start_matches('/')
            .split('@')
            .next()
            .unwrap_or("")
            .to_lowercase();
        if name.is_empty() {
            return None;
        }

        Some(Self {
            chat_id,
            user_id,
            sender,
            name,
            args: parts.map(str::to_string).collect(),
        })
    }
}

/// Outgoing "chat action" (typing indicator, etc).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChatAction {
    Typing,
    UploadPhoto,
}

/// Capabilities / feature flags of a messenger implementation.
#[derive(Clone, Copy, Debug)]
pub struct MessagingCapabilities {
    pub supports_photos: bool,
    pub max_message_len: usize,
    pub max_caption_len: usize,
}
